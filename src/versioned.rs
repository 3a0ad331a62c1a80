//! Time-versioned registry values.
//!
//! Almost every field of a CVR record is an array of values, each carrying a
//! validity period. The element whose `gyldigTil` is null is the value in
//! effect today; every other element is history. This module owns the one rule
//! used everywhere to read such arrays: take the current element, and if the
//! registry has no current element, take the last (most recent) one.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Validity period of a versioned registry value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    #[serde(
        rename = "gyldigFra",
        default,
        deserialize_with = "lenient_date"
    )]
    pub valid_from: Option<NaiveDate>,
    /// `Some(UNKNOWN_END)` when the registry states an end date that cannot be read.
    #[serde(rename = "gyldigTil", default, deserialize_with = "lenient_end_date")]
    pub valid_to: Option<NaiveDate>,
}

/// Stand-in for an end date that is present but unparseable. The element has
/// ended at some unknown date, so it is never current and never active.
pub const UNKNOWN_END: NaiveDate = NaiveDate::MIN;

impl Period {
    pub fn new(valid_from: Option<NaiveDate>, valid_to: Option<NaiveDate>) -> Self {
        Self {
            valid_from,
            valid_to,
        }
    }

    /// Open-ended period starting at `from`.
    pub fn open(from: NaiveDate) -> Self {
        Self::new(Some(from), None)
    }

    /// A period with no end date is the value currently in effect.
    pub fn is_current(&self) -> bool {
        self.valid_to.is_none()
    }

    /// Active on `date` when the period never ended or ends on/after `date`.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        match self.valid_to {
            None => true,
            Some(end) => end >= date,
        }
    }
}

/// Any registry element that carries a validity period.
pub trait Versioned {
    fn period(&self) -> &Period;
}

/// Selects an element using `predicate`, newest match first, falling back to the
/// last element of the array when nothing matches.
pub fn current_or_latest_by<T, P>(items: &[T], predicate: P) -> Option<&T>
where
    P: Fn(&T) -> bool,
{
    items
        .iter()
        .rev()
        .find(|item| predicate(item))
        .or_else(|| items.last())
}

/// The element in effect today (`gyldigTil == null`), or the most recent
/// historical element when no element is current.
pub fn current_or_latest<T: Versioned>(items: &[T]) -> Option<&T> {
    current_or_latest_by(items, |item| item.period().is_current())
}

/// Reads `field` from the current-or-latest element.
///
/// The field is read from the selected element only; an empty field on the
/// current element does not fall through to older history.
pub fn current_or_latest_map<'a, T, R, F>(items: &'a [T], field: F) -> Option<R>
where
    T: Versioned,
    F: FnOnce(&'a T) -> Option<R>,
{
    current_or_latest(items).and_then(field)
}

/// Parses the registry's date strings, tolerating timestamps and garbage.
///
/// The registry mostly emits `YYYY-MM-DD`, but some feeds append a time part.
/// Anything unparseable is treated as absent rather than failing the record.
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_registry_date))
}

/// Like `lenient_date`, but a non-blank value that does not parse still marks
/// the period as ended.
fn lenient_end_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(match raw.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(text) => Some(parse_registry_date(text).unwrap_or(UNKNOWN_END)),
    })
}

/// Parses the leading `YYYY-MM-DD` of a registry date string.
pub fn parse_registry_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Named {
        name: &'static str,
        period: Period,
    }

    impl Versioned for Named {
        fn period(&self) -> &Period {
            &self.period
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn named(name: &'static str, from: NaiveDate, to: Option<NaiveDate>) -> Named {
        Named {
            name,
            period: Period::new(Some(from), to),
        }
    }

    #[test]
    fn test_current_element_wins_over_position() {
        let items = vec![
            named("current", date(2015, 1, 1), None),
            named("old", date(2010, 1, 1), Some(date(2014, 12, 31))),
        ];

        assert_eq!(current_or_latest(&items).unwrap().name, "current");
    }

    #[test]
    fn test_falls_back_to_last_element() {
        let items = vec![
            named("first", date(2010, 1, 1), Some(date(2012, 1, 1))),
            named("last", date(2012, 1, 2), Some(date(2020, 5, 1))),
        ];

        assert_eq!(current_or_latest(&items).unwrap().name, "last");
    }

    #[test]
    fn test_empty_array_yields_none() {
        let items: Vec<Named> = Vec::new();
        assert!(current_or_latest(&items).is_none());
    }

    #[test]
    fn test_map_reads_only_selected_element() {
        let items = vec![
            named("", date(2010, 1, 1), Some(date(2012, 1, 1))),
            named("", date(2012, 1, 2), None),
        ];
        let value = current_or_latest_map(&items, |n| {
            Some(n.name).filter(|s| !s.is_empty())
        });
        assert!(value.is_none());
    }

    #[test]
    fn test_active_on_includes_end_date() {
        let period = Period::new(Some(date(2020, 1, 1)), Some(date(2024, 6, 30)));
        assert!(period.is_active_on(date(2024, 6, 30)));
        assert!(!period.is_active_on(date(2024, 7, 1)));
        assert!(Period::open(date(2020, 1, 1)).is_active_on(date(2099, 1, 1)));
    }

    #[test]
    fn test_lenient_date_parsing() {
        let period: Period = serde_json::from_value(serde_json::json!({
            "gyldigFra": "2019-03-01T00:00:00.000+01:00",
            "gyldigTil": "2021-06-30T00:00:00.000+02:00"
        }))
        .unwrap();
        assert_eq!(period.valid_from, Some(date(2019, 3, 1)));
        assert_eq!(period.valid_to, Some(date(2021, 6, 30)));

        let period: Period = serde_json::from_value(serde_json::json!({
            "gyldigFra": "not a date",
            "gyldigTil": ""
        }))
        .unwrap();
        assert_eq!(period.valid_from, None);
        assert!(period.is_current());
    }

    #[test]
    fn test_unreadable_end_date_means_ended() {
        let period: Period = serde_json::from_value(serde_json::json!({
            "gyldigFra": "2010-01-01",
            "gyldigTil": "31.12.2015"
        }))
        .unwrap();
        assert_eq!(period.valid_to, Some(UNKNOWN_END));
        assert!(!period.is_current());
        assert!(!period.is_active_on(date(2000, 1, 1)));

        let items = vec![
            Named {
                name: "old",
                period,
            },
            named("new", date(2016, 1, 1), Some(date(2020, 1, 1))),
        ];
        assert_eq!(current_or_latest(&items).unwrap().name, "new");
    }

    #[test]
    fn test_missing_period_fields_default_to_none() {
        let period: Period = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(period, Period::default());
    }
}

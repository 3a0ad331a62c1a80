//! Result shaping for registry search hits.
//!
//! Flattens a time-versioned registry record into a `CompanySummary`:
//! 1. every versioned field is read with `current_or_latest`
//! 2. the address is formatted the Danish way ("Vej 1, 2. th, 2100 København Ø")
//! 3. phone numbers are normalized to E.164 for Denmark
//! 4. placeholder emails are dropped

use crate::models::{Address, CompanyRecord, CompanySummary, ContactEntry};
use crate::ranking::RankedHit;
use crate::versioned::current_or_latest;
use chrono::Datelike;
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use regex::Regex;
use std::sync::OnceLock;

/// Display name used when a record carries no name at all.
pub const MISSING_NAME: &str = "N/A";

/// Builds the summary for a ranked hit.
pub fn summarize(ranked: &RankedHit) -> CompanySummary {
    let record = &ranked.hit.record;
    let id = if ranked.hit.id.is_empty() {
        record
            .cvr_number
            .map(|cvr| cvr.to_string())
            .unwrap_or_default()
    } else {
        ranked.hit.id.clone()
    };

    let mut summary = summarize_record(record);
    summary.id = id;
    summary.relevance = ranked.relevance;
    summary
}

/// Builds the summary for a bare record, with zero relevance.
pub fn summarize_record(record: &CompanyRecord) -> CompanySummary {
    let industry = record.current_industry();
    let legal_form = record.current_legal_form();

    CompanySummary {
        id: record
            .cvr_number
            .map(|cvr| cvr.to_string())
            .unwrap_or_default(),
        name: record.current_name().unwrap_or(MISSING_NAME).to_string(),
        cvr: record.cvr_number,
        address: record.current_address().and_then(format_address),
        industry: industry.and_then(|i| clean(i.text.as_deref())),
        industry_code: industry.and_then(|i| clean(i.code.as_deref())),
        employees: record.latest_employment().and_then(|e| e.headcount()),
        founded_year: record.incorporation_date().map(|d| d.year()),
        legal_form: legal_form.and_then(|f| {
            clean(f.long_description.as_deref()).or_else(|| clean(f.short_description.as_deref()))
        }),
        status: record.status_text().map(String::from),
        phone: public_contact(&record.phones).map(|raw| {
            normalize_dk_phone(&raw).unwrap_or(raw)
        }),
        email: public_contact(&record.emails).filter(|e| is_valid_email(e)),
        website: public_contact(&record.websites),
        relevance: 0.0,
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Current contact value, unless the registry marks it as protected.
fn public_contact(entries: &[ContactEntry]) -> Option<String> {
    let entry = current_or_latest(entries)?;
    if entry.secret {
        return None;
    }
    clean(Some(entry.value.as_str()))
}

/// Formats a registry address on one line.
///
/// Falls back to the free-text address when no street is registered.
pub fn format_address(address: &Address) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    if let Some(care_of) = clean(address.care_of.as_deref()) {
        parts.push(format!("c/o {}", care_of));
    }

    if let Some(street) = clean(address.street.as_deref()) {
        let mut line = street;
        if let Some(number) = address.house_number_from {
            line.push(' ');
            line.push_str(&number.to_string());
            if let Some(letter) = clean(address.letter_from.as_deref()) {
                line.push_str(&letter);
            }
            if let Some(to) = address.house_number_to.filter(|to| *to != number) {
                line.push_str(&format!("-{}", to));
            }
        }
        let floor = clean(address.floor.as_deref());
        let door = clean(address.door.as_deref());
        match (floor, door) {
            (Some(floor), Some(door)) => line.push_str(&format!(", {}. {}", floor, door)),
            (Some(floor), None) => line.push_str(&format!(", {}.", floor)),
            (None, Some(door)) => line.push_str(&format!(", {}", door)),
            (None, None) => {}
        }
        parts.push(line);
    } else if let Some(free_text) = clean(address.free_text.as_deref()) {
        parts.push(free_text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    let district = clean(address.postal_district.as_deref());
    match (address.postal_code, district) {
        (Some(code), Some(district)) => parts.push(format!("{} {}", code, district)),
        (Some(code), None) => parts.push(code.to_string()),
        (None, Some(district)) => parts.push(district),
        (None, None) => {}
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("email pattern is valid")
    })
}

/// Validate email address
///
/// Rejects malformed addresses and registry placeholders made of repeated or
/// sequential digits.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    let placeholder_patterns = ["999999", "111111", "000000", "123456789"];
    if let Some(pattern) = placeholder_patterns.iter().find(|p| email.contains(*p)) {
        tracing::debug!(pattern, "Dropping placeholder email");
        return false;
    }

    email_regex().is_match(email)
}

/// Normalizes a Danish phone number to E.164 (`+4533445566`).
///
/// Returns `None` for numbers libphonenumber does not consider valid in DK.
pub fn normalize_dk_phone(raw: &str) -> Option<String> {
    let digits = raw.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < 8 {
        return None;
    }

    match phonenumber::parse(Some(CountryId::DK), raw) {
        Ok(number) if phonenumber::is_valid(&number) => {
            Some(number.format().mode(Mode::E164).to_string())
        }
        Ok(_) => {
            tracing::debug!(raw, "Phone number is not a valid Danish number");
            None
        }
        Err(e) => {
            tracing::debug!(raw, error = ?e, "Failed to parse phone number");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> CompanyRecord {
        CompanyRecord::from_source(&json!({
            "Vrvirksomhed": {
                "cvrNummer": 24256790,
                "navne": [
                    {"navn": "NOVO INDUSTRI A/S", "periode": {"gyldigFra": "1989-01-01", "gyldigTil": "1999-10-31"}},
                    {"navn": "NOVO NORDISK A/S", "periode": {"gyldigFra": "1999-11-01", "gyldigTil": null}}
                ],
                "beliggenhedsadresse": [{
                    "vejnavn": "Novo Allé", "husnummerFra": 1, "postnummer": 2880, "postdistrikt": "Bagsværd",
                    "periode": {"gyldigFra": "1999-11-01", "gyldigTil": null}
                }],
                "hovedbranche": [{"branchekode": "212000", "branchetekst": "Fremstilling af farmaceutiske præparater",
                    "periode": {"gyldigFra": "2008-01-01", "gyldigTil": null}}],
                "virksomhedsform": [{"virksomhedsformkode": 60, "langBeskrivelse": "Aktieselskab", "kortBeskrivelse": "A/S",
                    "periode": {"gyldigFra": "1989-01-01", "gyldigTil": null}}],
                "virksomhedsstatus": [{"status": "NORMAL", "periode": {"gyldigFra": "1989-01-01", "gyldigTil": null}}],
                "telefonNummer": [{"kontaktoplysning": "44448888", "hemmelig": false, "periode": {"gyldigFra": "2000-01-01"}}],
                "elektroniskPost": [{"kontaktoplysning": "999999@example.com", "periode": {"gyldigFra": "2000-01-01"}}],
                "aarsbeskaeftigelse": [{"aar": 2022, "antalAnsatte": 20000}],
                "virksomhedMetadata": {"stiftelsesDato": "1989-11-28"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_summary_reads_current_values() {
        let summary = summarize_record(&record());
        assert_eq!(summary.name, "NOVO NORDISK A/S");
        assert_eq!(summary.cvr, Some(24256790));
        assert_eq!(summary.id, "24256790");
        assert_eq!(summary.address.as_deref(), Some("Novo Allé 1, 2880 Bagsværd"));
        assert_eq!(summary.industry_code.as_deref(), Some("212000"));
        assert_eq!(summary.legal_form.as_deref(), Some("Aktieselskab"));
        assert_eq!(summary.status.as_deref(), Some("NORMAL"));
        assert_eq!(summary.employees.as_deref(), Some("20000"));
        assert_eq!(summary.founded_year, Some(1989));
        assert_eq!(summary.phone.as_deref(), Some("+4544448888"));
        assert_eq!(summary.email, None);
    }

    #[test]
    fn test_summary_of_empty_record() {
        let summary = summarize_record(&CompanyRecord::default());
        assert_eq!(summary.name, MISSING_NAME);
        assert!(summary.address.is_none());
        assert!(summary.phone.is_none());
    }

    #[test]
    fn test_secret_contact_is_hidden() {
        let mut record = record();
        record.phones[0].secret = true;
        assert!(summarize_record(&record).phone.is_none());
    }

    #[test]
    fn test_format_address_with_floor_and_care_of() {
        let address = Address {
            care_of: Some("Advokat Hansen".to_string()),
            street: Some("Strandvejen".to_string()),
            house_number_from: Some(12),
            letter_from: Some("B".to_string()),
            floor: Some("2".to_string()),
            door: Some("th".to_string()),
            postal_code: Some(2900),
            postal_district: Some("Hellerup".to_string()),
            ..Default::default()
        };
        assert_eq!(
            format_address(&address).as_deref(),
            Some("c/o Advokat Hansen, Strandvejen 12B, 2. th, 2900 Hellerup")
        );
    }

    #[test]
    fn test_format_address_free_text_fallback() {
        let address = Address {
            free_text: Some("Postboks 100\n  Aarhus".to_string()),
            ..Default::default()
        };
        assert_eq!(format_address(&address).as_deref(), Some("Postboks 100 Aarhus"));
        assert!(format_address(&Address::default()).is_none());
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("info@novonordisk.com"));
        assert!(!is_valid_email("info@novonordisk"));
        assert!(!is_valid_email("000000@firma.dk"));
        assert!(!is_valid_email("a b@firma.dk"));
    }

    #[test]
    fn test_phone_normalization() {
        assert_eq!(normalize_dk_phone("33 44 55 66").as_deref(), Some("+4533445566"));
        assert_eq!(normalize_dk_phone("+45 33445566").as_deref(), Some("+4533445566"));
        assert!(normalize_dk_phone("1234").is_none());
    }
}

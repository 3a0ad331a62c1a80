use crate::versioned::{current_or_latest, current_or_latest_map, lenient_date, Period, Versioned};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============ Registry (CVR) Document ============

/// A company document from the CVR registry index (`Vrvirksomhed`).
///
/// Only the sections the search summary and the risk engine read are modelled;
/// everything else in the document is ignored. Every section defaults to empty so
/// partially populated documents still deserialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// CVR registry number.
    #[serde(rename = "cvrNummer", default)]
    pub cvr_number: Option<u64>,
    /// Registered names, time-versioned.
    #[serde(rename = "navne", default)]
    pub names: Vec<NameEntry>,
    /// Secondary names (aliases / binavne), time-versioned.
    #[serde(rename = "binavne", default)]
    pub secondary_names: Vec<NameEntry>,
    /// Registered addresses, time-versioned.
    #[serde(rename = "beliggenhedsadresse", default)]
    pub addresses: Vec<Address>,
    /// Registry status entries, time-versioned.
    #[serde(rename = "virksomhedsstatus", default)]
    pub statuses: Vec<StatusEntry>,
    /// Legal form entries (A/S, ApS, ...), time-versioned.
    #[serde(rename = "virksomhedsform", default)]
    pub legal_forms: Vec<LegalFormEntry>,
    /// Main industry classification, time-versioned.
    #[serde(rename = "hovedbranche", default)]
    pub industries: Vec<IndustryEntry>,
    #[serde(rename = "telefonNummer", default)]
    pub phones: Vec<ContactEntry>,
    #[serde(rename = "elektroniskPost", default)]
    pub emails: Vec<ContactEntry>,
    #[serde(rename = "hjemmeside", default)]
    pub websites: Vec<ContactEntry>,
    /// Yearly employment figures.
    #[serde(rename = "aarsbeskaeftigelse", default)]
    pub yearly_employment: Vec<EmploymentEntry>,
    /// Quarterly employment figures.
    #[serde(rename = "kvartalsbeskaeftigelse", default)]
    pub quarterly_employment: Vec<EmploymentEntry>,
    /// Participants (owners, directors, board, auditors) and their roles.
    #[serde(rename = "deltagerRelation", default)]
    pub participants: Vec<ParticipantRelation>,
    /// Free-form registry attributes (capital, purpose, ...).
    #[serde(rename = "attributter", default)]
    pub attributes: Vec<Attribute>,
    /// Lifecycle periods; the first start date is the registration date.
    #[serde(rename = "livsforloeb", default)]
    pub lifecycle: Vec<LifecycleEntry>,
    #[serde(rename = "virksomhedMetadata", default)]
    pub metadata: Option<CompanyMetadata>,
}

impl CompanyRecord {
    /// Reads a record from a search hit `_source` or a bare record.
    ///
    /// The registry wraps the record in a `Vrvirksomhed` key; callers of the risk
    /// endpoint usually pass the inner object directly. Both shapes are accepted.
    pub fn from_source(source: &Value) -> Result<Self, serde_json::Error> {
        let inner = source.get("Vrvirksomhed").unwrap_or(source);
        Self::deserialize(inner)
    }

    /// Current (or latest) registered name, falling back to the metadata snapshot.
    pub fn current_name(&self) -> Option<&str> {
        current_or_latest_map(&self.names, |n| non_empty(&n.name)).or_else(|| {
            self.metadata
                .as_ref()
                .and_then(|m| m.newest_name.as_ref())
                .and_then(|n| non_empty(&n.name))
        })
    }

    /// Every primary name the record has carried, newest metadata name included.
    pub fn all_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().filter_map(|n| non_empty(&n.name)).collect();
        if let Some(newest) = self
            .metadata
            .as_ref()
            .and_then(|m| m.newest_name.as_ref())
            .and_then(|n| non_empty(&n.name))
        {
            if !names.contains(&newest) {
                names.push(newest);
            }
        }
        names
    }

    /// Every secondary name (alias) the record has carried.
    pub fn all_secondary_names(&self) -> Vec<&str> {
        self.secondary_names
            .iter()
            .filter_map(|n| non_empty(&n.name))
            .collect()
    }

    /// Current registry status text, falling back to the composite metadata status.
    pub fn status_text(&self) -> Option<&str> {
        current_or_latest_map(&self.statuses, |s| non_empty(&s.status)).or_else(|| {
            self.metadata
                .as_ref()
                .and_then(|m| m.composite_status.as_deref())
                .and_then(non_empty)
        })
    }

    pub fn current_address(&self) -> Option<&Address> {
        current_or_latest(&self.addresses)
    }

    pub fn current_legal_form(&self) -> Option<&LegalFormEntry> {
        current_or_latest(&self.legal_forms)
    }

    pub fn current_industry(&self) -> Option<&IndustryEntry> {
        current_or_latest(&self.industries)
    }

    /// Incorporation date: metadata founding date, else the first lifecycle start,
    /// else the earliest name registration.
    pub fn incorporation_date(&self) -> Option<NaiveDate> {
        self.metadata
            .as_ref()
            .and_then(|m| m.founded)
            .or_else(|| {
                self.lifecycle
                    .iter()
                    .filter_map(|l| l.period.valid_from)
                    .min()
            })
            .or_else(|| self.names.iter().filter_map(|n| n.period.valid_from).min())
    }

    /// Most recent employment figure across yearly and quarterly reports.
    pub fn latest_employment(&self) -> Option<&EmploymentEntry> {
        self.yearly_employment
            .iter()
            .chain(self.quarterly_employment.iter())
            .filter(|e| e.headcount().is_some())
            .max_by_key(|e| (e.year, e.quarter.unwrap_or(0)))
    }
}

/// A name (primary or secondary) with its validity period.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameEntry {
    #[serde(rename = "navn", default)]
    pub name: String,
    #[serde(rename = "periode", default)]
    pub period: Period,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "vejnavn", default)]
    pub street: Option<String>,
    #[serde(rename = "husnummerFra", default)]
    pub house_number_from: Option<u32>,
    #[serde(rename = "husnummerTil", default)]
    pub house_number_to: Option<u32>,
    #[serde(rename = "bogstavFra", default)]
    pub letter_from: Option<String>,
    #[serde(rename = "etage", default)]
    pub floor: Option<String>,
    #[serde(rename = "sidedoer", default)]
    pub door: Option<String>,
    #[serde(rename = "postnummer", default)]
    pub postal_code: Option<u32>,
    #[serde(rename = "postdistrikt", default)]
    pub postal_district: Option<String>,
    #[serde(rename = "bynavn", default)]
    pub city_name: Option<String>,
    /// c/o name.
    #[serde(rename = "conavn", default)]
    pub care_of: Option<String>,
    /// Unstructured address text, used when the structured fields are empty.
    #[serde(rename = "fritekst", default)]
    pub free_text: Option<String>,
    #[serde(rename = "landekode", default)]
    pub country_code: Option<String>,
    #[serde(rename = "periode", default)]
    pub period: Period,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusEntry {
    #[serde(default)]
    pub status: String,
    #[serde(rename = "periode", default)]
    pub period: Period,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegalFormEntry {
    #[serde(rename = "virksomhedsformkode", default)]
    pub code: Option<u32>,
    #[serde(rename = "langBeskrivelse", default)]
    pub long_description: Option<String>,
    #[serde(rename = "kortBeskrivelse", default)]
    pub short_description: Option<String>,
    #[serde(rename = "periode", default)]
    pub period: Period,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndustryEntry {
    #[serde(rename = "branchekode", default, deserialize_with = "string_or_number")]
    pub code: Option<String>,
    #[serde(rename = "branchetekst", default)]
    pub text: Option<String>,
    #[serde(rename = "periode", default)]
    pub period: Period,
}

/// Phone number, email or website entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactEntry {
    #[serde(rename = "kontaktoplysning", default)]
    pub value: String,
    /// Protected contact details must not be shown.
    #[serde(rename = "hemmelig", default)]
    pub secret: bool,
    #[serde(rename = "periode", default)]
    pub period: Period,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmploymentEntry {
    #[serde(rename = "aar", default)]
    pub year: i32,
    #[serde(rename = "kvartal", default)]
    pub quarter: Option<u32>,
    #[serde(rename = "antalAnsatte", default)]
    pub employees: Option<u32>,
    /// Interval code such as `ANTAL_20_49`, reported when the exact count is withheld.
    #[serde(
        rename = "intervalKodeAntalAnsatte",
        alias = "antalAnsatteInterval",
        default
    )]
    pub employees_interval: Option<String>,
}

impl EmploymentEntry {
    /// Exact headcount when reported, otherwise the interval as `low-high`.
    pub fn headcount(&self) -> Option<String> {
        if let Some(count) = self.employees {
            return Some(count.to_string());
        }
        let code = self.employees_interval.as_deref()?;
        let bounds: Vec<&str> = code
            .trim_start_matches("ANTAL_")
            .split('_')
            .filter(|s| !s.is_empty())
            .collect();
        match bounds.as_slice() {
            [] => None,
            [single] => Some((*single).to_string()),
            [low, high, ..] => Some(format!("{}-{}", low, high)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifecycleEntry {
    #[serde(rename = "periode", default)]
    pub period: Period,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyMetadata {
    #[serde(rename = "nyesteNavn", default)]
    pub newest_name: Option<NameEntry>,
    #[serde(rename = "sammensatStatus", default)]
    pub composite_status: Option<String>,
    #[serde(rename = "stiftelsesDato", default, deserialize_with = "lenient_date")]
    pub founded: Option<NaiveDate>,
}

/// A typed registry attribute with time-versioned values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type", default)]
    pub attribute_type: String,
    #[serde(rename = "vaerdier", default)]
    pub values: Vec<AttributeValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeValue {
    #[serde(rename = "vaerdi", default, deserialize_with = "string_or_number_value")]
    pub value: String,
    #[serde(rename = "periode", default)]
    pub period: Period,
}

/// A participant (person or company) and the organisations it belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipantRelation {
    #[serde(rename = "deltager", default)]
    pub participant: Option<Participant>,
    #[serde(rename = "organisationer", default)]
    pub organisations: Vec<Organisation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Participant {
    #[serde(rename = "enhedsNummer", default)]
    pub unit_number: Option<u64>,
    /// `PERSON` or `VIRKSOMHED`.
    #[serde(rename = "enhedstype", default)]
    pub unit_type: Option<String>,
    #[serde(rename = "navne", default)]
    pub names: Vec<NameEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Organisation {
    /// Organisation kind: `DIREKTION`, `BESTYRELSE`, `REVISION`, `REGISTER`, ...
    #[serde(rename = "hovedtype", default)]
    pub main_type: Option<String>,
    #[serde(rename = "organisationsNavn", default)]
    pub names: Vec<NameEntry>,
    #[serde(rename = "medlemsData", default)]
    pub memberships: Vec<MembershipData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembershipData {
    #[serde(rename = "attributter", default)]
    pub attributes: Vec<Attribute>,
}

/// Role a participant holds through an organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    Management,
    Board,
    Owner,
    Auditor,
    Founder,
    Other,
}

impl Organisation {
    pub fn role(&self) -> RoleKind {
        let main_type = self.main_type.as_deref().unwrap_or("").to_uppercase();
        let org_name = current_or_latest_map(&self.names, |n| non_empty(&n.name))
            .unwrap_or("")
            .to_uppercase();

        match main_type.as_str() {
            "DIREKTION" => RoleKind::Management,
            "BESTYRELSE" | "TILSYNSRÅD" => RoleKind::Board,
            "REVISION" => RoleKind::Auditor,
            "STIFTERE" => RoleKind::Founder,
            "FULDT_ANSVARLIG_DELTAGERE" | "INTERESSENTER" => RoleKind::Owner,
            "REGISTER" if org_name.contains("EJER") => RoleKind::Owner,
            _ if org_name.contains("EJERREGISTER") || org_name.contains("LEGALE EJERE") => {
                RoleKind::Owner
            }
            _ => RoleKind::Other,
        }
    }

    /// Membership periods that define when the role was held.
    ///
    /// Ownership is tracked through the ownership-share attribute so share
    /// changes count; every other role through its `FUNKTION` attribute. When
    /// neither is present, every attribute value period is used.
    pub fn membership_periods(&self) -> Vec<&Period> {
        let preferred = match self.role() {
            RoleKind::Owner => "EJERANDEL_PROCENT",
            _ => "FUNKTION",
        };
        let attributes = || self.memberships.iter().flat_map(|m| m.attributes.iter());

        let matching: Vec<&Period> = attributes()
            .filter(|a| a.attribute_type.eq_ignore_ascii_case(preferred))
            .flat_map(|a| a.values.iter().map(|v| &v.period))
            .collect();

        if !matching.is_empty() {
            return matching;
        }
        attributes()
            .flat_map(|a| a.values.iter().map(|v| &v.period))
            .collect()
    }
}

impl Versioned for NameEntry {
    fn period(&self) -> &Period {
        &self.period
    }
}

impl Versioned for Address {
    fn period(&self) -> &Period {
        &self.period
    }
}

impl Versioned for StatusEntry {
    fn period(&self) -> &Period {
        &self.period
    }
}

impl Versioned for LegalFormEntry {
    fn period(&self) -> &Period {
        &self.period
    }
}

impl Versioned for IndustryEntry {
    fn period(&self) -> &Period {
        &self.period
    }
}

impl Versioned for ContactEntry {
    fn period(&self) -> &Period {
        &self.period
    }
}

impl Versioned for LifecycleEntry {
    fn period(&self) -> &Period {
        &self.period
    }
}

impl Versioned for AttributeValue {
    fn period(&self) -> &Period {
        &self.period
    }
}

// ============ Financial Statements ============

/// Key figures from one annual report, amounts in DKK.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRecord {
    /// Fiscal year the report covers; see `fiscal_year` when absent.
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub period_end: Option<NaiveDate>,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub gross_profit: Option<f64>,
    #[serde(default, alias = "profit", alias = "profitLoss")]
    pub net_result: Option<f64>,
    #[serde(default)]
    pub equity: Option<f64>,
    #[serde(default)]
    pub total_assets: Option<f64>,
    #[serde(default)]
    pub short_term_debt: Option<f64>,
    #[serde(default)]
    pub long_term_debt: Option<f64>,
    /// Current ratio; reports stating it as a percentage are normalized on read.
    #[serde(default)]
    pub liquidity_ratio: Option<f64>,
    /// Equity ratio in percent.
    #[serde(default)]
    pub equity_ratio: Option<f64>,
    /// Cash and other liquid assets.
    #[serde(default, alias = "liquidAssets")]
    pub cash: Option<f64>,
}

impl FinancialRecord {
    /// Stated fiscal year, else the year the reporting period ended.
    pub fn fiscal_year(&self) -> Option<i32> {
        self.year.or_else(|| self.period_end.map(|d| d.year()))
    }

    /// Short plus long-term debt, derived from the balance sheet when not reported.
    pub fn total_debt(&self) -> Option<f64> {
        match (self.short_term_debt, self.long_term_debt) {
            (Some(s), Some(l)) => Some(s + l),
            (Some(s), None) => Some(s),
            (None, Some(l)) => Some(l),
            (None, None) => match (self.total_assets, self.equity) {
                (Some(assets), Some(equity)) => Some((assets - equity).max(0.0)),
                _ => None,
            },
        }
    }

    /// Equity ratio in percent, derived from equity and total assets when absent.
    pub fn equity_ratio_percent(&self) -> Option<f64> {
        self.equity_ratio.or_else(|| match (self.equity, self.total_assets) {
            (Some(equity), Some(assets)) if assets > 0.0 => Some(equity / assets * 100.0),
            _ => None,
        })
    }

    /// Current ratio as a plain ratio (1.5 rather than 150).
    pub fn current_ratio(&self) -> Option<f64> {
        self.liquidity_ratio
            .map(|r| if r > 10.0 { r / 100.0 } else { r })
    }
}

/// A company's annual reports, in whatever order the source delivered them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinancialHistory {
    pub records: Vec<FinancialRecord>,
}

impl FinancialHistory {
    pub fn new(records: Vec<FinancialRecord>) -> Self {
        Self { records }
    }

    /// Reports sorted newest first, by fiscal year then period end. Reports
    /// that cannot be placed in time are skipped.
    pub fn newest_first(&self) -> Vec<&FinancialRecord> {
        let mut sorted: Vec<&FinancialRecord> = self
            .records
            .iter()
            .filter(|r| {
                let dated = r.fiscal_year().is_some();
                if !dated {
                    tracing::warn!("Skipping annual report without year or period end");
                }
                dated
            })
            .collect();
        sorted.sort_by(|a, b| {
            b.fiscal_year()
                .cmp(&a.fiscal_year())
                .then_with(|| b.period_end.cmp(&a.period_end))
        });
        sorted
    }
}

// ============ Search API ============

/// Query parameters of the search endpoint. Exactly one kind is used; CVR wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub cvr: Option<String>,
    pub company_name: Option<String>,
    pub person_name: Option<String>,
}

/// Flattened view of a registry record for result lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub id: String,
    pub name: String,
    pub cvr: Option<u64>,
    pub address: Option<String>,
    pub industry: Option<String>,
    pub industry_code: Option<String>,
    pub employees: Option<String>,
    pub founded_year: Option<i32>,
    pub legal_form: Option<String>,
    pub status: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    /// Local tier score the result was ranked by.
    pub relevance: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub companies: Vec<CompanySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_first_record: Option<Value>,
    pub total: u64,
}

/// Body of the risk endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskRequest {
    #[serde(default)]
    pub company: Option<Value>,
    #[serde(default)]
    pub financials: Option<FinancialHistory>,
}

// ============ Lenient field readers ============

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn string_or_number_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_or_number(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_source_unwraps_vrvirksomhed() {
        let source = json!({
            "Vrvirksomhed": {
                "cvrNummer": 24256790,
                "navne": [{"navn": "NOVO NORDISK A/S", "periode": {"gyldigFra": "1999-11-01", "gyldigTil": null}}]
            }
        });
        let record = CompanyRecord::from_source(&source).unwrap();
        assert_eq!(record.cvr_number, Some(24256790));
        assert_eq!(record.current_name(), Some("NOVO NORDISK A/S"));
    }

    #[test]
    fn test_current_name_falls_back_to_metadata() {
        let record = CompanyRecord::from_source(&json!({
            "virksomhedMetadata": {"nyesteNavn": {"navn": "META NAVN ApS"}}
        }))
        .unwrap();
        assert_eq!(record.current_name(), Some("META NAVN ApS"));
    }

    #[test]
    fn test_industry_code_accepts_numbers() {
        let entry: IndustryEntry =
            serde_json::from_value(json!({"branchekode": 620100, "branchetekst": "Computerprogrammering"}))
                .unwrap();
        assert_eq!(entry.code.as_deref(), Some("620100"));
    }

    #[test]
    fn test_employment_headcount_interval() {
        let entry = EmploymentEntry {
            year: 2023,
            employees_interval: Some("ANTAL_20_49".to_string()),
            ..Default::default()
        };
        assert_eq!(entry.headcount().as_deref(), Some("20-49"));

        let exact = EmploymentEntry {
            year: 2023,
            employees: Some(12),
            ..Default::default()
        };
        assert_eq!(exact.headcount().as_deref(), Some("12"));
    }

    #[test]
    fn test_latest_employment_prefers_newest_quarter() {
        let record = CompanyRecord {
            yearly_employment: vec![EmploymentEntry {
                year: 2022,
                employees: Some(10),
                ..Default::default()
            }],
            quarterly_employment: vec![
                EmploymentEntry {
                    year: 2023,
                    quarter: Some(1),
                    employees: Some(11),
                    ..Default::default()
                },
                EmploymentEntry {
                    year: 2023,
                    quarter: Some(3),
                    employees: Some(14),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(record.latest_employment().unwrap().employees, Some(14));
    }

    #[test]
    fn test_financial_history_sorts_newest_first() {
        let history: FinancialHistory = serde_json::from_value(json!([
            {"year": 2020, "equity": 1.0},
            {"year": 2022, "equity": 3.0},
            {"year": 2021, "equity": 2.0}
        ]))
        .unwrap();
        let years: Vec<Option<i32>> = history.newest_first().iter().map(|r| r.year).collect();
        assert_eq!(years, vec![Some(2022), Some(2021), Some(2020)]);
    }

    #[test]
    fn test_financial_history_dates_reports_without_year() {
        let history: FinancialHistory = serde_json::from_value(json!([
            {"year": 2022, "equity": 3.0},
            {"periodEnd": "2023-12-31", "equity": 4.0},
            {"equity": 99.0}
        ]))
        .unwrap();
        let newest = history.newest_first();
        assert_eq!(newest.len(), 2);
        assert_eq!(newest[0].fiscal_year(), Some(2023));
        assert_eq!(newest[0].equity, Some(4.0));
        assert_eq!(newest[1].fiscal_year(), Some(2022));
    }

    #[test]
    fn test_financial_record_aliases_and_derivations() {
        let record: FinancialRecord = serde_json::from_value(json!({
            "year": 2023,
            "profit": -50000.0,
            "equity": 400000.0,
            "totalAssets": 1000000.0,
            "liquidityRatio": 150.0
        }))
        .unwrap();
        assert_eq!(record.net_result, Some(-50000.0));
        assert_eq!(record.equity_ratio_percent(), Some(40.0));
        assert_eq!(record.total_debt(), Some(600000.0));
        assert_eq!(record.current_ratio(), Some(1.5));
    }

    #[test]
    fn test_owner_role_uses_ownership_share_periods() {
        let org: Organisation = serde_json::from_value(json!({
            "hovedtype": "REGISTER",
            "organisationsNavn": [{"navn": "EJERREGISTER", "periode": {}}],
            "medlemsData": [{"attributter": [
                {"type": "EJERANDEL_PROCENT", "vaerdier": [
                    {"vaerdi": "0.5", "periode": {"gyldigFra": "2019-01-01", "gyldigTil": "2021-01-01"}},
                    {"vaerdi": "1.0", "periode": {"gyldigFra": "2021-01-02"}}
                ]},
                {"type": "FUNKTION", "vaerdier": [{"vaerdi": "EJER", "periode": {"gyldigFra": "2019-01-01"}}]}
            ]}]
        }))
        .unwrap();
        assert_eq!(org.role(), RoleKind::Owner);
        assert_eq!(org.membership_periods().len(), 2);
    }
}

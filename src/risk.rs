//! Company risk scoring.
//!
//! Turns a registry record and optional annual reports into a 0.0-10.0 score
//! (10 = lowest risk). Terminal statuses short-circuit, then thirteen weighted
//! factors are blended and known danger patterns cap the result.

use crate::models::{CompanyRecord, FinancialHistory, RoleKind};
use crate::risk_financial::{
    assess_cash_flow, assess_debt_structure, assess_financial, assess_trends, Assessment,
    FinancialSnapshot, NEUTRAL_SCORE,
};
use crate::status::CompanyStatus;
use crate::versioned::Period;
use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score returned for companies under reconstruction or winding-up.
pub const RECONSTRUCTION_SCORE: f64 = 1.5;

/// Trailing window, in months, for counting registry changes.
pub const CHANGE_WINDOW_MONTHS: u32 = 36;

/// Score given to the payment-history factor until credit-bureau data exists.
pub const PAYMENT_HISTORY_SCORE: f64 = 8.0;

// ============ Output ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            RiskLevel::Low
        } else if score >= 5.0 {
            RiskLevel::Medium
        } else if score >= 2.0 {
            RiskLevel::High
        } else {
            RiskLevel::Extreme
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Extreme => "extreme",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriticalFlag {
    InactiveCompany,
    UnderReconstruction,
    TechnicalInsolvency,
    NegativeEquityMultiYear,
    NegativeEquityAndLoss,
    PersistentLossNegativeEquity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub score: f64,
    pub weight: f64,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactors {
    pub status: RiskFactor,
    pub financial: RiskFactor,
    pub financial_trends: RiskFactor,
    pub cash_flow: RiskFactor,
    pub debt_structure: RiskFactor,
    pub age: RiskFactor,
    pub management: RiskFactor,
    pub ownership: RiskFactor,
    pub industry: RiskFactor,
    pub payment_history: RiskFactor,
    pub auditor: RiskFactor,
    pub address: RiskFactor,
    pub data_completeness: RiskFactor,
}

impl RiskFactors {
    /// Every factor with the same score and explanation, at its usual weight.
    fn uniform(score: f64, details: &str) -> Self {
        let factor = |kind: FactorKind| RiskFactor {
            score,
            weight: kind.weight(),
            details: details.to_string(),
        };
        Self {
            status: factor(FactorKind::Status),
            financial: factor(FactorKind::Financial),
            financial_trends: factor(FactorKind::FinancialTrends),
            cash_flow: factor(FactorKind::CashFlow),
            debt_structure: factor(FactorKind::DebtStructure),
            age: factor(FactorKind::Age),
            management: factor(FactorKind::Management),
            ownership: factor(FactorKind::Ownership),
            industry: factor(FactorKind::Industry),
            payment_history: factor(FactorKind::PaymentHistory),
            auditor: factor(FactorKind::Auditor),
            address: factor(FactorKind::Address),
            data_completeness: factor(FactorKind::DataCompleteness),
        }
    }

    pub fn all(&self) -> [&RiskFactor; 13] {
        [
            &self.status,
            &self.financial,
            &self.financial_trends,
            &self.cash_flow,
            &self.debt_structure,
            &self.age,
            &self.management,
            &self.ownership,
            &self.industry,
            &self.payment_history,
            &self.auditor,
            &self.address,
            &self.data_completeness,
        ]
    }

    /// Weight-normalized sum of the factor scores.
    pub fn weighted_score(&self) -> f64 {
        let (weighted, total_weight) = self
            .all()
            .iter()
            .fold((0.0, 0.0), |(sum, weight), f| (sum + f.score * f.weight, weight + f.weight));
        if total_weight > 0.0 {
            weighted / total_weight
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScore {
    pub total_score: f64,
    pub risk_level: RiskLevel,
    pub factors: RiskFactors,
    pub warnings: Vec<String>,
    pub critical_flags: Vec<CriticalFlag>,
}

// ============ Factor weights ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorKind {
    Status,
    Financial,
    FinancialTrends,
    CashFlow,
    DebtStructure,
    Age,
    Management,
    Ownership,
    Industry,
    PaymentHistory,
    Auditor,
    Address,
    DataCompleteness,
}

impl FactorKind {
    pub const ALL: [FactorKind; 13] = [
        FactorKind::Status,
        FactorKind::Financial,
        FactorKind::FinancialTrends,
        FactorKind::CashFlow,
        FactorKind::DebtStructure,
        FactorKind::Age,
        FactorKind::Management,
        FactorKind::Ownership,
        FactorKind::Industry,
        FactorKind::PaymentHistory,
        FactorKind::Auditor,
        FactorKind::Address,
        FactorKind::DataCompleteness,
    ];

    /// Weight in percent. The weights sum to 103.5, so totals are normalized.
    pub fn weight(self) -> f64 {
        match self {
            FactorKind::Status => 15.0,
            FactorKind::Financial => 38.0,
            FactorKind::FinancialTrends => 14.0,
            FactorKind::CashFlow => 9.0,
            FactorKind::DebtStructure => 7.0,
            FactorKind::Age => 5.0,
            FactorKind::Management => 4.0,
            FactorKind::Ownership => 3.0,
            FactorKind::Industry => 3.0,
            FactorKind::PaymentHistory => 2.0,
            FactorKind::Auditor => 1.5,
            FactorKind::Address => 0.5,
            FactorKind::DataCompleteness => 1.5,
        }
    }

    fn factor(self, assessment: Assessment) -> RiskFactor {
        RiskFactor {
            score: assessment.score,
            weight: self.weight(),
            details: assessment.details,
        }
    }
}

// ============ Industry keywords ============

/// Lower-case keywords matched against the industry text, by risk tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryKeywords {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

impl Default for IndustryKeywords {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|w| w.to_string()).collect();
        Self {
            high: words(&[
                "restaurant", "café", "cafe", "værtshus", "catering", "byggeri",
                "bygge", "tømrer", "murer", "nedrivning", "vognmand", "taxi", "frisør",
                "rengøring", "detailhandel", "kiosk", "hotel",
            ]),
            medium: words(&[
                "engroshandel", "handel", "ejendom", "landbrug", "produktion", "reklame",
                "rejsebureau", "transport", "udlejning", "installation",
            ]),
            low: words(&[
                "software", "programmering", "konsulent", "rådgivning", "farmaceut",
                "sundhed", "læge", "tandlæge", "forsikring", "pension", "bank", "finansiel",
                "revision", "advokat", "undervisning", "forskning", "offentlig",
            ]),
        }
    }
}

// ============ Engine ============

/// Risk scoring against a fixed "today", so results never depend on the wall clock.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    today: NaiveDate,
    industry_keywords: IndustryKeywords,
}

impl RiskEngine {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            industry_keywords: IndustryKeywords::default(),
        }
    }

    /// Engine dated today (UTC).
    pub fn today() -> Self {
        Self::new(Utc::now().date_naive())
    }

    pub fn with_industry_keywords(mut self, keywords: IndustryKeywords) -> Self {
        self.industry_keywords = keywords;
        self
    }

    pub fn assess(
        &self,
        company: &CompanyRecord,
        financials: Option<&FinancialHistory>,
    ) -> RiskScore {
        let status_text = company.status_text();
        match CompanyStatus::classify(status_text) {
            CompanyStatus::Terminal => {
                let status = status_text.unwrap_or_default();
                tracing::info!(cvr = ?company.cvr_number, status, "Company is no longer active");
                return RiskScore {
                    total_score: 0.0,
                    risk_level: RiskLevel::Extreme,
                    factors: RiskFactors::uniform(0.0, &format!("Company is inactive ({})", status)),
                    warnings: vec![format!("Company is no longer active: {}", status)],
                    critical_flags: vec![CriticalFlag::InactiveCompany],
                };
            }
            CompanyStatus::Reconstruction => {
                let status = status_text.unwrap_or_default();
                tracing::info!(cvr = ?company.cvr_number, status, "Company is under reconstruction");
                return RiskScore {
                    total_score: RECONSTRUCTION_SCORE,
                    risk_level: RiskLevel::from_score(RECONSTRUCTION_SCORE),
                    factors: RiskFactors::uniform(
                        0.0,
                        &format!("Company is under reconstruction or winding-up ({})", status),
                    ),
                    warnings: vec![format!("Company is under reconstruction: {}", status)],
                    critical_flags: vec![CriticalFlag::UnderReconstruction],
                };
            }
            CompanyStatus::Active | CompanyStatus::Unknown => {}
        }

        let snapshot = FinancialSnapshot::new(financials);
        let window = ChangeWindow::ending(self.today);
        let founded = company.incorporation_date();

        let assessments = [
            (FactorKind::Status, self.assess_status(status_text)),
            (FactorKind::Financial, assess_financial(&snapshot)),
            (FactorKind::FinancialTrends, assess_trends(&snapshot)),
            (FactorKind::CashFlow, assess_cash_flow(&snapshot)),
            (FactorKind::DebtStructure, assess_debt_structure(&snapshot)),
            (FactorKind::Age, self.assess_age(founded)),
            (
                FactorKind::Management,
                assess_role_changes(company, RoleKind::Management, &window, founded),
            ),
            (
                FactorKind::Ownership,
                assess_role_changes(company, RoleKind::Owner, &window, founded),
            ),
            (FactorKind::Industry, self.assess_industry(company)),
            (
                FactorKind::PaymentHistory,
                Assessment::new(
                    PAYMENT_HISTORY_SCORE,
                    "No payment remarks registered (credit bureau data not available)",
                ),
            ),
            (
                FactorKind::Auditor,
                assess_role_changes(company, RoleKind::Auditor, &window, founded),
            ),
            (FactorKind::Address, assess_address_changes(company, &window)),
            (FactorKind::DataCompleteness, assess_data_completeness(company)),
        ];

        let mut warnings: Vec<String> = assessments
            .iter()
            .flat_map(|(_, a)| a.warnings.iter().cloned())
            .collect();

        let [status, financial, financial_trends, cash_flow, debt_structure, age, management, ownership, industry, payment_history, auditor, address, data_completeness] =
            assessments.map(|(kind, assessment)| kind.factor(assessment));
        let factors = RiskFactors {
            status,
            financial,
            financial_trends,
            cash_flow,
            debt_structure,
            age,
            management,
            ownership,
            industry,
            payment_history,
            auditor,
            address,
            data_completeness,
        };

        let weighted = factors.weighted_score();
        let overrides = critical_overrides(&snapshot);
        let capped = overrides
            .iter()
            .fold(weighted, |score, o| score.min(o.cap));
        let total_score = round_one_decimal(capped.clamp(0.0, 10.0));

        warnings.extend(overrides.iter().map(|o| o.warning.clone()));
        let critical_flags: Vec<CriticalFlag> = overrides.iter().map(|o| o.flag).collect();
        let risk_level = RiskLevel::from_score(total_score);

        tracing::info!(
            cvr = ?company.cvr_number,
            weighted = round_one_decimal(weighted),
            total_score,
            %risk_level,
            flags = critical_flags.len(),
            "Risk assessment complete"
        );

        RiskScore {
            total_score,
            risk_level,
            factors,
            warnings,
            critical_flags,
        }
    }

    fn assess_status(&self, status_text: Option<&str>) -> Assessment {
        match (CompanyStatus::classify(status_text), status_text) {
            (CompanyStatus::Active, Some(text)) => {
                Assessment::new(10.0, format!("Company status: {}", text.trim()))
            }
            (_, Some(text)) => {
                Assessment::new(NEUTRAL_SCORE, format!("Unrecognized company status: {}", text.trim()))
            }
            (_, None) => Assessment::insufficient("no company status registered"),
        }
    }

    fn assess_age(&self, founded: Option<NaiveDate>) -> Assessment {
        let Some(founded) = founded else {
            return Assessment::insufficient("no incorporation date");
        };
        let years = (self.today - founded).num_days() as f64 / 365.25;
        let score = if years >= 20.0 {
            10.0
        } else if years >= 10.0 {
            9.0
        } else if years >= 5.0 {
            7.0
        } else if years >= 3.0 {
            5.0
        } else if years >= 1.0 {
            3.0
        } else {
            2.0
        };
        Assessment::new(score, format!("Company is {:.1} years old", years.max(0.0)))
    }

    fn assess_industry(&self, company: &CompanyRecord) -> Assessment {
        let Some(text) = company
            .current_industry()
            .and_then(|i| i.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            return Assessment::insufficient("no industry registered");
        };

        let lowered = text.to_lowercase();
        let matches = |words: &[String]| words.iter().any(|w| lowered.contains(w.as_str()));
        let keywords = &self.industry_keywords;

        if matches(&keywords.high) {
            Assessment::new(4.0, format!("High-risk industry: {}", text))
        } else if matches(&keywords.medium) {
            Assessment::new(6.0, format!("Medium-risk industry: {}", text))
        } else if matches(&keywords.low) {
            Assessment::new(9.0, format!("Low-risk industry: {}", text))
        } else {
            Assessment::new(7.0, format!("Industry: {}", text))
        }
    }
}

/// Scores a record with the default keyword tables.
pub fn assess_risk(
    company: &CompanyRecord,
    financials: Option<&FinancialHistory>,
    today: NaiveDate,
) -> RiskScore {
    RiskEngine::new(today).assess(company, financials)
}

fn round_one_decimal(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

// ============ Change counting ============

/// Closed date range `[start, end]` ending today.
#[derive(Debug, Clone, Copy)]
struct ChangeWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl ChangeWindow {
    fn ending(today: NaiveDate) -> Self {
        let start = today
            .checked_sub_months(Months::new(CHANGE_WINDOW_MONTHS))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Role changes of `periods` inside `window`. Appointments and departures pair
/// up, so replacing one person with another is a single change. Starts on the
/// incorporation date are the founding setup, not a change.
fn count_changes<'a>(
    periods: impl Iterator<Item = &'a Period>,
    window: &ChangeWindow,
    founded: Option<NaiveDate>,
) -> usize {
    let (starts, ends) = periods.fold((0, 0), |(starts, ends), p| {
        let started = p
            .valid_from
            .is_some_and(|d| window.contains(d) && Some(d) != founded);
        let ended = p.valid_to.is_some_and(|d| window.contains(d));
        (starts + started as usize, ends + ended as usize)
    });
    starts.max(ends)
}

fn role_label(role: RoleKind) -> &'static str {
    match role {
        RoleKind::Management => "management",
        RoleKind::Board => "board",
        RoleKind::Owner => "ownership",
        RoleKind::Auditor => "auditor",
        RoleKind::Founder => "founder",
        RoleKind::Other => "participant",
    }
}

fn assess_role_changes(
    company: &CompanyRecord,
    role: RoleKind,
    window: &ChangeWindow,
    founded: Option<NaiveDate>,
) -> Assessment {
    let organisations: Vec<_> = company
        .participants
        .iter()
        .flat_map(|r| r.organisations.iter())
        .filter(|o| o.role() == role)
        .collect();

    let label = role_label(role);
    if organisations.is_empty() {
        tracing::debug!(role = label, "No registrations for role");
        return Assessment::insufficient(&format!("no {} registrations", label));
    }

    let changes = count_changes(
        organisations
            .iter()
            .flat_map(|o| o.membership_periods().into_iter()),
        window,
        founded,
    );

    let score = match (role, changes) {
        (_, 0) => 10.0,
        (RoleKind::Auditor, 1) => 7.0,
        (RoleKind::Auditor, 2) => 4.0,
        (RoleKind::Auditor, _) => 2.0,
        (_, 1) => 8.0,
        (_, 2) => 6.0,
        (_, 3) => 4.0,
        _ => 2.0,
    };

    let assessment = Assessment::new(
        score,
        format!("{} {} changes in the last 3 years", changes, label),
    );
    if changes >= 4 {
        assessment.with_warning(format!("Frequent {} changes ({} in 3 years)", label, changes))
    } else {
        assessment
    }
}

fn assess_address_changes(company: &CompanyRecord, window: &ChangeWindow) -> Assessment {
    if company.addresses.is_empty() {
        tracing::debug!("No address registrations");
        return Assessment::insufficient("no address registrations");
    }

    let mut starts: Vec<NaiveDate> = company
        .addresses
        .iter()
        .filter_map(|a| a.period.valid_from)
        .collect();
    starts.sort();
    // The first address is the registration address, not a move.
    let moves = starts
        .iter()
        .skip(1)
        .filter(|d| window.contains(**d))
        .count();

    let score = match moves {
        0 => 10.0,
        1 => 8.0,
        2 => 6.0,
        _ => 4.0,
    };
    Assessment::new(score, format!("{} address changes in the last 3 years", moves))
}

fn assess_data_completeness(company: &CompanyRecord) -> Assessment {
    let sections = [
        ("name", company.current_name().is_some()),
        ("address", !company.addresses.is_empty()),
        ("status", company.status_text().is_some()),
        ("legal form", !company.legal_forms.is_empty()),
        ("industry", !company.industries.is_empty()),
        ("participants", !company.participants.is_empty()),
        (
            "employment",
            !company.yearly_employment.is_empty() || !company.quarterly_employment.is_empty(),
        ),
    ];

    let missing: Vec<&str> = sections
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();
    let present = sections.len() - missing.len();

    if !missing.is_empty() {
        tracing::debug!(cvr = ?company.cvr_number, missing = ?missing, "Registry record is incomplete");
    }

    let score = present as f64 / sections.len() as f64 * 10.0;
    let details = if missing.is_empty() {
        format!("{} of {} registry sections present", present, sections.len())
    } else {
        format!(
            "{} of {} registry sections present (missing: {})",
            present,
            sections.len(),
            missing.join(", ")
        )
    };
    Assessment::new(score, details)
}

// ============ Critical overrides ============

#[derive(Debug, Clone, PartialEq)]
struct CriticalOverride {
    flag: CriticalFlag,
    cap: f64,
    warning: String,
}

/// Caps that apply to the latest reports. Each one can only lower the total.
/// The loss checks read the same report the equity figure came from.
fn critical_overrides(snapshot: &FinancialSnapshot) -> Vec<CriticalOverride> {
    let mut overrides = Vec::new();
    let Some((equity_report, equity)) = snapshot.latest_stating(|r| r.equity) else {
        return overrides;
    };

    if equity < -500_000.0 {
        overrides.push(CriticalOverride {
            flag: CriticalFlag::TechnicalInsolvency,
            cap: 1.0,
            warning: format!("CRITICAL: technically insolvent, equity {:.0} DKK", equity),
        });
    }

    let negative_years = snapshot.consecutive_negative_equity();
    if negative_years >= 2 {
        overrides.push(CriticalOverride {
            flag: CriticalFlag::NegativeEquityMultiYear,
            cap: 3.0,
            warning: format!("CRITICAL: negative equity for {} consecutive years", negative_years),
        });
    }

    if equity < 0.0 {
        if equity_report.net_result.is_some_and(|r| r < 0.0) {
            overrides.push(CriticalOverride {
                flag: CriticalFlag::NegativeEquityAndLoss,
                cap: 2.0,
                warning: "CRITICAL: negative equity combined with a loss in the latest year"
                    .to_string(),
            });
        }
        let losses = snapshot.consecutive_losses();
        if losses >= 3 {
            overrides.push(CriticalOverride {
                flag: CriticalFlag::PersistentLossNegativeEquity,
                cap: 1.5,
                warning: format!(
                    "CRITICAL: negative equity after {} consecutive loss years",
                    losses
                ),
            });
        }
    }

    overrides
}

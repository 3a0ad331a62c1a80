use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Registry status, grouped by what it means for the company's viability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    /// Normal / active.
    Active,
    /// Dissolved, bankrupt, ceased or liquidated. Nothing else matters.
    Terminal,
    /// Under reconstruction or voluntary winding-up.
    Reconstruction,
    /// Anything the patterns do not recognise, including a missing status.
    Unknown,
}

fn terminal_regex() -> &'static Regex {
    static TERMINAL: OnceLock<Regex> = OnceLock::new();
    TERMINAL.get_or_init(|| {
        Regex::new(
            r"(?i)opløst|oploest|tvangsopl|konkurs|ophørt|ophoert|likvidation afsluttet|slettet|dissolved|bankrupt|ceased|liquidated|liquidation completed",
        )
        .expect("terminal status pattern is valid")
    })
}

fn reconstruction_regex() -> &'static Regex {
    static RECONSTRUCTION: OnceLock<Regex> = OnceLock::new();
    RECONSTRUCTION.get_or_init(|| {
        Regex::new(
            r"(?i)rekonstruktion|likvidation|reconstruction|winding[- ]up|voluntary liquidation|under liquidation",
        )
        .expect("reconstruction status pattern is valid")
    })
}

fn active_regex() -> &'static Regex {
    static ACTIVE: OnceLock<Regex> = OnceLock::new();
    ACTIVE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(normal|aktiv|active|registreret)\s*$")
            .expect("active status pattern is valid")
    })
}

impl CompanyStatus {
    /// Classifies a registry status text.
    ///
    /// Terminal patterns are checked first: "OPLØST EFTER FRIVILLIG LIKVIDATION"
    /// is finished, not in progress.
    pub fn classify(status: Option<&str>) -> Self {
        let Some(text) = status.map(str::trim).filter(|s| !s.is_empty()) else {
            return CompanyStatus::Unknown;
        };
        if terminal_regex().is_match(text) {
            CompanyStatus::Terminal
        } else if reconstruction_regex().is_match(text) {
            CompanyStatus::Reconstruction
        } else if active_regex().is_match(text) {
            CompanyStatus::Active
        } else {
            CompanyStatus::Unknown
        }
    }

    pub fn is_operating(self) -> bool {
        matches!(self, CompanyStatus::Active | CompanyStatus::Unknown)
    }
}

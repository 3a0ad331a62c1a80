//! Financial sub-assessments of the risk engine.
//!
//! Every function scores one aspect of the annual reports on a 0-10 scale and
//! never fails: missing figures yield the neutral score 5 with an
//! "insufficient data" detail.

use crate::models::{FinancialHistory, FinancialRecord};

/// Neutral score used whenever the figures needed are missing.
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Number of most recent reports used for multi-year signals.
pub const HISTORY_YEARS: usize = 3;

/// Score, explanation and warnings produced by one assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub score: f64,
    pub details: String,
    pub warnings: Vec<String>,
    /// False when the score is the neutral prior for missing figures.
    pub has_data: bool,
}

impl Assessment {
    pub fn new(score: f64, details: impl Into<String>) -> Self {
        Self {
            score: score.clamp(0.0, 10.0),
            details: details.into(),
            warnings: Vec::new(),
            has_data: true,
        }
    }

    pub fn insufficient(what: &str) -> Self {
        Self {
            has_data: false,
            ..Self::new(NEUTRAL_SCORE, format!("Insufficient data: {}", what))
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Annual reports ordered newest first.
#[derive(Debug, Clone, Default)]
pub struct FinancialSnapshot<'a> {
    reports: Vec<&'a FinancialRecord>,
}

impl<'a> FinancialSnapshot<'a> {
    pub fn new(history: Option<&'a FinancialHistory>) -> Self {
        Self {
            reports: history.map(|h| h.newest_first()).unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn latest(&self) -> Option<&'a FinancialRecord> {
        self.reports.first().copied()
    }

    /// Up to `n` most recent values of a figure, newest first, skipping reports
    /// that do not state it.
    pub fn series<F>(&self, figure: F, n: usize) -> Vec<f64>
    where
        F: Fn(&FinancialRecord) -> Option<f64>,
    {
        self.reports
            .iter()
            .filter_map(|r| figure(r))
            .take(n)
            .collect()
    }

    /// Most recent stated value of a figure.
    pub fn latest_value<F>(&self, figure: F) -> Option<f64>
    where
        F: Fn(&FinancialRecord) -> Option<f64>,
    {
        self.latest_stating(figure).map(|(_, value)| value)
    }

    /// Most recent report stating a figure, with the value.
    pub fn latest_stating<F>(&self, figure: F) -> Option<(&'a FinancialRecord, f64)>
    where
        F: Fn(&FinancialRecord) -> Option<f64>,
    {
        self.reports
            .iter()
            .find_map(|r| figure(r).map(|value| (*r, value)))
    }

    /// How many reports in a row, newest first, satisfy `predicate`.
    pub fn consecutive<F, P>(&self, figure: F, predicate: P) -> usize
    where
        F: Fn(&FinancialRecord) -> Option<f64>,
        P: Fn(f64) -> bool,
    {
        self.reports
            .iter()
            .filter_map(|r| figure(r))
            .take_while(|v| predicate(*v))
            .count()
    }

    pub fn consecutive_losses(&self) -> usize {
        self.consecutive(|r| r.net_result, |v| v < 0.0)
    }

    pub fn consecutive_negative_equity(&self) -> usize {
        self.consecutive(|r| r.equity, |v| v < 0.0)
    }
}

fn dkk(amount: f64) -> String {
    if amount.abs() >= 1_000_000.0 {
        format!("{:.1}M DKK", amount / 1_000_000.0)
    } else if amount.abs() >= 1_000.0 {
        format!("{:.0}K DKK", amount / 1_000.0)
    } else {
        format!("{:.0} DKK", amount)
    }
}

// ============ Composite sub-factors ============

/// Equity health: level of the latest equity, consecutive negative years and the
/// decline over the last three reports.
pub fn assess_equity_health(snapshot: &FinancialSnapshot) -> Assessment {
    let equity = snapshot.series(|r| r.equity, HISTORY_YEARS);
    let Some(&latest) = equity.first() else {
        return Assessment::insufficient("no equity figures reported");
    };

    if latest < 0.0 {
        let negative_years = snapshot.consecutive_negative_equity();
        if negative_years >= 2 {
            return Assessment::new(
                0.0,
                format!(
                    "Negative equity ({}) for {} consecutive years",
                    dkk(latest),
                    negative_years
                ),
            )
            .with_warning(format!(
                "Equity has been negative for {} consecutive years",
                negative_years
            ));
        }
        return Assessment::new(1.0, format!("Negative equity ({})", dkk(latest)));
    }

    let mut score: f64 = if latest >= 5_000_000.0 {
        10.0
    } else if latest >= 1_000_000.0 {
        9.0
    } else if latest >= 500_000.0 {
        8.0
    } else if latest >= 200_000.0 {
        7.0
    } else if latest >= 80_000.0 {
        5.0
    } else {
        3.0
    };
    let mut details = format!("Equity {}", dkk(latest));

    if let Some(&oldest) = equity.last().filter(|_| equity.len() >= 2) {
        if oldest > 0.0 {
            let decline = (oldest - latest) / oldest;
            if decline >= 0.30 {
                score = score.min(3.0);
                details.push_str(&format!(", down {:.0}% over {} years", decline * 100.0, equity.len()));
            } else if decline >= 0.15 {
                score = score.min(5.0);
                details.push_str(&format!(", down {:.0}% over {} years", decline * 100.0, equity.len()));
            }
        }
    }

    Assessment::new(score, details)
}

/// Profitability: consecutive loss years first, then the size of the latest profit.
pub fn assess_profitability(snapshot: &FinancialSnapshot) -> Assessment {
    let Some(latest) = snapshot.latest_value(|r| r.net_result) else {
        return Assessment::insufficient("no net result reported");
    };

    let losses = snapshot.consecutive_losses();
    if losses >= 3 {
        return Assessment::new(1.0, format!("Losses in {} consecutive years", losses))
            .with_warning(format!(
                "CRITICAL: losses in {} consecutive years",
                losses
            ));
    }
    if losses == 2 {
        return Assessment::new(2.0, "Losses in the last 2 years");
    }
    if losses == 1 {
        return Assessment::new(4.0, format!("Loss in latest year ({})", dkk(latest)));
    }

    let (score, label) = if latest < 100_000.0 {
        (5.0, "Break-even result")
    } else if latest >= 1_000_000.0 {
        (10.0, "Strong profit")
    } else if latest >= 500_000.0 {
        (9.0, "Good profit")
    } else if latest >= 200_000.0 {
        (7.0, "Moderate profit")
    } else {
        (6.0, "Small profit")
    };
    Assessment::new(score, format!("{} ({})", label, dkk(latest)))
}

fn current_ratio_score(ratio: f64) -> f64 {
    if ratio >= 2.0 {
        10.0
    } else if ratio >= 1.5 {
        8.0
    } else if ratio >= 1.0 {
        6.0
    } else if ratio >= 0.75 {
        4.0
    } else {
        2.0
    }
}

fn equity_ratio_score(percent: f64) -> f64 {
    if percent >= 40.0 {
        10.0
    } else if percent >= 25.0 {
        8.0
    } else if percent >= 15.0 {
        6.0
    } else if percent >= 5.0 {
        4.0
    } else if percent >= 0.0 {
        2.0
    } else {
        0.0
    }
}

/// Liquidity and solvency: current ratio and equity ratio of the latest report.
pub fn assess_liquidity(snapshot: &FinancialSnapshot) -> Assessment {
    let Some(latest) = snapshot.latest() else {
        return Assessment::insufficient("no annual reports");
    };

    let mut scores = Vec::new();
    let mut parts = Vec::new();
    if let Some(ratio) = latest.current_ratio() {
        scores.push(current_ratio_score(ratio));
        parts.push(format!("current ratio {:.2}", ratio));
    }
    if let Some(percent) = latest.equity_ratio_percent() {
        scores.push(equity_ratio_score(percent));
        parts.push(format!("equity ratio {:.1}%", percent));
    }

    if scores.is_empty() {
        return Assessment::insufficient("no liquidity or solvency ratios");
    }
    let score = scores.iter().sum::<f64>() / scores.len() as f64;
    Assessment::new(score, capitalize(&parts.join(", ")))
}

/// Revenue development between the two latest reports.
pub fn assess_revenue(snapshot: &FinancialSnapshot) -> Assessment {
    let revenue = snapshot.series(|r| r.revenue, 2);
    match revenue.as_slice() {
        [] => Assessment::insufficient("no revenue reported"),
        [only] => Assessment::insufficient(&format!(
            "revenue {} has no prior year to compare",
            dkk(*only)
        )),
        [latest, previous, ..] => {
            if *previous <= 0.0 {
                let score = if *latest > 0.0 { 7.0 } else { NEUTRAL_SCORE };
                return Assessment::new(score, format!("Revenue {}", dkk(*latest)));
            }
            let growth = (latest - previous) / previous;
            let score = if growth >= 0.10 {
                9.0
            } else if growth >= 0.0 {
                7.0
            } else if growth >= -0.10 {
                5.0
            } else if growth >= -0.25 {
                3.0
            } else {
                2.0
            };
            Assessment::new(
                score,
                format!("Revenue {} ({:+.0}% year over year)", dkk(*latest), growth * 100.0),
            )
        }
    }
}

/// Operating performance: gross margin of the latest report.
pub fn assess_operating(snapshot: &FinancialSnapshot) -> Assessment {
    let Some(latest) = snapshot.latest() else {
        return Assessment::insufficient("no annual reports");
    };
    let Some(gross_profit) = latest.gross_profit else {
        return Assessment::insufficient("no gross profit reported");
    };

    match latest.revenue.filter(|r| *r > 0.0) {
        Some(revenue) => {
            let margin = gross_profit / revenue;
            let score = if margin >= 0.40 {
                9.0
            } else if margin >= 0.20 {
                7.0
            } else if margin >= 0.10 {
                5.0
            } else if margin >= 0.0 {
                4.0
            } else {
                2.0
            };
            Assessment::new(score, format!("Gross margin {:.1}%", margin * 100.0))
        }
        None if gross_profit > 0.0 => {
            Assessment::new(6.0, format!("Positive gross profit ({})", dkk(gross_profit)))
        }
        None => Assessment::new(2.0, format!("Negative gross profit ({})", dkk(gross_profit))),
    }
}

/// Internal weights of the financial composite.
pub const EQUITY_WEIGHT: f64 = 0.35;
pub const PROFITABILITY_WEIGHT: f64 = 0.25;
pub const LIQUIDITY_WEIGHT: f64 = 0.20;
pub const REVENUE_WEIGHT: f64 = 0.10;
pub const OPERATING_WEIGHT: f64 = 0.10;

/// Weighted blend of the five financial sub-factors.
///
/// Sub-factors without figures drop out and the remaining weights are
/// renormalized, so a missing liquidity ratio neither helps nor hurts a company
/// whose equity and profit are known. With no usable figure at all the
/// composite is the neutral prior.
pub fn assess_financial(snapshot: &FinancialSnapshot) -> Assessment {
    if snapshot.is_empty() {
        return Assessment::insufficient("no annual reports available");
    }

    let parts = [
        (EQUITY_WEIGHT, assess_equity_health(snapshot)),
        (PROFITABILITY_WEIGHT, assess_profitability(snapshot)),
        (LIQUIDITY_WEIGHT, assess_liquidity(snapshot)),
        (REVENUE_WEIGHT, assess_revenue(snapshot)),
        (OPERATING_WEIGHT, assess_operating(snapshot)),
    ];

    let (weighted, weight) = parts
        .iter()
        .filter(|(_, a)| a.has_data)
        .fold((0.0, 0.0), |(sum, total), (w, a)| (sum + w * a.score, total + w));
    if weight == 0.0 {
        return Assessment::insufficient("no usable figures in the annual reports");
    }

    let details = parts
        .iter()
        .map(|(_, a)| a.details.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    let warnings = parts
        .iter()
        .flat_map(|(_, a)| a.warnings.iter().cloned())
        .collect();

    Assessment {
        score: (weighted / weight).clamp(0.0, 10.0),
        details,
        warnings,
        has_data: true,
    }
}

// ============ Stand-alone financial factors ============

/// Largest relative spread of a positive series still read as steady.
const STEADY_SPREAD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Declining,
    Improving,
    Steady,
    Mixed,
}

/// Direction of a newest-first series. Positive values that stay within
/// `STEADY_SPREAD` of each other are steady, otherwise the series must be
/// strictly falling or rising over time.
fn direction(series: &[f64]) -> Direction {
    let max = series.iter().copied().fold(f64::MIN, f64::max);
    let min = series.iter().copied().fold(f64::MAX, f64::min);
    if min > 0.0 && (max - min) <= max * STEADY_SPREAD {
        Direction::Steady
    } else if series.windows(2).all(|w| w[0] < w[1]) {
        Direction::Declining
    } else if series.windows(2).all(|w| w[0] > w[1]) {
        Direction::Improving
    } else {
        Direction::Mixed
    }
}

/// Multi-year trends of equity, net result and revenue over the last three reports.
pub fn assess_trends(snapshot: &FinancialSnapshot) -> Assessment {
    let metrics: [(&str, Vec<f64>); 3] = [
        ("equity", snapshot.series(|r| r.equity, HISTORY_YEARS)),
        ("profit", snapshot.series(|r| r.net_result, HISTORY_YEARS)),
        ("revenue", snapshot.series(|r| r.revenue, HISTORY_YEARS)),
    ];

    let mut declining = Vec::new();
    let mut improving = Vec::new();
    let mut steady = Vec::new();
    let mut judged = 0;
    for (name, series) in &metrics {
        if series.len() < 2 {
            continue;
        }
        judged += 1;
        match direction(series) {
            Direction::Declining => declining.push(*name),
            Direction::Improving => improving.push(*name),
            Direction::Steady => steady.push(*name),
            Direction::Mixed => {}
        }
    }

    if judged == 0 {
        return Assessment::insufficient("fewer than two annual reports");
    }

    let score = match (declining.len(), improving.len(), steady.len()) {
        (d, _, _) if d >= 3 => 1.0,
        (2, _, _) => 3.0,
        (1, i, _) if i >= 1 => 5.0,
        (1, _, _) => 4.0,
        (_, i, _) if i >= 2 => 9.0,
        (_, i, s) if i + s >= 2 => 8.0,
        (_, 1, _) => 7.0,
        _ => 6.0,
    };

    let mut details = Vec::new();
    if !declining.is_empty() {
        details.push(format!("declining {}", declining.join(", ")));
    }
    if !improving.is_empty() {
        details.push(format!("improving {}", improving.join(", ")));
    }
    if !steady.is_empty() {
        details.push(format!("steady {}", steady.join(", ")));
    }
    if details.is_empty() {
        details.push("no clear trend".to_string());
    }

    let assessment = Assessment::new(score, capitalize(&details.join("; ")));
    if declining.len() >= 2 {
        assessment.with_warning(format!("Declining {} over recent years", declining.join(" and ")))
    } else {
        assessment
    }
}

/// Cash flow: liquid assets against short-term debt in the latest report.
pub fn assess_cash_flow(snapshot: &FinancialSnapshot) -> Assessment {
    let Some(latest) = snapshot.latest() else {
        return Assessment::insufficient("no annual reports");
    };
    let Some(cash) = latest.cash else {
        return Assessment::insufficient("no liquid assets reported");
    };
    let Some(short_term_debt) = latest.short_term_debt else {
        return Assessment::insufficient("no short-term debt reported");
    };

    if short_term_debt <= 0.0 {
        let score = if cash > 0.0 { 10.0 } else { NEUTRAL_SCORE };
        return Assessment::new(score, format!("No short-term debt, liquid assets {}", dkk(cash)));
    }

    let ratio = cash / short_term_debt;
    let score = if ratio >= 1.0 {
        10.0
    } else if ratio >= 0.5 {
        8.0
    } else if ratio >= 0.25 {
        6.0
    } else if ratio >= 0.1 {
        4.0
    } else {
        2.0
    };
    Assessment::new(score, format!("Liquid assets cover {:.0}% of short-term debt", ratio * 100.0))
}

/// Debt structure: debt-to-assets and debt-to-equity of the latest report.
pub fn assess_debt_structure(snapshot: &FinancialSnapshot) -> Assessment {
    let Some(latest) = snapshot.latest() else {
        return Assessment::insufficient("no annual reports");
    };
    let Some(debt) = latest.total_debt() else {
        return Assessment::insufficient("no debt figures reported");
    };

    if let Some(equity) = latest.equity {
        if equity <= 0.0 && debt > 0.0 {
            return Assessment::new(
                0.0,
                format!("Insolvent: debt {} against equity {}", dkk(debt), dkk(equity)),
            )
            .with_warning("Liabilities exceed assets");
        }
    }

    let mut scores = Vec::new();
    let mut parts = Vec::new();
    if let Some(assets) = latest.total_assets.filter(|a| *a > 0.0) {
        let ratio = debt / assets;
        scores.push(if ratio <= 0.4 {
            10.0
        } else if ratio <= 0.6 {
            8.0
        } else if ratio <= 0.75 {
            6.0
        } else if ratio <= 0.9 {
            4.0
        } else {
            2.0
        });
        parts.push(format!("debt/assets {:.2}", ratio));
    }
    if let Some(equity) = latest.equity.filter(|e| *e > 0.0) {
        let ratio = debt / equity;
        scores.push(if ratio <= 1.0 {
            10.0
        } else if ratio <= 2.0 {
            8.0
        } else if ratio <= 3.0 {
            6.0
        } else if ratio <= 5.0 {
            4.0
        } else {
            2.0
        });
        parts.push(format!("debt/equity {:.2}", ratio));
    }

    if scores.is_empty() {
        return Assessment::insufficient("no assets or equity to compare debt against");
    }
    let score = scores.iter().sum::<f64>() / scores.len() as f64;
    Assessment::new(score, capitalize(&parts.join(", ")))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(year: i32) -> FinancialRecord {
        FinancialRecord {
            year: Some(year),
            ..Default::default()
        }
    }

    fn history(records: Vec<FinancialRecord>) -> FinancialHistory {
        FinancialHistory::new(records)
    }

    fn with_equity(values: &[(i32, f64)]) -> FinancialHistory {
        history(
            values
                .iter()
                .map(|(year, equity)| FinancialRecord {
                    equity: Some(*equity),
                    ..report(*year)
                })
                .collect(),
        )
    }

    #[test]
    fn test_missing_history_is_neutral_everywhere() {
        let snapshot = FinancialSnapshot::new(None);
        for assessment in [
            assess_financial(&snapshot),
            assess_equity_health(&snapshot),
            assess_profitability(&snapshot),
            assess_liquidity(&snapshot),
            assess_revenue(&snapshot),
            assess_operating(&snapshot),
            assess_trends(&snapshot),
            assess_cash_flow(&snapshot),
            assess_debt_structure(&snapshot),
        ] {
            assert_eq!(assessment.score, NEUTRAL_SCORE);
            assert!(assessment.details.starts_with("Insufficient data"));
        }
    }

    #[test]
    fn test_equity_thresholds() {
        let cases = [
            (6_000_000.0, 10.0),
            (1_000_000.0, 9.0),
            (600_000.0, 8.0),
            (250_000.0, 7.0),
            (80_000.0, 5.0),
            (10_000.0, 3.0),
        ];
        for (equity, expected) in cases {
            let h = with_equity(&[(2023, equity)]);
            assert_eq!(
                assess_equity_health(&FinancialSnapshot::new(Some(&h))).score,
                expected,
                "equity {}",
                equity
            );
        }
    }

    #[test]
    fn test_equity_decline_caps_score() {
        // Unordered input must be sorted before the decline is measured.
        let h = with_equity(&[(2023, 6_000_000.0), (2021, 10_000_000.0), (2022, 8_000_000.0)]);
        let a = assess_equity_health(&FinancialSnapshot::new(Some(&h)));
        assert_eq!(a.score, 3.0);

        let h = with_equity(&[(2021, 10_000_000.0), (2023, 8_000_000.0)]);
        assert_eq!(assess_equity_health(&FinancialSnapshot::new(Some(&h))).score, 5.0);
    }

    #[test]
    fn test_negative_equity_scores() {
        let h = with_equity(&[(2023, -10_000.0), (2022, 50_000.0)]);
        let a = assess_equity_health(&FinancialSnapshot::new(Some(&h)));
        assert_eq!(a.score, 1.0);
        assert!(a.warnings.is_empty());

        let h = with_equity(&[(2023, -10_000.0), (2022, -5_000.0)]);
        let a = assess_equity_health(&FinancialSnapshot::new(Some(&h)));
        assert_eq!(a.score, 0.0);
        assert_eq!(a.warnings.len(), 1);
    }

    #[test]
    fn test_profitability_loss_streaks() {
        let results = |values: &[f64]| {
            history(
                values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| FinancialRecord {
                        net_result: Some(*v),
                        ..report(2023 - i as i32)
                    })
                    .collect(),
            )
        };

        let h = results(&[-1.0, -1.0, -1.0, 5.0]);
        let a = assess_profitability(&FinancialSnapshot::new(Some(&h)));
        assert_eq!(a.score, 1.0);
        assert!(a.warnings[0].starts_with("CRITICAL"));

        let h = results(&[-1.0, -1.0, 5.0]);
        assert_eq!(assess_profitability(&FinancialSnapshot::new(Some(&h))).score, 2.0);

        let h = results(&[-1.0, 5.0]);
        assert_eq!(assess_profitability(&FinancialSnapshot::new(Some(&h))).score, 4.0);

        let h = results(&[50_000.0]);
        assert_eq!(assess_profitability(&FinancialSnapshot::new(Some(&h))).score, 5.0);

        let h = results(&[1_500_000.0, -1.0]);
        assert_eq!(assess_profitability(&FinancialSnapshot::new(Some(&h))).score, 10.0);

        let h = results(&[250_000.0]);
        assert_eq!(assess_profitability(&FinancialSnapshot::new(Some(&h))).score, 7.0);
    }

    #[test]
    fn test_trends_count_declines() {
        let h = history(vec![
            FinancialRecord {
                equity: Some(100.0),
                net_result: Some(10.0),
                revenue: Some(1000.0),
                ..report(2023)
            },
            FinancialRecord {
                equity: Some(200.0),
                net_result: Some(20.0),
                revenue: Some(2000.0),
                ..report(2022)
            },
            FinancialRecord {
                equity: Some(300.0),
                net_result: Some(30.0),
                revenue: Some(3000.0),
                ..report(2021)
            },
        ]);
        let a = assess_trends(&FinancialSnapshot::new(Some(&h)));
        assert_eq!(a.score, 1.0);
        assert_eq!(a.warnings.len(), 1);
    }

    #[test]
    fn test_trends_improving() {
        let h = history(vec![
            FinancialRecord {
                equity: Some(300.0),
                revenue: Some(3000.0),
                ..report(2023)
            },
            FinancialRecord {
                equity: Some(200.0),
                revenue: Some(2000.0),
                ..report(2022)
            },
        ]);
        assert_eq!(assess_trends(&FinancialSnapshot::new(Some(&h))).score, 9.0);
    }

    #[test]
    fn test_trends_steady_equity_and_profit() {
        let h = history(
            (2021..=2023)
                .map(|year| FinancialRecord {
                    equity: Some(6_000_000.0),
                    net_result: Some(1_500_000.0),
                    ..report(year)
                })
                .collect(),
        );
        let a = assess_trends(&FinancialSnapshot::new(Some(&h)));
        assert_eq!(a.score, 8.0);
        assert_eq!(a.details, "Steady equity, profit");
        assert!(a.warnings.is_empty());
    }

    #[test]
    fn test_trends_steady_needs_positive_values() {
        let h = history(vec![
            FinancialRecord {
                equity: Some(-10_000.0),
                net_result: Some(-10_000.0),
                ..report(2023)
            },
            FinancialRecord {
                equity: Some(-10_000.0),
                net_result: Some(-10_000.0),
                ..report(2022)
            },
        ]);
        assert_eq!(assess_trends(&FinancialSnapshot::new(Some(&h))).score, 6.0);
    }

    #[test]
    fn test_composite_renormalizes_over_known_sub_factors() {
        let h = history(vec![FinancialRecord {
            equity: Some(6_000_000.0),
            net_result: Some(1_500_000.0),
            ..report(2023)
        }]);
        let a = assess_financial(&FinancialSnapshot::new(Some(&h)));
        assert_eq!(a.score, 10.0);
        assert!(a.has_data);
        assert!(a.details.contains("Insufficient data: no liquidity or solvency ratios"));

        let h = history(vec![FinancialRecord {
            equity: Some(6_000_000.0),
            net_result: Some(-10_000.0),
            ..report(2023)
        }]);
        let a = assess_financial(&FinancialSnapshot::new(Some(&h)));
        // equity 10 at 0.35, loss year 4 at 0.25
        assert!((a.score - (0.35 * 10.0 + 0.25 * 4.0) / 0.60).abs() < 1e-9);
    }

    #[test]
    fn test_composite_without_figures_is_neutral() {
        let h = history(vec![report(2023)]);
        let a = assess_financial(&FinancialSnapshot::new(Some(&h)));
        assert_eq!(a.score, NEUTRAL_SCORE);
        assert!(!a.has_data);
    }

    #[test]
    fn test_cash_flow_ratio() {
        let h = history(vec![FinancialRecord {
            cash: Some(30_000.0),
            short_term_debt: Some(100_000.0),
            ..report(2023)
        }]);
        assert_eq!(assess_cash_flow(&FinancialSnapshot::new(Some(&h))).score, 6.0);
    }

    #[test]
    fn test_debt_structure_insolvency_floor() {
        let h = history(vec![FinancialRecord {
            equity: Some(-1.0),
            short_term_debt: Some(500_000.0),
            total_assets: Some(499_999.0),
            ..report(2023)
        }]);
        let a = assess_debt_structure(&FinancialSnapshot::new(Some(&h)));
        assert_eq!(a.score, 0.0);
        assert_eq!(a.warnings, vec!["Liabilities exceed assets".to_string()]);
    }

    #[test]
    fn test_debt_structure_healthy() {
        let h = history(vec![FinancialRecord {
            equity: Some(6_000_000.0),
            short_term_debt: Some(1_000_000.0),
            long_term_debt: Some(1_000_000.0),
            total_assets: Some(8_000_000.0),
            ..report(2023)
        }]);
        assert_eq!(assess_debt_structure(&FinancialSnapshot::new(Some(&h))).score, 10.0);
    }

    #[test]
    fn test_revenue_and_operating() {
        let h = history(vec![
            FinancialRecord {
                revenue: Some(1_200_000.0),
                gross_profit: Some(600_000.0),
                ..report(2023)
            },
            FinancialRecord {
                revenue: Some(1_000_000.0),
                ..report(2022)
            },
        ]);
        let snapshot = FinancialSnapshot::new(Some(&h));
        assert_eq!(assess_revenue(&snapshot).score, 9.0);
        assert_eq!(assess_operating(&snapshot).score, 9.0);
    }

    #[test]
    fn test_composite_weights_sum_to_one() {
        let total = EQUITY_WEIGHT + PROFITABILITY_WEIGHT + LIQUIDITY_WEIGHT + REVENUE_WEIGHT + OPERATING_WEIGHT;
        assert!((total - 1.0).abs() < 1e-9);
    }
}

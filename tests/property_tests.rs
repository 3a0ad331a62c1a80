/// Property-based tests using proptest
/// Tests invariants and properties that should hold for all inputs
use chrono::NaiveDate;
use cvr_intel_api::models::{CompanyRecord, FinancialHistory, FinancialRecord, NameEntry, StatusEntry};
use cvr_intel_api::query_builder::{
    boost_invariant_holds, strip_legal_form, tier_accumulation, NameQuery, QueryPlan, SearchQuery,
    SearchTier, COMPANY_TIERS, PERSON_TIERS,
};
use cvr_intel_api::ranking::score_record;
use cvr_intel_api::risk::{assess_risk, CriticalFlag, RiskLevel};
use cvr_intel_api::summary::{is_valid_email, normalize_dk_phone};
use cvr_intel_api::versioned::{current_or_latest, Period};
use proptest::prelude::*;

const SUFFIXES: &[&str] = &["A/S", "ApS", "I/S", "P/S", "K/S", "AMBA", "SMBA", "aps", "a/s"];

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn date(offset_days: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + chrono::Duration::days(offset_days)
}

fn named(name: &str) -> CompanyRecord {
    CompanyRecord {
        names: vec![NameEntry {
            name: name.to_string(),
            period: Period::new(Some(date(0)), None),
        }],
        ..Default::default()
    }
}

fn with_status(status: &str) -> CompanyRecord {
    CompanyRecord {
        statuses: vec![StatusEntry {
            status: status.to_string(),
            period: Period::new(Some(date(0)), None),
        }],
        ..named("TEST ApS")
    }
}

fn base_name() -> impl Strategy<Value = String> {
    prop::collection::vec("[A-Z][a-z]{3,8}", 1..=3).prop_map(|words| words.join(" "))
}

fn report(year: i32, equity: f64, result: f64) -> FinancialRecord {
    FinancialRecord {
        year: Some(year),
        equity: Some(equity),
        net_result: Some(result),
        ..Default::default()
    }
}

#[test]
fn tier_tables_keep_the_boost_invariant() {
    assert!(boost_invariant_holds(COMPANY_TIERS));
    assert!(boost_invariant_holds(PERSON_TIERS));
}

// Property: every planned block outranks everything the next tier can add
proptest! {
    #[test]
    fn planned_blocks_outrank_next_tier(base in base_name(), suffix in prop::sample::select(SUFFIXES)) {
        let query = NameQuery::new(&format!("{} {}", base, suffix));
        let plan = QueryPlan::build(SearchQuery::CompanyName(query), 10, today());

        let mut tiers: Vec<SearchTier> = plan.blocks.iter().map(|b| b.tier).collect();
        tiers.dedup();
        for pair in tiers.windows(2) {
            let weakest_higher = plan
                .blocks
                .iter()
                .filter(|b| b.tier == pair[0])
                .map(|b| b.boost)
                .fold(f64::INFINITY, f64::min);
            let next_total: f64 = plan
                .blocks
                .iter()
                .filter(|b| b.tier == pair[1])
                .map(|b| b.boost)
                .sum();
            prop_assert!(weakest_higher > next_total);
            prop_assert!(next_total <= tier_accumulation(COMPANY_TIERS, pair[1]));
        }
    }
}

// Property: legal-form suffixes do not change which tier-0 clause fires
proptest! {
    #[test]
    fn suffix_swap_keeps_exact_tier(
        base in base_name(),
        first in prop::sample::select(SUFFIXES),
        second in prop::sample::select(SUFFIXES),
    ) {
        prop_assume!(strip_legal_form(&base) == base);

        let a = NameQuery::new(&format!("{} {}", base, first));
        let b = NameQuery::new(&format!("{} {}", base, second));
        prop_assert_eq!(&a.cleaned, &base);
        prop_assert_eq!(&b.cleaned, &base);

        let record = named(&base.to_uppercase());
        let plan_a = QueryPlan::build(SearchQuery::CompanyName(a), 10, today());
        let plan_b = QueryPlan::build(SearchQuery::CompanyName(b), 10, today());
        let (score_a, tier_a) = score_record(&plan_a.query, &plan_a.blocks, &record, today());
        let (score_b, tier_b) = score_record(&plan_b.query, &plan_b.blocks, &record, today());

        prop_assert_eq!(tier_a, Some(SearchTier::ExactName));
        prop_assert_eq!(tier_b, Some(SearchTier::ExactName));
        prop_assert_eq!(score_a, score_b);
    }

    #[test]
    fn stripping_never_yields_empty(raw in "\\PC{0,40}") {
        let cleaned = strip_legal_form(&raw);
        if !raw.trim().is_empty() {
            prop_assert!(!cleaned.is_empty());
        }
    }
}

// Property: current-or-latest picks the open entry, else the last one
proptest! {
    #[test]
    fn current_or_latest_selects_open_or_last(
        len in 1usize..8,
        open in prop::option::of(0usize..8),
    ) {
        let open = open.filter(|i| *i < len);
        let entries: Vec<NameEntry> = (0..len)
            .map(|i| NameEntry {
                name: format!("name-{}", i),
                period: Period::new(
                    Some(date(i as i64 * 100)),
                    if Some(i) == open { None } else { Some(date(i as i64 * 100 + 99)) },
                ),
            })
            .collect();

        let selected = current_or_latest(&entries).unwrap();
        let expected = open.unwrap_or(len - 1);
        prop_assert_eq!(&selected.name, &format!("name-{}", expected));
    }
}

// Property: risk engine overrides
proptest! {
    #[test]
    fn dissolved_companies_always_score_zero(
        status in prop::sample::select(vec!["OPLØST EFTER KONKURS", "TVANGSOPLØST", "UNDER KONKURS", "Ophørt", "OPLØST EFTER FUSION"]),
        equity in -10_000_000.0f64..50_000_000.0,
        result in -5_000_000.0f64..5_000_000.0,
    ) {
        let history = FinancialHistory::new(vec![report(2023, equity, result)]);
        let score = assess_risk(&with_status(status), Some(&history), today());
        prop_assert_eq!(score.total_score, 0.0);
        prop_assert_eq!(score.risk_level, RiskLevel::Extreme);
    }

    #[test]
    fn two_negative_years_with_a_loss_cap_at_two(
        latest_equity in -500_000.0f64..-1.0,
        previous_equity in -2_000_000.0f64..-1.0,
        loss in -3_000_000.0f64..-1.0,
        previous_result in -1_000_000.0f64..1_000_000.0,
        revenue in 0.0f64..100_000_000.0,
    ) {
        let mut latest = report(2023, latest_equity, loss);
        latest.revenue = Some(revenue);
        let history = FinancialHistory::new(vec![
            report(2022, previous_equity, previous_result),
            latest,
        ]);
        let score = assess_risk(&with_status("NORMAL"), Some(&history), today());
        prop_assert!(score.total_score <= 2.0);
        prop_assert!(score.critical_flags.contains(&CriticalFlag::NegativeEquityAndLoss));
    }

    #[test]
    fn total_score_stays_in_range(
        equity in -2_000_000.0f64..20_000_000.0,
        result in -2_000_000.0f64..5_000_000.0,
        years in 1usize..5,
    ) {
        let reports = (0..years)
            .map(|i| report(2023 - i as i32, equity * (1.0 + i as f64 / 10.0), result))
            .collect();
        let score = assess_risk(&with_status("NORMAL"), Some(&FinancialHistory::new(reports)), today());
        prop_assert!((0.0..=10.0).contains(&score.total_score));
        prop_assert_eq!(score.risk_level, RiskLevel::from_score(score.total_score));
    }
}

// Property: contact normalization never panics
proptest! {
    #[test]
    fn email_validation_never_panics(email in "\\PC*") {
        let _ = is_valid_email(&email);
    }

    #[test]
    fn danish_numbers_normalize_to_e164(number in 20_000_000u32..=99_999_999u32) {
        if let Some(normalized) = normalize_dk_phone(&number.to_string()) {
            prop_assert!(normalized.starts_with("+45"));
            prop_assert_eq!(normalized.len(), 11);
        }
    }
}

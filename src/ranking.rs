//! Local ranking of registry hits.
//!
//! The planned tier blocks are evaluated in memory against each returned record
//! with the same additive semantics the index applies (`constant_score` per
//! block, boosts summed). Person searches score every active participant
//! relation on its own and keep the best one, like the nested query's
//! `score_mode: max`. Hits are then ordered by:
//!
//! 1. local tier score, descending
//! 2. index `_score`, descending
//! 3. operating companies before dissolved ones
//! 4. shorter current name
//! 5. CVR number, ascending

use crate::models::CompanyRecord;
use crate::query_builder::{
    tokenize, FieldGroup, MatchKind, PlannedBlock, PlannedClause, QueryPlan, SearchQuery,
    SearchTier,
};
use crate::status::CompanyStatus;
use chrono::NaiveDate;
use serde_json::Value;
use std::cmp::Ordering;

/// One hit returned by the registry index.
#[derive(Debug, Clone)]
pub struct RegistryHit {
    pub id: String,
    pub engine_score: Option<f64>,
    pub source: Value,
    pub record: CompanyRecord,
}

/// A hit with its local relevance.
#[derive(Debug, Clone)]
pub struct RankedHit {
    pub hit: RegistryHit,
    pub relevance: f64,
    pub best_tier: Option<SearchTier>,
}

/// Name values of a record, split the way the index fields are.
#[derive(Debug, Default)]
struct NameValues<'a> {
    primary: Vec<&'a str>,
    secondary: Vec<&'a str>,
}

impl<'a> NameValues<'a> {
    fn company(record: &'a CompanyRecord) -> Self {
        Self {
            primary: record.all_names(),
            secondary: record.all_secondary_names(),
        }
    }

    fn participant(names: Vec<&'a str>) -> Self {
        Self {
            primary: names,
            secondary: Vec::new(),
        }
    }

    fn group(&self, group: FieldGroup) -> Vec<&'a str> {
        match group {
            FieldGroup::Primary => self.primary.clone(),
            FieldGroup::Secondary => self.secondary.clone(),
            FieldGroup::Both => self
                .primary
                .iter()
                .chain(self.secondary.iter())
                .copied()
                .collect(),
        }
    }
}

/// Names of each participant relation holding at least one role on `today`,
/// one list per relation. A relation with no recorded membership periods
/// counts as active, as it does in the index.
fn active_participant_names(record: &CompanyRecord, today: NaiveDate) -> Vec<Vec<&str>> {
    record
        .participants
        .iter()
        .filter(|relation| {
            let periods: Vec<_> = relation
                .organisations
                .iter()
                .flat_map(|o| o.membership_periods())
                .collect();
            periods.is_empty() || periods.iter().any(|p| p.is_active_on(today))
        })
        .filter_map(|relation| relation.participant.as_ref())
        .map(|p| {
            p.names
                .iter()
                .map(|n| n.name.trim())
                .filter(|n| !n.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|names| !names.is_empty())
        .collect()
}

fn clause_matches(clause: &PlannedClause, names: &[&str]) -> bool {
    if names.is_empty() {
        return false;
    }
    let query_tokens = tokenize(&clause.text);
    if query_tokens.is_empty() {
        return false;
    }

    match clause.kind {
        MatchKind::ExactTerm => {
            let wanted = normalize(&clause.text);
            names.iter().any(|n| normalize(n) == wanted)
        }
        MatchKind::Phrase => names.iter().any(|n| {
            let tokens = tokenize(n);
            tokens
                .windows(query_tokens.len())
                .any(|window| window == query_tokens.as_slice())
        }),
        MatchKind::AllWords => {
            let all: Vec<String> = names.iter().flat_map(|n| tokenize(n)).collect();
            query_tokens.iter().all(|t| all.contains(t))
        }
        MatchKind::LeadingPrefix => names.iter().any(|n| {
            tokenize(n)
                .first()
                .is_some_and(|first| first.starts_with(query_tokens[0].as_str()))
        }),
        MatchKind::AnyWord => {
            let all: Vec<String> = names.iter().flat_map(|n| tokenize(n)).collect();
            query_tokens.iter().any(|t| all.contains(t))
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Sum of the boosts of every block that matches `record`, and the best tier hit.
pub fn score_record(
    query: &SearchQuery,
    blocks: &[PlannedBlock],
    record: &CompanyRecord,
    today: NaiveDate,
) -> (f64, Option<SearchTier>) {
    match query {
        SearchQuery::Cvr(_) => (0.0, None),
        SearchQuery::CompanyName(_) => score_names(blocks, &NameValues::company(record)),
        SearchQuery::PersonName(_) => active_participant_names(record, today)
            .into_iter()
            .map(|names| score_names(blocks, &NameValues::participant(names)))
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .unwrap_or((0.0, None)),
    }
}

fn score_names(blocks: &[PlannedBlock], names: &NameValues) -> (f64, Option<SearchTier>) {
    let mut total = 0.0;
    let mut best: Option<SearchTier> = None;

    for block in blocks {
        let matched = block
            .clauses
            .iter()
            .any(|c| clause_matches(c, &names.group(c.fields)));
        if matched {
            total += block.boost;
            best = Some(best.map_or(block.tier, |b| b.min(block.tier)));
        }
    }
    (total, best)
}

/// Scores and orders hits for `plan`.
pub fn rank_hits(plan: &QueryPlan, hits: Vec<RegistryHit>, today: NaiveDate) -> Vec<RankedHit> {
    let mut ranked: Vec<RankedHit> = hits
        .into_iter()
        .map(|hit| {
            let (relevance, best_tier) = score_record(&plan.query, &plan.blocks, &hit.record, today);
            RankedHit {
                hit,
                relevance,
                best_tier,
            }
        })
        .collect();

    ranked.sort_by(compare_ranked);

    if let Some(top) = ranked.first() {
        tracing::debug!(
            hits = ranked.len(),
            top_relevance = top.relevance,
            top_tier = ?top.best_tier,
            "Ranked registry hits"
        );
    }
    ranked
}

fn compare_ranked(a: &RankedHit, b: &RankedHit) -> Ordering {
    b.relevance
        .total_cmp(&a.relevance)
        .then_with(|| {
            let a_score = a.hit.engine_score.unwrap_or(0.0);
            let b_score = b.hit.engine_score.unwrap_or(0.0);
            b_score.total_cmp(&a_score)
        })
        .then_with(|| operating_rank(a).cmp(&operating_rank(b)))
        .then_with(|| name_len(a).cmp(&name_len(b)))
        .then_with(|| {
            let a_cvr = a.hit.record.cvr_number.unwrap_or(u64::MAX);
            let b_cvr = b.hit.record.cvr_number.unwrap_or(u64::MAX);
            a_cvr.cmp(&b_cvr)
        })
}

fn operating_rank(hit: &RankedHit) -> u8 {
    if CompanyStatus::classify(hit.hit.record.status_text()).is_operating() {
        0
    } else {
        1
    }
}

fn name_len(hit: &RankedHit) -> usize {
    hit.hit
        .record
        .current_name()
        .map(|n| n.chars().count())
        .unwrap_or(usize::MAX)
}

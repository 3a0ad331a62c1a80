//! Search query planning against the CVR registry index.
//!
//! A user query is classified as a CVR number, a company name or a person name.
//! CVR numbers become a single exact term filter. Names become a disjunction of
//! match tiers, from exact identity (tier 0) down to "any word matches" (tier 6).
//! Every tier is wrapped in `constant_score`, so a document collects each tier's
//! boost at most once and the final score is the plain sum of the tiers it matched.
//!
//! # Tier invariant
//!
//! `boost[n]` must exceed everything tier `n + 1` can contribute to one document
//! (`tier_accumulation`). Tier 0 contributes two blocks, the exact term block and
//! the phrase block at 1.1x. `boost_invariant_holds` checks this for a table.
//!
//! All tiers for a query kind are listed in one configuration table
//! (`COMPANY_TIERS`, `PERSON_TIERS`) and rendered by one builder.

use crate::errors::AppError;
use crate::models::SearchRequest;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::OnceLock;

/// Registry number field.
pub const CVR_FIELD: &str = "Vrvirksomhed.cvrNummer";
/// Nested path holding participant relations.
pub const PARTICIPANT_PATH: &str = "Vrvirksomhed.deltagerRelation";
/// End date of a participant's membership attribute values.
pub const MEMBERSHIP_VALID_TO_FIELD: &str =
    "Vrvirksomhed.deltagerRelation.organisationer.medlemsData.attributter.vaerdier.periode.gyldigTil";

const COMPANY_PRIMARY_FIELDS: &[&str] = &[
    "Vrvirksomhed.navne.navn",
    "Vrvirksomhed.virksomhedMetadata.nyesteNavn.navn",
];
const COMPANY_SECONDARY_FIELDS: &[&str] = &["Vrvirksomhed.binavne.navn"];
const PERSON_PRIMARY_FIELDS: &[&str] = &["Vrvirksomhed.deltagerRelation.deltager.navne.navn"];

/// Multiplier applied to the phrase block of tier 0.
pub const PHRASE_BOOST_FACTOR: f64 = 1.1;

// ============ Tiers ============

/// Match-confidence tier. Lower number means higher priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SearchTier {
    /// Whole name equals the query (cleaned or original).
    ExactName = 0,
    /// Cleaned query appears as a phrase in a primary or secondary name.
    NamePhrase = 1,
    /// Phrase in a primary name only.
    PrimaryPhrase = 2,
    /// Phrase in a secondary name only.
    SecondaryPhrase = 3,
    /// Every query word present, any order.
    AllWords = 4,
    /// First query word starts the name.
    LeadingPrefix = 5,
    /// At least one query word present.
    AnyWord = 6,
}

impl SearchTier {
    /// Base boost of the tier.
    pub fn boost(self) -> f64 {
        match self {
            SearchTier::ExactName => 50_000.0,
            SearchTier::NamePhrase => 15_000.0,
            SearchTier::PrimaryPhrase => 10_000.0,
            SearchTier::SecondaryPhrase => 9_000.0,
            SearchTier::AllWords => 8_000.0,
            SearchTier::LeadingPrefix => 7_000.0,
            SearchTier::AnyWord => 6_000.0,
        }
    }

    /// Stable name used for the `_name` of the tier's query blocks.
    pub fn label(self) -> &'static str {
        match self {
            SearchTier::ExactName => "tier0_exact",
            SearchTier::NamePhrase => "tier1_phrase",
            SearchTier::PrimaryPhrase => "tier2_primary_phrase",
            SearchTier::SecondaryPhrase => "tier3_secondary_phrase",
            SearchTier::AllWords => "tier4_all_words",
            SearchTier::LeadingPrefix => "tier5_prefix",
            SearchTier::AnyWord => "tier6_any_word",
        }
    }
}

impl fmt::Display for SearchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How a clause matches a name field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchKind {
    /// Full-string, case-insensitive equality on the keyword sub-field.
    ExactTerm,
    /// Words adjacent and in order.
    Phrase,
    /// Every word present, any order, across the field group.
    AllWords,
    /// First word is a prefix of the first token of the name.
    LeadingPrefix,
    /// Any word present.
    AnyWord,
}

/// Which name fields a clause targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldGroup {
    Primary,
    Secondary,
    Both,
}

/// Which form of the user's text a clause uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryText {
    Cleaned,
    CleanedAndOriginal,
}

/// One clause template of the configuration table.
#[derive(Debug, Clone, Copy)]
pub struct ClauseSpec {
    pub kind: MatchKind,
    pub fields: FieldGroup,
    pub text: QueryText,
}

/// One `constant_score` block: a set of clauses sharing a boost.
#[derive(Debug, Clone, Copy)]
pub struct BlockSpec {
    pub tier: SearchTier,
    pub boost_factor: f64,
    pub clauses: &'static [ClauseSpec],
}

impl BlockSpec {
    /// Whole-number boost; `50_000.0 * 1.1` is not exactly 55000 in f64.
    pub fn boost(&self) -> f64 {
        (self.tier.boost() * self.boost_factor).round()
    }
}

const fn clause(kind: MatchKind, fields: FieldGroup, text: QueryText) -> ClauseSpec {
    ClauseSpec { kind, fields, text }
}

/// Tier table for company-name searches.
pub const COMPANY_TIERS: &[BlockSpec] = &[
    BlockSpec {
        tier: SearchTier::ExactName,
        boost_factor: 1.0,
        clauses: &[clause(
            MatchKind::ExactTerm,
            FieldGroup::Both,
            QueryText::CleanedAndOriginal,
        )],
    },
    BlockSpec {
        tier: SearchTier::ExactName,
        boost_factor: PHRASE_BOOST_FACTOR,
        clauses: &[clause(
            MatchKind::Phrase,
            FieldGroup::Both,
            QueryText::CleanedAndOriginal,
        )],
    },
    BlockSpec {
        tier: SearchTier::NamePhrase,
        boost_factor: 1.0,
        clauses: &[clause(MatchKind::Phrase, FieldGroup::Both, QueryText::Cleaned)],
    },
    BlockSpec {
        tier: SearchTier::PrimaryPhrase,
        boost_factor: 1.0,
        clauses: &[clause(MatchKind::Phrase, FieldGroup::Primary, QueryText::Cleaned)],
    },
    BlockSpec {
        tier: SearchTier::SecondaryPhrase,
        boost_factor: 1.0,
        clauses: &[clause(MatchKind::Phrase, FieldGroup::Secondary, QueryText::Cleaned)],
    },
    BlockSpec {
        tier: SearchTier::AllWords,
        boost_factor: 1.0,
        clauses: &[clause(MatchKind::AllWords, FieldGroup::Both, QueryText::Cleaned)],
    },
    BlockSpec {
        tier: SearchTier::LeadingPrefix,
        boost_factor: 1.0,
        clauses: &[clause(MatchKind::LeadingPrefix, FieldGroup::Both, QueryText::Cleaned)],
    },
    BlockSpec {
        tier: SearchTier::AnyWord,
        boost_factor: 1.0,
        clauses: &[clause(MatchKind::AnyWord, FieldGroup::Both, QueryText::Cleaned)],
    },
];

/// Tier table for person-name searches, evaluated inside the participant relation.
/// Phrase matches outrank plain word matches.
pub const PERSON_TIERS: &[BlockSpec] = &[
    BlockSpec {
        tier: SearchTier::ExactName,
        boost_factor: 1.0,
        clauses: &[clause(MatchKind::ExactTerm, FieldGroup::Primary, QueryText::Cleaned)],
    },
    BlockSpec {
        tier: SearchTier::PrimaryPhrase,
        boost_factor: 1.0,
        clauses: &[clause(MatchKind::Phrase, FieldGroup::Primary, QueryText::Cleaned)],
    },
    BlockSpec {
        tier: SearchTier::AllWords,
        boost_factor: 1.0,
        clauses: &[clause(MatchKind::AllWords, FieldGroup::Primary, QueryText::Cleaned)],
    },
    BlockSpec {
        tier: SearchTier::AnyWord,
        boost_factor: 1.0,
        clauses: &[clause(MatchKind::AnyWord, FieldGroup::Primary, QueryText::Cleaned)],
    },
];

/// Most a single document can collect from `tier` under `table`.
pub fn tier_accumulation(table: &[BlockSpec], tier: SearchTier) -> f64 {
    table
        .iter()
        .filter(|b| b.tier == tier)
        .map(BlockSpec::boost)
        .sum()
}

/// True when every tier's base boost beats the accumulation of the next tier
/// present in the table.
pub fn boost_invariant_holds(table: &[BlockSpec]) -> bool {
    let mut tiers: Vec<SearchTier> = table.iter().map(|b| b.tier).collect();
    tiers.sort();
    tiers.dedup();

    tiers
        .windows(2)
        .all(|pair| pair[0].boost() > tier_accumulation(table, pair[1]))
}

// ============ Query classification ============

/// Company-name input in its two retained forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameQuery {
    /// Whitespace-normalized user input.
    pub original: String,
    /// `original` with a trailing legal-form suffix removed.
    pub cleaned: String,
}

impl NameQuery {
    pub fn new(raw: &str) -> Self {
        let original = normalize_whitespace(raw);
        let cleaned = strip_legal_form(&original);
        Self { original, cleaned }
    }

    fn texts(&self, which: QueryText) -> Vec<&str> {
        match which {
            QueryText::Cleaned => vec![self.cleaned.as_str()],
            QueryText::CleanedAndOriginal => {
                if self.cleaned.eq_ignore_ascii_case(&self.original) {
                    vec![self.cleaned.as_str()]
                } else {
                    vec![self.cleaned.as_str(), self.original.as_str()]
                }
            }
        }
    }
}

/// A classified user query. CVR takes priority over names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Cvr(u64),
    CompanyName(NameQuery),
    PersonName(NameQuery),
}

impl SearchQuery {
    /// Classifies a request, failing before any I/O on unusable input.
    pub fn classify(request: &SearchRequest) -> Result<Self, AppError> {
        if let Some(cvr) = present(&request.cvr) {
            return parse_cvr(cvr).map(SearchQuery::Cvr);
        }
        if let Some(name) = present(&request.company_name) {
            return Ok(SearchQuery::CompanyName(NameQuery::new(name)));
        }
        if let Some(name) = present(&request.person_name) {
            // Person names carry no legal form; keep both forms identical.
            let original = normalize_whitespace(name);
            return Ok(SearchQuery::PersonName(NameQuery {
                cleaned: original.clone(),
                original,
            }));
        }
        Err(AppError::InvalidInput(
            "One of cvr, companyName or personName is required".to_string(),
        ))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SearchQuery::Cvr(_) => "cvr",
            SearchQuery::CompanyName(_) => "company_name",
            SearchQuery::PersonName(_) => "person_name",
        }
    }

    pub fn name_query(&self) -> Option<&NameQuery> {
        match self {
            SearchQuery::Cvr(_) => None,
            SearchQuery::CompanyName(q) | SearchQuery::PersonName(q) => Some(q),
        }
    }

    /// Tier table used for this query kind; empty for CVR lookups.
    pub fn tier_table(&self) -> &'static [BlockSpec] {
        match self {
            SearchQuery::Cvr(_) => &[],
            SearchQuery::CompanyName(_) => COMPANY_TIERS,
            SearchQuery::PersonName(_) => PERSON_TIERS,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parses a CVR number, ignoring embedded spaces.
pub fn parse_cvr(raw: &str) -> Result<u64, AppError> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidInput(format!(
            "CVR number must be numeric: {}",
            raw
        )));
    }
    digits
        .parse::<u64>()
        .map_err(|_| AppError::InvalidInput(format!("CVR number out of range: {}", raw)))
}

// ============ Normalization ============

fn legal_form_regex() -> &'static Regex {
    static LEGAL_FORM: OnceLock<Regex> = OnceLock::new();
    LEGAL_FORM.get_or_init(|| {
        Regex::new(
            r"(?i)(?:^|[\s,]+)(?:A/S|ApS|I/S|P/S|K/S|G/S|V/S|E/S|F\.M\.B\.A\.?|FMBA|A\.M\.B\.A\.?|AMBA|S\.M\.B\.A\.?|SMBA|AS|APS|IS|PS|KS|GS|VS|ES)\.?\s*$",
        )
        .expect("legal form pattern is valid")
    })
}

/// Collapses runs of whitespace and trims.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes one trailing Danish legal-form suffix (A/S, ApS, I/S, ...).
///
/// Returns the input unchanged when stripping would leave nothing, e.g. when the
/// user searched for "ApS" alone.
pub fn strip_legal_form(name: &str) -> String {
    let normalized = normalize_whitespace(name);
    let stripped = legal_form_regex().replace(&normalized, "");
    let stripped = stripped.trim().trim_end_matches(',').trim();
    if stripped.is_empty() {
        normalized
    } else {
        stripped.to_string()
    }
}

/// Lowercased word tokens, split on anything that is not alphanumeric.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

// ============ Plans ============

/// A clause with its template resolved against the user's text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedClause {
    pub kind: MatchKind,
    pub fields: FieldGroup,
    pub text: String,
}

/// A resolved `constant_score` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedBlock {
    pub tier: SearchTier,
    pub boost: f64,
    pub clauses: Vec<PlannedClause>,
}

/// Everything needed to run a search and re-rank its hits.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub query: SearchQuery,
    pub blocks: Vec<PlannedBlock>,
    pub body: Value,
}

impl QueryPlan {
    /// Plans `query` for a result page of `size`, with `today` deciding which
    /// participant memberships are still active.
    pub fn build(query: SearchQuery, size: usize, today: NaiveDate) -> Self {
        let blocks = match query.name_query() {
            Some(name) => plan_blocks(query.tier_table(), name),
            None => Vec::new(),
        };

        let body = match &query {
            SearchQuery::Cvr(cvr) => cvr_body(*cvr, size),
            SearchQuery::CompanyName(_) => company_body(&blocks, size),
            SearchQuery::PersonName(_) => person_body(&blocks, size, today),
        };

        tracing::debug!(
            kind = query.kind(),
            blocks = blocks.len(),
            size,
            "Planned registry search"
        );

        Self {
            query,
            blocks,
            body,
        }
    }
}

/// Resolves a tier table against a name query. Clauses targeting empty field
/// groups or blank text are dropped, and blocks left without clauses vanish.
pub fn plan_blocks(table: &[BlockSpec], name: &NameQuery) -> Vec<PlannedBlock> {
    table
        .iter()
        .filter_map(|spec| {
            let mut clauses: Vec<PlannedClause> = Vec::new();
            for template in spec.clauses {
                for text in name.texts(template.text) {
                    if tokenize(text).is_empty() {
                        continue;
                    }
                    let planned = PlannedClause {
                        kind: template.kind,
                        fields: template.fields,
                        text: text.to_string(),
                    };
                    if !clauses.contains(&planned) {
                        clauses.push(planned);
                    }
                }
            }
            if clauses.is_empty() {
                None
            } else {
                Some(PlannedBlock {
                    tier: spec.tier,
                    boost: spec.boost(),
                    clauses,
                })
            }
        })
        .collect()
}

fn cvr_body(cvr: u64, size: usize) -> Value {
    json!({
        "size": size,
        "query": {
            "bool": {
                "filter": [
                    { "term": { CVR_FIELD: cvr } }
                ]
            }
        }
    })
}

fn company_body(blocks: &[PlannedBlock], size: usize) -> Value {
    let fields = NameFieldSet::company();
    json!({
        "size": size,
        "query": {
            "bool": {
                "should": render_blocks(blocks, &fields),
                "minimum_should_match": 1
            }
        }
    })
}

fn person_body(blocks: &[PlannedBlock], size: usize, today: NaiveDate) -> Value {
    let fields = NameFieldSet::person();
    let today = today.format("%Y-%m-%d").to_string();
    json!({
        "size": size,
        "query": {
            "nested": {
                "path": PARTICIPANT_PATH,
                "score_mode": "max",
                "query": {
                    "bool": {
                        "should": render_blocks(blocks, &fields),
                        "minimum_should_match": 1,
                        "filter": [
                            {
                                "bool": {
                                    "should": [
                                        { "bool": { "must_not": { "exists": { "field": MEMBERSHIP_VALID_TO_FIELD } } } },
                                        { "range": { MEMBERSHIP_VALID_TO_FIELD: { "gte": today } } }
                                    ],
                                    "minimum_should_match": 1
                                }
                            }
                        ]
                    }
                }
            }
        }
    })
}

/// Index field names behind each field group.
struct NameFieldSet {
    primary: &'static [&'static str],
    secondary: &'static [&'static str],
}

impl NameFieldSet {
    fn company() -> Self {
        Self {
            primary: COMPANY_PRIMARY_FIELDS,
            secondary: COMPANY_SECONDARY_FIELDS,
        }
    }

    fn person() -> Self {
        Self {
            primary: PERSON_PRIMARY_FIELDS,
            secondary: &[],
        }
    }

    fn resolve(&self, group: FieldGroup) -> Vec<&'static str> {
        match group {
            FieldGroup::Primary => self.primary.to_vec(),
            FieldGroup::Secondary => self.secondary.to_vec(),
            FieldGroup::Both => self
                .primary
                .iter()
                .chain(self.secondary.iter())
                .copied()
                .collect(),
        }
    }
}

fn render_blocks(blocks: &[PlannedBlock], fields: &NameFieldSet) -> Vec<Value> {
    blocks
        .iter()
        .filter_map(|block| {
            let clauses: Vec<Value> = block
                .clauses
                .iter()
                .flat_map(|c| render_clause(c, &fields.resolve(c.fields)))
                .collect();
            if clauses.is_empty() {
                return None;
            }
            Some(json!({
                "constant_score": {
                    "filter": {
                        "bool": {
                            "_name": block.tier.label(),
                            "should": clauses,
                            "minimum_should_match": 1
                        }
                    },
                    "boost": block.boost
                }
            }))
        })
        .collect()
}

fn render_clause(clause: &PlannedClause, fields: &[&str]) -> Vec<Value> {
    if fields.is_empty() {
        return Vec::new();
    }
    match clause.kind {
        MatchKind::ExactTerm => fields
            .iter()
            .map(|f| {
                json!({
                    "term": {
                        format!("{}.keyword", f): {
                            "value": clause.text,
                            "case_insensitive": true
                        }
                    }
                })
            })
            .collect(),
        MatchKind::Phrase => fields
            .iter()
            .map(|f| json!({ "match_phrase": { *f: { "query": clause.text } } }))
            .collect(),
        MatchKind::AllWords => vec![json!({
            "multi_match": {
                "query": clause.text,
                "fields": fields,
                "type": "cross_fields",
                "operator": "and"
            }
        })],
        MatchKind::LeadingPrefix => {
            let Some(first) = tokenize(&clause.text).into_iter().next() else {
                return Vec::new();
            };
            fields
                .iter()
                .map(|f| {
                    json!({
                        "span_first": {
                            "match": {
                                "span_multi": {
                                    "match": { "prefix": { *f: { "value": first } } }
                                }
                            },
                            "end": 1
                        }
                    })
                })
                .collect()
        }
        MatchKind::AnyWord => vec![json!({
            "multi_match": {
                "query": clause.text,
                "fields": fields,
                "operator": "or"
            }
        })],
    }
}

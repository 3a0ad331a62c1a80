use crate::cache::SearchCache;
use crate::circuit_breaker::{create_search_circuit_breaker, SearchCircuitBreaker};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{CompanyRecord, SearchRequest, SearchResponse};
use crate::query_builder::{QueryPlan, SearchQuery};
use crate::ranking::{rank_hits, RegistryHit};
use crate::summary::summarize;
use chrono::{NaiveDate, Utc};
use failsafe::futures::CircuitBreaker;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// First retry delay; doubles on every further attempt.
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

// ============ CVR Registry Search ============

pub struct CvrSearchService {
    client: Client,
    search_url: String,
    username: Option<String>,
    password: Option<String>,
    result_size: usize,
    max_retries: u32,
    retry_base_delay: Duration,
    cache: SearchCache,
    breaker: SearchCircuitBreaker,
}

impl CvrSearchService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.search_timeout())
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            search_url: config.cvr_search_url.clone(),
            username: config.cvr_user.clone(),
            password: config.cvr_pass.clone(),
            result_size: config.search_result_size,
            max_retries: config.search_max_retries,
            retry_base_delay: RETRY_BASE_DELAY,
            cache: SearchCache::new(config.cache_ttl()),
            breaker: create_search_circuit_breaker(),
        })
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_circuit_breaker(mut self, breaker: SearchCircuitBreaker) -> Self {
        self.breaker = breaker;
        self
    }

    /// Classifies, plans, executes and ranks a registry search.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, AppError> {
        let query = SearchQuery::classify(request)?;
        self.search_query(query, Utc::now().date_naive()).await
    }

    /// Runs an already classified query. `today` decides which participant
    /// roles count as current.
    pub async fn search_query(
        &self,
        query: SearchQuery,
        today: NaiveDate,
    ) -> Result<SearchResponse, AppError> {
        let (username, password) = self.credentials()?;

        let plan = QueryPlan::build(query, self.result_size, today);
        let cache_key = SearchCache::key_for(&plan.body);
        if let Some(cached) = self.cache.get(&cache_key).await {
            tracing::info!(kind = plan.query.kind(), "Serving registry search from cache");
            return Ok(cached);
        }

        tracing::info!(
            kind = plan.query.kind(),
            blocks = plan.blocks.len(),
            "Searching CVR registry"
        );
        let raw = self.execute(&plan.body, username, password).await?;
        let response = build_response(&plan, &raw, today)?;

        tracing::info!(
            kind = plan.query.kind(),
            returned = response.companies.len(),
            total = response.total,
            "Registry search complete"
        );

        self.cache.insert(cache_key, response.clone()).await;
        Ok(response)
    }

    fn credentials(&self) -> Result<(&str, &str), AppError> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) => Ok((user, pass)),
            _ => Err(AppError::ConfigurationError(
                "CVR_USER and CVR_PASS must be set to search the registry".to_string(),
            )),
        }
    }

    /// Posts `body` through the circuit breaker, retrying transient failures
    /// with exponential backoff.
    async fn execute(&self, body: &Value, username: &str, password: &str) -> Result<Value, AppError> {
        let mut attempt: u32 = 0;
        loop {
            let result = self
                .breaker
                .call_with(
                    |e: &AppError| e.is_transient(),
                    self.post_once(body, username, password),
                )
                .await;

            match result {
                Ok(value) => return Ok(value),
                Err(failsafe::Error::Rejected) => {
                    tracing::warn!("Registry search rejected, circuit breaker is open");
                    return Err(AppError::upstream(
                        None,
                        "Registry search temporarily disabled after repeated failures",
                    ));
                }
                Err(failsafe::Error::Inner(e)) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.retry_base_delay * 2u32.pow(attempt);
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Registry search failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(failsafe::Error::Inner(e)) => return Err(e),
            }
        }
    }

    async fn post_once(&self, body: &Value, username: &str, password: &str) -> Result<Value, AppError> {
        let response = self
            .client
            .post(&self.search_url)
            .basic_auth(username, Some(password))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Registry search returned error {}: {}", status, error_text);
            return Err(AppError::upstream(
                Some(status.as_u16()),
                format!("Registry search returned status {}: {}", status, error_text),
            ));
        }

        let status = response.status().as_u16();
        response.json().await.map_err(|e| {
            AppError::upstream(
                Some(status),
                format!("Failed to parse registry search response: {}", e),
            )
        })
    }
}

/// Reads `hits.hits[]` and `hits.total` from a search response. Hits whose
/// source does not look like a registry record are logged and skipped.
pub fn parse_hits(raw: &Value) -> Result<(Vec<RegistryHit>, u64), AppError> {
    let entries = raw
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::upstream(None, "Registry response has no hits array"))?;

    let mut hits = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = match entry.get("_id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => String::new(),
        };
        let Some(source) = entry.get("_source").filter(|s| s.is_object()) else {
            tracing::warn!(id = %id, "Registry hit without _source, skipping");
            continue;
        };
        match CompanyRecord::from_source(source) {
            Ok(record) => hits.push(RegistryHit {
                id,
                engine_score: entry.get("_score").and_then(Value::as_f64),
                source: source.clone(),
                record,
            }),
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Registry hit has unexpected shape, skipping");
            }
        }
    }

    // Older indices report a bare number, newer ones `{ "value": n }`.
    let total = raw
        .pointer("/hits/total")
        .and_then(|t| t.as_u64().or_else(|| t.get("value").and_then(Value::as_u64)))
        .unwrap_or(hits.len() as u64);

    Ok((hits, total))
}

/// Ranks and summarizes a raw search response for `plan`.
pub fn build_response(plan: &QueryPlan, raw: &Value, today: NaiveDate) -> Result<SearchResponse, AppError> {
    let (hits, total) = parse_hits(raw)?;
    let ranked = rank_hits(plan, hits, today);

    Ok(SearchResponse {
        raw_first_record: ranked.first().map(|r| r.hit.source.clone()),
        companies: ranked.iter().map(summarize).collect(),
        total,
    })
}

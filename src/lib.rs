//! CVR Company Intelligence API Library
//!
//! Searches the Danish business registry (CVR) with a tiered relevance query
//! and scores company risk from registry records and annual reports.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Search planning, ranking and risk scoring.
//! - `integrations`: Registry search client and its resilience helpers.
//! - `versioned`: Time-versioned registry values and the current-or-latest rule.
//! - `models`: Registry record, financial report and API models.
//! - `query_builder`: Query classification and the tiered search body.
//! - `ranking`: Local re-ranking of registry hits.
//! - `summary`: Flattening records into company summaries.
//! - `status`: Classification of registry status texts.
//! - `risk`: The risk engine.
//! - `risk_financial`: Financial sub-assessments.
//! - `services`: Registry search client.
//! - `cache`: Search response cache.
//! - `circuit_breaker`: Circuit breaker for the registry index.
//! - `handlers`: HTTP request handlers.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.

pub mod api;
pub mod core;
pub mod integrations;

pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod query_builder;
pub mod ranking;
pub mod risk;
pub mod risk_financial;
pub mod services;
pub mod status;
pub mod summary;
pub mod versioned;

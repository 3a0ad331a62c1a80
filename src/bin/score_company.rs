//! Scores a company from files on disk and prints the risk score as JSON.
//!
//! Usage: score_company <company.json> [financials.json]
//!
//! `company.json` is a registry record (a search hit `_source` or the bare
//! record); `financials.json` is an array of annual reports.

use anyhow::Context;
use cvr_intel_api::models::{CompanyRecord, FinancialHistory};
use cvr_intel_api::risk::RiskEngine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn read_json(path: &str) -> anyhow::Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cvr_intel_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(company_path) = args.first() else {
        anyhow::bail!("Usage: score_company <company.json> [financials.json]");
    };

    let company = CompanyRecord::from_source(&read_json(company_path)?)
        .context("Company file is not a registry record")?;

    let financials: Option<FinancialHistory> = match args.get(1) {
        Some(path) => Some(
            serde_json::from_value(read_json(path)?)
                .context("Financials file is not an array of annual reports")?,
        ),
        None => None,
    };

    let score = RiskEngine::today().assess(&company, financials.as_ref());
    println!("{}", serde_json::to_string_pretty(&score)?);

    Ok(())
}

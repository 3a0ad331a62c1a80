use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_CVR_SEARCH_URL: &str =
    "http://distribution.virk.dk/cvr-permanent/virksomhed/_search";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub cvr_search_url: String,
    /// Registry credentials. Optional at startup; searching without them fails
    /// with a configuration error before any request is sent.
    pub cvr_user: Option<String>,
    pub cvr_pass: Option<String>,
    pub search_result_size: usize,
    pub search_timeout_secs: u64,
    pub search_max_retries: u32,
    /// 0 disables the response cache.
    pub search_cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            cvr_search_url: DEFAULT_CVR_SEARCH_URL.to_string(),
            cvr_user: None,
            cvr_pass: None,
            search_result_size: 20,
            search_timeout_secs: 15,
            search_max_retries: 2,
            search_cache_ttl_secs: 300,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str, default: T, hint: &str) -> anyhow::Result<T> {
    match optional_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be {}", name, hint)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            cvr_search_url: optional_var("CVR_SEARCH_URL")
                .unwrap_or(defaults.cvr_search_url)
                .trim()
                .to_string(),
            cvr_user: optional_var("CVR_USER"),
            cvr_pass: optional_var("CVR_PASS"),
            search_result_size: parsed_var(
                "SEARCH_RESULT_SIZE",
                defaults.search_result_size,
                "a positive number",
            )?,
            search_timeout_secs: parsed_var(
                "SEARCH_TIMEOUT_SECS",
                defaults.search_timeout_secs,
                "a number of seconds",
            )?,
            search_max_retries: parsed_var(
                "SEARCH_MAX_RETRIES",
                defaults.search_max_retries,
                "a non-negative number",
            )?,
            search_cache_ttl_secs: parsed_var(
                "SEARCH_CACHE_TTL_SECS",
                defaults.search_cache_ttl_secs,
                "a number of seconds",
            )?,
        };
        config.validate()?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("CVR search URL: {}", config.cvr_search_url);
        tracing::debug!("Server Port: {}", config.port);
        if !config.has_credentials() {
            tracing::warn!("CVR_USER / CVR_PASS not set, registry searches will be rejected");
        }

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.cvr_search_url.starts_with("http://") && !self.cvr_search_url.starts_with("https://")
        {
            anyhow::bail!("CVR_SEARCH_URL must start with http:// or https://");
        }
        url::Url::parse(&self.cvr_search_url)
            .map_err(|e| anyhow::anyhow!("CVR_SEARCH_URL is not a valid URL: {}", e))?;
        if self.search_result_size == 0 {
            anyhow::bail!("SEARCH_RESULT_SIZE must be at least 1");
        }
        if self.search_timeout_secs == 0 {
            anyhow::bail!("SEARCH_TIMEOUT_SECS must be at least 1");
        }
        Ok(())
    }

    pub fn has_credentials(&self) -> bool {
        self.cvr_user.is_some() && self.cvr_pass.is_some()
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.search_cache_ttl_secs > 0).then(|| Duration::from_secs(self.search_cache_ttl_secs))
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::graph::Actor;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sparql: SparqlConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// SPARQL endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SparqlConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Namespace prepended to actor identifiers to form resource IRIs.
    #[serde(default = "default_resource_prefix")]
    pub resource_prefix: String,
    /// Property linking a film to its cast.
    #[serde(default = "default_starring_property")]
    pub starring_property: String,
    /// Pause before every request, to stay within the endpoint's fair use.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// First retry delay; doubles on every further attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SparqlConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            resource_prefix: default_resource_prefix(),
            starring_property: default_starring_property(),
            request_delay_ms: default_request_delay_ms(),
            query_timeout_ms: default_query_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl SparqlConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
    /// Stop a level as soon as one path reaches the target.
    #[serde(default)]
    pub early_exit: bool,
    /// Wall-clock budget for the whole search; 0 disables it.
    #[serde(default)]
    pub search_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            max_hops: default_max_hops(),
            early_exit: false,
            search_timeout_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_endpoint() -> String {
    "https://dbpedia.org/sparql".to_string()
}

fn default_resource_prefix() -> String {
    "http://dbpedia.org/resource/".to_string()
}

fn default_starring_property() -> String {
    "http://dbpedia.org/ontology/starring".to_string()
}

fn default_request_delay_ms() -> u64 {
    100
}

fn default_query_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> usize {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1_000
}

fn default_user_agent() -> String {
    format!("baconpath/{}", env!("CARGO_PKG_VERSION"))
}

fn default_target() -> String {
    "Kevin_Bacon".to_string()
}

fn default_max_hops() -> usize {
    6
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Upper bound on `search.max_hops`; frontiers grow too fast beyond this.
pub const MAX_HOPS_LIMIT: usize = 12;

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. `explicit` (e.g. a `--config` flag)
    /// 2. Path specified in BACONPATH_CONFIG environment variable
    /// 3. ./config.toml in current directory, if it exists
    ///
    /// Without any config file the built-in defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("BACONPATH_CONFIG").ok().map(PathBuf::from));

        let config = match named {
            Some(path) => Self::from_file(&path)?,
            None => {
                let default_path = Path::new("config.toml");
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.sparql.endpoint)
            .with_context(|| format!("sparql.endpoint is not a URL: {}", self.sparql.endpoint))?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            anyhow::bail!("sparql.endpoint must be an http(s) URL, got {}", endpoint);
        }

        if self.sparql.query_timeout_ms == 0 {
            anyhow::bail!("sparql.query_timeout_ms must be greater than 0");
        }

        if self.search.max_hops == 0 || self.search.max_hops > MAX_HOPS_LIMIT {
            anyhow::bail!(
                "search.max_hops must be between 1 and {}",
                MAX_HOPS_LIMIT
            );
        }

        Actor::parse(&self.search.target).context("search.target is not a valid actor")?;

        Ok(())
    }

    /// `None` when the search budget is disabled.
    pub fn search_timeout(&self) -> Option<Duration> {
        match self.search.search_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

use crate::embeddings::{DEFAULT_BASE_URL, DEFAULT_MODEL, EMBEDDING_DIMENSION};
use crate::feed::DEFAULT_FEED_URL;
use crate::reconciler::DEFAULT_CONCURRENCY;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, path::PathBuf, time::Duration};
use tracing::{info, warn};
use utils::errors::{DATABASE_URL_NOT_SET, OPENAI_API_KEY_NOT_SET};

pub const DEFAULT_CONFIG_PATH: &str = "faq-sync.yaml";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FaqSyncConfig {
    pub server: ServerConfig,
    pub feed: FeedConfig,
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Directory served for any path without a route. `None` disables it.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3001".to_string(),
            static_dir: Some(PathBuf::from("public")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            max_retries: 3,
            timeout_secs: 30,
        }
    }
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    /// Expected vector length; also the column width of the table.
    pub dimensions: usize,
    pub timeout_secs: u64,
    /// Embedding calls in flight during a reconciliation pass.
    pub concurrency: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            dimensions: EMBEDDING_DIMENSION,
            timeout_secs: 30,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    /// Create the extension, table and index on startup when missing.
    pub bootstrap_schema: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 15,
            bootstrap_schema: true,
        }
    }
}

impl StoreConfig {
    pub fn pool_options(&self) -> faq_db::PoolOptions {
        faq_db::PoolOptions {
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Reconcile on a timer as well as on request. `None` disables the timer.
    pub interval_secs: Option<u64>,
    pub run_on_startup: bool,
}

/// Secrets that only come from the environment.
#[derive(Clone)]
pub struct Secrets {
    pub database_url: String,
    pub openai_api_key: String,
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context(DATABASE_URL_NOT_SET)?,
            openai_api_key: env::var("OPENAI_API_KEY").context(OPENAI_API_KEY_NOT_SET)?,
        })
    }
}

/// Reads the YAML file named by `FAQ_SYNC_CONFIG_PATH` (falling back to
/// defaults when it is missing or broken) and applies environment overrides.
pub fn load() -> FaqSyncConfig {
    let path = env::var("FAQ_SYNC_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = match fs::read_to_string(&path) {
        Ok(contents) => match serde_yaml::from_str::<FaqSyncConfig>(&contents) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, path = %path, "Failed to parse faq-sync config, using defaults");
                FaqSyncConfig::default()
            }
        },
        Err(err) => {
            warn!(error = %err, path = %path, "faq-sync config not found, using defaults");
            FaqSyncConfig::default()
        }
    };

    apply_env_overrides(&mut config);
    // A zero period means no timer, whichever layer set it.
    config.sync.interval_secs = config.sync.interval_secs.filter(|secs| *secs > 0);

    info!(
        bind = %config.server.bind,
        feed_url = %config.feed.url,
        model = %config.embedding.model,
        dimensions = config.embedding.dimensions,
        sync_interval_secs = ?config.sync.interval_secs,
        "faq-sync config loaded"
    );

    config
}

fn apply_env_overrides(config: &mut FaqSyncConfig) {
    if let Ok(value) = env::var("FAQ_SYNC_BIND") {
        config.server.bind = value;
    }

    if let Ok(value) = env::var("FAQ_FEED_URL") {
        config.feed.url = value;
    }

    if let Ok(value) = env::var("OPENAI_BASE_URL") {
        config.embedding.base_url = value;
    }

    if let Ok(value) = env::var("OPENAI_EMBEDDING_MODEL") {
        config.embedding.model = value;
    }

    if let Ok(value) = env::var("FAQ_SYNC_INTERVAL_SECS") {
        match value.parse::<u64>() {
            Ok(secs) => config.sync.interval_secs = Some(secs),
            Err(err) => {
                warn!(
                    error = %err,
                    "Failed to parse FAQ_SYNC_INTERVAL_SECS override"
                );
            }
        }
    }
}

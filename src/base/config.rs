//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc, time::Duration};

use serde::Deserialize;
use tokio::sync::Semaphore;

use super::types::Res;

/// Default cap on concurrently executing handlers.
fn default_max_concurrent_handlers() -> usize {
    64
}

/// Configuration for the interaction router.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// Platform user id of the bot owner (`OWNER_ID`).
    #[serde(default)]
    pub owner_id: String,
    /// Initially trusted user ids, comma separated in the environment (`TRUSTED_IDS`).
    #[serde(default)]
    pub trusted_ids: Vec<String>,
    /// Maximum number of handlers executing at once (`MAX_CONCURRENT_HANDLERS`).
    /// Events beyond this wait for a free slot instead of blocking the event source.
    #[serde(default = "default_max_concurrent_handlers")]
    pub max_concurrent_handlers: usize,
    /// Optional per-handler deadline in seconds (`HANDLER_TIMEOUT_SECS`).
    #[serde(default)]
    pub handler_timeout_secs: Option<u64>,
    /// Whether the owner passes "trusted" checks without being in the trusted set (`OWNER_IS_IMPLICITLY_TRUSTED`).
    #[serde(default)]
    pub owner_is_implicitly_trusted: bool,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            owner_id: String::new(),
            trusted_ids: Vec::new(),
            max_concurrent_handlers: default_max_concurrent_handlers(),
            handler_timeout_secs: None,
            owner_is_implicitly_trusted: false,
        }
    }
}

impl ConfigInner {
    /// The handler deadline, if one is configured.
    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let env = config::Environment::default()
            .prefix("INTERACTION_ROUTER")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("trusted_ids");

        let mut cfg = config::Config::builder().add_source(env);

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Checks the loaded values for consistency.
    pub fn validate(&self) -> Res<()> {
        if self.owner_id.trim().is_empty() {
            return Err(anyhow::anyhow!("Owner id must be set and cannot be blank."));
        }

        if self.max_concurrent_handlers < 1 {
            return Err(anyhow::anyhow!("Max concurrent handlers must be at least 1."));
        }

        if self.max_concurrent_handlers > Semaphore::MAX_PERMITS {
            return Err(anyhow::anyhow!("Max concurrent handlers cannot exceed {}.", Semaphore::MAX_PERMITS));
        }

        if self.handler_timeout_secs == Some(0) {
            return Err(anyhow::anyhow!("Handler timeout must be at least 1 second when set."));
        }

        Ok(())
    }
}

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

// Tests.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use parley_api::Endpoints;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SESSION_DB: &str = "parley.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    pub poll_interval: Duration,
    pub session_db: PathBuf,
    pub http_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            session_db: PathBuf::from(DEFAULT_SESSION_DB),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Reads `PARLEY_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("PARLEY_AUTH_URL") {
            config.endpoints.auth = url;
        }
        if let Some(url) = lookup("PARLEY_MESSAGES_URL") {
            config.endpoints.messages = url;
        }
        if let Some(url) = lookup("PARLEY_SERVERS_URL") {
            config.endpoints.servers = url;
        }
        if let Some(url) = lookup("PARLEY_CONTACTS_URL") {
            config.endpoints.contacts = url;
        }

        if let Some(raw) = lookup("PARLEY_POLL_INTERVAL_MS") {
            let ms: u64 = raw
                .parse()
                .with_context(|| format!("PARLEY_POLL_INTERVAL_MS is not a number: {raw}"))?;
            if ms == 0 {
                bail!("PARLEY_POLL_INTERVAL_MS must be greater than zero");
            }
            config.poll_interval = Duration::from_millis(ms);
        }

        if let Some(raw) = lookup("PARLEY_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("PARLEY_HTTP_TIMEOUT_SECS is not a number: {raw}"))?;
            config.http_timeout = Duration::from_secs(secs);
        }

        if let Some(path) = lookup("PARLEY_SESSION_DB") {
            config.session_db = PathBuf::from(path);
        }

        Ok(config)
    }
}

//! Client configuration.
//!
//! Defaults target the public `v2` API. `from_env` lets tests and scripts
//! point the client elsewhere without code changes.

use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.modrinth.com/v2";
pub const DEFAULT_USER_AGENT: &str = concat!("rinth-core/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Upper bound for a whole call. `None` leaves the agent's defaults.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Reads `RINTH_BASE_URL`, `RINTH_USER_AGENT` and `RINTH_TIMEOUT_SECS`,
    /// falling back to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = match env::var("RINTH_BASE_URL") {
            Ok(url) if !url.is_empty() => Self::new(&url),
            _ => Self::default(),
        };
        if let Ok(agent) = env::var("RINTH_USER_AGENT") {
            if !agent.is_empty() {
                config.user_agent = agent;
            }
        }
        if let Some(secs) = env::var("RINTH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.timeout = Some(Duration::from_secs(secs));
        }
        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

//! Transport configuration.

use std::time::Duration;

pub const TIMEOUT_ENV: &str = "RESTKIT_TIMEOUT_SECS";
pub const USER_AGENT_ENV: &str = "RESTKIT_USER_AGENT";
pub const MAX_BODY_ENV: &str = "RESTKIT_MAX_BODY_BYTES";

/// Settings for `UreqTransport`.
///
/// The pipeline itself enforces no timeout; a timeout configured here
/// surfaces as `TransportFault::Timeout`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub timeout: Option<Duration>,
    pub user_agent: String,
    /// Largest response body read before the transport gives up.
    pub max_body: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            user_agent: format!("restkit/{}", env!("CARGO_PKG_VERSION")),
            max_body: u64::MAX,
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_max_body(mut self, max_body: u64) -> Self {
        self.max_body = max_body;
        self
    }

    /// Defaults overridden by `RESTKIT_TIMEOUT_SECS`, `RESTKIT_USER_AGENT`
    /// and `RESTKIT_MAX_BODY_BYTES`.
    ///
    /// A timeout of `0` disables the timeout; unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(0) => config.timeout = None,
                Ok(secs) => config.timeout = Some(Duration::from_secs(secs)),
                Err(_) => {
                    tracing::warn!(target: "restkit_core::config", "ignoring invalid {}={:?}", TIMEOUT_ENV, raw);
                }
            }
        }
        if let Some(raw) = lookup(MAX_BODY_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(bytes) => config.max_body = bytes,
                Err(_) => {
                    tracing::warn!(target: "restkit_core::config", "ignoring invalid {}={:?}", MAX_BODY_ENV, raw);
                }
            }
        }
        if let Some(agent) = lookup(USER_AGENT_ENV).filter(|a| !a.trim().is_empty()) {
            config.user_agent = agent;
        }
        config
    }
}

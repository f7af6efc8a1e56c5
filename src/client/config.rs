//! Client configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Tuning knobs for an [`ApiClient`](crate::ApiClient) and its transports.
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// use console_client::client::ClientConfig;
///
/// let config = ClientConfig::from_json(r#"{"loop_guard_ceiling": 20}"#).unwrap();
/// assert_eq!(config.loop_guard_ceiling, 20);
/// assert_eq!(config.loop_guard_window_ms, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Timeout for real network requests
    pub request_timeout_ms: u64,
    /// Calls allowed inside one loop-guard window
    pub loop_guard_ceiling: usize,
    /// How long each call counts against the ceiling
    pub loop_guard_window_ms: u64,
    /// Lower bound of the simulated latency
    pub simulated_latency_min_ms: u64,
    /// Upper bound of the simulated latency
    pub simulated_latency_max_ms: u64,
    /// Probability of a synthetic failure, clamped to `[0, 0.5]`
    pub simulated_failure_rate: f64,
    /// Seed for the simulated transport's random source
    pub simulated_seed: Option<u64>,
    /// Log failed calls at warn level
    pub enable_logging: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            request_timeout_ms: 30_000,
            loop_guard_ceiling: 100,
            loop_guard_window_ms: 1_000,
            simulated_latency_min_ms: 300,
            simulated_latency_max_ms: 500,
            simulated_failure_rate: 0.0,
            simulated_seed: None,
            enable_logging: true,
        }
    }
}

impl ClientConfig {
    /// Defaults with no simulated latency or failures.
    pub fn instant() -> Self {
        ClientConfig {
            simulated_latency_min_ms: 0,
            simulated_latency_max_ms: 0,
            simulated_failure_rate: 0.0,
            ..Default::default()
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loop_guard_ceiling == 0 {
            return Err(ConfigError::Invalid {
                field: "loop_guard_ceiling",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.loop_guard_window_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "loop_guard_window_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.simulated_latency_min_ms > self.simulated_latency_max_ms {
            return Err(ConfigError::Invalid {
                field: "simulated_latency_min_ms",
                reason: format!(
                    "{} exceeds simulated_latency_max_ms {}",
                    self.simulated_latency_min_ms, self.simulated_latency_max_ms
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.simulated_failure_rate) {
            return Err(ConfigError::Invalid {
                field: "simulated_failure_rate",
                reason: "must be a probability".to_string(),
            });
        }
        Ok(())
    }
}

//! Application configuration.

use std::time::Duration;

use hedge_risk::RiskConfig;
use hedge_signer::KeySource;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// REST base URL including the version prefix.
    pub http_url: String,
    /// Tradable market symbols.
    pub markets: Vec<String>,
    /// Inclusive notional range `[min, max]` in quote currency.
    pub notional_range: [u64; 2],
    /// Inclusive cooldown range `[min, max]` in seconds.
    pub cooldown_secs: [u64; 2],
    /// HTTP request timeout. Default: 10,000 ms.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Ethereum keys, one per managed account.
    pub keys: KeySource,
    #[serde(default)]
    pub risk: RiskConfig,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.markets.is_empty() {
            return Err(AppError::Config("at least one market is required".to_string()));
        }
        if self.notional_range[0] > self.notional_range[1] {
            return Err(AppError::Config(format!(
                "notional_range min > max: {:?}",
                self.notional_range
            )));
        }
        if self.cooldown_secs[0] > self.cooldown_secs[1] {
            return Err(AppError::Config(format!(
                "cooldown_secs min > max: {:?}",
                self.cooldown_secs
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(AppError::Config("request_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

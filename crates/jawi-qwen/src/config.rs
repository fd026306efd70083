//! Qwen configuration

use jawi_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://litellm.bangka.productionready.xyz/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "vllm-qwen3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the Qwen chat-completions client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QwenConfig {
    pub api_key: String,
    pub api_url: String,
    pub model_id: String,
    pub timeout_secs: u64,
}

impl QwenConfig {
    /// Create configuration from environment variables.
    ///
    /// `QWEN_API_KEY` is mandatory; the service refuses to start without it.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var("QWEN_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::Configuration("QWEN_API_KEY environment variable not found".to_string())
            })?;

        let api_url = env::var("QWEN_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let model_id = env::var("QWEN_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs = match env::var("QWEN_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                Error::Configuration(format!("QWEN_TIMEOUT_SECS is not a number of seconds: {raw}"))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            api_key,
            api_url,
            model_id,
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration with explicit values
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            model_id: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Configuration("API key must not be empty".to_string()));
        }
        let parsed = url::Url::parse(&self.api_url).map_err(|e| {
            Error::Configuration(format!("invalid QWEN_API_URL '{}': {e}", self.api_url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Configuration(format!(
                "QWEN_API_URL must be http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Configuration("timeout must be at least one second".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(QwenConfig::new("key").validate().is_ok());
        assert!(QwenConfig::new("  ").validate().is_err());
        assert!(QwenConfig::new("key").with_api_url("not a url").validate().is_err());
        assert!(QwenConfig::new("key").with_api_url("ftp://host/v1").validate().is_err());
        assert!(QwenConfig::new("key").with_timeout_secs(0).validate().is_err());
    }

    #[test]
    fn test_timeout_default() {
        assert_eq!(QwenConfig::new("key").timeout(), Duration::from_secs(60));
    }
}

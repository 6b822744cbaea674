use std::env;
use std::time::Duration;

pub const CHANNEL_NAME: &str = "ModelScope";
pub const DEFAULT_BASE_URL: &str = "https://api-inference.modelscope.cn";
pub const DEFAULT_MODEL: &str = "Tongyi-MAI/Z-Image-Turbo";

pub const INITIAL_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const MAX_POLL_ATTEMPTS: u32 = 60;

/// Per-channel connection settings.
#[derive(Debug, Clone, Default)]
pub struct ChannelConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl ChannelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let base_url = env::var("MODELSCOPE_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let api_key = env::var("MODELSCOPE_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty());

        ChannelConfig { base_url, api_key }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Configured base URL without trailing slashes, or the public ModelScope host.
    pub fn resolved_base_url(&self) -> String {
        match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

/// Backoff schedule for the task poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            initial_interval: INITIAL_POLL_INTERVAL,
            max_interval: MAX_POLL_INTERVAL,
            max_attempts: MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }
}

/// Read-only model table handed to the adaptor at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    pub default_model: String,
    pub models: Vec<String>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        ModelCatalog {
            default_model: DEFAULT_MODEL.to_string(),
            models: vec![
                "Tongyi-MAI/Z-Image-Turbo".to_string(),
                "modelscope/stable-diffusion-v1-5".to_string(),
                "modelscope/stable-diffusion-xl-base-1.0".to_string(),
                "AI-ModelScope/stable-diffusion-v1-4".to_string(),
            ],
        }
    }
}

impl ModelCatalog {
    pub fn new(default_model: impl Into<String>, models: Vec<String>) -> Self {
        ModelCatalog {
            default_model: default_model.into(),
            models,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_fallback() {
        assert_eq!(ChannelConfig::new().resolved_base_url(), DEFAULT_BASE_URL);
        assert_eq!(
            ChannelConfig::new().with_base_url("  ").resolved_base_url(),
            DEFAULT_BASE_URL
        );
        assert_eq!(
            ChannelConfig::new()
                .with_base_url("http://proxy.local/")
                .resolved_base_url(),
            "http://proxy.local"
        );
    }

    #[test]
    fn test_poll_defaults() {
        let config = PollConfig::default();
        assert_eq!(config.initial_interval, Duration::from_secs(2));
        assert_eq!(config.max_interval, Duration::from_secs(10));
        assert_eq!(config.max_attempts, 60);
    }

    #[test]
    fn test_empty_api_key_is_absent() {
        assert!(ChannelConfig::new().with_api_key("").api_key().is_none());
        assert_eq!(
            ChannelConfig::new().with_api_key("ms-1").api_key(),
            Some("ms-1")
        );
    }
}

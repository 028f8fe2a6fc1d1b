use serde::{Deserialize, Serialize};

pub const API_URL_ENV: &str = "ANNOTATION_API_URL";
pub const API_KEY_ENV: &str = "ANNOTATION_API_KEY";
pub const TIMEOUT_ENV: &str = "ANNOTATION_API_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every request path is resolved against
    pub api_url: String,
    /// Sent as `Authorization: Api-Key <key>` to the API origin
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl ClientConfig {
    /// Build a config from the process environment, keeping defaults for unset values
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.api_url = url;
        }
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            config.api_key = Some(key);
        }
        // Unparseable timeouts fall back to the default
        if let Some(secs) = lookup(TIMEOUT_ENV).and_then(|v| v.trim().parse().ok()) {
            config.timeout_secs = secs;
        }

        config
    }
}

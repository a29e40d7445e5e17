use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Hosted model invoked when none is configured
pub const DEFAULT_MODEL: &str = "fal-ai/flux/dev";

/// Environment variable holding the provider credential by default
pub const DEFAULT_API_KEY_ENV: &str = "FAL_KEY";

/// Image generation provider configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Model identifier on the provider's queue
    #[serde(default = "default_model")]
    pub model: String,
    /// Queue API base URL
    #[serde(default = "default_queue_url")]
    pub queue_url: Url,
    /// Inline API key, takes precedence over `api_key_env`
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Environment variable read on every request when no inline key is set
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Delay between queue status polls (e.g. "500ms")
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
    /// Upper bound on a single generation (e.g. "2m"); unbounded when unset
    #[serde(default)]
    pub timeout: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            queue_url: default_queue_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            poll_interval: default_poll_interval(),
            timeout: None,
        }
    }
}

impl ProviderConfig {
    /// Parsed poll interval
    ///
    /// # Errors
    ///
    /// Returns an error if `poll_interval` is not a valid duration string
    pub fn poll_interval(&self) -> anyhow::Result<Duration> {
        parse_duration("provider.poll_interval", &self.poll_interval)
    }

    /// Parsed generation timeout, if one is configured
    ///
    /// # Errors
    ///
    /// Returns an error if `timeout` is set but is not a valid duration string
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|raw| parse_duration("provider.timeout", raw))
            .transpose()
    }
}

fn parse_duration(field: &str, raw: &str) -> anyhow::Result<Duration> {
    duration_str::parse(raw).map_err(|e| anyhow::anyhow!("invalid duration for {field} '{raw}': {e}"))
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_queue_url() -> Url {
    Url::parse("https://queue.fal.run").expect("must be a valid URL")
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_poll_interval() -> String {
    "500ms".to_string()
}

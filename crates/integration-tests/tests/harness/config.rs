//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use imagerelay_config::{Config, CorsConfig, EndpointConfig, ProviderConfig, ServerConfig};
use secrecy::SecretString;

/// Credential sent to the mock backend unless a test removes it
pub const TEST_API_KEY: &str = "test-key";

/// Environment variable that no test sets
pub const UNSET_KEY_VAR: &str = "IMAGERELAY_IT_NEVER_SET_KEY";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder pointed at a mock fal queue
    pub fn new(queue_url: &str) -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    ..ServerConfig::default()
                },
                provider: ProviderConfig {
                    queue_url: queue_url.parse().expect("valid URL"),
                    api_key: Some(SecretString::from(TEST_API_KEY)),
                    api_key_env: UNSET_KEY_VAR.to_owned(),
                    poll_interval: "10ms".to_owned(),
                    ..ProviderConfig::default()
                },
                ..Config::default()
            },
        }
    }

    /// Drop the inline key so the relay falls back to an unset variable
    pub fn without_api_key(mut self) -> Self {
        self.config.provider.api_key = None;
        self
    }

    /// Bound every provider call
    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.config.provider.timeout = Some(timeout.to_owned());
        self
    }

    /// Replace the default endpoints
    pub fn with_endpoints(mut self, endpoints: Vec<EndpointConfig>) -> Self {
        self.config.relay.endpoints = endpoints;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = config;
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}

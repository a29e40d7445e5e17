use serde::Deserialize;

/// Path served by the standalone server variant
pub const STANDALONE_PATH: &str = "/api/generate-image";

/// Path served by the serverless function variant
pub const FUNCTION_PATH: &str = "/generate-image";

/// Relay endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Endpoints that accept generation requests
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<EndpointConfig>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
        }
    }
}

/// A single relay endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// Route path, must start with `/`
    pub path: String,
    /// How the endpoint receives requests
    #[serde(default)]
    pub variant: EndpointVariant,
}

/// Hosting model of an endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointVariant {
    /// Routed for `POST` only; other verbs are rejected by the router
    #[default]
    Standalone,
    /// Accepts every verb and answers non-`POST` with a JSON 405
    Function,
}

fn default_endpoints() -> Vec<EndpointConfig> {
    vec![
        EndpointConfig {
            path: STANDALONE_PATH.to_string(),
            variant: EndpointVariant::Standalone,
        },
        EndpointConfig {
            path: FUNCTION_PATH.to_string(),
            variant: EndpointVariant::Function,
        },
    ]
}

use std::time::Duration;

use serde::Deserialize;

/// Front-end origin allowed when no CORS section is configured
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://image-creation.netlify.app";

/// CORS policy applied to every response
///
/// Defaults to a single front-end origin, `GET`/`POST`, and the
/// `Content-Type` request header.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins (wildcard "*" or explicit list)
    #[serde(default = "default_origins")]
    pub origins: AnyOrArray,
    /// Allowed HTTP methods (wildcard "*" or explicit list)
    #[serde(default = "default_methods")]
    pub methods: AnyOrArray,
    /// Allowed request headers (wildcard "*" or explicit list)
    #[serde(default = "default_headers")]
    pub headers: AnyOrArray,
    /// Max age for preflight cache in seconds
    #[serde(default)]
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_origins(),
            methods: default_methods(),
            headers: default_headers(),
            max_age: None,
        }
    }
}

impl CorsConfig {
    /// Get max age as Duration
    pub fn max_age_duration(&self) -> Option<Duration> {
        self.max_age.map(Duration::from_secs)
    }

    /// Check that every listed origin, method, and header is well formed
    ///
    /// # Errors
    ///
    /// Returns an error naming the first entry that cannot be used in a
    /// response header
    pub fn validate(&self) -> anyhow::Result<()> {
        if let AnyOrArray::List(origins) = &self.origins {
            for origin in origins {
                http::HeaderValue::from_str(origin)
                    .map_err(|e| anyhow::anyhow!("invalid CORS origin '{origin}': {e}"))?;
            }
        }
        if let AnyOrArray::List(methods) = &self.methods {
            for method in methods {
                method
                    .parse::<http::Method>()
                    .map_err(|e| anyhow::anyhow!("invalid CORS method '{method}': {e}"))?;
            }
        }
        if let AnyOrArray::List(headers) = &self.headers {
            for header in headers {
                header
                    .parse::<http::HeaderName>()
                    .map_err(|e| anyhow::anyhow!("invalid CORS header '{header}': {e}"))?;
            }
        }
        Ok(())
    }
}

fn default_origins() -> AnyOrArray {
    AnyOrArray::List(vec![DEFAULT_ALLOWED_ORIGIN.to_string()])
}

fn default_methods() -> AnyOrArray {
    AnyOrArray::List(vec!["GET".to_string(), "POST".to_string()])
}

fn default_headers() -> AnyOrArray {
    AnyOrArray::List(vec!["Content-Type".to_string()])
}

/// Either a wildcard "*" or explicit list of values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyOrArray {
    /// Match any value
    Any,
    /// Explicit list
    List(Vec<String>),
}

impl<'de> Deserialize<'de> for AnyOrArray {
    /// Accepts a single string or an array; a `"*"` anywhere means any
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }

        let values = match Raw::deserialize(deserializer)? {
            Raw::One(value) => vec![value],
            Raw::Many(values) => values,
        };

        if values.iter().any(|value| value == "*") {
            Ok(Self::Any)
        } else {
            Ok(Self::List(values))
        }
    }
}

use std::{collections::HashSet, net::SocketAddr, path::Path};

use crate::{Config, server::DEFAULT_PORT};

/// Environment variable overriding the listen port
const PORT_ENV: &str = "PORT";

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads and deserializes the file, applies environment overrides,
    /// then validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, TOML parsing fails,
    /// an override is malformed, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let mut config: Self = toml::from_str(&raw).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Build configuration from defaults and the environment alone
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is not a valid port number
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise from the environment alone
    ///
    /// # Errors
    ///
    /// See [`Config::load`] and [`Config::from_env`]
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::from_env(),
        }
    }

    /// Apply `PORT` to the listen address, keeping any configured host
    fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        let Ok(raw) = std::env::var(PORT_ENV) else {
            return Ok(());
        };

        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(());
        }

        let port: u16 = raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {PORT_ENV} value '{raw}': {e}"))?;

        let host = self
            .server
            .listen_address
            .map_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)).ip(), |addr| addr.ip());

        self.server.listen_address = Some(SocketAddr::new(host, port));

        Ok(())
    }

    /// Validate that the configuration is internally consistent
    ///
    /// A missing provider credential is not a validation error; it fails
    /// individual requests instead.
    ///
    /// # Errors
    ///
    /// Returns an error if endpoints are missing or clash, durations do not
    /// parse, the CORS policy contains unusable values, or telemetry settings
    /// are out of range
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_endpoints()?;
        self.validate_provider_config()?;
        self.server.cors.validate()?;
        if let Some(telemetry) = &self.telemetry {
            telemetry.validate()?;
        }
        Ok(())
    }

    fn validate_endpoints(&self) -> anyhow::Result<()> {
        if self.relay.endpoints.is_empty() {
            anyhow::bail!("at least one relay endpoint must be configured");
        }

        let mut seen = HashSet::new();
        for endpoint in &self.relay.endpoints {
            if !endpoint.path.starts_with('/') {
                anyhow::bail!("relay endpoint path '{}' must start with '/'", endpoint.path);
            }
            if !seen.insert(endpoint.path.as_str()) {
                anyhow::bail!("relay endpoint path '{}' is configured more than once", endpoint.path);
            }
            if self.server.health.enabled && endpoint.path == self.server.health.path {
                anyhow::bail!("relay endpoint path '{}' collides with the health path", endpoint.path);
            }
        }

        Ok(())
    }

    fn validate_provider_config(&self) -> anyhow::Result<()> {
        if self.provider.model.trim().is_empty() {
            anyhow::bail!("provider.model must not be empty");
        }

        if self.provider.api_key_env.trim().is_empty() {
            anyhow::bail!("provider.api_key_env must not be empty");
        }

        if self.provider.poll_interval()?.is_zero() {
            anyhow::bail!("provider.poll_interval must be greater than 0");
        }

        self.provider.timeout()?;

        Ok(())
    }
}

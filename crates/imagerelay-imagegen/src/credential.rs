use secrecy::{ExposeSecret, SecretString};

/// Where the provider credential comes from
///
/// Resolved on every request, never cached. An inline key wins over the
/// environment; empty values count as absent.
#[derive(Debug, Clone)]
pub struct CredentialSource {
    inline: Option<SecretString>,
    env_var: String,
}

impl CredentialSource {
    pub fn new(inline: Option<SecretString>, env_var: impl Into<String>) -> Self {
        Self {
            inline,
            env_var: env_var.into(),
        }
    }

    /// Read the credential from the named environment variable only
    pub fn env(env_var: impl Into<String>) -> Self {
        Self::new(None, env_var)
    }

    /// Name of the environment variable consulted
    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Current credential, if any
    pub fn resolve(&self) -> Option<SecretString> {
        if let Some(key) = &self.inline
            && !key.expose_secret().is_empty()
        {
            return Some(key.clone());
        }

        std::env::var(&self.env_var)
            .ok()
            .filter(|value| !value.is_empty())
            .map(SecretString::from)
    }
}

//! Secure API credential handling.
//!
//! Credentials are wrapped in [`secrecy::SecretString`] so they cannot
//! leak through `Debug` output or error messages, and are zeroed on
//! drop. The raw value is only reachable via [`ApiCredential::expose`],
//! which callers invoke at the request-header call site and nowhere
//! else.

use secrecy::{ExposeSecret, SecretString};

use super::ProviderError;

/// Where a credential was loaded from, for debugging without revealing
/// the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Read from an environment variable.
    Environment,

    /// Supplied in a configuration document.
    Config,

    /// Passed directly in code.
    Programmatic,
}

/// An API credential with redacted `Debug` and tracked provenance.
pub struct ApiCredential {
    secret: SecretString,
    source: CredentialSource,
    label: String,
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredential")
            .field("label", &self.label)
            .field("source", &self.source)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl ApiCredential {
    /// Wrap a credential supplied programmatically.
    pub fn new(value: impl Into<String>, source: CredentialSource, label: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(value.into()),
            source,
            label: label.into(),
        }
    }

    /// Load a credential from an environment variable.
    pub fn from_env(var: &str, label: impl Into<String>) -> Result<Self, ProviderError> {
        let value = std::env::var(var).map_err(|_| {
            ProviderError::NotConfigured(format!("{} environment variable not set", var))
        })?;
        if value.is_empty() {
            return Err(ProviderError::NotConfigured(format!(
                "{} environment variable is empty",
                var
            )));
        }
        Ok(Self::new(value, CredentialSource::Environment, label))
    }

    /// Load from a JSON config key, falling back to an environment
    /// variable.
    pub fn from_config_or_env(
        config: &serde_json::Value,
        key: &str,
        var: &str,
        label: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = config[key].as_str() {
            if !value.is_empty() {
                return Ok(Self::new(value, CredentialSource::Config, label));
            }
        }
        Self::from_env(var, label)
    }

    /// Expose the raw credential. Call only at the point of use.
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.secret.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

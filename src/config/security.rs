use serde::Deserialize;

use crate::{Result, Sensitive, crypto::MIN_SECRET_LEN};

/// Configuration for sensitive-data encryption.
///
/// The passphrase should come from the environment via handlebars
/// substitution rather than living in the TOML file:
///
/// ```toml
/// [security]
/// encryption_secret = "{{ ENCRYPTION_SECRET }}"
/// ```
///
/// An empty substituted value (missing env var) is treated as "not
/// configured"; a present-but-short passphrase is a hard configuration error
/// so the failure shows up at startup instead of as a cryptic crypto failure
/// on first use.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    /// Encryption passphrase, at least 32 characters when present.
    pub encryption_secret: Option<Sensitive<String>>,
}

impl SecurityConfig {
    /// The configured passphrase, with an empty string normalized to `None`.
    pub fn secret(&self) -> Option<&str> {
        self.encryption_secret
            .as_ref()
            .map(|s| s.0.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(secret) = self.secret()
            && secret.chars().count() < MIN_SECRET_LEN
        {
            return Err(crate::Error::config(format!(
                "[security] encryption_secret must be at least {MIN_SECRET_LEN} characters; \
                 generate one with SecretVault::generate_key()"
            )));
        }
        Ok(())
    }
}

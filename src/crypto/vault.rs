//! Configuration-aware facade over the envelope cipher.
//!
//! The raw primitive in [`super::cipher`] accepts any passphrase; this layer
//! enforces the deployment policy (an environment-sourced passphrase of at
//! least 32 characters) and fails fast with a descriptive configuration error
//! instead of deferring to an opaque crypto failure later. It also adds the
//! helpers route code actually wants: API-key strings and serializable values.

use serde::{Serialize, de::DeserializeOwned};

use super::cipher;
use crate::{Error, Result, Sensitive};

/// Environment variable the vault reads its passphrase from.
pub const ENCRYPTION_SECRET_VAR: &str = "ENCRYPTION_SECRET";

/// Minimum passphrase length in characters.
pub const MIN_SECRET_LEN: usize = 32;

/// Symmetric encryption service for sensitive data.
///
/// Construct once at startup (from configuration via
/// [`crate::Config::create_secret_vault`] or directly from the environment)
/// and share by reference. The passphrase is held in a [`Sensitive`] wrapper
/// so it never appears in debug output and is zeroized on drop.
///
/// # Examples
///
/// ```
/// use replyguard::SecretVault;
///
/// let vault = SecretVault::new("0123456789abcdef0123456789abcdef").unwrap();
/// let sealed = vault.encrypt_str("api response").unwrap();
/// assert_eq!(vault.decrypt_str(&sealed).unwrap(), "api response");
/// ```
#[derive(Clone)]
pub struct SecretVault {
    secret: Sensitive<String>,
}

impl std::fmt::Debug for SecretVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretVault")
            .field("secret", &self.secret)
            .finish()
    }
}

impl SecretVault {
    /// Creates a vault from an explicit passphrase.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the passphrase is shorter than
    /// [`MIN_SECRET_LEN`] characters. An under-length passphrase would make
    /// the PBKDF2 work factor pointless, so it is rejected up front.
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.chars().count() < MIN_SECRET_LEN {
            return Err(Error::config(format!(
                "Encryption passphrase must be at least {MIN_SECRET_LEN} characters. \
                 Set {ENCRYPTION_SECRET_VAR} or [security] encryption_secret in config."
            )));
        }
        Ok(Self {
            secret: Sensitive(secret),
        })
    }

    /// Creates a vault from the `ENCRYPTION_SECRET` environment variable.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the variable is absent or the
    /// passphrase is too short.
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var(ENCRYPTION_SECRET_VAR).map_err(|_| {
            Error::config(format!(
                "{ENCRYPTION_SECRET_VAR} is not set. Generate one with \
                 SecretVault::generate_key() and export it before starting the service."
            ))
        })?;
        Self::new(secret)
    }

    /// Non-throwing capability probe: is a usable passphrase present in the
    /// environment? Lets callers branch instead of handling errors.
    pub fn is_configured() -> bool {
        std::env::var(ENCRYPTION_SECRET_VAR)
            .map(|s| s.chars().count() >= MIN_SECRET_LEN)
            .unwrap_or(false)
    }

    /// Generates a provisioning-ready passphrase: 32 random bytes, hex-encoded
    /// to 64 characters.
    pub fn generate_key() -> String {
        cipher::generate_key()
    }

    /// Encrypts an opaque string.
    pub fn encrypt_str(&self, plaintext: &str) -> Result<String> {
        cipher::encrypt_with(plaintext, &self.secret.0)
    }

    /// Decrypts an opaque string.
    pub fn decrypt_str(&self, payload: &str) -> Result<String> {
        cipher::decrypt_with(payload, &self.secret.0)
    }

    /// Encrypts a provider API key, rejecting empty keys before any crypto
    /// work happens.
    pub fn encrypt_api_key(&self, api_key: &str) -> Result<String> {
        if api_key.trim().is_empty() {
            return Err(Error::invalid_input("API key must not be empty"));
        }
        self.encrypt_str(api_key)
    }

    /// Decrypts a provider API key.
    pub fn decrypt_api_key(&self, payload: &str) -> Result<String> {
        self.decrypt_str(payload)
    }

    /// Encrypts any serializable value by round-tripping it through JSON.
    pub fn encrypt_value<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = serde_json::to_string(value)?;
        self.encrypt_str(&json)
    }

    /// Decrypts a value previously sealed with [`Self::encrypt_value`].
    pub fn decrypt_value<T: DeserializeOwned>(&self, payload: &str) -> Result<T> {
        let json = self.decrypt_str(payload)?;
        Ok(serde_json::from_str(&json)?)
    }
}

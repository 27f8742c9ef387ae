//! Passphrase-based envelope encryption.
//!
//! Every call to [`encrypt`] draws a fresh random salt and IV, derives a
//! one-off AES-256 key from the passphrase with PBKDF2-HMAC-SHA512, and seals
//! the plaintext with AES-256-GCM. The output embeds everything needed for
//! decryption as three colon-separated hex segments:
//!
//! ```text
//! hex(salt) : hex(iv) : hex(ciphertext || tag)
//! ```
//!
//! Deriving a per-encryption key from a random salt means the same
//! application-wide passphrase never produces key reuse, and the self-contained
//! payload needs no external key-material store to decrypt.
//!
//! Failures are deliberately coarse. [`CipherError::InvalidFormat`] fires only
//! when the payload does not split into exactly three segments; every other
//! problem (bad hex, wrong passphrase, tampered bytes) is
//! [`CipherError::DecryptionFailed`]. Callers branch on the two, but the HTTP
//! surface collapses them (see [`crate::Error`]).

use aes_gcm::{
    AesGcm, Nonce,
    aead::{Aead, KeyInit, generic_array::typenum::U16},
    aes::Aes256,
};
use pbkdf2::pbkdf2_hmac;
use rand::{RngCore, rngs::OsRng};
use sha2::Sha512;
use thiserror::Error;

use crate::{Error, Result};

/// Salt length in bytes (hex-encoded to 128 characters).
const SALT_LEN: usize = 64;

/// IV length in bytes (hex-encoded to 32 characters).
const IV_LEN: usize = 16;

/// Derived key length in bytes (AES-256).
const KEY_LEN: usize = 32;

/// PBKDF2 iteration count.
const PBKDF2_ROUNDS: u32 = 100_000;

/// AES-256-GCM parameterized with a 16-byte nonce to match the envelope layout.
type EnvelopeCipher = AesGcm<Aes256, U16>;

/// Errors produced by [`encrypt`] and [`decrypt`].
///
/// Messages carry no detail about the underlying crypto failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Encryption could not be performed (e.g. empty passphrase).
    #[error("encryption failed")]
    EncryptionFailed,

    /// The payload does not consist of exactly three colon-separated segments.
    #[error("encrypted payload is malformed")]
    InvalidFormat,

    /// Decryption failed: corrupted segments, tampered ciphertext or wrong passphrase.
    #[error("decryption failed")]
    DecryptionFailed,
}

impl From<CipherError> for Error {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::InvalidFormat => Error::crypto_format(err.to_string()),
            CipherError::EncryptionFailed | CipherError::DecryptionFailed => {
                Error::crypto_failure(err.to_string())
            }
        }
    }
}

/// Derives a 32-byte key from the passphrase and salt.
///
/// Deterministic for a given (secret, salt) pair, which is what lets the
/// embedded salt reproduce the key at decryption time.
fn derive_key(secret: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha512>(secret.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    key
}

/// Encrypts `plaintext` under `secret`, producing a self-contained payload.
///
/// Two calls with identical inputs yield different payloads because the salt
/// and IV are drawn fresh each time.
///
/// # Errors
///
/// Returns [`CipherError::EncryptionFailed`] when the passphrase is empty or
/// the cipher rejects the operation. No further detail is exposed.
pub fn encrypt(plaintext: &str, secret: &str) -> std::result::Result<String, CipherError> {
    if secret.is_empty() {
        return Err(CipherError::EncryptionFailed);
    }

    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut iv);

    let key = derive_key(secret, &salt);
    let cipher =
        EnvelopeCipher::new_from_slice(&key).map_err(|_| CipherError::EncryptionFailed)?;

    let nonce = Nonce::<U16>::from_slice(&iv);
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| CipherError::EncryptionFailed)?;

    Ok(format!(
        "{}:{}:{}",
        hex::encode(salt),
        hex::encode(iv),
        hex::encode(ciphertext)
    ))
}

/// Decrypts a payload produced by [`encrypt`].
///
/// # Errors
///
/// - [`CipherError::InvalidFormat`] when the payload does not split into
///   exactly three colon-delimited segments.
/// - [`CipherError::DecryptionFailed`] for anything else: non-hex segments,
///   wrong IV length, wrong passphrase, or a ciphertext whose authentication
///   tag no longer verifies.
pub fn decrypt(payload: &str, secret: &str) -> std::result::Result<String, CipherError> {
    let segments: Vec<&str> = payload.split(':').collect();
    if segments.len() != 3 {
        return Err(CipherError::InvalidFormat);
    }

    let salt = hex::decode(segments[0]).map_err(|_| CipherError::DecryptionFailed)?;
    let iv = hex::decode(segments[1]).map_err(|_| CipherError::DecryptionFailed)?;
    let ciphertext = hex::decode(segments[2]).map_err(|_| CipherError::DecryptionFailed)?;

    if iv.len() != IV_LEN {
        return Err(CipherError::DecryptionFailed);
    }

    let key = derive_key(secret, &salt);
    let cipher =
        EnvelopeCipher::new_from_slice(&key).map_err(|_| CipherError::DecryptionFailed)?;

    let nonce = Nonce::<U16>::from_slice(&iv);
    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_ref())
        .map_err(|_| CipherError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|_| CipherError::DecryptionFailed)
}

/// Generates a fresh random key suitable for provisioning as a passphrase:
/// 32 random bytes, hex-encoded to 64 characters.
pub fn generate_key() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Convenience wrappers returning the crate [`Result`] type.
///
/// These are what the vault uses; the raw functions above keep the precise
/// [`CipherError`] for tests and internal branching.
pub fn encrypt_with(plaintext: &str, secret: &str) -> Result<String> {
    Ok(encrypt(plaintext, secret)?)
}

/// See [`encrypt_with`].
pub fn decrypt_with(payload: &str, secret: &str) -> Result<String> {
    Ok(decrypt(payload, secret)?)
}

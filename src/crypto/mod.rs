//! Envelope encryption for sensitive data.
//!
//! Two layers:
//! - [`cipher`] - the raw primitive: PBKDF2-derived keys and AES-256-GCM,
//!   self-contained `salt:iv:ciphertext` payloads.
//! - [`vault`] - a configuration-aware facade that enforces the passphrase
//!   policy and adds API-key and JSON helpers.

mod cipher;
mod vault;

pub use cipher::*;
pub use vault::*;

//! Cryptographic capability set consumed by the pipeline.
//!
//! The key-unlock chain and the event decryptor never touch an OpenPGP
//! implementation directly. They go through [`CryptoBackend`], which exposes
//! exactly the primitives they need:
//!
//! - unlock a locked private key with a passphrase
//! - decrypt a message (split or armored) with a [`Keyring`]
//! - verify a detached signature with a [`Keyring`]
//!
//! With the `pgp` feature enabled, [`PgpBackend`] implements the trait on top
//! of the `pgp` crate.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[cfg(feature = "pgp")]
mod openpgp;
#[cfg(test)]
pub(crate) mod testing;

#[cfg(feature = "pgp")]
pub use openpgp::{PgpBackend, PgpKey};

/// Failures reported by a [`CryptoBackend`].
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The key material could not be parsed.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// The passphrase does not unlock the key.
    #[error("key could not be unlocked: {0}")]
    Locked(String),

    /// The ciphertext could not be parsed.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// None of the keys in the keyring can decrypt the message.
    #[error("no key in the keyring can decrypt the message")]
    NoMatchingKey,

    /// The signature could not be parsed.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// No key in the keyring produced this signature over the given data.
    #[error("signature does not verify")]
    BadSignature,
}

/// An encrypted payload in one of the two wire forms the backend uses.
#[derive(Debug, Clone, Copy)]
pub enum EncryptedMessage<'a> {
    /// A reusable key packet plus a per-part data packet, both binary.
    Split {
        key_packet: &'a [u8],
        data_packet: &'a [u8],
    },
    /// A self-describing ASCII-armored message.
    Armored(&'a str),
}

/// An immutable, shareable set of unlocked keys.
///
/// Cloning is cheap; a refreshed keyring replaces the old handle instead of
/// mutating it.
pub struct Keyring<K> {
    keys: Arc<[K]>,
}

impl<K> Keyring<K> {
    pub fn new(keys: Vec<K>) -> Self {
        Self { keys: keys.into() }
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns true if both handles point at the same key set.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.keys, &other.keys)
    }
}

impl<K> Clone for Keyring<K> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
        }
    }
}

impl<K> fmt::Debug for Keyring<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyring")
            .field("keys", &self.keys.len())
            .finish()
    }
}

/// The primitive operations the pipeline needs from an OpenPGP-like library.
///
/// Implementations are synchronous: every call is CPU-bound work on data the
/// caller already holds.
pub trait CryptoBackend: Send + Sync {
    /// An unlocked private key.
    type Key: Send + Sync;

    /// Unlocks an armored private key with `passphrase`.
    fn unlock_key(&self, armored_key: &str, passphrase: &[u8]) -> Result<Self::Key, CryptoError>;

    /// Decrypts `message` with any key of `keyring`, checking validity at `at`.
    fn decrypt(
        &self,
        keyring: &Keyring<Self::Key>,
        message: EncryptedMessage<'_>,
        at: DateTime<Utc>,
    ) -> Result<Vec<u8>, CryptoError>;

    /// Verifies an armored detached signature over `data` at `at`.
    fn verify_detached(
        &self,
        keyring: &Keyring<Self::Key>,
        data: &[u8],
        armored_signature: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CryptoError>;
}

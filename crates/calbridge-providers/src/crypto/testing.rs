//! Deterministic stand-in for a real OpenPGP backend, used by unit tests.
//!
//! Keys are `FAKEKEY:<id>:<passphrase>` strings. Ciphertexts name the key
//! that can open them, signatures carry the signer id and a digest of the
//! signed bytes. This is enough to exercise every control-flow path of the
//! pipeline (wrong passphrase, foreign key, tampered content) without key
//! generation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};

use super::{CryptoBackend, CryptoError, EncryptedMessage, Keyring};

const ARMOR_HEADER: &str = "-----BEGIN FAKE MESSAGE-----";

/// An unlocked fake key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeKey {
    pub id: String,
}

/// Per-primitive call counters shared with the test body.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub unlocks: AtomicUsize,
    pub decrypts: AtomicUsize,
    pub verifies: AtomicUsize,
}

impl CallCounts {
    pub fn unlocks(&self) -> usize {
        self.unlocks.load(Ordering::SeqCst)
    }

    pub fn decrypts(&self) -> usize {
        self.decrypts.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default, Clone)]
pub struct FakeCrypto {
    pub calls: Arc<CallCounts>,
}

impl FakeCrypto {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A locked key that unlocks to `id` with `passphrase`.
pub fn locked_key(id: &str, passphrase: &str) -> String {
    format!("FAKEKEY:{id}:{passphrase}")
}

/// An armored ciphertext only `key_id` can open.
pub fn encrypt_armored(key_id: &str, plaintext: &str) -> String {
    format!(
        "{ARMOR_HEADER}\n{key_id}\n{}",
        STANDARD.encode(plaintext.as_bytes())
    )
}

/// A split ciphertext as `(base64 key packet, base64 data packet)`.
pub fn encrypt_split(key_id: &str, plaintext: &str) -> (String, String) {
    (
        STANDARD.encode(key_id.as_bytes()),
        STANDARD.encode(plaintext.as_bytes()),
    )
}

/// A detached signature by `key_id` over `data`.
pub fn sign(key_id: &str, data: &str) -> String {
    format!("FAKESIG:{key_id}:{:016x}", digest(data.as_bytes()))
}

fn digest(data: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}

fn find<'a>(keyring: &'a Keyring<FakeKey>, id: &str) -> Option<&'a FakeKey> {
    keyring.keys().iter().find(|k| k.id == id)
}

impl CryptoBackend for FakeCrypto {
    type Key = FakeKey;

    fn unlock_key(&self, armored_key: &str, passphrase: &[u8]) -> Result<FakeKey, CryptoError> {
        self.calls.unlocks.fetch_add(1, Ordering::SeqCst);
        let mut fields = armored_key.splitn(3, ':');
        let (Some("FAKEKEY"), Some(id), Some(expected)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(CryptoError::MalformedKey("not a fake key".into()));
        };
        if expected.as_bytes() != passphrase {
            return Err(CryptoError::Locked(format!("wrong passphrase for {id}")));
        }
        Ok(FakeKey { id: id.to_string() })
    }

    fn decrypt(
        &self,
        keyring: &Keyring<FakeKey>,
        message: EncryptedMessage<'_>,
        _at: DateTime<Utc>,
    ) -> Result<Vec<u8>, CryptoError> {
        self.calls.decrypts.fetch_add(1, Ordering::SeqCst);
        let (key_id, body) = match message {
            EncryptedMessage::Split {
                key_packet,
                data_packet,
            } => {
                let id = String::from_utf8(key_packet.to_vec())
                    .map_err(|e| CryptoError::MalformedMessage(e.to_string()))?;
                (id, data_packet.to_vec())
            }
            EncryptedMessage::Armored(armored) => {
                let mut lines = armored.lines();
                if lines.next() != Some(ARMOR_HEADER) {
                    return Err(CryptoError::MalformedMessage("missing armor header".into()));
                }
                let id = lines
                    .next()
                    .ok_or_else(|| CryptoError::MalformedMessage("missing key id".into()))?;
                let body = STANDARD
                    .decode(lines.next().unwrap_or_default())
                    .map_err(|e| CryptoError::MalformedMessage(e.to_string()))?;
                (id.to_string(), body)
            }
        };
        find(keyring, &key_id).ok_or(CryptoError::NoMatchingKey)?;
        Ok(body)
    }

    fn verify_detached(
        &self,
        keyring: &Keyring<FakeKey>,
        data: &[u8],
        armored_signature: &str,
        _at: DateTime<Utc>,
    ) -> Result<(), CryptoError> {
        self.calls.verifies.fetch_add(1, Ordering::SeqCst);
        let mut fields = armored_signature.splitn(3, ':');
        let (Some("FAKESIG"), Some(id), Some(sum)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(CryptoError::MalformedSignature("not a fake signature".into()));
        };
        if find(keyring, id).is_none() || sum != format!("{:016x}", digest(data)) {
            return Err(CryptoError::BadSignature);
        }
        Ok(())
    }
}

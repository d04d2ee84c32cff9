//! OpenPGP backend built on the `pgp` crate.
//!
//! rpgp keeps secret key material encrypted at rest and asks for the
//! passphrase on every secret operation, so an "unlocked" [`PgpKey`] is the
//! parsed key together with the passphrase that was verified against it. The
//! passphrase is wiped when the key is dropped.

use std::fmt;
use std::io::Cursor;

use chrono::{DateTime, Utc};
use pgp::composed::{Deserializable, Message, SignedSecretKey, StandaloneSignature};
use pgp::types::SecretKeyTrait;
use tracing::trace;
use zeroize::Zeroizing;

use super::{CryptoBackend, CryptoError, EncryptedMessage, Keyring};

/// A parsed private key whose passphrase has been verified.
pub struct PgpKey {
    key: SignedSecretKey,
    passphrase: Zeroizing<String>,
}

impl PgpKey {
    /// Returns the underlying key.
    pub fn key(&self) -> &SignedSecretKey {
        &self.key
    }

    fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        self.key.expires_at().is_some_and(|expiry| expiry < at)
    }
}

impl fmt::Debug for PgpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgpKey").finish_non_exhaustive()
    }
}

/// [`CryptoBackend`] implementation backed by rpgp.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgpBackend;

impl PgpBackend {
    pub fn new() -> Self {
        Self
    }

    fn parse_message(message: EncryptedMessage<'_>) -> Result<Message, CryptoError> {
        let parsed = match message {
            EncryptedMessage::Split {
                key_packet,
                data_packet,
            } => {
                let mut bytes = Vec::with_capacity(key_packet.len() + data_packet.len());
                bytes.extend_from_slice(key_packet);
                bytes.extend_from_slice(data_packet);
                Message::from_bytes(Cursor::new(bytes))
            }
            EncryptedMessage::Armored(armored) => {
                Message::from_armor_single(Cursor::new(armored.as_bytes())).map(|(msg, _)| msg)
            }
        };
        parsed.map_err(|e| CryptoError::MalformedMessage(e.to_string()))
    }
}

impl CryptoBackend for PgpBackend {
    type Key = PgpKey;

    fn unlock_key(&self, armored_key: &str, passphrase: &[u8]) -> Result<PgpKey, CryptoError> {
        let (key, _headers) = SignedSecretKey::from_armor_single(Cursor::new(armored_key.as_bytes()))
            .map_err(|e| CryptoError::MalformedKey(e.to_string()))?;

        let passphrase = Zeroizing::new(
            std::str::from_utf8(passphrase)
                .map_err(|_| CryptoError::Locked("passphrase is not valid UTF-8".into()))?
                .to_string(),
        );

        let check = passphrase.clone();
        key.unlock(move || check.to_string(), |_| Ok(()))
            .map_err(|e| CryptoError::Locked(e.to_string()))?;

        Ok(PgpKey { key, passphrase })
    }

    fn decrypt(
        &self,
        keyring: &Keyring<PgpKey>,
        message: EncryptedMessage<'_>,
        at: DateTime<Utc>,
    ) -> Result<Vec<u8>, CryptoError> {
        let message = Self::parse_message(message)?;

        for candidate in usable_keys(keyring, at) {
            let passphrase = candidate.passphrase.clone();
            match message.decrypt(move || passphrase.to_string(), &[&candidate.key]) {
                Ok((decrypted, _key_ids)) => {
                    return decrypted
                        .get_content()
                        .map_err(|e| CryptoError::MalformedMessage(e.to_string()))?
                        .ok_or_else(|| {
                            CryptoError::MalformedMessage("message has no literal data".into())
                        });
                }
                Err(e) => {
                    trace!(error = %e, "Key did not decrypt message");
                }
            }
        }

        Err(CryptoError::NoMatchingKey)
    }

    fn verify_detached(
        &self,
        keyring: &Keyring<PgpKey>,
        data: &[u8],
        armored_signature: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CryptoError> {
        let (signature, _headers) =
            StandaloneSignature::from_armor_single(Cursor::new(armored_signature.as_bytes()))
                .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;

        for candidate in usable_keys(keyring, at) {
            if signature.verify(&candidate.key.public_key(), data).is_ok() {
                return Ok(());
            }
            for subkey in &candidate.key.secret_subkeys {
                if signature.verify(&subkey.key.public_key(), data).is_ok() {
                    return Ok(());
                }
            }
        }

        Err(CryptoError::BadSignature)
    }
}

/// Keys of `keyring` that have not expired at `at`.
fn usable_keys(keyring: &Keyring<PgpKey>, at: DateTime<Utc>) -> impl Iterator<Item = &PgpKey> {
    keyring.keys().iter().filter(move |key| {
        let expired = key.is_expired_at(at);
        if expired {
            trace!(%at, "Skipping expired key");
        }
        !expired
    })
}

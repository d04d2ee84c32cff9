//! Event record decryption.
//!
//! A [`RawEventRecord`] carries three categories of parts (shared, personal,
//! calendar). Each part is independently flagged encrypted and/or signed.
//! Encrypted parts are opened with the calendar keyring; signatures are
//! checked against the address keyring. A category either decodes completely
//! or fails as a whole.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, trace};

use crate::crypto::{CryptoBackend, EncryptedMessage, Keyring};
use crate::remote::{EventPart, RawEventRecord};

/// The three part categories of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartCategory {
    Shared,
    Personal,
    Calendar,
}

impl fmt::Display for PartCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shared => "shared",
            Self::Personal => "personal",
            Self::Calendar => "calendar",
        })
    }
}

/// Errors produced by [`EventDecryptor::decrypt_event`].
#[derive(Debug, Error)]
pub enum DecryptError {
    /// A required keyring was not supplied.
    #[error("{0} keyring is required")]
    MissingKeyring(&'static str),

    /// The record's shared key packet is not valid base64.
    #[error("invalid shared key packet: {reason}")]
    KeyPacket { reason: String },

    /// A part could not be decrypted or is not valid UTF-8.
    #[error("cannot decode {category} part {index}: {reason}")]
    PartDecode {
        category: PartCategory,
        index: usize,
        reason: String,
    },

    /// A signed part has a missing or invalid signature.
    #[error("signature check failed for {category} part {index}: {reason}")]
    SignatureVerification {
        category: PartCategory,
        index: usize,
        reason: String,
    },
}

/// Plaintext of each category, parts joined with `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedEventText {
    pub shared_text: String,
    pub personal_text: String,
    pub calendar_text: String,
}

/// Decrypts and verifies event records.
pub struct EventDecryptor<C> {
    crypto: Arc<C>,
}

impl<C> Clone for EventDecryptor<C> {
    fn clone(&self) -> Self {
        Self {
            crypto: Arc::clone(&self.crypto),
        }
    }
}

impl<C: CryptoBackend> EventDecryptor<C> {
    pub fn new(crypto: Arc<C>) -> Self {
        Self { crypto }
    }

    /// Decodes every category of `record`.
    ///
    /// Only shared parts use the record's split key packet; personal and
    /// calendar parts are self-contained armored messages.
    pub fn decrypt_event(
        &self,
        record: &RawEventRecord,
        calendar_keyring: Option<&Keyring<C::Key>>,
        address_keyring: Option<&Keyring<C::Key>>,
    ) -> Result<DecodedEventText, DecryptError> {
        let calendar_keyring = calendar_keyring.ok_or(DecryptError::MissingKeyring("calendar"))?;
        let address_keyring = address_keyring.ok_or(DecryptError::MissingKeyring("address"))?;

        // The key packet only serves shared parts.
        let key_packet = match record.shared_key_packet.as_deref() {
            Some(packet) if !packet.is_empty() && !record.shared_events.is_empty() => {
                Some(STANDARD.decode(packet).map_err(|e| DecryptError::KeyPacket {
                    reason: e.to_string(),
                })?)
            }
            _ => None,
        };

        let keys = PartKeys {
            calendar: calendar_keyring,
            address: address_keyring,
            at: Utc::now(),
        };

        let text = DecodedEventText {
            shared_text: self.decode_category(
                PartCategory::Shared,
                &record.shared_events,
                key_packet.as_deref(),
                &keys,
            )?,
            personal_text: self.decode_category(
                PartCategory::Personal,
                &record.personal_events,
                None,
                &keys,
            )?,
            calendar_text: self.decode_category(
                PartCategory::Calendar,
                &record.calendar_events,
                None,
                &keys,
            )?,
        };

        trace!(
            event_id = %record.id,
            shared = record.shared_events.len(),
            personal = record.personal_events.len(),
            calendar = record.calendar_events.len(),
            "Decoded event parts"
        );
        Ok(text)
    }

    fn decode_category(
        &self,
        category: PartCategory,
        parts: &[EventPart],
        key_packet: Option<&[u8]>,
        keys: &PartKeys<'_, C::Key>,
    ) -> Result<String, DecryptError> {
        let mut decoded = Vec::with_capacity(parts.len());
        for (index, part) in parts.iter().enumerate() {
            let plain = self
                .decode_part(part, key_packet, keys)
                .map_err(|failure| failure.into_error(category, index))?;
            if !plain.is_empty() {
                decoded.push(plain);
            }
        }
        Ok(decoded.join("\n"))
    }

    fn decode_part(
        &self,
        part: &EventPart,
        key_packet: Option<&[u8]>,
        keys: &PartKeys<'_, C::Key>,
    ) -> Result<String, PartFailure> {
        let data = if part.encrypted {
            let plain = match key_packet {
                Some(key_packet) => {
                    let data_packet = STANDARD
                        .decode(&part.data)
                        .map_err(|e| PartFailure::Decode(e.to_string()))?;
                    self.crypto.decrypt(
                        keys.calendar,
                        EncryptedMessage::Split {
                            key_packet,
                            data_packet: &data_packet,
                        },
                        keys.at,
                    )
                }
                None => self.crypto.decrypt(
                    keys.calendar,
                    EncryptedMessage::Armored(&part.data),
                    keys.at,
                ),
            }
            .map_err(|e| PartFailure::Decode(e.to_string()))?;
            String::from_utf8(plain).map_err(|_| PartFailure::Decode("not valid UTF-8".into()))?
        } else {
            part.data.clone()
        };

        if part.signed {
            let signature = part
                .signature
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| PartFailure::Signature("signature missing".into()))?;
            self.crypto
                .verify_detached(keys.address, data.as_bytes(), signature, keys.at)
                .map_err(|e| PartFailure::Signature(e.to_string()))?;
        }

        Ok(data)
    }
}

struct PartKeys<'a, K> {
    calendar: &'a Keyring<K>,
    address: &'a Keyring<K>,
    at: DateTime<Utc>,
}

enum PartFailure {
    Decode(String),
    Signature(String),
}

impl PartFailure {
    fn into_error(self, category: PartCategory, index: usize) -> DecryptError {
        debug!(%category, index, "Event part failed to decode");
        match self {
            Self::Decode(reason) => DecryptError::PartDecode {
                category,
                index,
                reason,
            },
            Self::Signature(reason) => DecryptError::SignatureVerification {
                category,
                index,
                reason,
            },
        }
    }
}

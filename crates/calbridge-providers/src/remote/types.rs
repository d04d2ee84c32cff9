//! Records returned by the encrypted calendar backend.
//!
//! Field names follow the backend's JSON (PascalCase). Boolean flags arrive
//! either as JSON booleans or as `0`/`1` integers and are accepted in both
//! forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Part flag: the payload is encrypted.
pub const PART_ENCRYPTED: u8 = 1;
/// Part flag: the payload carries a detached signature.
pub const PART_SIGNED: u8 = 2;

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

fn default_true() -> bool {
    true
}

/// One of the user's mail addresses with its locked key bundle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Address {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub keys: Vec<AddressKey>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressKey {
    #[serde(rename = "ID")]
    pub id: String,
    /// Armored, passphrase-locked private key.
    pub private_key: String,
    #[serde(default = "default_true", deserialize_with = "flag")]
    pub active: bool,
    #[serde(default, deserialize_with = "flag")]
    pub primary: bool,
}

impl AddressKey {
    pub fn new(id: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            private_key: private_key.into(),
            active: true,
            primary: false,
        }
    }
}

/// Calendar type as reported by the backend; `0` is a personal calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CalendarType(pub u8);

impl CalendarType {
    pub const NORMAL: Self = Self(0);
    pub const SUBSCRIBED: Self = Self(1);

    pub fn is_normal(self) -> bool {
        self == Self::NORMAL
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Calendar {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "Type", default)]
    pub kind: CalendarType,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CalendarMember {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    /// Permission bitmask; zero means no access beyond reading.
    #[serde(default)]
    pub permissions: u32,
}

/// A calendar's passphrase, encrypted once per member.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CalendarPassphrase {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub member_passphrases: Vec<MemberPassphrase>,
}

impl CalendarPassphrase {
    /// Returns the entry encrypted for `member_id`.
    pub fn for_member(&self, member_id: &str) -> Option<&MemberPassphrase> {
        self.member_passphrases
            .iter()
            .find(|entry| entry.member_id == member_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemberPassphrase {
    #[serde(rename = "MemberID")]
    pub member_id: String,
    /// Armored message encrypted to the member's address keys.
    pub passphrase: String,
    /// Armored detached signature over the decrypted passphrase; may be empty.
    #[serde(default, deserialize_with = "nullable")]
    pub signature: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CalendarKey {
    #[serde(rename = "ID")]
    pub id: String,
    pub private_key: String,
    #[serde(default)]
    pub flags: u32,
}

fn nullable<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One fragment of an event record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "WireEventPart")]
pub struct EventPart {
    pub encrypted: bool,
    pub signed: bool,
    /// Ciphertext (base64 or armored) when encrypted, plaintext otherwise.
    pub data: String,
    pub signature: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireEventPart {
    #[serde(rename = "Type", default)]
    kind: u8,
    #[serde(default)]
    data: String,
    #[serde(default)]
    signature: Option<String>,
}

impl From<WireEventPart> for EventPart {
    fn from(wire: WireEventPart) -> Self {
        Self {
            encrypted: wire.kind & PART_ENCRYPTED != 0,
            signed: wire.kind & PART_SIGNED != 0,
            data: wire.data,
            signature: wire.signature.filter(|s| !s.is_empty()),
        }
    }
}

impl EventPart {
    /// A clear, unsigned part.
    pub fn clear(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// An encrypted, unsigned part.
    pub fn encrypted(data: impl Into<String>) -> Self {
        Self {
            encrypted: true,
            ..Self::clear(data)
        }
    }

    /// Marks the part as signed with `signature`.
    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signed = true;
        self.signature = Some(signature.into());
        self
    }
}

/// An encrypted event as stored by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawEventRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "CalendarID")]
    pub calendar_id: String,
    /// Base64 key packet shared by every split-form part of the shared category.
    #[serde(default)]
    pub shared_key_packet: Option<String>,
    #[serde(default)]
    pub shared_events: Vec<EventPart>,
    #[serde(default)]
    pub personal_events: Vec<EventPart>,
    #[serde(default)]
    pub calendar_events: Vec<EventPart>,
    /// Unix seconds.
    #[serde(default)]
    pub start_time: i64,
    /// Unix seconds.
    #[serde(default)]
    pub end_time: i64,
    #[serde(default, deserialize_with = "flag")]
    pub full_day: bool,
    /// Unix seconds; zero when unknown.
    #[serde(default)]
    pub modify_time: i64,
}

impl RawEventRecord {
    pub fn new(id: impl Into<String>, calendar_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            ..Self::default()
        }
    }

    /// Start time stored in the clear by the backend.
    pub fn start(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.start_time, 0).unwrap_or_default()
    }

    /// End time stored in the clear by the backend.
    pub fn end(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.end_time, 0).unwrap_or_default()
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        if self.modify_time == 0 {
            return None;
        }
        DateTime::from_timestamp(self.modify_time, 0)
    }
}

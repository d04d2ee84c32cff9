//! CalendarProvider trait and implementations.
//!
//! This crate provides the calendar backends behind the bridge:
//!
//! - [`CalendarProvider`] - The trait every backend implements
//! - [`EncryptedProvider`] - The end-to-end encrypted remote calendar
//! - [`FeedProvider`] - A plain, read-only ICS feed
//! - [`ProviderError`] - Error types for provider operations
//!
//! # Architecture
//!
//! ```text
//!  account passphrase
//!          │
//!          ▼
//! ┌─────────────────┐      ┌──────────────────────┐
//! │   KeyUnlocker   │─────▶│ CalendarKeyResolver  │ (cached keyrings)
//! └─────────────────┘      └──────────┬───────────┘
//!                                     │
//!          ┌──────────────────────────┘
//!          ▼
//! ┌─────────────────┐      ┌──────────────────────┐
//! │ EventDecryptor  │─────▶│     vcalendar        │
//! └─────────────────┘      └──────────┬───────────┘
//!                                     │
//!                                     ▼
//!                          ┌──────────────────────┐
//!                          │ EncryptedProvider    │──┐
//!                          └──────────────────────┘  │ CalendarProvider
//!                          ┌──────────────────────┐  │
//!                          │ FeedProvider         │──┘
//!                          └──────────────────────┘
//! ```
//!
//! Cryptography sits behind [`CryptoBackend`]; the OpenPGP implementation
//! is available with the `pgp` feature and the feed provider with the
//! `feed` feature. The remote API sits behind [`RemoteCalendarClient`].
//!
//! # Example
//!
//! ```ignore
//! use calbridge_providers::{CalendarProvider, FeedConfig, FeedProvider};
//! use calbridge_core::TimeRange;
//! use tokio_util::sync::CancellationToken;
//!
//! let provider = FeedProvider::http(FeedConfig::new("https://example.com/team.ics")?)?;
//! let events = provider
//!     .list_events(&CancellationToken::new(), "", TimeRange::unbounded())
//!     .await?;
//! ```

pub mod crypto;
pub mod decrypt;
pub mod error;
#[cfg(feature = "feed")]
pub mod feed;
pub mod keys;
pub mod provider;
pub mod remote;
pub mod vcalendar;

// Re-export main types at crate root
pub use crypto::{CryptoBackend, CryptoError, EncryptedMessage, Keyring};
#[cfg(feature = "pgp")]
pub use crypto::{PgpBackend, PgpKey};
pub use decrypt::{DecodedEventText, DecryptError, EventDecryptor, PartCategory};
pub use error::{ClientError, ProviderError, ProviderErrorCode, ProviderResult};
#[cfg(feature = "feed")]
pub use feed::{FeedConfig, FeedFetcher, FeedProvider, FeedResponse, HttpFeedFetcher};
pub use keys::{CalendarKeyResolver, KeyUnlocker, UnlockOutcome};
pub use provider::{BoxFuture, CalendarProvider, CapabilitySet, ProviderKind};
pub use remote::{
    Credentials, ENCRYPTED_PLACEHOLDER_TITLE, EncryptedProvider, RemoteCalendarClient,
    RemoteConfig,
};
pub use vcalendar::{ParseError, ParsedEventFields};

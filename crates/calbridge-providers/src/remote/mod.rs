//! Encrypted remote calendar provider.
//!
//! The provider walks the key chain (address keys, calendar passphrase,
//! calendar keys), then pages through event records, decrypting and parsing
//! each one into a [`DomainEvent`](calbridge_core::DomainEvent).
//!
//! # Example
//!
//! ```ignore
//! use calbridge_providers::remote::{Credentials, EncryptedProvider, RemoteConfig};
//!
//! let config = RemoteConfig::new(Credentials::new(passphrase));
//! let provider = EncryptedProvider::new(config, Some(client), Arc::new(PgpBackend));
//! let events = provider.list_events(&ctx, "cal-id", TimeRange::unbounded()).await?;
//! ```

mod client;
mod config;
mod provider;
#[cfg(test)]
pub(crate) mod testing;
mod types;

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, ProviderError, ProviderResult};
use crate::provider::with_cancel;

pub use client::{ClientResult, RemoteCalendarClient};
pub use config::{Credentials, RemoteConfig};
pub use provider::{ENCRYPTED_PLACEHOLDER_TITLE, EncryptedProvider};
pub use types::{
    Address, AddressKey, Calendar, CalendarKey, CalendarMember, CalendarPassphrase, CalendarType,
    EventPart, MemberPassphrase, PART_ENCRYPTED, PART_SIGNED, RawEventRecord,
};

/// Awaits a backend call, mapping its failure to an upstream error.
pub(crate) async fn call_backend<T>(
    ctx: &CancellationToken,
    call: &str,
    fut: impl Future<Output = Result<T, ClientError>>,
) -> ProviderResult<T> {
    with_cancel(ctx, async {
        fut.await
            .map_err(|e| ProviderError::upstream(format!("{call}: {e}")).with_source(e))
    })
    .await
}

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto::{CryptoBackend, EncryptedMessage, Keyring};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::with_cancel;
use crate::remote::{Credentials, RemoteCalendarClient, call_backend};

use super::KeyUnlocker;

/// Resolves and caches the address keyring and one keyring per calendar.
///
/// The cache is scoped to this instance. The keyring maps are never locked
/// across a backend call; two callers missing the same calendar at once both
/// derive the keyring and the later write replaces the earlier one.
pub struct CalendarKeyResolver<C: CryptoBackend> {
    client: Option<Arc<dyn RemoteCalendarClient>>,
    crypto: Arc<C>,
    unlocker: KeyUnlocker<C>,
    /// Taken once the address keys unlock.
    credentials: Mutex<Option<Credentials>>,
    address_keyring: RwLock<Option<Keyring<C::Key>>>,
    calendar_keyrings: RwLock<HashMap<String, Keyring<C::Key>>>,
}

impl<C: CryptoBackend> CalendarKeyResolver<C> {
    pub fn new(
        client: Option<Arc<dyn RemoteCalendarClient>>,
        crypto: Arc<C>,
        credentials: Credentials,
    ) -> Self {
        Self {
            unlocker: KeyUnlocker::new(client.clone(), Arc::clone(&crypto)),
            client,
            crypto,
            credentials: Mutex::new(Some(credentials)),
            address_keyring: RwLock::new(None),
            calendar_keyrings: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the address keyring, unlocking it on first use.
    pub async fn resolve_address_keyring(
        &self,
        ctx: &CancellationToken,
    ) -> ProviderResult<Keyring<C::Key>> {
        if let Some(keyring) = self.address_keyring.read().await.as_ref() {
            return Ok(keyring.clone());
        }

        // Serializes first-time unlocks; the cache lock itself stays free.
        // Waiting callers still observe their own cancellation.
        let mut credentials = with_cancel(ctx, async { Ok(self.credentials.lock().await) }).await?;
        if let Some(keyring) = self.address_keyring.read().await.as_ref() {
            return Ok(keyring.clone());
        }
        let passphrase = credentials
            .as_ref()
            .ok_or_else(|| ProviderError::configuration("no key passphrase available"))?;

        let keyring = self
            .unlocker
            .unlock_address_keys(ctx, passphrase.passphrase())
            .await?;

        *self.address_keyring.write().await = Some(keyring.clone());
        credentials.take();
        Ok(keyring)
    }

    /// Returns the keyring of `calendar_id`, deriving it on a cache miss.
    pub async fn resolve_calendar_keyring(
        &self,
        ctx: &CancellationToken,
        calendar_id: &str,
    ) -> ProviderResult<Keyring<C::Key>> {
        if let Some(keyring) = self.calendar_keyrings.read().await.get(calendar_id) {
            debug!(calendar_id, "Calendar keyring cache hit");
            return Ok(keyring.clone());
        }
        debug!(calendar_id, "Calendar keyring cache miss");

        let address_keyring = self.resolve_address_keyring(ctx).await?;
        let keyring = self
            .derive_calendar_keyring(ctx, calendar_id, &address_keyring)
            .await?;

        self.calendar_keyrings
            .write()
            .await
            .insert(calendar_id.to_string(), keyring.clone());
        info!(calendar_id, keys = keyring.len(), "Calendar keyring unlocked");
        Ok(keyring)
    }

    /// Number of calendars with a cached keyring.
    pub async fn cached_calendars(&self) -> usize {
        self.calendar_keyrings.read().await.len()
    }

    async fn derive_calendar_keyring(
        &self,
        ctx: &CancellationToken,
        calendar_id: &str,
        address_keyring: &Keyring<C::Key>,
    ) -> ProviderResult<Keyring<C::Key>> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ProviderError::configuration("remote calendar client is not configured"))?;

        let members = call_backend(
            ctx,
            "get calendar members",
            client.get_calendar_members(calendar_id),
        )
        .await?;
        let member = members.first().ok_or_else(|| {
            ProviderError::no_members(format!("calendar {calendar_id} has no members"))
        })?;

        let passphrases = call_backend(
            ctx,
            "get calendar passphrase",
            client.get_calendar_passphrase(calendar_id),
        )
        .await?;
        let entry = passphrases.for_member(&member.id).ok_or_else(|| {
            ProviderError::passphrase_decrypt(format!(
                "calendar {calendar_id} has no passphrase for member {}",
                member.id
            ))
        })?;

        let now = Utc::now();
        let secret = Zeroizing::new(
            self.crypto
                .decrypt(
                    address_keyring,
                    EncryptedMessage::Armored(&entry.passphrase),
                    now,
                )
                .map_err(|e| {
                    ProviderError::passphrase_decrypt(format!(
                        "cannot decrypt passphrase of calendar {calendar_id}"
                    ))
                    .with_source(e)
                })?,
        );
        if !entry.signature.is_empty() {
            self.crypto
                .verify_detached(address_keyring, &secret, &entry.signature, now)
                .map_err(|e| {
                    ProviderError::passphrase_decrypt(format!(
                        "passphrase signature of calendar {calendar_id} does not verify"
                    ))
                    .with_source(e)
                })?;
        }

        let keys = call_backend(
            ctx,
            "get calendar keys",
            client.get_calendar_keys(calendar_id),
        )
        .await?;
        let unlocked: Vec<_> = keys
            .iter()
            .filter_map(|key| match self.crypto.unlock_key(&key.private_key, &secret) {
                Ok(k) => Some(k),
                Err(e) => {
                    debug!(calendar_id, key_id = %key.id, error = %e, "Calendar key did not unlock");
                    None
                }
            })
            .collect();
        if unlocked.is_empty() {
            return Err(ProviderError::calendar_key_unlock(format!(
                "no key of calendar {calendar_id} unlocked with its passphrase"
            )));
        }
        Ok(Keyring::new(unlocked))
    }
}

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::crypto::{CryptoBackend, Keyring};
use crate::error::{ProviderError, ProviderResult};
use crate::remote::{Address, RemoteCalendarClient, call_backend};

/// Keys collected across addresses plus the number of addresses skipped
/// because they had no active key or none of their keys unlocked.
#[derive(Debug)]
pub struct UnlockOutcome<K> {
    pub keys: Vec<K>,
    pub skipped_addresses: usize,
}

impl<K> Default for UnlockOutcome<K> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            skipped_addresses: 0,
        }
    }
}

/// Turns the account passphrase into the address keyring.
pub struct KeyUnlocker<C> {
    client: Option<Arc<dyn RemoteCalendarClient>>,
    crypto: Arc<C>,
}

impl<C: CryptoBackend> KeyUnlocker<C> {
    pub fn new(client: Option<Arc<dyn RemoteCalendarClient>>, crypto: Arc<C>) -> Self {
        Self { client, crypto }
    }

    /// Unlocks every address key that opens with `passphrase`.
    ///
    /// Addresses whose keys do not unlock are skipped: a user may hold keys
    /// locked under older passphrases. Fails with `NoUsableKeys` only when
    /// nothing unlocked at all.
    pub async fn unlock_address_keys(
        &self,
        ctx: &CancellationToken,
        passphrase: &[u8],
    ) -> ProviderResult<Keyring<C::Key>> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ProviderError::configuration("remote calendar client is not configured"))?;
        if passphrase.is_empty() {
            return Err(ProviderError::invalid_input("key passphrase is required"));
        }

        let addresses = call_backend(ctx, "get addresses", client.get_addresses()).await?;
        if addresses.is_empty() {
            return Err(ProviderError::no_addresses("backend returned no addresses"));
        }

        let outcome = self.collect_keys(&addresses, passphrase);

        info!(
            addresses = addresses.len(),
            keys = outcome.keys.len(),
            skipped = outcome.skipped_addresses,
            "Unlocked address keys"
        );

        if outcome.keys.is_empty() {
            return Err(ProviderError::no_usable_keys(
                "no address key could be unlocked with the given passphrase",
            ));
        }
        Ok(Keyring::new(outcome.keys))
    }

    fn collect_keys(&self, addresses: &[Address], passphrase: &[u8]) -> UnlockOutcome<C::Key> {
        addresses
            .iter()
            .fold(UnlockOutcome::default(), |mut outcome, address| {
                match self.unlock_address(address, passphrase) {
                    Some(keys) => outcome.keys.extend(keys),
                    None => outcome.skipped_addresses += 1,
                }
                outcome
            })
    }

    /// Returns the unlocked keys of one address, or `None` if it has no
    /// active key or none of them unlocked.
    fn unlock_address(&self, address: &Address, passphrase: &[u8]) -> Option<Vec<C::Key>> {
        let active: Vec<_> = address.keys.iter().filter(|key| key.active).collect();
        if active.is_empty() {
            trace!(address_id = %address.id, "Skipping address, no active keys");
            return None;
        }

        let mut unlocked = Vec::with_capacity(active.len());
        for key in active {
            match self.crypto.unlock_key(&key.private_key, passphrase) {
                Ok(k) => unlocked.push(k),
                Err(e) => {
                    debug!(address_id = %address.id, key_id = %key.id, error = %e, "Address key did not unlock");
                }
            }
        }

        if unlocked.is_empty() {
            debug!(address_id = %address.id, "Skipping address, no key unlocked");
            return None;
        }
        Some(unlocked)
    }
}

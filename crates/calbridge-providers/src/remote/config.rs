//! Encrypted provider configuration.

use std::fmt;

use zeroize::Zeroizing;

/// The user's key passphrase.
///
/// The bytes are wiped when the value is dropped and never appear in `Debug`
/// output.
#[derive(Clone)]
pub struct Credentials {
    passphrase: Zeroizing<Vec<u8>>,
}

impl Credentials {
    pub fn new(passphrase: impl Into<Vec<u8>>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }

    pub fn passphrase(&self) -> &[u8] {
        &self.passphrase
    }

    pub fn is_empty(&self) -> bool {
        self.passphrase.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Configuration for the encrypted provider.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Passphrase used once to unlock the address keys.
    pub credentials: Credentials,

    /// Number of event records requested per page.
    pub page_size: usize,
}

impl RemoteConfig {
    /// Default page size for event listing.
    pub const DEFAULT_PAGE_SIZE: usize = 100;

    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the page size. Zero is raised to one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

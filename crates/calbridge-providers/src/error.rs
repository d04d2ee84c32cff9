//! Error types for calendar provider operations.
//!
//! Every provider operation returns either a complete result or exactly one
//! [`ProviderError`]. The [`ProviderErrorCode`] tells callers which stage of
//! the pipeline failed (key unlock, passphrase decrypt, part decode, parsing)
//! without them having to match on message text.

use std::fmt;
use thiserror::Error;

use crate::decrypt::DecryptError;
use crate::vcalendar::ParseError;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// A required collaborator (backend client, keyring source) is missing.
    Configuration,
    /// A caller-supplied argument violates a precondition.
    InvalidInput,
    /// A backend call failed.
    Upstream,
    /// Fetching a feed resource failed or returned a non-success status.
    Fetch,
    /// The backend returned no addresses for the account.
    NoAddresses,
    /// The calendar has no members.
    NoMembers,
    /// No address key could be unlocked with the given passphrase.
    NoUsableKeys,
    /// The calendar passphrase could not be decrypted with the address keys.
    PassphraseDecrypt,
    /// No calendar key could be unlocked with the calendar passphrase.
    CalendarKeyUnlock,
    /// An event part could not be decrypted or decoded.
    PartDecode,
    /// A signed event part has a missing or invalid signature.
    SignatureVerification,
    /// A timestamp is present but in no recognized form.
    InvalidTimestamp,
    /// The event text has no start timestamp.
    MissingStartTime,
    /// The operation is intentionally not implemented by this provider.
    NotSupported,
    /// The caller cancelled the operation.
    Cancelled,
}

impl ProviderErrorCode {
    /// Returns true if this error is transient and the operation may be retried.
    ///
    /// The providers never retry on their own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream | Self::Fetch)
    }

    /// Returns a stable machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration_error",
            Self::InvalidInput => "invalid_input",
            Self::Upstream => "upstream_error",
            Self::Fetch => "fetch_error",
            Self::NoAddresses => "no_addresses",
            Self::NoMembers => "no_members",
            Self::NoUsableKeys => "no_usable_keys",
            Self::PassphraseDecrypt => "passphrase_decrypt_error",
            Self::CalendarKeyUnlock => "calendar_key_unlock_error",
            Self::PartDecode => "part_decode_error",
            Self::SignatureVerification => "signature_verification_error",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::MissingStartTime => "missing_start_time",
            Self::NotSupported => "not_supported",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while interacting with a calendar provider.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The provider that generated this error (e.g., "proton", "ics").
    provider: Option<String>,
    /// Operation name for [`ProviderErrorCode::NotSupported`].
    operation: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            operation: None,
            source: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Configuration, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidInput, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Upstream, message)
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Fetch, message)
    }

    pub fn no_addresses(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NoAddresses, message)
    }

    pub fn no_members(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NoMembers, message)
    }

    pub fn no_usable_keys(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NoUsableKeys, message)
    }

    pub fn passphrase_decrypt(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::PassphraseDecrypt, message)
    }

    pub fn calendar_key_unlock(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::CalendarKeyUnlock, message)
    }

    /// Creates a cancellation error.
    pub fn cancelled() -> Self {
        Self::new(ProviderErrorCode::Cancelled, "operation cancelled by caller")
    }

    /// Creates a not-supported error carrying the operation name.
    pub fn not_supported(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        let mut err = Self::new(
            ProviderErrorCode::NotSupported,
            format!("{operation}: operation not supported by provider"),
        );
        err.operation = Some(operation);
        err
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Returns the unsupported operation's name, if this is a not-supported error.
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Returns true if this error is transient and may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Returns true if the caller cancelled the operation.
    pub fn is_cancelled(&self) -> bool {
        self.code == ProviderErrorCode::Cancelled
    }

    /// Returns true for an intentional capability gap rather than a failure.
    pub fn is_not_supported(&self) -> bool {
        self.code == ProviderErrorCode::NotSupported
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{provider}] ")?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<DecryptError> for ProviderError {
    fn from(err: DecryptError) -> Self {
        let code = match err {
            DecryptError::MissingKeyring(_) => ProviderErrorCode::InvalidInput,
            DecryptError::KeyPacket { .. } | DecryptError::PartDecode { .. } => {
                ProviderErrorCode::PartDecode
            }
            DecryptError::SignatureVerification { .. } => ProviderErrorCode::SignatureVerification,
        };
        Self::new(code, err.to_string()).with_source(err)
    }
}

impl From<ParseError> for ProviderError {
    fn from(err: ParseError) -> Self {
        let code = match err {
            ParseError::MissingStartTime => ProviderErrorCode::MissingStartTime,
            ParseError::InvalidTimestamp { .. } => ProviderErrorCode::InvalidTimestamp,
        };
        Self::new(code, err.to_string()).with_source(err)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// An opaque failure reported by a backend collaborator.
///
/// Backend clients (the remote calendar API, the feed fetcher) report every
/// failure this way; the providers decide which [`ProviderErrorCode`] it maps
/// to based on which call failed.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ClientError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_retryable() {
        assert!(ProviderErrorCode::Upstream.is_retryable());
        assert!(ProviderErrorCode::Fetch.is_retryable());
        assert!(!ProviderErrorCode::NoUsableKeys.is_retryable());
        assert!(!ProviderErrorCode::SignatureVerification.is_retryable());
        assert!(!ProviderErrorCode::Cancelled.is_retryable());
    }

    #[test]
    fn error_code_display() {
        assert_eq!(
            ProviderErrorCode::PassphraseDecrypt.as_str(),
            "passphrase_decrypt_error"
        );
        assert_eq!(ProviderErrorCode::NotSupported.to_string(), "not_supported");
    }

    #[test]
    fn not_supported_carries_operation() {
        let err = ProviderError::not_supported("create_event");
        assert_eq!(err.code(), ProviderErrorCode::NotSupported);
        assert_eq!(err.operation(), Some("create_event"));
        assert!(err.is_not_supported());
        assert!(err.message().contains("create_event"));
    }

    #[test]
    fn provider_error_display() {
        let err = ProviderError::no_members("calendar cal-1 has no members").with_provider("proton");
        let display = err.to_string();
        assert!(display.contains("[proton]"));
        assert!(display.contains("no_members"));
        assert!(display.contains("cal-1"));
    }

    #[test]
    fn provider_error_with_source() {
        use std::error::Error;
        let err = ProviderError::upstream("get addresses failed")
            .with_source(ClientError::new("connection reset"));
        assert!(err.is_retryable());
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "connection reset");
    }

    #[test]
    fn leaf_errors_map_to_codes() {
        use crate::decrypt::PartCategory;

        let err: ProviderError = DecryptError::SignatureVerification {
            category: PartCategory::Shared,
            index: 2,
            reason: "signature does not verify".into(),
        }
        .into();
        assert_eq!(err.code(), ProviderErrorCode::SignatureVerification);
        assert!(err.message().contains("shared part 2"));

        let err: ProviderError = DecryptError::MissingKeyring("calendar").into();
        assert_eq!(err.code(), ProviderErrorCode::InvalidInput);

        let err: ProviderError = ParseError::MissingStartTime.into();
        assert_eq!(err.code(), ProviderErrorCode::MissingStartTime);

        let err: ProviderError = ParseError::InvalidTimestamp {
            value: "soon".into(),
        }
        .into();
        assert_eq!(err.code(), ProviderErrorCode::InvalidTimestamp);
    }

    #[test]
    fn cancelled_is_distinguishable() {
        let err = ProviderError::cancelled();
        assert!(err.is_cancelled());
        assert!(!err.is_retryable());
    }
}

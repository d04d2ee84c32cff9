//! ICS feed provider configuration.

use std::time::Duration;
use url::Url;

/// Configuration for the ICS feed provider.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Location of the `.ics` resource.
    pub url: Url,

    /// Identifier of the single synthetic calendar.
    pub calendar_id: String,

    /// Display name of the synthetic calendar.
    pub calendar_name: String,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl FeedConfig {
    pub const DEFAULT_CALENDAR_ID: &'static str = "ics-default";

    pub const DEFAULT_CALENDAR_NAME: &'static str = "ICS feed (read-only)";

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Creates a new feed configuration for the given URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(url.as_ref())?;
        Ok(Self {
            url: parsed,
            calendar_id: Self::DEFAULT_CALENDAR_ID.to_string(),
            calendar_name: Self::DEFAULT_CALENDAR_NAME.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("calbridge/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    pub fn with_calendar_name(mut self, name: impl Into<String>) -> Self {
        self.calendar_name = name.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

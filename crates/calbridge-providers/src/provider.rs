//! CalendarProvider trait definition.
//!
//! This module defines the [`CalendarProvider`] trait, the one surface a
//! transport layer (REST, RPC, CLI) calls into. Two implementations exist:
//! the plain ICS feed and the encrypted remote calendar.
//!
//! Every operation takes a [`CancellationToken`]. Cancelling it aborts the
//! in-flight backend call and the operation fails with
//! [`ProviderErrorCode::Cancelled`](crate::ProviderErrorCode::Cancelled).

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use calbridge_core::{DomainCalendar, DomainEvent, EventMutation, TimeRange};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so callers can hold a
/// `Box<dyn CalendarProvider>` chosen at runtime.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Static description of what a provider can do.
///
/// Informational only: mutation attempts are rejected per operation
/// regardless of what this advertises.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapabilitySet {
    pub read_only: bool,
    pub write_supported: bool,
    pub shared_calendars: bool,
    pub attendees: bool,
    pub reminders: bool,
    pub recurrence: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl CapabilitySet {
    /// A read-only provider with no optional features.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    pub fn with_shared_calendars(mut self) -> Self {
        self.shared_calendars = true;
        self
    }

    pub fn with_attendees(mut self) -> Self {
        self.attendees = true;
        self
    }

    pub fn with_reminders(mut self) -> Self {
        self.reminders = true;
        self
    }

    pub fn with_recurrence(mut self) -> Self {
        self.recurrence = true;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// The two provider variants, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Plain ICS feed fetched over HTTP.
    Feed,
    /// Encrypted remote calendar.
    Encrypted,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feed => "ics",
            Self::Encrypted => "proton",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ics" => Ok(Self::Feed),
            "proton" => Ok(Self::Encrypted),
            other => Err(ProviderError::configuration(format!(
                "unknown provider {other:?} (expected \"ics\" or \"proton\")"
            ))),
        }
    }
}

/// The core abstraction for calendar providers.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; one instance serves concurrent
///   requests
/// - Pagination is internal; every call returns a complete result or one error
/// - No operation is retried internally
/// - The mutation methods default to [`ProviderErrorCode::NotSupported`]
///   carrying the operation name
///
/// [`ProviderErrorCode::NotSupported`]: crate::ProviderErrorCode::NotSupported
pub trait CalendarProvider: Send + Sync {
    /// Returns the name of this provider (`"ics"`, `"proton"`).
    fn name(&self) -> &str;

    fn capabilities(&self) -> CapabilitySet;

    /// Lists the calendars visible to this provider.
    fn list_calendars<'a>(
        &'a self,
        ctx: &'a CancellationToken,
    ) -> BoxFuture<'a, ProviderResult<Vec<DomainCalendar>>>;

    /// Lists the events of `calendar_id` that overlap `range`.
    ///
    /// An event is excluded when it ends strictly before `range.from` or
    /// starts strictly after `range.to`. Unset bounds impose no constraint.
    fn list_events<'a>(
        &'a self,
        ctx: &'a CancellationToken,
        calendar_id: &'a str,
        range: TimeRange,
    ) -> BoxFuture<'a, ProviderResult<Vec<DomainEvent>>>;

    fn create_event<'a>(
        &'a self,
        _ctx: &'a CancellationToken,
        _mutation: EventMutation,
    ) -> BoxFuture<'a, ProviderResult<DomainEvent>> {
        let err = ProviderError::not_supported("create_event").with_provider(self.name());
        Box::pin(async move { Err(err) })
    }

    fn update_event<'a>(
        &'a self,
        _ctx: &'a CancellationToken,
        _event_id: &'a str,
        _mutation: EventMutation,
    ) -> BoxFuture<'a, ProviderResult<DomainEvent>> {
        let err = ProviderError::not_supported("update_event").with_provider(self.name());
        Box::pin(async move { Err(err) })
    }

    fn delete_event<'a>(
        &'a self,
        _ctx: &'a CancellationToken,
        _event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        let err = ProviderError::not_supported("delete_event").with_provider(self.name());
        Box::pin(async move { Err(err) })
    }
}

/// Runs `fut` unless `ctx` is cancelled first.
pub(crate) async fn with_cancel<T>(
    ctx: &CancellationToken,
    fut: impl Future<Output = ProviderResult<T>>,
) -> ProviderResult<T> {
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(ProviderError::cancelled()),
        result = fut => result,
    }
}

/// Drops events outside `range`, returning how many were removed.
pub(crate) fn retain_in_range(events: &mut Vec<DomainEvent>, range: &TimeRange) -> usize {
    let before = events.len();
    events.retain(|event| range.admits(event.start, event.end));
    before - events.len()
}

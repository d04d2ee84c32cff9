//! Provider-agnostic calendar model.
//!
//! Every provider, whatever its backend looks like, emits these types:
//! - [`DomainCalendar`]: a calendar the user can list events from
//! - [`DomainEvent`]: a single decoded, normalized event
//! - [`EventMutation`]: the payload of a create/update request

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A calendar exposed by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCalendar {
    /// Unique identifier for the calendar (provider-specific).
    pub id: String,
    /// Human-readable name of the calendar.
    pub name: String,
    /// Whether the user may only read this calendar.
    pub read_only: bool,
    /// Whether the calendar is shared with (or subscribed from) someone else.
    pub shared: bool,
    /// Permissions the user holds, e.g. `read`, `write`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
}

impl DomainCalendar {
    /// Creates a read-only, unshared calendar with no explicit permissions.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            read_only: true,
            shared: false,
            permissions: Vec::new(),
        }
    }

    /// Builder method to set the read-only flag.
    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Builder method to set the shared flag.
    #[must_use]
    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// Builder method to set the permission list.
    #[must_use]
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }
}

/// A normalized calendar event.
///
/// `start <= end` is not guaranteed: source data may carry inverted ranges and
/// consumers must tolerate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique identifier for the event (provider-specific).
    pub id: String,
    /// The calendar this event belongs to.
    pub calendar_id: String,
    /// The event title/summary.
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    /// Start instant in UTC. Midnight UTC for all-day events.
    pub start: DateTime<Utc>,
    /// End instant in UTC. Midnight UTC for all-day events.
    pub end: DateTime<Utc>,
    /// Whether the event carries dates without a time-of-day component.
    pub all_day: bool,
    /// Raw recurrence rule (`RRULE` value), not expanded.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub recurrence: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reminders: Vec<String>,
    /// Last modification time reported by the backend, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DomainEvent {
    /// Creates a new event with the required fields; everything else empty.
    pub fn new(
        id: impl Into<String>,
        calendar_id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            title: title.into(),
            description: String::new(),
            location: String::new(),
            start,
            end,
            all_day: false,
            recurrence: String::new(),
            attendees: Vec::new(),
            reminders: Vec::new(),
            updated_at: None,
        }
    }

    /// Builder method to set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to set the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder method to set the all-day flag.
    #[must_use]
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    /// Builder method to set the recurrence rule.
    #[must_use]
    pub fn with_recurrence(mut self, rule: impl Into<String>) -> Self {
        self.recurrence = rule.into();
        self
    }

    /// Builder method to set the attendee list.
    #[must_use]
    pub fn with_attendees(mut self, attendees: Vec<String>) -> Self {
        self.attendees = attendees;
        self
    }

    /// Builder method to set the reminder list.
    #[must_use]
    pub fn with_reminders(mut self, reminders: Vec<String>) -> Self {
        self.reminders = reminders;
        self
    }

    /// Builder method to set the last modification time.
    #[must_use]
    pub fn with_updated_at(mut self, updated_at: Option<DateTime<Utc>>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Returns true if the event ends before it starts.
    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }
}

/// Input for creating or updating an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMutation {
    pub calendar_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub recurrence: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reminders: Vec<String>,
}

impl EventMutation {
    /// Creates a mutation with the required fields.
    pub fn new(
        calendar_id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            title: title.into(),
            description: String::new(),
            location: String::new(),
            start,
            end,
            all_day: false,
            recurrence: String::new(),
            attendees: Vec::new(),
            reminders: Vec::new(),
        }
    }
}

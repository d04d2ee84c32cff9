//! Core types: domain calendars and events, time ranges, tracing setup

pub mod domain;
pub mod time;
pub mod tracing;

pub use domain::{DomainCalendar, DomainEvent, EventMutation};
pub use time::{EventTime, TimeRange};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};

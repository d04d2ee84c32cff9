//! Backend client contract for the encrypted provider.
//!
//! The HTTP client and login flow live outside this crate. The provider only
//! needs the six reads below; each either returns the decoded records or a
//! [`ClientError`].

use crate::error::ClientError;
use crate::provider::BoxFuture;

use super::types::{
    Address, Calendar, CalendarKey, CalendarMember, CalendarPassphrase, RawEventRecord,
};

/// Result of a backend call.
pub type ClientResult<T> = Result<T, ClientError>;

/// Read access to the encrypted calendar backend.
pub trait RemoteCalendarClient: Send + Sync {
    /// The user's addresses with their locked keys.
    fn get_addresses(&self) -> BoxFuture<'_, ClientResult<Vec<Address>>>;

    fn get_calendars(&self) -> BoxFuture<'_, ClientResult<Vec<Calendar>>>;

    fn get_calendar_members<'a>(
        &'a self,
        calendar_id: &'a str,
    ) -> BoxFuture<'a, ClientResult<Vec<CalendarMember>>>;

    fn get_calendar_passphrase<'a>(
        &'a self,
        calendar_id: &'a str,
    ) -> BoxFuture<'a, ClientResult<CalendarPassphrase>>;

    fn get_calendar_keys<'a>(
        &'a self,
        calendar_id: &'a str,
    ) -> BoxFuture<'a, ClientResult<Vec<CalendarKey>>>;

    /// One page of event records. Pages are numbered from zero.
    fn get_calendar_events<'a>(
        &'a self,
        calendar_id: &'a str,
        page: usize,
        page_size: usize,
    ) -> BoxFuture<'a, ClientResult<Vec<RawEventRecord>>>;
}

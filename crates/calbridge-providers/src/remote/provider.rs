//! [`CalendarProvider`] over the encrypted remote calendar.

use std::sync::Arc;

use calbridge_core::{DomainCalendar, DomainEvent, TimeRange};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::crypto::{CryptoBackend, Keyring};
use crate::decrypt::EventDecryptor;
use crate::error::{ProviderError, ProviderResult};
use crate::keys::CalendarKeyResolver;
use crate::provider::{BoxFuture, CalendarProvider, CapabilitySet, retain_in_range};
use crate::vcalendar;

use super::client::RemoteCalendarClient;
use super::config::RemoteConfig;
use super::types::RawEventRecord;
use super::call_backend;

const PROVIDER_NAME: &str = "proton";

/// Title of the event emitted in place of a record that failed to decode.
pub const ENCRYPTED_PLACEHOLDER_TITLE: &str = "[encrypted]";

/// Read-only provider for the encrypted remote calendar.
///
/// Records that fail to decrypt or parse are not dropped: each becomes a
/// placeholder event titled [`ENCRYPTED_PLACEHOLDER_TITLE`], timed with the
/// backend's clear-text start and end, with the error code as description.
pub struct EncryptedProvider<C: CryptoBackend> {
    client: Option<Arc<dyn RemoteCalendarClient>>,
    resolver: CalendarKeyResolver<C>,
    decryptor: EventDecryptor<C>,
    page_size: usize,
}

impl<C: CryptoBackend> EncryptedProvider<C> {
    pub fn new(
        config: RemoteConfig,
        client: Option<Arc<dyn RemoteCalendarClient>>,
        crypto: Arc<C>,
    ) -> Self {
        Self {
            resolver: CalendarKeyResolver::new(
                client.clone(),
                Arc::clone(&crypto),
                config.credentials,
            ),
            decryptor: EventDecryptor::new(crypto),
            client,
            page_size: config.page_size.max(1),
        }
    }

    /// The keyring resolver backing this provider.
    pub fn resolver(&self) -> &CalendarKeyResolver<C> {
        &self.resolver
    }

    fn client(&self) -> ProviderResult<&Arc<dyn RemoteCalendarClient>> {
        self.client
            .as_ref()
            .ok_or_else(|| ProviderError::configuration("remote calendar client is not configured"))
    }

    async fn calendars(&self, ctx: &CancellationToken) -> ProviderResult<Vec<DomainCalendar>> {
        let client = self.client()?;
        let calendars = call_backend(ctx, "get calendars", client.get_calendars()).await?;

        let mut out = Vec::with_capacity(calendars.len());
        for calendar in calendars {
            let members = call_backend(
                ctx,
                "get calendar members",
                client.get_calendar_members(&calendar.id),
            )
            .await?;
            let writable = members.first().is_some_and(|m| m.permissions > 0);
            let permissions: &[&str] = if writable {
                &["read", "write"]
            } else {
                &["read"]
            };
            out.push(
                DomainCalendar::new(calendar.id, calendar.name)
                    .with_read_only(!writable)
                    .with_shared(!calendar.kind.is_normal())
                    .with_permissions(permissions.iter().copied()),
            );
        }

        debug!(count = out.len(), "Listed calendars");
        Ok(out)
    }

    async fn events(
        &self,
        ctx: &CancellationToken,
        calendar_id: &str,
        range: TimeRange,
    ) -> ProviderResult<Vec<DomainEvent>> {
        let client = self.client()?;
        if calendar_id.is_empty() {
            return Err(ProviderError::invalid_input("calendar id is required"));
        }

        let calendar_keyring = self.resolver.resolve_calendar_keyring(ctx, calendar_id).await?;
        let address_keyring = self.resolver.resolve_address_keyring(ctx).await?;

        let mut events = Vec::new();
        let mut degraded = 0usize;
        let mut page = 0usize;
        loop {
            let records = call_backend(
                ctx,
                "get calendar events",
                client.get_calendar_events(calendar_id, page, self.page_size),
            )
            .await?;
            let fetched = records.len();
            debug!(calendar_id, page, fetched, "Fetched event page");

            for record in &records {
                match self.decode_record(record, calendar_id, &calendar_keyring, &address_keyring) {
                    Ok(event) => events.push(event),
                    Err(err) => {
                        warn!(event_id = %record.id, code = %err.code(), "Event could not be decoded, emitting placeholder");
                        degraded += 1;
                        events.push(placeholder(record, calendar_id, &err));
                    }
                }
            }

            if fetched < self.page_size {
                break;
            }
            page += 1;
        }

        let total = events.len();
        let filtered = retain_in_range(&mut events, &range);
        info!(
            calendar_id,
            pages = page + 1,
            total,
            degraded,
            filtered,
            "Listed events"
        );
        Ok(events)
    }

    fn decode_record(
        &self,
        record: &RawEventRecord,
        calendar_id: &str,
        calendar_keyring: &Keyring<C::Key>,
        address_keyring: &Keyring<C::Key>,
    ) -> ProviderResult<DomainEvent> {
        let text =
            self.decryptor
                .decrypt_event(record, Some(calendar_keyring), Some(address_keyring))?;
        let fields = vcalendar::parse(&text.shared_text, &text.personal_text)?;

        Ok(DomainEvent::new(
            record.id.clone(),
            owning_calendar(record, calendar_id),
            fields.title,
            fields.start,
            fields.end,
        )
        .with_description(fields.description)
        .with_location(fields.location)
        .with_all_day(fields.all_day)
        .with_recurrence(fields.recurrence_rule)
        .with_attendees(fields.attendees)
        .with_reminders(fields.reminders)
        .with_updated_at(record.modified_at()))
    }
}

fn owning_calendar(record: &RawEventRecord, requested: &str) -> String {
    if record.calendar_id.is_empty() {
        requested.to_string()
    } else {
        record.calendar_id.clone()
    }
}

fn placeholder(record: &RawEventRecord, calendar_id: &str, err: &ProviderError) -> DomainEvent {
    DomainEvent::new(
        record.id.clone(),
        owning_calendar(record, calendar_id),
        ENCRYPTED_PLACEHOLDER_TITLE,
        record.start(),
        record.end(),
    )
    .with_all_day(record.full_day)
    .with_description(err.code().as_str())
    .with_updated_at(record.modified_at())
}

impl<C: CryptoBackend> CalendarProvider for EncryptedProvider<C> {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::read_only()
            .with_shared_calendars()
            .with_attendees()
            .with_reminders()
            .with_recurrence()
            .with_note("The encrypted provider is read-only.")
    }

    fn list_calendars<'a>(
        &'a self,
        ctx: &'a CancellationToken,
    ) -> BoxFuture<'a, ProviderResult<Vec<DomainCalendar>>> {
        Box::pin(async move {
            self.calendars(ctx)
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }

    fn list_events<'a>(
        &'a self,
        ctx: &'a CancellationToken,
        calendar_id: &'a str,
        range: TimeRange,
    ) -> BoxFuture<'a, ProviderResult<Vec<DomainEvent>>> {
        Box::pin(async move {
            self.events(ctx, calendar_id, range)
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }
}

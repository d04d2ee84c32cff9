//! [`CalendarProvider`] over a plain ICS feed.

use std::sync::Arc;

use calbridge_core::{DomainCalendar, DomainEvent, TimeRange};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CalendarProvider, CapabilitySet, retain_in_range, with_cancel};

use super::client::FeedFetcher;
use super::config::FeedConfig;
use super::ics;

const PROVIDER_NAME: &str = "ics";

/// Read-only provider exposing one feed as a single calendar.
pub struct FeedProvider {
    config: FeedConfig,
    fetcher: Arc<dyn FeedFetcher>,
}

impl FeedProvider {
    pub fn new(config: FeedConfig, fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Creates a provider fetching over HTTP(S).
    pub fn http(config: FeedConfig) -> ProviderResult<Self> {
        let fetcher = super::client::HttpFeedFetcher::new(&config)?;
        Ok(Self::new(config, Arc::new(fetcher)))
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    async fn fetch_text(&self, ctx: &CancellationToken) -> ProviderResult<String> {
        let url = &self.config.url;
        let response = with_cancel(ctx, async {
            self.fetcher.fetch(url).await.map_err(|e| {
                ProviderError::fetch(format!("failed to fetch feed {url}: {e}")).with_source(e)
            })
        })
        .await?;

        if response.status != 200 {
            return Err(ProviderError::fetch(format!(
                "feed {url} returned status {}",
                response.status
            )));
        }
        Ok(response.body)
    }

    async fn events(
        &self,
        ctx: &CancellationToken,
        calendar_id: &str,
        range: TimeRange,
    ) -> ProviderResult<Vec<DomainEvent>> {
        let calendar_id = if calendar_id.is_empty() {
            self.config.calendar_id.as_str()
        } else {
            calendar_id
        };

        let body = self.fetch_text(ctx).await?;
        let parsed = ics::parse_feed(&body, calendar_id);
        let mut events = parsed.events;

        let total = events.len();
        let filtered = retain_in_range(&mut events, &range);
        info!(
            calendar_id,
            total,
            dropped = parsed.dropped,
            filtered,
            "Listed feed events"
        );
        Ok(events)
    }
}

impl CalendarProvider for FeedProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::read_only().with_note("The ICS feed is read-only.")
    }

    fn list_calendars<'a>(
        &'a self,
        _ctx: &'a CancellationToken,
    ) -> BoxFuture<'a, ProviderResult<Vec<DomainCalendar>>> {
        Box::pin(async move {
            debug!(calendar_id = %self.config.calendar_id, "Listing synthetic feed calendar");
            Ok(vec![
                DomainCalendar::new(&self.config.calendar_id, &self.config.calendar_name)
                    .with_read_only(true)
                    .with_permissions(["read"]),
            ])
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, ProviderErrorCode};
    use crate::feed::FeedResponse;
    use calbridge_core::EventMutation;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    const FEED: &str = "BEGIN:VCALENDAR\r\n\
        VERSION:2.0\r\n\
        BEGIN:VTIMEZONE\r\nTZID:Europe/Berlin\r\nEND:VTIMEZONE\r\n\
        BEGIN:VEVENT\r\n\
        UID:holiday-1\r\n\
        DTSTART;VALUE=DATE:20260216\r\n\
        DTEND;VALUE=DATE:20260217\r\n\
        SUMMARY:Company holiday\r\n\
        END:VEVENT\r\n\
        BEGIN:VEVENT\r\n\
        UID:sync-1\r\n\
        DTSTART;TZID=Europe/Berlin:20260216T090000\r\n\
        DTEND;TZID=America/New_York:20260216T040000\r\n\
        SUMMARY:Cross-te\r\n am sync\r\n\
        BEGIN:VALARM\r\nTRIGGER:-PT10M\r\nDESCRIPTION:Alarm\r\nEND:VALARM\r\n\
        END:VEVENT\r\n\
        BEGIN:VEVENT\r\n\
        SUMMARY:No identifier\r\n\
        DTSTART:20260216T120000Z\r\n\
        END:VEVENT\r\n\
        END:VCALENDAR\r\n";

    enum Reply {
        Body(u16, &'static str),
        Transport,
        Hang,
    }

    struct FakeFetcher {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl FeedFetcher for FakeFetcher {
        fn fetch<'a>(
            &'a self,
            _url: &'a Url,
        ) -> BoxFuture<'a, Result<FeedResponse, ClientError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                match self.reply {
                    Reply::Body(status, body) => Ok(FeedResponse {
                        status,
                        body: body.to_string(),
                    }),
                    Reply::Transport => Err(ClientError::new("connection refused")),
                    Reply::Hang => std::future::pending().await,
                }
            })
        }
    }

    fn setup(reply: Reply) -> (FeedProvider, Arc<FakeFetcher>) {
        let fetcher = Arc::new(FakeFetcher {
            reply,
            calls: AtomicUsize::new(0),
        });
        let config = FeedConfig::new("https://calendar.example.com/team.ics").unwrap();
        (FeedProvider::new(config, fetcher.clone()), fetcher)
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[tokio::test]
    async fn lists_feed_events() {
        let (provider, fetcher) = setup(Reply::Body(200, FEED));
        let ctx = CancellationToken::new();

        let events = provider
            .list_events(&ctx, "", TimeRange::unbounded())
            .await
            .unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(events.len(), 2);

        let holiday = &events[0];
        assert_eq!(holiday.id, "holiday-1");
        assert_eq!(holiday.calendar_id, "ics-default");
        assert!(holiday.all_day);
        assert_eq!(holiday.start, at("2026-02-16T00:00:00Z"));
        assert_eq!(holiday.end, at("2026-02-17T00:00:00Z"));

        let sync = &events[1];
        assert!(!sync.all_day);
        assert_eq!(sync.title, "Cross-team sync");
        assert_eq!(sync.description, "");
        assert_eq!(sync.start, at("2026-02-16T08:00:00Z"));
        assert_eq!(sync.end, at("2026-02-16T09:00:00Z"));
        assert!(events.iter().all(|e| e.end >= e.start));
    }

    #[tokio::test]
    async fn explicit_calendar_id_is_kept() {
        let (provider, _) = setup(Reply::Body(200, FEED));
        let ctx = CancellationToken::new();

        let events = provider
            .list_events(&ctx, "mine", TimeRange::unbounded())
            .await
            .unwrap();
        assert!(events.iter().all(|e| e.calendar_id == "mine"));
    }

    #[tokio::test]
    async fn filters_by_range() {
        let (provider, _) = setup(Reply::Body(200, FEED));
        let ctx = CancellationToken::new();
        let range = TimeRange::unbounded().with_from(at("2026-02-16T08:30:00Z"));

        let events = provider.list_events(&ctx, "", range).await.unwrap();
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["holiday-1", "sync-1"]);

        let range = TimeRange::unbounded().with_from(at("2026-02-16T09:30:00Z"));
        let events = provider.list_events(&ctx, "", range).await.unwrap();
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["holiday-1"]);

        let range = TimeRange::unbounded().with_to(at("2026-02-15T00:00:00Z"));
        assert!(provider.list_events(&ctx, "", range).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_ok_status_is_fetch_error() {
        let (provider, _) = setup(Reply::Body(404, "not found"));
        let ctx = CancellationToken::new();

        let err = provider
            .list_events(&ctx, "", TimeRange::unbounded())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::Fetch);
        assert_eq!(err.provider(), Some("ics"));
        assert!(err.message().contains("404"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn transport_failure_is_fetch_error() {
        let (provider, _) = setup(Reply::Transport);
        let ctx = CancellationToken::new();

        let err = provider
            .list_events(&ctx, "", TimeRange::unbounded())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::Fetch);
        assert!(err.message().contains("connection refused"));
    }

    #[tokio::test]
    async fn cancellation_interrupts_fetch() {
        let (provider, _) = setup(Reply::Hang);
        let ctx = CancellationToken::new();

        let list = provider.list_events(&ctx, "", TimeRange::unbounded());
        let cancel = async {
            tokio::task::yield_now().await;
            ctx.cancel();
        };
        let (result, ()) = tokio::join!(list, cancel);

        let err = result.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.provider(), Some("ics"));
    }

    #[tokio::test]
    async fn single_synthetic_calendar() {
        let (provider, fetcher) = setup(Reply::Body(200, FEED));
        let ctx = CancellationToken::new();

        let calendars = provider.list_calendars(&ctx).await.unwrap();
        assert_eq!(calendars.len(), 1);
        assert_eq!(calendars[0].id, "ics-default");
        assert_eq!(calendars[0].name, "ICS feed (read-only)");
        assert!(calendars[0].read_only);
        assert!(!calendars[0].shared);
        assert_eq!(calendars[0].permissions, ["read"]);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mutations_not_supported() {
        let (provider, _) = setup(Reply::Body(200, FEED));
        let ctx = CancellationToken::new();
        let mutation = EventMutation::new(
            "ics-default",
            "New",
            at("2026-02-16T09:00:00Z"),
            at("2026-02-16T10:00:00Z"),
        );

        let err = provider.create_event(&ctx, mutation.clone()).await.unwrap_err();
        assert!(err.is_not_supported());
        assert_eq!(err.provider(), Some("ics"));
        assert!(provider.update_event(&ctx, "x", mutation).await.unwrap_err().is_not_supported());
        assert!(provider.delete_event(&ctx, "x").await.unwrap_err().is_not_supported());
    }

    #[test]
    fn capabilities_are_read_only() {
        let (provider, _) = setup(Reply::Body(200, FEED));
        let caps = provider.capabilities();
        assert!(caps.read_only);
        assert!(!caps.write_supported);
        assert!(!caps.shared_calendars);
        assert!(!caps.attendees);
        assert_eq!(provider.name(), "ics");
    }
}

//! VEVENT extraction from feed text.
//!
//! Feed data is never encrypted. The feed is read with the `icalendar`
//! parser; each `VEVENT` found at the top level or inside a `VCALENDAR` is
//! then handed to the shared calendar text building blocks. Properties of
//! nested components (`VALARM`) are not part of the event.

use calbridge_core::DomainEvent;
use icalendar::parser::{Component, Property, read_calendar, unfold};
use tracing::{debug, warn};

use crate::vcalendar::{self, ContentLine};

/// Events read from a feed, plus how many `VEVENT` blocks were unusable.
#[derive(Debug, Default)]
pub struct FeedEvents {
    pub events: Vec<DomainEvent>,
    pub dropped: usize,
}

/// Parses every `VEVENT` of `text` into events of `calendar_id`.
///
/// Blocks without a `UID` or without a readable `DTSTART` are dropped and
/// counted. Text that is not iCalendar at all yields no events.
pub fn parse_feed(text: &str, calendar_id: &str) -> FeedEvents {
    let unfolded = unfold(text);
    let calendar = match read_calendar(&unfolded) {
        Ok(calendar) => calendar,
        Err(e) => {
            warn!(error = %e, "Feed is not valid iCalendar");
            return FeedEvents::default();
        }
    };

    let mut vevents = Vec::new();
    collect_vevents(&calendar.components, &mut vevents);

    let mut out = FeedEvents::default();
    for vevent in vevents {
        let lines: Vec<ContentLine> = vevent.properties.iter().map(content_line).collect();

        let Some(uid) = lines
            .iter()
            .find(|line| line.name == "UID" && !line.value.trim().is_empty())
            .map(|line| line.value.trim().to_string())
        else {
            debug!("Dropping VEVENT without UID");
            out.dropped += 1;
            continue;
        };

        match vcalendar::parse_content_lines(&lines, &[]) {
            Ok(fields) => out.events.push(
                DomainEvent::new(uid, calendar_id, fields.title, fields.start, fields.end)
                    .with_description(fields.description)
                    .with_location(fields.location)
                    .with_all_day(fields.all_day),
            ),
            Err(e) => {
                debug!(uid = %uid, error = %e, "Dropping unreadable VEVENT");
                out.dropped += 1;
            }
        }
    }
    out
}

/// Collects `VEVENT` components, descending into `VCALENDAR` wrappers only.
fn collect_vevents<'c, 'a>(components: &'c [Component<'a>], out: &mut Vec<&'c Component<'a>>) {
    for component in components {
        let name = component.name.as_ref();
        if name.eq_ignore_ascii_case("VEVENT") {
            out.push(component);
        } else if name.eq_ignore_ascii_case("VCALENDAR") {
            collect_vevents(&component.components, out);
        }
    }
}

fn content_line(property: &Property<'_>) -> ContentLine {
    ContentLine {
        name: property.name.as_ref().to_ascii_uppercase(),
        params: property
            .params
            .iter()
            .map(|param| {
                let value = param
                    .val
                    .as_ref()
                    .map(|v| v.as_ref().trim_matches('"').to_string())
                    .unwrap_or_default();
                (param.key.as_ref().to_ascii_uppercase(), value)
            })
            .collect(),
        value: property.val.to_string(),
    }
}

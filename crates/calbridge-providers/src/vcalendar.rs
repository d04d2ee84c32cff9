//! Calendar text parsing.
//!
//! Decoded event bodies and ICS feeds share the same line-oriented text
//! format: folded content lines of the form `NAME;PARAM=VALUE:VALUE`. This
//! module provides the small set of building blocks both providers need:
//!
//! - [`unfold_lines`] joins folded continuation lines
//! - [`ContentLine::parse`] splits a logical line into name, parameters and value
//! - [`parse_timestamp`] reads the three timestamp literal forms
//! - [`parse`] extracts [`ParsedEventFields`] from a shared and a personal body
//!
//! Parsing is pure. The only failures are a missing or unreadable `DTSTART`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::{trace, warn};

use calbridge_core::EventTime;

/// Errors produced while parsing calendar text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The event text has no `DTSTART` line.
    #[error("event text has no DTSTART")]
    MissingStartTime,

    /// A timestamp literal is in none of the recognized forms.
    #[error("invalid timestamp {value:?}")]
    InvalidTimestamp { value: String },
}

/// Structured fields extracted from decoded event text.
///
/// `start <= end` is not enforced: source data may carry inverted ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEventFields {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    /// Raw `RRULE` value, not expanded.
    pub recurrence_rule: String,
    pub attendees: Vec<String>,
    pub reminders: Vec<String>,
}

/// A logical content line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Upper-cased property name.
    pub name: String,
    /// Parameters in source order, names upper-cased, values unquoted.
    pub params: Vec<(String, String)>,
    pub value: String,
}

impl ContentLine {
    /// Parses `NAME[;PARAM=VALUE...]:VALUE`.
    ///
    /// The value starts after the first colon that is not inside a quoted
    /// parameter value. Returns `None` for lines without a colon or name.
    pub fn parse(line: &str) -> Option<Self> {
        let split = find_unquoted(line, ':')?;
        let (head, value) = (&line[..split], &line[split + 1..]);

        let mut segments = split_unquoted(head, ';').into_iter();
        let name = segments.next()?.trim().to_ascii_uppercase();
        if name.is_empty() {
            return None;
        }

        let params = segments
            .filter_map(|segment| {
                let (key, val) = segment.split_once('=')?;
                Some((
                    key.trim().to_ascii_uppercase(),
                    val.trim().trim_matches('"').to_string(),
                ))
            })
            .collect();

        Some(Self {
            name,
            params,
            value: value.to_string(),
        })
    }

    /// Returns the first value of parameter `name` (case-insensitive).
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parses the value as a timestamp, honoring a `TZID` parameter.
    pub fn timestamp(&self) -> Result<EventTime, ParseError> {
        parse_timestamp(&self.value, self.param("TZID"))
    }
}

fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut quoted = false;
    for (idx, c) in s.char_indices() {
        match c {
            '"' => quoted = !quoted,
            c if c == needle && !quoted => return Some(idx),
            _ => {}
        }
    }
    None
}

fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = s;
    while let Some(idx) = find_unquoted(rest, sep) {
        out.push(&rest[..idx]);
        rest = &rest[idx + 1..];
    }
    out.push(rest);
    out
}

/// Normalizes line endings and joins folded lines.
///
/// A line starting with a space or tab continues the previous logical line
/// with its leading whitespace removed. Blank lines are dropped and other
/// lines are trimmed.
pub fn unfold_lines(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    let mut out: Vec<String> = Vec::new();
    for line in normalized.split('\n') {
        if (line.starts_with(' ') || line.starts_with('\t'))
            && let Some(last) = out.last_mut()
        {
            last.push_str(line.trim_start_matches([' ', '\t']));
            continue;
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// Unfolds `text` and parses every logical line, skipping unparseable ones.
pub fn content_lines(text: &str) -> Vec<ContentLine> {
    unfold_lines(text)
        .iter()
        .filter_map(|line| ContentLine::parse(line))
        .collect()
}

/// Parses a timestamp literal.
///
/// Accepted forms:
/// - `YYYYMMDD`: a date, yielding [`EventTime::AllDay`]
/// - `YYYYMMDDTHHMMSSZ`: a UTC instant
/// - `YYYYMMDDTHHMMSS`: a local instant in `tzid`, or UTC when `tzid` is absent
///
/// An unknown `tzid` is logged and the wall clock is read as UTC.
pub fn parse_timestamp(value: &str, tzid: Option<&str>) -> Result<EventTime, ParseError> {
    let value = value.trim();
    let invalid = || ParseError::InvalidTimestamp {
        value: value.to_string(),
    };

    if value.len() == 8 {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .map(EventTime::AllDay)
            .map_err(|_| invalid());
    }

    if let Some(utc) = value.strip_suffix(['Z', 'z']) {
        let naive = parse_naive_datetime(utc).ok_or_else(invalid)?;
        return Ok(EventTime::from_utc(Utc.from_utc_datetime(&naive)));
    }

    let naive = parse_naive_datetime(value).ok_or_else(invalid)?;
    let utc = match tzid.map(str::trim).filter(|t| !t.is_empty()) {
        Some(tzid) => match tzid.trim_start_matches('/').parse::<Tz>() {
            Ok(tz) => localize(tz, naive),
            Err(_) => {
                warn!(tzid = %tzid, "Unknown TZID, reading time as UTC");
                Utc.from_utc_datetime(&naive)
            }
        },
        None => Utc.from_utc_datetime(&naive),
    };
    Ok(EventTime::from_utc(utc))
}

fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    if value.len() != 15 {
        return None;
    }
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()
}

/// Interprets `naive` as wall-clock time in `tz`.
///
/// Ambiguous times resolve to the earlier instant. Times inside a DST gap use
/// the offset in force just before the gap.
fn localize(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return dt.with_timezone(&Utc);
    }
    let offset = (1..=48)
        .find_map(|hours| {
            tz.from_local_datetime(&(naive - TimeDelta::hours(hours)))
                .earliest()
        })
        .map(|before| before.offset().fix().local_minus_utc())
        .unwrap_or(0);
    trace!(tz = %tz, offset, "Local time falls in a DST gap");
    Utc.from_utc_datetime(&(naive - TimeDelta::seconds(i64::from(offset))))
}

/// Undoes RFC 5545 TEXT escaping.
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(escaped @ (',' | ';' | '\\')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Parses decoded event text into structured fields.
///
/// Scalar fields, `ATTENDEE` and `DTSTART` come from `shared_text`.
/// `TRIGGER` lines come from `personal_text`.
pub fn parse(shared_text: &str, personal_text: &str) -> Result<ParsedEventFields, ParseError> {
    parse_content_lines(&content_lines(shared_text), &content_lines(personal_text))
}

/// Like [`parse`], over lines that were already unfolded and split.
pub fn parse_content_lines(
    shared: &[ContentLine],
    personal: &[ContentLine],
) -> Result<ParsedEventFields, ParseError> {
    // First non-empty occurrence of a scalar wins.
    let first = |name: &str| {
        shared
            .iter()
            .find(|line| line.name == name && !line.value.trim().is_empty())
    };
    let text = |name: &str| {
        first(name)
            .map(|line| unescape_text(&line.value))
            .unwrap_or_default()
    };
    let all = |lines: &[ContentLine], name: &str| -> Vec<String> {
        lines
            .iter()
            .filter(|line| line.name == name)
            .map(|line| line.value.clone())
            .collect()
    };

    let start = first("DTSTART")
        .ok_or(ParseError::MissingStartTime)?
        .timestamp()?;
    let end = match first("DTEND").map(ContentLine::timestamp) {
        Some(Ok(end)) => end,
        Some(Err(err)) => {
            trace!(error = %err, "Ignoring unreadable DTEND");
            start
        }
        None => start,
    };

    Ok(ParsedEventFields {
        title: text("SUMMARY"),
        description: text("DESCRIPTION"),
        location: text("LOCATION"),
        start: start.to_utc_datetime(),
        end: end.to_utc_datetime(),
        all_day: start.is_all_day(),
        recurrence_rule: first("RRULE")
            .map(|line| line.value.clone())
            .unwrap_or_default(),
        attendees: all(shared, "ATTENDEE"),
        reminders: all(personal, "TRIGGER"),
    })
}

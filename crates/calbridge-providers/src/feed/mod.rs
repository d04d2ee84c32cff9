//! Read-only provider over a plain ICS feed.
//!
//! The feed is fetched on every `list_events` call and exposed as a single
//! synthetic calendar. Nothing is decrypted or cached.

mod client;
mod config;
mod ics;
mod provider;

pub use client::{FeedFetcher, FeedResponse, HttpFeedFetcher};
pub use config::FeedConfig;
pub use ics::{FeedEvents, parse_feed};
pub use provider::FeedProvider;

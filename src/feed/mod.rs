//! Feed retrieval for feedwatch.
//!
//! This module fetches the watched feed and turns it into a snapshot the
//! selection logic can rank.

pub mod fetcher;
pub mod types;

pub use fetcher::{parse_feed, FeedFetcher, FeedSource};
pub use types::{FeedEntry, FeedSnapshot, MAX_FEED_SIZE};

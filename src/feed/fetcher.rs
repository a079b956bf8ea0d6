//! Feed fetcher.
//!
//! Retrieves the watched feed over HTTP and parses it into a
//! [`FeedSnapshot`]. RSS 2.0, RSS 1.0 and Atom are all accepted.

use std::time::Duration;

use async_trait::async_trait;
use feed_rs::model::Link;
use feed_rs::parser;
use reqwest::Client;
use tracing::debug;

use crate::config::FeedConfig;
use crate::error::{Result, WatchError};
use crate::feed::types::{FeedEntry, FeedSnapshot};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Source of feed snapshots for the watch loop.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current state of the feed.
    async fn fetch(&self) -> Result<FeedSnapshot>;
}

/// HTTP feed fetcher for a single configured URL.
pub struct FeedFetcher {
    client: Client,
    url: String,
    max_feed_size: u64,
}

impl FeedFetcher {
    /// Create a fetcher from the feed configuration.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| WatchError::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            max_feed_size: config.max_feed_size_bytes,
        })
    }

    /// The URL this fetcher polls.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch(&self) -> Result<FeedSnapshot> {
        debug!("Fetching feed {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| WatchError::Fetch(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(WatchError::Fetch(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(WatchError::Fetch(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_feed_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WatchError::Fetch(format!("failed to read response: {}", e)))?;

        if bytes.len() as u64 > self.max_feed_size {
            return Err(WatchError::Fetch(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_feed_size
            )));
        }

        parse_feed(&bytes)
    }
}

/// Parse feed bytes into a snapshot.
///
/// Leading whitespace before the XML declaration is tolerated.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedSnapshot> {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());

    let feed = parser::parse(&bytes[start..])
        .map_err(|e| WatchError::Parse(format!("failed to parse feed: {}", e)))?;

    let title = feed
        .title
        .map(|t| t.content)
        .unwrap_or_else(|| "Untitled Feed".to_string());

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| FeedEntry {
            title: entry.title.map(|t| t.content),
            link: permalink(entry.links),
            published: entry.published,
            updated: entry.updated,
        })
        .collect();

    Ok(FeedSnapshot { title, entries })
}

/// Choose the entry permalink: the first `alternate` (or unlabelled) link,
/// else the first link of any kind.
fn permalink(links: Vec<Link>) -> Option<String> {
    let alternate = links
        .iter()
        .position(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"));
    links
        .into_iter()
        .nth(alternate.unwrap_or(0))
        .map(|l| l.href)
}

//! Feed snapshot types.

use chrono::{DateTime, Utc};

/// Maximum feed size in bytes (5MB).
pub const MAX_FEED_SIZE: u64 = 5 * 1024 * 1024;

/// A single entry as it appeared in the fetched feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    /// Entry title, if the feed carried one.
    pub title: Option<String>,
    /// Permalink of the entry.
    pub link: Option<String>,
    /// When the entry was published.
    pub published: Option<DateTime<Utc>>,
    /// When the entry was last updated.
    pub updated: Option<DateTime<Utc>>,
}

impl FeedEntry {
    /// Create an entry with a title and link.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            link: Some(link.into()),
            published: None,
            updated: None,
        }
    }

    /// Set the published time.
    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }

    /// Set the updated time.
    pub fn with_updated(mut self, updated: DateTime<Utc>) -> Self {
        self.updated = Some(updated);
        self
    }

    /// Title, or the empty string when absent.
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Link, or the empty string when absent.
    pub fn link_or_empty(&self) -> &str {
        self.link.as_deref().unwrap_or("")
    }

    /// Sort key in Unix seconds: published, else updated, else 0.
    pub fn timestamp(&self) -> i64 {
        self.published
            .or(self.updated)
            .map(|dt| dt.timestamp())
            .unwrap_or(0)
    }

    /// Published time as display text, empty when unknown.
    pub fn published_text(&self) -> String {
        self.published
            .map(|dt| dt.to_rfc2822())
            .unwrap_or_default()
    }
}

/// The parsed contents of one fetch.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    /// Feed title.
    pub title: String,
    /// Entries in document order.
    pub entries: Vec<FeedEntry>,
}

impl FeedSnapshot {
    /// Create a snapshot from a list of entries.
    pub fn new(title: impl Into<String>, entries: Vec<FeedEntry>) -> Self {
        Self {
            title: title.into(),
            entries,
        }
    }
}

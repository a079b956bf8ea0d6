//! Feed snapshot ranking.
//!
//! Orders eligible entries by recency and then by id, and picks the first
//! one that is newer than the watermark. Feed document order is ignored;
//! the id only decides between equal (or missing) timestamps.

use crate::feed::FeedEntry;

use super::eligibility::is_eligible;
use super::identifier::extract_id;

/// An eligible entry with a usable status id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Trimmed entry title.
    pub title: String,
    /// Status id extracted from the permalink.
    pub id: u64,
    /// Published time as display text, empty when unknown.
    pub published: String,
    /// Unix seconds used for ordering, 0 when the entry has no time.
    pub timestamp: i64,
}

impl Candidate {
    /// Build a candidate from an entry, if it is eligible and has an id.
    pub fn from_entry(entry: &FeedEntry) -> Option<Self> {
        let title = entry.title_or_empty().trim();
        if !is_eligible(title) {
            return None;
        }
        let id = extract_id(entry.link_or_empty())?;

        Some(Self {
            title: title.to_string(),
            id,
            published: entry.published_text(),
            timestamp: entry.timestamp(),
        })
    }

    fn sort_key(&self) -> (i64, u64) {
        (self.timestamp, self.id)
    }
}

/// Collect candidates sorted newest first by (timestamp, id).
pub fn collect_candidates(entries: &[FeedEntry]) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = entries.iter().filter_map(Candidate::from_entry).collect();
    candidates.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
    candidates
}

/// Pick the newest eligible entry whose id exceeds `watermark`.
///
/// With no watermark the newest candidate is returned.
pub fn pick_newest_eligible(entries: &[FeedEntry], watermark: Option<u64>) -> Option<Candidate> {
    collect_candidates(entries)
        .into_iter()
        .find(|c| watermark.map_or(true, |w| c.id > w))
}

//! feedwatch - single-feed RSS watcher
//!
//! Polls one RSS/Atom feed, picks the newest eligible status not yet seen,
//! posts its canonical link to a receiver and records a watermark so each
//! status is reported at most once. Also ships the relay receiver that turns
//! those posts into chat webhook messages.

pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod notify;
pub mod relay;
pub mod select;
pub mod watcher;
pub mod watermark;

pub use config::Config;
pub use error::{Result, WatchError};
pub use feed::{parse_feed, FeedEntry, FeedFetcher, FeedSnapshot, FeedSource};
pub use notify::{HttpNotifier, Notifier};
pub use relay::{create_router, LatestPost, RelayServer, RelayState};
pub use select::{
    collect_candidates, extract_id, is_eligible, normalize_link, pick_newest_eligible, Candidate,
};
pub use watcher::{CycleOutcome, WatchSettings, WatchState, Watcher};
pub use watermark::WatermarkStore;

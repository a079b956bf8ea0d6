//! Candidate selection for feedwatch.
//!
//! Decides which feed entry, if any, is new enough to notify:
//! - identifier: status id extraction and canonical links
//! - eligibility: retweet/reply filtering by title
//! - ranker: ordering and watermark comparison

pub mod eligibility;
pub mod identifier;
pub mod ranker;

pub use eligibility::is_eligible;
pub use identifier::{extract_id, normalize_link};
pub use ranker::{collect_candidates, pick_newest_eligible, Candidate};

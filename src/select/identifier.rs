//! Status identifier extraction and link normalization.

use std::sync::LazyLock;

use regex::Regex;

static RE_STATUS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/status/([0-9]+)").expect("valid status id pattern"));

/// Extract the numeric status id from a permalink.
///
/// Uses the first `/status/<digits>` occurrence (case-insensitive). Returns
/// `None` when the link has no such segment or the digits overflow `u64`.
pub fn extract_id(link: &str) -> Option<u64> {
    RE_STATUS_ID
        .captures(link)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Build the canonical permalink for a status id.
///
/// The link is always rebuilt from the id, never copied from the feed.
pub fn normalize_link(domain: &str, account: &str, id: u64) -> String {
    format!("https://{domain}/{account}/status/{id}")
}

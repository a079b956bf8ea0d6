//! Title-based eligibility filter.

use std::sync::LazyLock;

use regex::Regex;

/// Retweets (`RT ...`) and replies (`R to @user: ...`).
static RE_SKIP_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(RT\b|R to\s)").expect("valid skip title pattern"));

/// Check whether an entry with this title may be notified.
///
/// The title is trimmed first. Empty titles are eligible.
pub fn is_eligible(title: &str) -> bool {
    !RE_SKIP_TITLE.is_match(title.trim())
}

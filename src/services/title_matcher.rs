//! Decide whether a library title was watched recently
//!
//! Library titles and history titles come from different systems, so the
//! comparison is loose: exact match after lowercasing, then substring
//! containment in either direction, then a short table of per-title
//! overrides. Containment ignores word boundaries, so "Up" matches
//! "cupcake wars".

use crate::services::watch_history::WatchIndex;

/// A title that counts as watched whenever any history key contains
/// `required_substring`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleOverride {
    /// Compared case-sensitively against the untouched library title.
    pub exact_title: &'static str,
    /// Searched for in the lowercased history keys.
    pub required_substring: &'static str,
}

/// Overrides applied after the generic rules.
// Kept as-is until someone confirms whether this rule is still wanted.
pub const TITLE_OVERRIDES: &[TitleOverride] = &[TitleOverride {
    exact_title: "Supernatural",
    required_substring: "supernatural",
}];

/// How a candidate was matched to the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    /// Lowercased title is a history key
    Exact,
    /// Lowercased title occurs inside this history key
    CandidateInWatched(String),
    /// This history key occurs inside the lowercased title
    WatchedInCandidate(String),
    /// An override rule fired on this history key
    Override(String),
}

impl MatchKind {
    /// The history key responsible for the match, if it differs from the candidate.
    pub fn matched_key(&self) -> Option<&str> {
        match self {
            MatchKind::Exact => None,
            MatchKind::CandidateInWatched(key)
            | MatchKind::WatchedInCandidate(key)
            | MatchKind::Override(key) => Some(key),
        }
    }
}

/// `true` if `candidate_title` counts as watched within the index's window.
pub fn is_recently_watched(candidate_title: &str, index: &WatchIndex) -> bool {
    find_watch_match(candidate_title, index).is_some()
}

/// First matching rule for `candidate_title`, using [`TITLE_OVERRIDES`].
pub fn find_watch_match(candidate_title: &str, index: &WatchIndex) -> Option<MatchKind> {
    find_watch_match_with(candidate_title, index, TITLE_OVERRIDES)
}

/// First matching rule for `candidate_title` with an explicit override table.
pub fn find_watch_match_with(
    candidate_title: &str,
    index: &WatchIndex,
    overrides: &[TitleOverride],
) -> Option<MatchKind> {
    let candidate = candidate_title.to_lowercase();

    if index.contains(&candidate) {
        return Some(MatchKind::Exact);
    }

    for key in index.titles() {
        if key.contains(candidate.as_str()) {
            return Some(MatchKind::CandidateInWatched(key.to_string()));
        }
        if candidate.contains(key) {
            return Some(MatchKind::WatchedInCandidate(key.to_string()));
        }
    }

    override_match(candidate_title, index, overrides)
}

/// Apply only the override table.
pub fn override_match(
    candidate_title: &str,
    index: &WatchIndex,
    overrides: &[TitleOverride],
) -> Option<MatchKind> {
    overrides
        .iter()
        .filter(|rule| rule.exact_title == candidate_title)
        .find_map(|rule| {
            index
                .titles()
                .find(|key| key.contains(rule.required_substring))
                .map(|key| MatchKind::Override(key.to_string()))
        })
}

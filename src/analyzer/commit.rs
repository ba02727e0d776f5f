//! Conventional-commit classification.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

// Anchored, case-sensitive. `revert` is a declared category below but is
// deliberately absent from this pattern; see the tests pinning that gap.
static TYPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(feat|fix|docs|style|refactor|perf|test|chore)(\([^)]*\))?:")
        .unwrap()
});

static BREAKING_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]+(\([^)]*\))?!:").unwrap()
});

/// A commit read from version-control history. Never constructed by the
/// release pipeline itself, only by the repository inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Full commit SHA.
    pub hash: String,
    /// Full commit message, subject line first.
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    /// Commit time in seconds since the epoch.
    pub timestamp: i64,
}

impl Commit {
    /// The subject line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Display name for changelog attribution: author name, else email.
    pub fn author(&self) -> &str {
        if self.author_name.is_empty() {
            &self.author_email
        } else {
            &self.author_name
        }
    }
}

/// Commit categories used for grouping changes in release notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Chore,
    Revert,
    Other,
}

impl CommitType {
    /// All categories in their fixed rendering order.
    pub const ALL: [CommitType; 10] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Perf,
        CommitType::Test,
        CommitType::Chore,
        CommitType::Revert,
        CommitType::Other,
    ];

    /// Section heading used in release notes.
    pub fn heading(&self) -> &'static str {
        match self {
            CommitType::Feat => "Features",
            CommitType::Fix => "Bug Fixes",
            CommitType::Docs => "Documentation",
            CommitType::Style => "Styles",
            CommitType::Refactor => "Code Refactoring",
            CommitType::Perf => "Performance Improvements",
            CommitType::Test => "Tests",
            CommitType::Chore => "Chores",
            CommitType::Revert => "Reverts",
            CommitType::Other => "Other Changes",
        }
    }
}

/// Classify a commit message by its conventional-commit prefix.
///
/// Matches `type(scope)?:` at the start of the message, case-sensitively.
/// Anything unmatched classifies as [`CommitType::Other`].
pub fn classify(message: &str) -> CommitType {
    let captured = TYPE_PATTERN
        .captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str());

    match captured {
        Some("feat") => CommitType::Feat,
        Some("fix") => CommitType::Fix,
        Some("docs") => CommitType::Docs,
        Some("style") => CommitType::Style,
        Some("refactor") => CommitType::Refactor,
        Some("perf") => CommitType::Perf,
        Some("test") => CommitType::Test,
        Some("chore") => CommitType::Chore,
        _ => CommitType::Other,
    }
}

/// Whether a commit message declares a breaking change, either with a `!`
/// before the subject colon or a `BREAKING CHANGE:` footer.
pub fn is_breaking(message: &str) -> bool {
    BREAKING_PREFIX.is_match(message) || message.contains("BREAKING CHANGE:")
}

/// Group commits into per-category buckets.
///
/// Every category key is present in the returned map, even when its bucket
/// is empty. Within a bucket, commits keep their input order.
pub fn group_by_type(commits: &[Commit]) -> BTreeMap<CommitType, Vec<Commit>> {
    let mut grouped: BTreeMap<CommitType, Vec<Commit>> = BTreeMap::new();

    for kind in CommitType::ALL {
        grouped.insert(kind, vec![]);
    }

    for commit in commits {
        grouped
            .entry(classify(commit.summary()))
            .or_default()
            .push(commit.clone());
    }

    grouped
}

//! Markdown release-notes rendering.

use crate::analyzer::commit::{Commit, CommitType, group_by_type};

/// Render release notes for a tag from its commits.
///
/// Output is a level-2 heading naming the tag followed by one level-3
/// section per non-empty commit category, in the classifier's fixed order.
/// Empty categories are omitted entirely.
pub fn generate(tag_name: &str, commits: &[Commit]) -> String {
    let grouped = group_by_type(commits);
    let mut notes = format!("## {tag_name}\n");

    for kind in CommitType::ALL {
        let bucket = &grouped[&kind];
        if bucket.is_empty() {
            continue;
        }

        notes.push_str(&format!("\n### {}\n\n", kind.heading()));

        for commit in bucket {
            notes.push_str(&format!(
                "- {} by @{}\n",
                commit.summary(),
                commit.author()
            ));
        }
    }

    notes
}

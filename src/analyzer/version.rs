//! Semantic version derivation.

use clap::ValueEnum;
use semver::{Prerelease, Version};

use crate::{
    analyzer::commit::{self, Commit, CommitType},
    error::Error,
    result::Result,
};

/// Kind of version bump to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReleaseType {
    Major,
    Minor,
    Patch,
    Prerelease,
}

/// Compute the next version from a current version string and a bump type.
///
/// Major, minor, and patch bumps follow standard semver reset rules and
/// clear any prerelease component. A prerelease bump increments the trailing
/// numeric component when the current version already carries the same
/// identifier, and otherwise attaches `<identifier>.0` after a patch bump.
pub fn next_version(
    current: &str,
    bump: ReleaseType,
    prerelease_id: &str,
) -> Result<Version> {
    let current = Version::parse(current)
        .map_err(|e| Error::InvalidVersion(format!("{current}: {e}")))?;

    let next = match bump {
        ReleaseType::Major => Version::new(current.major + 1, 0, 0),
        ReleaseType::Minor => Version::new(current.major, current.minor + 1, 0),
        ReleaseType::Patch => {
            Version::new(current.major, current.minor, current.patch + 1)
        }
        ReleaseType::Prerelease => next_prerelease(&current, prerelease_id)?,
    };

    Ok(next)
}

fn next_prerelease(current: &Version, id: &str) -> Result<Version> {
    let mut next = if current.pre.is_empty() {
        Version::new(current.major, current.minor, current.patch + 1)
    } else {
        Version::new(current.major, current.minor, current.patch)
    };

    let pre = match increment_identifier(current.pre.as_str(), id) {
        Some(incremented) => incremented,
        None => format!("{id}.0"),
    };

    next.pre = Prerelease::new(&pre)
        .map_err(|e| Error::InvalidVersion(format!("{pre}: {e}")))?;

    Ok(next)
}

// "beta.3" with id "beta" -> "beta.4"; anything else restarts at <id>.0.
fn increment_identifier(pre: &str, id: &str) -> Option<String> {
    let (prefix, counter) = pre.rsplit_once('.')?;
    if prefix != id {
        return None;
    }
    let counter: u64 = counter.parse().ok()?;
    Some(format!("{id}.{}", counter + 1))
}

/// Whether a version carries a prerelease segment. Controls the published
/// release's `prerelease` attribute; `draft` stays a separate user choice.
pub fn is_prerelease(version: &Version) -> bool {
    !version.pre.is_empty()
}

/// Tag name for fixed-strategy releases.
pub fn fixed_tag_name(version: &Version) -> String {
    format!("v{version}")
}

/// Tag name for independent-strategy releases.
pub fn independent_tag_name(package: &str, version: &Version) -> String {
    format!("{package}@{version}")
}

/// Derive a bump type from classified commits: breaking changes win, then
/// features, then everything else is a patch.
pub fn release_type_for(commits: &[Commit]) -> ReleaseType {
    if commits.iter().any(|c| commit::is_breaking(&c.message)) {
        return ReleaseType::Major;
    }

    if commits
        .iter()
        .any(|c| commit::classify(c.summary()) == CommitType::Feat)
    {
        return ReleaseType::Minor;
    }

    ReleaseType::Patch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(message: &str) -> Commit {
        Commit {
            hash: "abc".to_string(),
            message: message.to_string(),
            author_name: "a".to_string(),
            author_email: "a@example.com".to_string(),
            timestamp: 0,
        }
    }

    #[test]
    fn bumps_minor_and_resets_patch() {
        let v = next_version("1.2.3", ReleaseType::Minor, "beta").unwrap();
        assert_eq!(v.to_string(), "1.3.0");
    }

    #[test]
    fn bumps_major_and_resets_minor_and_patch() {
        let v = next_version("1.9.9", ReleaseType::Major, "beta").unwrap();
        assert_eq!(v.to_string(), "2.0.0");
    }

    #[test]
    fn patch_bumps_compose() {
        let first = next_version("0.4.7", ReleaseType::Patch, "beta").unwrap();
        let second =
            next_version(&first.to_string(), ReleaseType::Patch, "beta")
                .unwrap();
        assert_eq!(first.to_string(), "0.4.8");
        assert_eq!(second.to_string(), "0.4.9");
    }

    #[test]
    fn stable_bumps_clear_prerelease() {
        let v =
            next_version("1.2.3-beta.4", ReleaseType::Minor, "beta").unwrap();
        assert_eq!(v.to_string(), "1.3.0");
        assert!(!is_prerelease(&v));
    }

    #[test]
    fn prerelease_attaches_identifier_to_stable_version() {
        let v =
            next_version("1.0.0", ReleaseType::Prerelease, "beta").unwrap();
        assert_eq!(v.to_string(), "1.0.1-beta.0");
        assert!(is_prerelease(&v));
    }

    #[test]
    fn prerelease_increments_matching_identifier() {
        let v = next_version("1.0.1-beta.0", ReleaseType::Prerelease, "beta")
            .unwrap();
        assert_eq!(v.to_string(), "1.0.1-beta.1");
    }

    #[test]
    fn prerelease_restarts_on_identifier_change() {
        let v = next_version("1.0.1-beta.4", ReleaseType::Prerelease, "rc")
            .unwrap();
        assert_eq!(v.to_string(), "1.0.1-rc.0");
    }

    #[test]
    fn rejects_unparseable_current_version() {
        let err =
            next_version("one.two.three", ReleaseType::Patch, "beta")
                .unwrap_err();
        assert!(matches!(err, Error::InvalidVersion(_)));
        assert!(err.to_string().contains("one.two.three"));
    }

    #[test]
    fn builds_tag_names_per_strategy() {
        let v = Version::parse("1.1.0").unwrap();
        assert_eq!(fixed_tag_name(&v), "v1.1.0");
        assert_eq!(independent_tag_name("api", &v), "api@1.1.0");
    }

    #[test]
    fn derives_bump_from_commits() {
        let patch_only = vec![commit("fix: a"), commit("chore: b")];
        assert_eq!(release_type_for(&patch_only), ReleaseType::Patch);

        let with_feature = vec![commit("fix: a"), commit("feat: b")];
        assert_eq!(release_type_for(&with_feature), ReleaseType::Minor);

        let with_breaking = vec![commit("feat!: b"), commit("fix: a")];
        assert_eq!(release_type_for(&with_breaking), ReleaseType::Major);

        let footer_breaking = vec![commit(
            "refactor: move modules\n\nBREAKING CHANGE: imports changed",
        )];
        assert_eq!(release_type_for(&footer_breaking), ReleaseType::Major);

        assert_eq!(release_type_for(&[]), ReleaseType::Patch);
    }
}

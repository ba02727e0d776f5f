//! Request and response types for hosting platform operations.

/// Everything needed to publish one release.
#[derive(Debug, Clone)]
pub struct CreateReleaseRequest {
    pub owner: String,
    pub repo: String,
    pub tag_name: String,
    pub release_name: String,
    /// Markdown release notes.
    pub body: String,
    /// Marks the release as a prerelease; derived from the version.
    pub prerelease: bool,
    /// Marks the release as a draft; an independent user choice.
    pub draft: bool,
}

/// A release as reported by the hosting platform.
#[derive(Debug, Clone)]
pub struct ForgeRelease {
    pub id: u64,
    pub tag_name: String,
    pub name: String,
    pub draft: bool,
    pub prerelease: bool,
}

//! Traits related to remote hosting platforms.

use async_trait::async_trait;

use crate::{
    forge::types::{CreateReleaseRequest, ForgeRelease},
    repo::RepoInfo,
    result::Result,
};

/// Narrow interface to the hosting platform used for publishing releases.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Verify the credential is usable and return the login it belongs to.
    async fn get_authenticated_user(&self) -> Result<String>;

    /// Whether the repository exists. "Not found" is a valid `false`, not
    /// an error.
    async fn repo_exists(&self, info: &RepoInfo) -> Result<bool>;

    /// Publish a release for an existing or to-be-created tag.
    async fn create_release(
        &self,
        req: &CreateReleaseRequest,
    ) -> Result<ForgeRelease>;

    /// List existing releases for the repository.
    async fn list_releases(&self, info: &RepoInfo) -> Result<Vec<ForgeRelease>>;

    /// Delete a release by id.
    async fn delete_release(&self, info: &RepoInfo, id: u64) -> Result<()>;
}

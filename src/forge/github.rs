//! Implements the Forge trait for GitHub.

use async_trait::async_trait;
use log::*;
use octocrab::Octocrab;
use secrecy::{ExposeSecret, SecretString};

use crate::{
    error::Error,
    forge::{
        traits::Forge,
        types::{CreateReleaseRequest, ForgeRelease},
    },
    repo::RepoInfo,
    result::Result,
};

const RELEASE_PAGE_SIZE: u8 = 100;

/// GitHub client using Octocrab with personal access token authentication.
pub struct Github {
    instance: Octocrab,
}

impl Github {
    /// Build a GitHub client from a personal access token.
    pub fn new(token: &SecretString) -> Result<Self> {
        let instance = Octocrab::builder()
            .personal_token(token.expose_secret().to_string())
            .build()
            .map_err(|e| {
                Error::Authentication(format!(
                    "failed to build github client: {e}"
                ))
            })?;

        Ok(Self { instance })
    }
}

#[async_trait]
impl Forge for Github {
    async fn get_authenticated_user(&self) -> Result<String> {
        let user = self.instance.current().user().await.map_err(|e| {
            Error::Authentication(format!("token rejected by github: {e}"))
        })?;

        debug!("authenticated as {}", user.login);

        Ok(user.login)
    }

    async fn repo_exists(&self, info: &RepoInfo) -> Result<bool> {
        match self.instance.repos(&info.owner, &info.repo).get().await {
            Ok(_) => Ok(true),
            Err(octocrab::Error::GitHub { source, .. })
                if source.status_code.as_u16() == 404 =>
            {
                Ok(false)
            }
            Err(e) => Err(Error::Publish(format!(
                "failed to look up repository {}/{}: {e}",
                info.owner, info.repo
            ))),
        }
    }

    async fn create_release(
        &self,
        req: &CreateReleaseRequest,
    ) -> Result<ForgeRelease> {
        info!("creating github release for tag {}", req.tag_name);

        let release = self
            .instance
            .repos(&req.owner, &req.repo)
            .releases()
            .create(&req.tag_name)
            .name(&req.release_name)
            .body(&req.body)
            .draft(req.draft)
            .prerelease(req.prerelease)
            .send()
            .await
            .map_err(|e| {
                Error::Publish(format!(
                    "failed to create release {}: {e}",
                    req.tag_name
                ))
            })?;

        Ok(ForgeRelease {
            id: release.id.0,
            tag_name: release.tag_name,
            name: release.name.unwrap_or_default(),
            draft: release.draft,
            prerelease: release.prerelease,
        })
    }

    async fn list_releases(
        &self,
        info: &RepoInfo,
    ) -> Result<Vec<ForgeRelease>> {
        let page = self
            .instance
            .repos(&info.owner, &info.repo)
            .releases()
            .list()
            .per_page(RELEASE_PAGE_SIZE)
            .send()
            .await
            .map_err(|e| {
                Error::Publish(format!("failed to list releases: {e}"))
            })?;

        Ok(page
            .items
            .into_iter()
            .map(|release| ForgeRelease {
                id: release.id.0,
                tag_name: release.tag_name,
                name: release.name.unwrap_or_default(),
                draft: release.draft,
                prerelease: release.prerelease,
            })
            .collect())
    }

    async fn delete_release(&self, info: &RepoInfo, id: u64) -> Result<()> {
        self.instance
            .repos(&info.owner, &info.repo)
            .releases()
            .delete(id)
            .await
            .map_err(|e| {
                Error::Publish(format!("failed to delete release {id}: {e}"))
            })?;

        Ok(())
    }
}

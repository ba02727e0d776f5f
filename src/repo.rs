//! Git repository inspection and mutation.
//!
//! Wraps `git2` with the operations the release pipeline needs: reading the
//! remote, tags, and commit history, and creating/pushing the release
//! commit and tag. Pushes authenticate with the configured token; local
//! reads need no credentials.

use futures_util::future::try_join_all;
use git2::{RemoteCallbacks, Sort};
use git_url_parse::GitUrl;
use log::*;
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;

use crate::{analyzer::commit::Commit, error::Error, result::Result};

/// Hosting platform this tool publishes to. Remotes on any other host are
/// rejected during repo-info resolution.
const SUPPORTED_HOST: &str = "github.com";

/// Owner and repository name parsed from the remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub owner: String,
    pub repo: String,
}

impl RepoInfo {
    /// Parse owner/repo out of a github.com remote URL.
    ///
    /// Both fields are guaranteed non-empty on success; any other outcome
    /// is an [`Error::InvalidRemoteFormat`].
    pub fn from_remote_url(url: &str) -> Result<Self> {
        let parsed = GitUrl::parse(url)
            .map_err(|e| Error::InvalidRemoteFormat(format!("{url}: {e}")))?;

        let host = parsed.host.unwrap_or_default();
        if host != SUPPORTED_HOST {
            return Err(Error::InvalidRemoteFormat(format!(
                "unsupported host {host:?} in {url}"
            )));
        }

        let owner = parsed.owner.unwrap_or_default();
        let repo = parsed.name;

        if owner.is_empty() || repo.is_empty() {
            return Err(Error::InvalidRemoteFormat(url.to_string()));
        }

        Ok(Self { owner, repo })
    }
}

/// Existing tags with the most recent one distinguished.
///
/// An empty tag list is a valid state signaling a first release, not an
/// error.
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    pub all: Vec<String>,
    pub latest: Option<String>,
}

/// High-level interface to the working repository.
pub struct Repository {
    repo: git2::Repository,
    token: Option<SecretString>,
}

impl Repository {
    /// Open the repository containing `path`.
    pub fn open(path: &Path, token: Option<SecretString>) -> Result<Self> {
        let repo = git2::Repository::discover(path)?;
        Ok(Self { repo, token })
    }

    /// The repository's working directory.
    pub fn workdir(&self) -> Result<&Path> {
        self.repo.workdir().ok_or_else(|| {
            Error::Repository("repository has no working directory".to_string())
        })
    }

    fn remote_name(&self) -> Result<String> {
        let remotes = self.repo.remotes()?;

        if remotes.is_empty() {
            return Err(Error::NoRemote);
        }

        if remotes.iter().flatten().any(|name| name == "origin") {
            return Ok("origin".to_string());
        }

        Ok(remotes.get(0).unwrap_or_default().to_string())
    }

    /// URL of the origin remote (or the first remote when origin is absent).
    pub fn get_remote_url(&self) -> Result<String> {
        let name = self.remote_name()?;
        let remote = self.repo.find_remote(&name)?;

        remote.url().map(str::to_string).ok_or_else(|| {
            Error::InvalidRemoteFormat(
                "remote url is not valid utf-8".to_string(),
            )
        })
    }

    /// Owner/repo parsed from the remote URL.
    pub fn get_repo_info(&self) -> Result<RepoInfo> {
        RepoInfo::from_remote_url(&self.get_remote_url()?)
    }

    /// All tags plus the most recent one by tagged-commit time.
    pub fn get_tags(&self) -> Result<TagSet> {
        let names = self.repo.tag_names(None)?;
        let mut tags: Vec<(String, i64)> = vec![];

        for name in names.iter().flatten() {
            let object =
                self.repo.revparse_single(&format!("refs/tags/{name}"))?;
            let commit = object.peel_to_commit()?;
            tags.push((name.to_string(), commit.time().seconds()));
        }

        tags.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let latest = tags.last().map(|(name, _)| name.clone());
        let all = tags.into_iter().map(|(name, _)| name).collect();

        Ok(TagSet { all, latest })
    }

    /// Commits reachable from HEAD, newest first, optionally bounded to
    /// those after `from` (exclusive). An empty result is not an error here;
    /// the release pipeline decides whether that is acceptable.
    pub fn get_commits(&self, from: Option<&str>) -> Result<Vec<Commit>> {
        let mut walk = self.repo.revwalk()?;
        walk.push_head()?;

        if let Some(from) = from {
            debug!("listing commits since {from}");
            let object = self.repo.revparse_single(from)?;
            walk.hide(object.peel_to_commit()?.id())?;
        }

        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let mut commits = vec![];
        for oid in walk {
            let commit = self.repo.find_commit(oid?)?;
            let author = commit.author();
            commits.push(Commit {
                hash: commit.id().to_string(),
                message: commit.message().unwrap_or_default().to_string(),
                author_name: author.name().unwrap_or_default().to_string(),
                author_email: author.email().unwrap_or_default().to_string(),
                timestamp: commit.time().seconds(),
            });
        }

        Ok(commits)
    }

    /// Paths touched by a single commit, relative to the repository root.
    pub fn get_commit_files(&self, hash: &str) -> Result<Vec<String>> {
        let oid = git2::Oid::from_str(hash)?;
        let commit = self.repo.find_commit(oid)?;
        let tree = commit.tree()?;

        // Root commits diff against an empty tree.
        let parent_tree = match commit.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };

        let diff = self.repo.diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&tree),
            None,
        )?;

        let mut files = vec![];
        for delta in diff.deltas() {
            if let Some(path) =
                delta.new_file().path().or_else(|| delta.old_file().path())
            {
                files.push(path.to_string_lossy().to_string());
            }
        }

        Ok(files)
    }

    /// Fetch changed files for many commits as one parallel batch.
    ///
    /// All-or-nothing: a single failed lookup fails the whole batch. Each
    /// task opens its own repository handle so lookups can run concurrently.
    pub async fn get_commit_files_batch(
        &self,
        hashes: &[String],
    ) -> Result<Vec<(String, Vec<String>)>> {
        let git_dir = self.repo.path().to_path_buf();

        let tasks = hashes.iter().map(|hash| {
            let git_dir = git_dir.clone();
            let hash = hash.clone();
            tokio::task::spawn_blocking(move || -> Result<(String, Vec<String>)> {
                let repo = Repository {
                    repo: git2::Repository::open(&git_dir)?,
                    token: None,
                };
                let files = repo.get_commit_files(&hash)?;
                Ok((hash, files))
            })
        });

        let joined = try_join_all(tasks).await.map_err(|e| {
            Error::Repository(format!("changed-file batch failed: {e}"))
        })?;

        joined.into_iter().collect()
    }

    fn signature(&self) -> Result<git2::Signature<'_>> {
        let config = self.repo.config()?.snapshot()?;
        let user = config.get_str("user.name")?;
        let email = config.get_str("user.email")?;
        Ok(git2::Signature::now(user, email)?)
    }

    /// Stage all modified, new, and deleted files.
    pub fn add_all(&self) -> Result<()> {
        debug!("adding changed files to index");
        let mut index = self.repo.index()?;
        index.add_all(["."], git2::IndexAddOption::DEFAULT, None)?;
        index.write()?;
        Ok(())
    }

    /// Commit the staged changes on HEAD.
    pub fn commit(&self, msg: &str) -> Result<()> {
        debug!("committing changes with msg: {msg}");
        let mut index = self.repo.index()?;
        let oid = index.write_tree()?;
        let tree = self.repo.find_tree(oid)?;
        let parent = self.repo.head()?.peel_to_commit()?;
        let committer = self.signature()?;
        self.repo.commit(
            Some("HEAD"),
            &committer,
            &committer,
            msg,
            &tree,
            &[&parent],
        )?;
        Ok(())
    }

    /// Name of the currently checked-out branch.
    pub fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        head.shorthand().map(str::to_string).ok_or_else(|| {
            Error::Repository("HEAD is not on a named branch".to_string())
        })
    }

    /// Create an annotated tag pointing at HEAD.
    ///
    /// Check-then-create: a tag already pointing at HEAD is accepted
    /// silently so a failed run can be re-run; a tag pointing at a
    /// different commit is an error.
    pub fn create_tag(
        &self,
        tag_name: &str,
        tag_message: Option<&str>,
    ) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;

        if let Ok(existing) =
            self.repo.revparse_single(&format!("refs/tags/{tag_name}"))
        {
            if existing.peel_to_commit()?.id() == head.id() {
                debug!("tag {tag_name} already points at HEAD, skipping");
                return Ok(());
            }
            return Err(Error::Repository(format!(
                "tag {tag_name} already exists on a different commit"
            )));
        }

        info!("creating tag {tag_name}");
        let tagger = self.signature()?;
        self.repo.tag(
            tag_name,
            head.as_object(),
            &tagger,
            tag_message.unwrap_or(tag_name),
            false,
        )?;

        Ok(())
    }

    fn auth_callbacks(&self) -> RemoteCallbacks<'static> {
        let mut callbacks = RemoteCallbacks::new();

        if let Some(token) = &self.token {
            let token = token.expose_secret().to_string();
            callbacks.credentials(move |_url, username, _allowed| {
                git2::Cred::userpass_plaintext(
                    username.unwrap_or("git"),
                    &token,
                )
            });
        }

        callbacks
    }

    fn push_refspec(&self, refspec: &str) -> Result<()> {
        let name = self.remote_name()?;
        let mut remote = self.repo.find_remote(&name)?;

        let mut push_opts = git2::PushOptions::new();
        push_opts.remote_callbacks(self.auth_callbacks());

        remote.push(&[refspec], Some(&mut push_opts))?;

        Ok(())
    }

    /// Push a local branch to the remote.
    pub fn push_branch(&self, branch: &str) -> Result<()> {
        info!("pushing branch {branch}");
        self.push_refspec(&format!("refs/heads/{branch}"))
    }

    /// Push a local tag to the remote.
    pub fn push_tag(&self, tag: &str) -> Result<()> {
        info!("pushing tag {tag}");
        self.push_refspec(&format!("refs/tags/{tag}"))
    }
}

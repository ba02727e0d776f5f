//! Release orchestration.
//!
//! One run moves through a fixed sequence: authenticate against the hosting
//! platform, resolve owner/repo from the local remote, branch on the
//! configured versioning strategy, compute the next version and notes, then
//! apply the side effects (manifest bump, release commit, tag, remote
//! release, pushes). Planning performs no writes, which is what makes
//! dry-run a pure short-circuit. Failures are terminal; partially applied
//! side effects are not rolled back.

use log::*;
use std::path::Path;

use crate::{
    analyzer::{
        commit::Commit,
        notes,
        version::{self, ReleaseType},
    },
    cli,
    config::{ProjectConfig, ReleaseStrategy, VersioningStrategy},
    error::Error,
    forge::{
        github::Github,
        traits::Forge,
        types::CreateReleaseRequest,
    },
    repo::{RepoInfo, Repository},
    result::Result,
    updater::{self, workspace},
};

/// Terminal artifact of one release run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseResult {
    pub version: String,
    pub tag_name: String,
    pub release_notes: String,
}

/// Options resolved from CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseOptions {
    /// Explicit bump type; `None` defers to the configured strategy.
    pub release_type: Option<ReleaseType>,
    /// Publish the remote release as a draft.
    pub draft: bool,
}

/// A package affected by the commits under review (independent strategy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedPackage {
    pub name: String,
    pub version: String,
    pub package_path: String,
}

/// Everything computed by the read-only planning phase.
#[derive(Debug, Clone)]
pub struct ReleasePlan {
    pub repo_info: RepoInfo,
    pub version: semver::Version,
    pub tag_name: String,
    pub notes: String,
    /// Workspace globs (fixed) or the single package path (independent)
    /// whose manifests get bumped.
    pub bump_targets: Vec<String>,
    /// Package being released under the independent strategy.
    pub package_name: Option<String>,
}

impl ReleasePlan {
    pub fn result(&self) -> ReleaseResult {
        ReleaseResult {
            version: self.version.to_string(),
            tag_name: self.tag_name.clone(),
            release_notes: self.notes.clone(),
        }
    }
}

/// Sequences one release run. Executes exactly once per invocation; there
/// is no resumability.
pub struct Orchestrator<'a> {
    config: &'a ProjectConfig,
    repo: &'a Repository,
    forge: &'a dyn Forge,
    opts: ReleaseOptions,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a ProjectConfig,
        repo: &'a Repository,
        forge: &'a dyn Forge,
        opts: ReleaseOptions,
    ) -> Self {
        Self {
            config,
            repo,
            forge,
            opts,
        }
    }

    /// Run every read/compute step and return the would-be release.
    ///
    /// Performs no writes of any kind: no manifest edits, no tags, no
    /// remote calls beyond lookups.
    pub async fn plan(&self) -> Result<ReleasePlan> {
        let user = self.forge.get_authenticated_user().await?;
        info!("authenticated with github as {user}");

        let repo_info = self.repo.get_repo_info()?;
        info!("releasing {}/{}", repo_info.owner, repo_info.repo);

        if !self.forge.repo_exists(&repo_info).await? {
            return Err(Error::Repository(format!(
                "repository {}/{} not found on github",
                repo_info.owner, repo_info.repo
            )));
        }

        let plan = match self.config.release.versioning_strategy {
            VersioningStrategy::Fixed => self.plan_fixed(repo_info)?,
            VersioningStrategy::Independent => {
                self.plan_independent(repo_info).await?
            }
        };

        self.ensure_no_existing_release(&plan).await?;

        Ok(plan)
    }

    /// Apply the side effects of a computed plan: bump manifests, commit
    /// and push, tag, publish the remote release, push the tag.
    ///
    /// A failure part-way through leaves earlier effects in place.
    pub async fn apply(&self, plan: &ReleasePlan) -> Result<ReleaseResult> {
        let updater = updater::for_environment(self.config.project.environment);
        let updated = updater
            .update(self.repo.workdir()?, &plan.bump_targets, &plan.version)
            .await?;

        for path in &updated {
            debug!("bumped {}", path.display());
        }

        self.repo.add_all()?;
        self.repo
            .commit(&format!("chore(release): {}", plan.tag_name))?;
        let branch = self.repo.current_branch()?;
        self.repo.push_branch(&branch)?;

        self.repo.create_tag(&plan.tag_name, None)?;

        let request = CreateReleaseRequest {
            owner: plan.repo_info.owner.clone(),
            repo: plan.repo_info.repo.clone(),
            tag_name: plan.tag_name.clone(),
            release_name: plan.tag_name.clone(),
            body: plan.notes.clone(),
            prerelease: version::is_prerelease(&plan.version),
            draft: self.opts.draft,
        };
        let release = self.forge.create_release(&request).await?;
        info!("created release {}", release.tag_name);

        self.repo.push_tag(&plan.tag_name)?;

        Ok(plan.result())
    }

    fn commits_since_latest(&self) -> Result<Vec<Commit>> {
        let tags = self.repo.get_tags()?;

        match &tags.latest {
            Some(latest) => info!("latest tag: {latest}"),
            None => info!("no existing tags, treating this as a first release"),
        }

        let commits = self.repo.get_commits(tags.latest.as_deref())?;
        if commits.is_empty() {
            return Err(Error::NoCommits);
        }

        info!("found {} commits to release", commits.len());

        Ok(commits)
    }

    fn resolve_bump(&self, commits: &[Commit]) -> ReleaseType {
        if let Some(release_type) = self.opts.release_type {
            return release_type;
        }

        match self.config.release.strategy {
            ReleaseStrategy::Auto => version::release_type_for(commits),
            ReleaseStrategy::Manual => ReleaseType::Patch,
        }
    }

    fn plan_fixed(&self, repo_info: RepoInfo) -> Result<ReleasePlan> {
        let commits = self.commits_since_latest()?;
        let bump = self.resolve_bump(&commits);

        let next = version::next_version(
            &self.config.project.version,
            bump,
            &self.config.release.pre_release_identifier,
        )?;
        let tag_name = version::fixed_tag_name(&next);
        let notes = notes::generate(&tag_name, &commits);

        Ok(ReleasePlan {
            repo_info,
            version: next,
            tag_name,
            notes,
            bump_targets: self.config.project.workspaces.clone(),
            package_name: None,
        })
    }

    async fn plan_independent(
        &self,
        repo_info: RepoInfo,
    ) -> Result<ReleasePlan> {
        let commits = self.commits_since_latest()?;

        let hashes: Vec<String> =
            commits.iter().map(|c| c.hash.clone()).collect();
        let changed_files: Vec<String> = self
            .repo
            .get_commit_files_batch(&hashes)
            .await?
            .into_iter()
            .flat_map(|(_, files)| files)
            .collect();

        let root = self.repo.workdir()?;
        let affected = self.changed_packages(root, &changed_files)?;

        let Some(package) = affected.first() else {
            return Err(Error::NoPackagesChanged);
        };

        // Known limitation: only the first affected package is released in
        // one run.
        if affected.len() > 1 {
            let skipped: Vec<&str> = affected[1..]
                .iter()
                .map(|p| p.name.as_str())
                .collect();
            warn!(
                "{} packages changed, releasing only {} (skipped: {})",
                affected.len(),
                package.name,
                skipped.join(", ")
            );
        }

        let bump = self.resolve_bump(&commits);
        let next = version::next_version(
            &package.version,
            bump,
            &self.config.release.pre_release_identifier,
        )?;
        let tag_name = version::independent_tag_name(&package.name, &next);
        let notes = notes::generate(&tag_name, &commits);

        Ok(ReleasePlan {
            repo_info,
            version: next,
            tag_name,
            notes,
            bump_targets: vec![package.package_path.clone()],
            package_name: Some(package.name.clone()),
        })
    }

    /// Correlate changed file paths against the configured workspaces.
    fn changed_packages(
        &self,
        root: &Path,
        changed_files: &[String],
    ) -> Result<Vec<ChangedPackage>> {
        let dirs = workspace::resolve_workspace_dirs(
            root,
            &self.config.project.workspaces,
        )?;

        let mut affected = vec![];

        for dir in dirs {
            let touched = changed_files.iter().any(|file| {
                dir.as_os_str().is_empty()
                    || Path::new(file).starts_with(&dir)
            });

            if !touched {
                continue;
            }

            affected.push(self.describe_package(root, &dir));
        }

        Ok(affected)
    }

    fn describe_package(&self, root: &Path, dir: &Path) -> ChangedPackage {
        let (name, manifest_version) = workspace::package_metadata(
            root,
            dir,
            self.config.project.environment,
        );

        let fallback_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "package".to_string());

        let package_path = if dir.as_os_str().is_empty() {
            ".".to_string()
        } else {
            dir.to_string_lossy().to_string()
        };

        ChangedPackage {
            name: name.unwrap_or(fallback_name),
            version: manifest_version.unwrap_or_else(|| "0.0.0".to_string()),
            package_path,
        }
    }

    async fn ensure_no_existing_release(
        &self,
        plan: &ReleasePlan,
    ) -> Result<()> {
        let releases = self.forge.list_releases(&plan.repo_info).await?;

        if releases.iter().any(|r| r.tag_name == plan.tag_name) {
            return Err(Error::Publish(format!(
                "a release already exists for tag {}",
                plan.tag_name
            )));
        }

        Ok(())
    }
}

/// Execute the `release` subcommand.
pub async fn execute(
    args: &cli::Args,
    release_args: &cli::ReleaseArgs,
) -> Result<()> {
    let config = ProjectConfig::load(Path::new(&args.config))?;
    let token = args.get_token()?;

    let repo = Repository::open(Path::new("."), Some(token.clone()))?;
    let forge = Github::new(&token)?;

    let opts = ReleaseOptions {
        release_type: release_args.release_type,
        draft: release_args.draft,
    };

    let orchestrator = Orchestrator::new(&config, &repo, &forge, opts);
    let plan = orchestrator.plan().await?;

    if release_args.dry_run {
        info!(
            "dry run: would release {} as {}",
            plan.version, plan.tag_name
        );
        info!("release notes:\n{}", plan.notes);
        return Ok(());
    }

    if !release_args.ci && !cli::confirm_release(&plan.tag_name)? {
        info!("release cancelled, no changes were made");
        return Ok(());
    }

    let result = orchestrator.apply(&plan).await?;
    info!("released {} ({})", result.tag_name, result.version);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::types::ForgeRelease;
    use crate::test_helpers::{commit_file, init_repo, tag_head};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Counting in-memory forge so tests can assert on collaborator calls.
    struct MockForge {
        exists: bool,
        releases: Mutex<Vec<ForgeRelease>>,
        create_calls: AtomicUsize,
    }

    impl MockForge {
        fn new() -> Self {
            Self {
                exists: true,
                releases: Mutex::new(vec![]),
                create_calls: AtomicUsize::new(0),
            }
        }

        fn with_release(tag_name: &str) -> Self {
            let forge = Self::new();
            forge.releases.lock().unwrap().push(ForgeRelease {
                id: 1,
                tag_name: tag_name.to_string(),
                name: tag_name.to_string(),
                draft: false,
                prerelease: false,
            });
            forge
        }

        fn create_count(&self) -> usize {
            self.create_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Forge for MockForge {
        async fn get_authenticated_user(&self) -> Result<String> {
            Ok("release-bot".to_string())
        }

        async fn repo_exists(&self, _info: &RepoInfo) -> Result<bool> {
            Ok(self.exists)
        }

        async fn create_release(
            &self,
            req: &CreateReleaseRequest,
        ) -> Result<ForgeRelease> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            let release = ForgeRelease {
                id: 42,
                tag_name: req.tag_name.clone(),
                name: req.release_name.clone(),
                draft: req.draft,
                prerelease: req.prerelease,
            };
            self.releases.lock().unwrap().push(release.clone());
            Ok(release)
        }

        async fn list_releases(
            &self,
            _info: &RepoInfo,
        ) -> Result<Vec<ForgeRelease>> {
            Ok(self.releases.lock().unwrap().clone())
        }

        async fn delete_release(
            &self,
            _info: &RepoInfo,
            _id: u64,
        ) -> Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        dir: TempDir,
        git_repo: git2::Repository,
    }

    impl Fixture {
        /// Working repo with a github origin; suitable for planning tests.
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let git_repo = init_repo(dir.path());
            git_repo
                .remote("origin", "https://github.com/acme/widgets.git")
                .unwrap();
            Self { dir, git_repo }
        }

        /// Working repo whose origin is a local bare repo, so pushes in
        /// apply() succeed without a network.
        fn with_local_origin() -> (Self, TempDir) {
            let bare_dir = TempDir::new().unwrap();
            git2::Repository::init_bare(bare_dir.path()).unwrap();

            let dir = TempDir::new().unwrap();
            let git_repo = init_repo(dir.path());
            git_repo
                .remote(
                    "origin",
                    bare_dir.path().to_string_lossy().as_ref(),
                )
                .unwrap();

            (Self { dir, git_repo }, bare_dir)
        }

        fn repo(&self) -> Repository {
            Repository::open(self.dir.path(), None).unwrap()
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    fn fixed_config(version: &str) -> ProjectConfig {
        let mut config = ProjectConfig::default();
        config.project.version = version.to_string();
        config
    }

    fn independent_config(workspaces: &[&str]) -> ProjectConfig {
        let mut config = ProjectConfig::default();
        config.release.versioning_strategy = VersioningStrategy::Independent;
        config.project.workspaces =
            workspaces.iter().map(|w| w.to_string()).collect();
        config
    }

    #[tokio::test]
    async fn fixed_plan_computes_version_tag_and_notes() {
        let fixture = Fixture::new();
        commit_file(&fixture.git_repo, "x.js", "x", "feat: x");
        commit_file(&fixture.git_repo, "y.js", "y", "fix: y");

        let config = fixed_config("1.0.0");
        let repo = fixture.repo();
        let forge = MockForge::new();
        let orchestrator = Orchestrator::new(
            &config,
            &repo,
            &forge,
            ReleaseOptions {
                release_type: Some(ReleaseType::Minor),
                draft: false,
            },
        );

        let plan = orchestrator.plan().await.unwrap();
        let result = plan.result();

        assert_eq!(result.version, "1.1.0");
        assert_eq!(result.tag_name, "v1.1.0");
        assert!(result.release_notes.contains("## v1.1.0"));
        assert!(result.release_notes.contains("### Features"));
        assert!(result.release_notes.contains("- feat: x by @Test User"));
        assert!(result.release_notes.contains("### Bug Fixes"));
        assert!(result.release_notes.contains("- fix: y by @Test User"));
    }

    #[tokio::test]
    async fn planning_performs_no_writes() {
        let fixture = Fixture::new();
        fixture.write(
            "package.json",
            r#"{"name": "widgets", "version": "1.0.0"}"#,
        );
        commit_file(&fixture.git_repo, "x.js", "x", "feat: x");

        let config = fixed_config("1.0.0");
        let repo = fixture.repo();
        let forge = MockForge::new();
        let orchestrator = Orchestrator::new(
            &config,
            &repo,
            &forge,
            ReleaseOptions::default(),
        );

        orchestrator.plan().await.unwrap();

        // Zero write-side collaborator calls and no local mutation.
        assert_eq!(forge.create_count(), 0);
        let manifest = fs::read_to_string(
            fixture.dir.path().join("package.json"),
        )
        .unwrap();
        assert!(manifest.contains("1.0.0"));
        let tags = repo.get_tags().unwrap();
        assert!(tags.all.is_empty());
    }

    #[tokio::test]
    async fn zero_commits_since_latest_tag_fails_without_mutation() {
        let fixture = Fixture::new();
        commit_file(&fixture.git_repo, "x.js", "x", "feat: x");
        tag_head(&fixture.git_repo, "v1.0.0");

        let config = fixed_config("1.0.0");
        let repo = fixture.repo();
        let forge = MockForge::new();
        let orchestrator = Orchestrator::new(
            &config,
            &repo,
            &forge,
            ReleaseOptions::default(),
        );

        let err = orchestrator.plan().await.unwrap_err();
        assert!(matches!(err, Error::NoCommits));
        assert_eq!(forge.create_count(), 0);
    }

    #[tokio::test]
    async fn missing_repository_on_the_forge_is_fatal() {
        let fixture = Fixture::new();
        commit_file(&fixture.git_repo, "x.js", "x", "feat: x");

        let config = fixed_config("1.0.0");
        let repo = fixture.repo();
        let mut forge = MockForge::new();
        forge.exists = false;
        let orchestrator = Orchestrator::new(
            &config,
            &repo,
            &forge,
            ReleaseOptions::default(),
        );

        let err = orchestrator.plan().await.unwrap_err();
        assert!(matches!(err, Error::Repository(_)));
    }

    #[tokio::test]
    async fn duplicate_remote_release_is_detected_before_mutation() {
        let fixture = Fixture::new();
        commit_file(&fixture.git_repo, "x.js", "x", "feat: x");

        let config = fixed_config("1.0.0");
        let repo = fixture.repo();
        let forge = MockForge::with_release("v1.1.0");
        let orchestrator = Orchestrator::new(
            &config,
            &repo,
            &forge,
            ReleaseOptions {
                release_type: Some(ReleaseType::Minor),
                draft: false,
            },
        );

        let err = orchestrator.plan().await.unwrap_err();
        assert!(matches!(err, Error::Publish(_)));
    }

    #[tokio::test]
    async fn auto_strategy_derives_bump_from_commits() {
        let fixture = Fixture::new();
        commit_file(&fixture.git_repo, "x.js", "x", "feat: x");

        let config = fixed_config("1.0.0");
        let repo = fixture.repo();
        let forge = MockForge::new();
        let orchestrator = Orchestrator::new(
            &config,
            &repo,
            &forge,
            ReleaseOptions::default(),
        );

        let plan = orchestrator.plan().await.unwrap();
        assert_eq!(plan.tag_name, "v1.1.0");
    }

    #[tokio::test]
    async fn prerelease_bump_marks_the_release_as_prerelease() {
        let (fixture, _bare) = Fixture::with_local_origin();
        fixture.write(
            "package.json",
            r#"{"name": "widgets", "version": "1.0.0"}"#,
        );
        commit_file(&fixture.git_repo, "x.js", "x", "feat: x");

        let config = fixed_config("1.0.0");
        let repo = fixture.repo();
        let forge = MockForge::new();
        let orchestrator = Orchestrator::new(
            &config,
            &repo,
            &forge,
            ReleaseOptions {
                release_type: Some(ReleaseType::Prerelease),
                draft: false,
            },
        );

        let plan = ReleasePlan {
            repo_info: RepoInfo {
                owner: "acme".to_string(),
                repo: "widgets".to_string(),
            },
            version: semver::Version::parse("1.0.1-beta.0").unwrap(),
            tag_name: "v1.0.1-beta.0".to_string(),
            notes: "## v1.0.1-beta.0\n".to_string(),
            bump_targets: vec![".".to_string()],
            package_name: None,
        };

        orchestrator.apply(&plan).await.unwrap();

        let published = forge.releases.lock().unwrap();
        assert!(published.last().unwrap().prerelease);
    }

    #[tokio::test]
    async fn independent_plan_releases_the_first_changed_package() {
        let fixture = Fixture::new();
        fixture.write(
            "packages/api/package.json",
            r#"{"name": "api", "version": "2.0.0"}"#,
        );
        fixture.write(
            "packages/web/package.json",
            r#"{"name": "web", "version": "3.0.0"}"#,
        );
        commit_file(
            &fixture.git_repo,
            "packages/api/index.js",
            "x",
            "fix: api bug",
        );

        let config = independent_config(&["packages/*"]);
        let repo = fixture.repo();
        let forge = MockForge::new();
        let orchestrator = Orchestrator::new(
            &config,
            &repo,
            &forge,
            ReleaseOptions {
                release_type: Some(ReleaseType::Patch),
                draft: false,
            },
        );

        let plan = orchestrator.plan().await.unwrap();

        assert_eq!(plan.package_name.as_deref(), Some("api"));
        assert_eq!(plan.version.to_string(), "2.0.1");
        assert_eq!(plan.tag_name, "api@2.0.1");
        assert_eq!(plan.bump_targets, vec!["packages/api".to_string()]);
    }

    #[tokio::test]
    async fn independent_plan_defaults_version_when_manifest_is_missing() {
        let fixture = Fixture::new();
        fs::create_dir_all(fixture.dir.path().join("packages/bare"))
            .unwrap();
        commit_file(
            &fixture.git_repo,
            "packages/bare/main.py",
            "x",
            "feat: start",
        );

        let config = independent_config(&["packages/*"]);
        let repo = fixture.repo();
        let forge = MockForge::new();
        let orchestrator = Orchestrator::new(
            &config,
            &repo,
            &forge,
            ReleaseOptions {
                release_type: Some(ReleaseType::Patch),
                draft: false,
            },
        );

        let plan = orchestrator.plan().await.unwrap();
        assert_eq!(plan.package_name.as_deref(), Some("bare"));
        assert_eq!(plan.version.to_string(), "0.0.1");
    }

    #[tokio::test]
    async fn independent_plan_with_no_affected_packages_fails() {
        let fixture = Fixture::new();
        fixture.write(
            "packages/api/package.json",
            r#"{"name": "api", "version": "2.0.0"}"#,
        );
        commit_file(&fixture.git_repo, "docs/readme.md", "x", "docs: readme");

        let config = independent_config(&["packages/*"]);
        let repo = fixture.repo();
        let forge = MockForge::new();
        let orchestrator = Orchestrator::new(
            &config,
            &repo,
            &forge,
            ReleaseOptions::default(),
        );

        let err = orchestrator.plan().await.unwrap_err();
        assert!(matches!(err, Error::NoPackagesChanged));
    }

    #[tokio::test]
    async fn apply_bumps_commits_tags_and_publishes() {
        let (fixture, bare) = Fixture::with_local_origin();
        fixture.write(
            "package.json",
            r#"{"name": "widgets", "version": "1.0.0"}"#,
        );
        commit_file(&fixture.git_repo, "x.js", "x", "feat: x");

        let config = fixed_config("1.0.0");
        let repo = fixture.repo();
        let forge = MockForge::new();
        let orchestrator = Orchestrator::new(
            &config,
            &repo,
            &forge,
            ReleaseOptions::default(),
        );

        let plan = ReleasePlan {
            repo_info: RepoInfo {
                owner: "acme".to_string(),
                repo: "widgets".to_string(),
            },
            version: semver::Version::parse("1.1.0").unwrap(),
            tag_name: "v1.1.0".to_string(),
            notes: "## v1.1.0\n".to_string(),
            bump_targets: vec![".".to_string()],
            package_name: None,
        };

        let result = orchestrator.apply(&plan).await.unwrap();
        assert_eq!(result.version, "1.1.0");

        // Manifest bumped in place.
        let manifest = fs::read_to_string(
            fixture.dir.path().join("package.json"),
        )
        .unwrap();
        assert!(manifest.contains("\"version\": \"1.1.0\""));

        // Release commit created and tagged.
        let commits = repo.get_commits(None).unwrap();
        assert_eq!(commits[0].summary(), "chore(release): v1.1.0");
        let tags = repo.get_tags().unwrap();
        assert_eq!(tags.latest.as_deref(), Some("v1.1.0"));

        // Remote release created exactly once, tag pushed to the remote.
        assert_eq!(forge.create_count(), 1);
        let bare_repo = git2::Repository::open_bare(bare.path()).unwrap();
        assert!(
            bare_repo
                .revparse_single("refs/tags/v1.1.0")
                .is_ok()
        );
    }
}

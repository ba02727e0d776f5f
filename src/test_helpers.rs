//! Shared fixtures for tests that need real git repositories.

use std::fs;
use std::path::Path;

/// Initialize a repository with a committer identity configured.
pub fn init_repo(dir: &Path) -> git2::Repository {
    let repo = git2::Repository::init(dir).unwrap();

    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();

    repo
}

/// Write a file and commit it on HEAD, returning the new commit id.
pub fn commit_file(
    repo: &git2::Repository,
    rel_path: &str,
    content: &str,
    message: &str,
) -> git2::Oid {
    let workdir = repo.workdir().unwrap();
    let path = workdir.join(rel_path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(rel_path)).unwrap();
    index.write().unwrap();

    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let signature = repo.signature().unwrap();

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parents,
    )
    .unwrap()
}

/// Create an annotated tag pointing at HEAD.
pub fn tag_head(repo: &git2::Repository, name: &str) {
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    let tagger = repo.signature().unwrap();
    repo.tag(name, head.as_object(), &tagger, name, false)
        .unwrap();
}

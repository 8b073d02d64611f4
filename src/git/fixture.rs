//! Throwaway repositories for git backend tests.

use git2::{Oid, Repository, Signature};
use std::path::Path;
use tempfile::TempDir;

pub struct TestRepo {
    dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Empty repository whose HEAD points at `refs/heads/main`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let repo = Repository::init(dir.path()).expect("init repo");
        {
            let mut config = repo.config().expect("config");
            config.set_str("user.name", "Test User").expect("set name");
            config.set_str("user.email", "test@example.com").expect("set email");
        }
        repo.set_head("refs/heads/main").expect("point HEAD at main");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dirs");
        }
        std::fs::write(path, contents).expect("write file");
    }

    pub fn remove(&self, name: &str) {
        std::fs::remove_file(self.dir.path().join(name)).expect("remove file");
    }

    /// Write a file, stage everything and commit on the current branch.
    pub fn commit_file(&self, name: &str, contents: &str, message: &str) -> Oid {
        self.write(name, contents);
        self.commit_all(message)
    }

    pub fn commit_all(&self, message: &str) -> Oid {
        let mut index = self.repo.index().expect("index");
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .expect("add all");
        index
            .update_all(["*"].iter(), None)
            .expect("update all");
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("write tree");
        let tree = self.repo.find_tree(tree_id).expect("find tree");
        let sig = Signature::now("Test User", "test@example.com").expect("signature");

        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("commit")
    }

    /// Create a branch at HEAD without switching to it.
    pub fn branch(&self, name: &str) {
        let head = self.repo.head().expect("head").peel_to_commit().expect("head commit");
        self.repo.branch(name, &head, false).expect("create branch");
    }

    pub fn tag(&self, name: &str) {
        let head = self.repo.head().expect("head").peel_to_commit().expect("head commit");
        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .expect("create tag");
    }

    /// Switch HEAD and the working tree to `branch`.
    pub fn checkout(&self, branch: &str) {
        let refname = format!("refs/heads/{}", branch);
        let obj = self.repo.revparse_single(&refname).expect("resolve branch");
        let mut opts = git2::build::CheckoutBuilder::new();
        opts.force();
        self.repo
            .checkout_tree(&obj, Some(&mut opts))
            .expect("checkout tree");
        self.repo.set_head(&refname).expect("set head");
    }
}

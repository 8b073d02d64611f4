//! Branch comparison: what a branch is compared against, and the ahead/behind
//! commit and file listings derived from that choice.

pub mod files;
pub mod orchestrator;
pub mod paged;
pub mod picker;
pub mod range;
pub mod refresh;
pub mod store;
#[cfg(test)]
pub mod testing;

pub use orchestrator::ComparisonOrchestrator;
pub use picker::RequestedRef;
pub use refresh::RefreshBus;
pub use store::{ComparisonStateStore, JsonFileState, MemoryState, WorkspaceState};

/// A local or remote-tracking branch in one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    pub repo_path: String,
    pub name: String,
    pub remote: bool,
}

impl BranchRef {
    pub fn local(repo_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            name: name.into(),
            remote: false,
        }
    }

    pub fn remote(repo_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            name: name.into(),
            remote: true,
        }
    }

    /// Stable across runs: repository path plus the qualified branch name.
    pub fn id(&self) -> String {
        let namespace = if self.remote { "remotes" } else { "heads" };
        format!("{}|{}/{}", self.repo_path, namespace, self.name)
    }
}

/// Key under which a branch's comparison is persisted. The checked-out
/// branch keeps its own entry apart from the same branch viewed elsewhere.
pub fn branch_identity(branch: &BranchRef, current: bool) -> String {
    if current {
        format!("{}+current", branch.id())
    } else {
        branch.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_ids_are_namespaced() {
        assert_eq!(BranchRef::local("/repo", "main").id(), "/repo|heads/main");
        assert_eq!(BranchRef::remote("/repo", "origin/main").id(), "/repo|remotes/origin/main");
    }

    #[test]
    fn current_branch_identity_is_distinct() {
        let branch = BranchRef::local("/repo", "main");
        assert_eq!(branch_identity(&branch, false), "/repo|heads/main");
        assert_eq!(branch_identity(&branch, true), "/repo|heads/main+current");
    }
}

//! Runtime settings for the comparison service, assembled from CLI flags and
//! `BRANCH_COMPARE_*` environment variables.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compare::{JsonFileState, MemoryState, WorkspaceState};
use crate::models::ComparisonMode;

pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct CompareConfig {
    /// Where comparison choices are persisted; `None` uses the default
    /// location inside the repository's git directory.
    pub state_file: Option<PathBuf>,
    /// Commits per page when a request gives no limit.
    pub page_size: usize,
    /// Mode for branches without a stored comparison.
    pub default_mode: ComparisonMode,
    /// `false` keeps comparisons in memory only.
    pub persist: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            state_file: None,
            page_size: DEFAULT_PAGE_SIZE,
            default_mode: ComparisonMode::Working,
            persist: true,
        }
    }
}

impl CompareConfig {
    pub fn state_file_for(&self, git_dir: &Path) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| git_dir.join("branch-compare").join("state.json"))
    }

    pub fn workspace_state(&self, git_dir: &Path) -> Arc<dyn WorkspaceState> {
        if self.persist {
            let state = JsonFileState::new(self.state_file_for(git_dir));
            tracing::info!("Persisting comparisons to {}", state.path().display());
            Arc::new(state)
        } else {
            tracing::info!("Comparisons are kept in memory only");
            Arc::new(MemoryState::new())
        }
    }

    /// A zero page size means "no limit".
    pub fn page_limit(&self, requested: Option<usize>) -> Option<usize> {
        match requested.unwrap_or(self.page_size) {
            0 => None,
            n => Some(n),
        }
    }
}

//! API route handlers - maps HTTP endpoints to comparison operations.
//!
//! Each submodule defines routes for a feature area:
//! - `repository`: Basic repo info (GET /api/v1/repository)
//! - `refs`: Branches and tags a comparison can target
//! - `compare`: Comparison view, paged commits, changed files and the
//!   edit/clear/mode/notation operations

pub mod compare;
pub mod refs;
pub mod repository;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::compare::{branch_identity, BranchRef, ComparisonOrchestrator, ComparisonStateStore, RefreshBus};
use crate::config::CompareConfig;
use crate::error::{AppError, Result};
use crate::git::GitRepository;
use crate::models::RefKind;

/// Everything the handlers share: the repository, the comparison store and
/// one orchestrator per branch, created on first use. Each orchestrator has
/// its own lock; the map lock is only held to find or create one.
pub struct AppState {
    pub git: Arc<GitRepository>,
    pub store: ComparisonStateStore,
    pub refresh: Arc<RefreshBus>,
    pub config: CompareConfig,
    nodes: Mutex<HashMap<String, Arc<Mutex<ComparisonOrchestrator>>>>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(git: Arc<GitRepository>, config: CompareConfig) -> Result<Self> {
        let state = config.workspace_state(&git.git_dir()?);
        Ok(Self {
            git,
            store: ComparisonStateStore::new(state),
            refresh: Arc::new(RefreshBus::new()),
            config,
            nodes: Mutex::new(HashMap::new()),
        })
    }

    /// `branch` defaults to the checked-out branch.
    fn resolve_branch(&self, branch: Option<&str>) -> Result<(BranchRef, bool)> {
        let current = self.git.current_branch()?;
        let name = match branch.filter(|b| !b.is_empty()) {
            Some(name) => name.to_string(),
            None => current.clone().ok_or_else(|| AppError::BranchNotFound("HEAD".to_string()))?,
        };

        let branch = match self.git.ref_kind(&name)? {
            Some(RefKind::Branch) => BranchRef::local(&self.git.path, &name),
            Some(RefKind::Remote) => BranchRef::remote(&self.git.path, &name),
            Some(RefKind::Tag) | None => return Err(AppError::BranchNotFound(name)),
        };
        let is_current = !branch.remote && current.as_deref() == Some(branch.name.as_str());
        Ok((branch, is_current))
    }

    /// Lock the orchestrator for `branch`. Operations on one branch are
    /// serialized by holding the returned guard; other branches stay free.
    pub async fn node(&self, branch: Option<&str>) -> Result<OwnedMutexGuard<ComparisonOrchestrator>> {
        let (branch, current) = self.resolve_branch(branch)?;
        let key = branch_identity(&branch, current);

        let node = {
            let mut nodes = self.nodes.lock().await;
            match nodes.get(&key) {
                Some(node) => node.clone(),
                None => {
                    let node = ComparisonOrchestrator::load(
                        self.git.clone(),
                        self.store.clone(),
                        self.refresh.clone(),
                        branch,
                        current,
                        self.config.default_mode,
                    )
                    .await?;
                    let node = Arc::new(Mutex::new(node));
                    nodes.insert(key, node.clone());
                    node
                }
            }
        };

        Ok(node.lock_owned().await)
    }
}

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .merge(repository::routes(state.clone()))
        .merge(refs::routes(state.clone()))
        .merge(compare::routes(state))
}

//! One branch's comparison node: owns the compare-with choice, persists it,
//! and lazily builds the ahead/behind/files children from it.

use std::sync::Arc;

use crate::compare::files::{pluralize, FileDiffQuery};
use crate::compare::paged::{PagedCommitQuery, PagedCommitResult};
use crate::compare::picker::{PickResult, PickerOptions, RefPicker};
use crate::compare::range::{create_range, RangeResolver};
use crate::compare::refresh::RefreshSignal;
use crate::compare::store::ComparisonStateStore;
use crate::compare::{branch_identity, BranchRef};
use crate::error::Result;
use crate::git::GitQueryService;
use crate::models::{
    ChildView, CommitDirection, CommitPageResponse, ComparisonMode, ComparisonReport, ComparisonTarget,
    ComparisonView, FileDiffResult, FileScope, RangeNotation, RangePair,
};

/// A changed-file listing, computed on first use.
pub struct FilesNode {
    query: FileDiffQuery,
    result: Option<FileDiffResult>,
}

impl FilesNode {
    fn new(query: FileDiffQuery) -> Self {
        Self { query, result: None }
    }

    pub fn query(&self) -> &FileDiffQuery {
        &self.query
    }

    pub async fn result(&mut self, git: &dyn GitQueryService) -> Result<&FileDiffResult> {
        let result = match self.result.take() {
            Some(result) => result,
            None => self.query.run(git).await?,
        };
        Ok(self.result.insert(result))
    }
}

/// Commits on one side of the comparison.
pub struct CommitsNode {
    pub direction: CommitDirection,
    pub count: usize,
    /// Merge base of the comparison, or `pair.ref1` when there is none.
    pub files_base: String,
    /// Empty for the working tree.
    pub files_head: String,
    pub commits: PagedCommitQuery,
    pub files: FilesNode,
    working_tree: bool,
}

impl CommitsNode {
    pub fn label(&self) -> String {
        match self.direction {
            CommitDirection::Behind => "Behind".to_string(),
            CommitDirection::Ahead if self.working_tree => "Ahead (includes working changes)".to_string(),
            CommitDirection::Ahead => "Ahead".to_string(),
        }
    }

    pub fn description(&self) -> String {
        pluralize("commit", self.count)
    }

    /// Restart the listing and return its first page.
    pub async fn first_page(&mut self, limit: Option<usize>) -> Result<CommitPageResponse> {
        let direction = self.direction;
        let result = self.commits.fetch(limit).await?;
        Ok(page_response(direction, result))
    }

    /// Extend the listing; the response holds every commit fetched so far.
    pub async fn next_page(&mut self, limit: Option<usize>) -> Result<CommitPageResponse> {
        let direction = self.direction;
        let result = self.commits.more(limit).await?;
        Ok(page_response(direction, result))
    }

    fn view(&self) -> ChildView {
        ChildView::Commits {
            direction: self.direction,
            label: self.label(),
            description: self.description(),
            count: self.count,
            range: self.commits.range().to_string(),
            files_base: self.files_base.clone(),
            files_head: self.files_head.clone(),
        }
    }
}

fn page_response(direction: CommitDirection, result: &PagedCommitResult) -> CommitPageResponse {
    CommitPageResponse {
        direction,
        commits: result.entries.clone(),
        has_more: result.has_more,
    }
}

pub struct ComparisonChildren {
    pub merge_base: Option<String>,
    pub behind: CommitsNode,
    pub ahead: CommitsNode,
    pub files: FilesNode,
}

impl ComparisonChildren {
    pub fn commits(&mut self, direction: CommitDirection) -> &mut CommitsNode {
        match direction {
            CommitDirection::Ahead => &mut self.ahead,
            CommitDirection::Behind => &mut self.behind,
        }
    }

    pub fn files(&mut self, scope: FileScope) -> &mut FilesNode {
        match scope {
            FileScope::All => &mut self.files,
            FileScope::Ahead => &mut self.ahead.files,
            FileScope::Behind => &mut self.behind.files,
        }
    }

    /// Behind, ahead, then the full file listing.
    pub async fn views(&mut self, git: &dyn GitQueryService) -> Result<Vec<ChildView>> {
        let expression = self.files.query().expression();
        let label = self.files.result(git).await?.label.clone();
        Ok(vec![
            self.behind.view(),
            self.ahead.view(),
            ChildView::Files { label, expression },
        ])
    }
}

enum ChildCache {
    Empty,
    Populated(ComparisonChildren),
}

/// Coordinates the comparison of one branch against a chosen reference.
///
/// Without a compare-with target the node has no children. Any change to
/// the target or its mode drops the built children, persists the new
/// choice and signals the view layer.
pub struct ComparisonOrchestrator {
    git: Arc<dyn GitQueryService>,
    store: ComparisonStateStore,
    refresh: Arc<dyn RefreshSignal>,
    branch: BranchRef,
    current: bool,
    compare_with: Option<ComparisonTarget>,
    default_mode: ComparisonMode,
    children: ChildCache,
}

impl ComparisonOrchestrator {
    /// Build the node for `branch`, restoring any persisted target. A stored
    /// target keeps its own mode; `default_mode` applies otherwise.
    pub async fn load(
        git: Arc<dyn GitQueryService>,
        store: ComparisonStateStore,
        refresh: Arc<dyn RefreshSignal>,
        branch: BranchRef,
        current: bool,
        default_mode: ComparisonMode,
    ) -> Result<Self> {
        let compare_with = store.load(&branch_identity(&branch, current), default_mode).await?;
        tracing::debug!(
            "Loaded comparison for {}: {:?}",
            branch.name,
            compare_with.as_ref().map(|t| &t.reference)
        );

        Ok(Self {
            git,
            store,
            refresh,
            branch,
            current,
            compare_with,
            default_mode,
            children: ChildCache::Empty,
        })
    }

    pub fn id(&self) -> String {
        format!(
            "{}|{}{}",
            self.branch.repo_path,
            self.branch.name,
            if self.current { "|root" } else { "" }
        )
    }

    fn identity(&self) -> String {
        branch_identity(&self.branch, self.current)
    }

    pub fn branch(&self) -> &BranchRef {
        &self.branch
    }

    pub fn compare_with(&self) -> Option<&ComparisonTarget> {
        self.compare_with.as_ref()
    }

    pub fn mode(&self) -> ComparisonMode {
        self.compare_with.as_ref().map_or(self.default_mode, |t| t.mode)
    }

    pub fn compares_working_tree(&self) -> bool {
        self.compare_with
            .as_ref()
            .map_or(self.default_mode.compares_working_tree(), |t| t.compares_working_tree())
    }

    fn resolver(&self) -> RangeResolver<'_> {
        let compare_with = self.compare_with.as_ref().map_or("", |t| t.reference.as_str());
        RangeResolver::new(&self.branch.name, compare_with)
    }

    pub fn ahead(&self) -> RangePair {
        self.resolver().ahead_pair()
    }

    pub fn behind(&self) -> RangePair {
        self.resolver().behind_pair()
    }

    /// `None` while no compare-with target is set. Built once and reused
    /// until the target changes.
    pub async fn get_children(&mut self) -> Result<Option<&mut ComparisonChildren>> {
        let Some(target) = self.compare_with.clone() else {
            return Ok(None);
        };

        if let ChildCache::Empty = self.children {
            let children = self.build_children(&target).await?;
            self.children = ChildCache::Populated(children);
        }

        match &mut self.children {
            ChildCache::Populated(children) => Ok(Some(children)),
            ChildCache::Empty => Ok(None),
        }
    }

    async fn build_children(&self, target: &ComparisonTarget) -> Result<ComparisonChildren> {
        let resolver = RangeResolver::new(&self.branch.name, &target.reference);
        let ahead = resolver.ahead_pair();
        let behind = resolver.behind_pair();
        let working_tree = target.compares_working_tree();

        // Counted from the branch's side, so `ahead` is what the branch has
        let counts = self.git.ahead_behind_count(&behind).await?.unwrap_or_default();
        let merge_base = RangeResolver::merge_base(self.git.as_ref(), &ahead.ref1, &ahead.ref2).await?;

        tracing::debug!(
            "Comparison {}: {} ahead, {} behind, merge base {:?}",
            self.id(),
            counts.ahead,
            counts.behind,
            merge_base
        );

        let files_base = |pair: &RangePair| merge_base.clone().unwrap_or_else(|| pair.ref1.clone());

        let behind_node = CommitsNode {
            direction: CommitDirection::Behind,
            count: counts.behind,
            files_base: files_base(&behind),
            files_head: behind.ref2.clone(),
            commits: PagedCommitQuery::new(
                self.git.clone(),
                create_range(&behind.ref1, &behind.ref2, RangeNotation::TwoDot),
            ),
            files: FilesNode::new(FileDiffQuery::Behind { pair: behind.clone() }),
            working_tree: false,
        };

        let ahead_node = CommitsNode {
            direction: CommitDirection::Ahead,
            count: counts.ahead,
            files_base: files_base(&ahead),
            files_head: if working_tree { String::new() } else { ahead.ref2.clone() },
            commits: PagedCommitQuery::new(
                self.git.clone(),
                create_range(&ahead.ref1, &ahead.ref2, RangeNotation::TwoDot),
            ),
            files: FilesNode::new(FileDiffQuery::Ahead {
                pair: ahead.clone(),
                working_tree,
            }),
            working_tree,
        };

        let files = FilesNode::new(FileDiffQuery::Full {
            base: self.branch.name.clone(),
            compare_with: target.reference.clone(),
            working_tree,
            notation: target.notation,
        });

        Ok(ComparisonChildren {
            merge_base,
            behind: behind_node,
            ahead: ahead_node,
            files,
        })
    }

    fn invalidate(&mut self) {
        self.children = ChildCache::Empty;
    }

    async fn update_target(&mut self, target: Option<ComparisonTarget>) -> Result<()> {
        self.compare_with = target;
        self.invalidate();
        self.store.save(&self.identity(), self.compare_with.as_ref()).await?;
        self.refresh.node_changed(&self.id());
        Ok(())
    }

    /// Ask `picker` for a new compare-with ref. Returns whether the target
    /// changed; a cancelled pick leaves everything untouched.
    pub async fn edit(&mut self, picker: &dyn RefPicker) -> Result<bool> {
        let title = format!("Compare {} with", self.branch.name);
        let picked = picker
            .show(
                &title,
                "Choose a reference (branch, tag, etc) to compare with",
                PickerOptions::default(),
            )
            .await;

        let reference = match picked {
            Some(PickResult::Picked(reference)) => reference,
            Some(PickResult::Cancelled) | None => return Ok(false),
        };

        tracing::info!("Comparing {} with {:?}", self.branch.name, reference);
        let target = ComparisonTarget {
            notation: self.compare_with.as_ref().and_then(|t| t.notation),
            ..ComparisonTarget::new(reference, self.mode())
        };
        self.update_target(Some(target)).await?;
        Ok(true)
    }

    pub async fn clear(&mut self) -> Result<()> {
        if self.compare_with.is_none() {
            return Ok(());
        }
        tracing::info!("Clearing comparison for {}", self.branch.name);
        self.update_target(None).await
    }

    pub async fn set_comparison_mode(&mut self, mode: ComparisonMode) -> Result<()> {
        match self.compare_with.clone() {
            Some(mut target) => {
                target.mode = mode;
                self.update_target(Some(target)).await
            }
            None => {
                // Nothing stored yet; the mode applies to the next pick
                self.default_mode = mode;
                self.invalidate();
                self.refresh.node_changed(&self.id());
                Ok(())
            }
        }
    }

    /// Range notation for the full file listing. Ignored while unconfigured.
    pub async fn set_notation(&mut self, notation: Option<RangeNotation>) -> Result<()> {
        match self.compare_with.clone() {
            Some(mut target) => {
                target.notation = notation;
                self.update_target(Some(target)).await
            }
            None => Ok(()),
        }
    }

    pub async fn view(&mut self, revision: u64) -> Result<ComparisonView> {
        let git = self.git.clone();
        let (children, merge_base) = match self.get_children().await? {
            Some(children) => (children.views(git.as_ref()).await?, children.merge_base.clone()),
            None => (Vec::new(), None),
        };

        Ok(ComparisonView {
            id: self.id(),
            branch: self.branch.name.clone(),
            current: self.current,
            compare_with: self.compare_with.clone(),
            mode: self.mode(),
            ahead: self.ahead(),
            behind: self.behind(),
            merge_base,
            children,
            revision,
        })
    }

    /// The view plus the first page of each commit listing and the full
    /// file listing.
    pub async fn report(&mut self, revision: u64, limit: Option<usize>) -> Result<ComparisonReport> {
        let comparison = self.view(revision).await?;
        let git = self.git.clone();

        let Some(children) = self.get_children().await? else {
            return Ok(ComparisonReport {
                comparison,
                behind: None,
                ahead: None,
                files: None,
            });
        };

        let behind = children.behind.first_page(limit).await?;
        let ahead = children.ahead.first_page(limit).await?;
        let files = children.files.result(git.as_ref()).await?.clone();

        Ok(ComparisonReport {
            comparison,
            behind: Some(behind),
            ahead: Some(ahead),
            files: Some(files),
        })
    }
}

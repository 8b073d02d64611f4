use git2::{Delta, Diff, DiffFindOptions, DiffOptions};

use crate::error::Result;
use crate::git::graph::plain_merge_base;
use crate::git::repository::{head_is_unborn, resolve_commit, GitRepository};
use crate::git::revspec::RevRange;
use crate::models::{DiffStatus, FileStatus, HEAD};

impl GitRepository {
    /// File-level status for a diff expression.
    ///
    /// - `A...B`: changes on B since its merge base with A (`None` if unrelated)
    /// - `A..B`: tree of A against tree of B
    /// - `A`: tree of A against the working tree, index included
    pub fn diff_status(&self, expression: &str) -> Result<Option<Vec<FileStatus>>> {
        let spec = RevRange::parse(expression)?;

        self.with_repo(|repo| {
            let mut opts = DiffOptions::new();
            opts.include_untracked(true);
            opts.recurse_untracked_dirs(true);

            let mut diff = match &spec {
                RevRange::Single(reference) => {
                    if reference == HEAD && head_is_unborn(repo)? {
                        return Ok(None);
                    }
                    let tree = resolve_commit(repo, reference)?.tree()?;
                    repo.diff_tree_to_workdir_with_index(Some(&tree), Some(&mut opts))?
                }
                RevRange::TwoDot(from, to) => {
                    let from_tree = resolve_commit(repo, from)?.tree()?;
                    let to_tree = resolve_commit(repo, to)?.tree()?;
                    repo.diff_tree_to_tree(Some(&from_tree), Some(&to_tree), Some(&mut opts))?
                }
                RevRange::ThreeDot(left, right) => {
                    let Some(base) = plain_merge_base(repo, left, right)? else {
                        tracing::debug!("no merge base for {}, no diff status", expression);
                        return Ok(None);
                    };
                    let base_tree = repo.find_commit(base)?.tree()?;
                    let to_tree = resolve_commit(repo, right)?.tree()?;
                    repo.diff_tree_to_tree(Some(&base_tree), Some(&to_tree), Some(&mut opts))?
                }
            };

            let mut find = DiffFindOptions::new();
            find.renames(true);
            diff.find_similar(Some(&mut find))?;

            Ok(Some(collect_statuses(&diff)))
        })
    }
}

fn collect_statuses(diff: &Diff<'_>) -> Vec<FileStatus> {
    diff.deltas()
        .filter_map(|delta| {
            let status = match delta.status() {
                Delta::Added | Delta::Untracked => DiffStatus::Added,
                Delta::Deleted => DiffStatus::Deleted,
                Delta::Modified => DiffStatus::Modified,
                Delta::Renamed => DiffStatus::Renamed,
                Delta::Copied => DiffStatus::Copied,
                Delta::Typechange => DiffStatus::TypeChanged,
                Delta::Unmodified => DiffStatus::Unmodified,
                // Ignored and unreadable entries are not changes
                _ => return None,
            };

            let new_path = delta.new_file().path().map(|p| p.to_string_lossy().to_string());
            let old_path = delta.old_file().path().map(|p| p.to_string_lossy().to_string());
            let path = new_path.clone().or_else(|| old_path.clone())?;

            let original_path = match status {
                DiffStatus::Renamed | DiffStatus::Copied => old_path.filter(|old| *old != path),
                _ => None,
            };

            Some(FileStatus {
                original_path,
                ..FileStatus::new(path, status)
            })
        })
        .collect()
}

use crate::compare::range::create_range;
use crate::error::Result;
use crate::git::GitQueryService;
use crate::models::{FileDiffResult, FileStatus, RangeNotation, RangePair, HEAD};

/// Which changed-file set to compute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileDiffQuery {
    /// Everything between the compare-with ref and the base.
    Full {
        base: String,
        /// Empty means the working tree.
        compare_with: String,
        working_tree: bool,
        notation: Option<RangeNotation>,
    },
    /// Changes the base has since the merge base, plus uncommitted changes
    /// when comparing with the working tree.
    Ahead { pair: RangePair, working_tree: bool },
    /// Changes the compare-with ref has since the merge base.
    Behind { pair: RangePair },
}

impl FileDiffQuery {
    /// The diff-status expression for the historical part of the query.
    pub fn expression(&self) -> String {
        match self {
            FileDiffQuery::Full {
                base,
                compare_with,
                working_tree,
                notation,
            } => {
                if compare_with.is_empty() {
                    base.clone()
                } else if *working_tree {
                    compare_with.clone()
                } else {
                    create_range(compare_with, base, notation.unwrap_or(RangeNotation::ThreeDot))
                }
            }
            FileDiffQuery::Ahead { pair, .. } | FileDiffQuery::Behind { pair } => {
                create_range(&pair.ref1, &pair.ref2, RangeNotation::ThreeDot)
            }
        }
    }

    pub async fn run(&self, git: &dyn GitQueryService) -> Result<FileDiffResult> {
        let expression = self.expression();
        let mut files = git.diff_status(&expression).await?;

        if let FileDiffQuery::Ahead { working_tree: true, .. } = self {
            let working = git.diff_status(HEAD).await?;
            if let Some(working) = working {
                files = Some(merge_working_files(files.unwrap_or_default(), working));
            }
        }

        tracing::debug!(
            "diff status {}: {} files",
            expression,
            files.as_ref().map_or(0, |f| f.len())
        );

        Ok(FileDiffResult {
            label: files_changed_label(files.as_deref()),
            files,
        })
    }
}

/// Overlay working-tree statuses on a historical set: same path replaces,
/// new paths append, untouched paths stay as they were.
pub fn merge_working_files(mut historical: Vec<FileStatus>, working: Vec<FileStatus>) -> Vec<FileStatus> {
    for file in working {
        match historical.iter_mut().find(|f| f.path == file.path) {
            Some(existing) => *existing = file,
            None => historical.push(file),
        }
    }
    historical
}

pub fn files_changed_label(files: Option<&[FileStatus]>) -> String {
    let count = files.map_or(0, |f| f.len());
    format!("{} changed", pluralize("file", count))
}

/// `"No files"`, `"1 file"`, `"3 files"`.
pub fn pluralize(word: &str, count: usize) -> String {
    match count {
        0 => format!("No {}s", word),
        1 => format!("1 {}", word),
        n => format!("{} {}s", n, word),
    }
}

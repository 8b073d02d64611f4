//! File-level diff DTOs.
//!
//! - `FileStatus`: one changed path and how it changed
//! - `FileDiffResult`: a labelled set of changed files for one comparison
//!
//! Only statuses are modelled; hunks and line content are out of scope.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileStatus {
    pub path: String,
    /// Previous path for renames and copies.
    pub original_path: Option<String>,
    pub status: DiffStatus,
}

impl FileStatus {
    pub fn new(path: impl Into<String>, status: DiffStatus) -> Self {
        Self {
            path: path.into(),
            original_path: None,
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    TypeChanged,
    Unmodified,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileDiffResult {
    pub label: String,
    /// `None` when the status query had no result, as opposed to no changes.
    pub files: Option<Vec<FileStatus>>,
}

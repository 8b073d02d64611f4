//! Comparison state and read-model DTOs.
//!
//! - `ComparisonTarget`: what a branch is compared against (persisted)
//! - `RangePair`: directional pair of refs for ahead/behind queries
//! - `ComparisonView`, `ChildView`: what the API returns for one branch node
//! - `CommitPageResponse`: a page of ahead/behind commits

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{CommitDetail, FileDiffResult};

/// Symbolic ref used when no compare-with reference is set.
pub const HEAD: &str = "HEAD";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMode {
    /// Compare against the working tree (uncommitted changes included).
    #[default]
    Working,
    Branch,
    Tag,
}

impl ComparisonMode {
    pub fn compares_working_tree(self) -> bool {
        self == ComparisonMode::Working
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonMode::Working => "working",
            ComparisonMode::Branch => "branch",
            ComparisonMode::Tag => "tag",
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "working" => Ok(ComparisonMode::Working),
            "branch" => Ok(ComparisonMode::Branch),
            "tag" => Ok(ComparisonMode::Tag),
            other => Err(format!(
                "unknown comparison mode '{}' (expected working, branch or tag)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RangeNotation {
    #[serde(rename = "..")]
    TwoDot,
    #[serde(rename = "...")]
    ThreeDot,
}

impl RangeNotation {
    pub fn as_str(self) -> &'static str {
        match self {
            RangeNotation::TwoDot => "..",
            RangeNotation::ThreeDot => "...",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComparisonTarget {
    /// Empty means the working tree.
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notation: Option<RangeNotation>,
    #[serde(rename = "type", alias = "mode", default)]
    pub mode: ComparisonMode,
}

impl ComparisonTarget {
    pub fn new(reference: impl Into<String>, mode: ComparisonMode) -> Self {
        Self {
            reference: reference.into(),
            notation: None,
            mode,
        }
    }

    pub fn is_working_tree(&self) -> bool {
        self.reference.is_empty()
    }

    /// Working-tree comparison applies for an empty ref whatever the mode says.
    pub fn compares_working_tree(&self) -> bool {
        self.is_working_tree() || self.mode.compares_working_tree()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RangePair {
    pub ref1: String,
    pub ref2: String,
}

impl RangePair {
    pub fn new(ref1: impl Into<String>, ref2: impl Into<String>) -> Self {
        Self {
            ref1: ref1.into(),
            ref2: ref2.into(),
        }
    }
}

/// Commit counts relative to the first ref of the queried pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AheadBehind {
    /// Reachable only from `ref1`.
    pub ahead: usize,
    /// Reachable only from `ref2`.
    pub behind: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommitDirection {
    Ahead,
    Behind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileScope {
    #[default]
    All,
    Ahead,
    Behind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChildView {
    Commits {
        direction: CommitDirection,
        label: String,
        description: String,
        count: usize,
        range: String,
        /// Left side of the file comparison: the merge base, or `ref1` without one.
        files_base: String,
        files_head: String,
    },
    Files {
        label: String,
        expression: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonView {
    pub id: String,
    pub branch: String,
    pub current: bool,
    pub compare_with: Option<ComparisonTarget>,
    pub mode: ComparisonMode,
    pub ahead: RangePair,
    pub behind: RangePair,
    pub merge_base: Option<String>,
    pub children: Vec<ChildView>,
    /// Bumped every time this node signals a change.
    pub revision: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitPageResponse {
    pub direction: CommitDirection,
    pub commits: Vec<CommitDetail>,
    pub has_more: bool,
}

/// Everything the `show` command prints for one branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub comparison: ComparisonView,
    pub behind: Option<CommitPageResponse>,
    pub ahead: Option<CommitPageResponse>,
    pub files: Option<FileDiffResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_serializes_with_ref_and_type_keys() {
        let target = ComparisonTarget {
            reference: "main".to_string(),
            notation: Some(RangeNotation::TwoDot),
            mode: ComparisonMode::Branch,
        };
        let json = serde_json::to_value(&target).unwrap();
        assert_eq!(json["ref"], "main");
        assert_eq!(json["notation"], "..");
        assert_eq!(json["type"], "branch");
    }

    #[test]
    fn target_without_mode_defaults_to_working() {
        let target: ComparisonTarget = serde_json::from_str(r#"{"ref":"develop"}"#).unwrap();
        assert_eq!(target.mode, ComparisonMode::Working);
        assert_eq!(target.notation, None);
    }

    #[test]
    fn empty_ref_compares_working_tree_regardless_of_mode() {
        let target = ComparisonTarget::new("", ComparisonMode::Tag);
        assert!(target.compares_working_tree());

        let target = ComparisonTarget::new("v1.0", ComparisonMode::Tag);
        assert!(!target.compares_working_tree());
    }

    #[test]
    fn mode_from_str() {
        assert_eq!("Branch".parse::<ComparisonMode>(), Ok(ComparisonMode::Branch));
        assert!("nope".parse::<ComparisonMode>().is_err());
    }
}

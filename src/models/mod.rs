//! Data transfer objects (DTOs) for the comparison engine and its API.
//!
//! These structs are serialized to JSON for frontend consumption and for the
//! persisted comparison state.
//! - `compare`: ComparisonTarget, ComparisonMode, RangePair, comparison views
//! - `commit`: CommitDetail, AuthorInfo, LogPage, LogCursor
//! - `diff`: FileStatus, DiffStatus, FileDiffResult
//! - `repository`: RepositoryInfo, CommitInfo, RefInfo for the ref picker

pub mod commit;
pub mod compare;
pub mod diff;
pub mod repository;

pub use commit::*;
pub use compare::*;
pub use diff::*;
pub use repository::*;

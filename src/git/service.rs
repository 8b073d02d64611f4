//! The query surface the comparison layer consumes.
//!
//! Every method distinguishes "no result" (`Ok(None)`) from failure (`Err`):
//! a missing merge base or an empty repository is a normal outcome, an
//! unknown reference is not.

use async_trait::async_trait;

use crate::error::Result;
use crate::git::repository::GitRepository;
use crate::models::{AheadBehind, FileStatus, LogCursor, LogPage, RangePair};

#[async_trait]
pub trait GitQueryService: Send + Sync {
    /// Commits only in `pair.ref1` (ahead) and only in `pair.ref2` (behind).
    async fn ahead_behind_count(&self, pair: &RangePair) -> Result<Option<AheadBehind>>;

    async fn merge_base(&self, ref1: &str, ref2: &str, fork_point: bool) -> Result<Option<String>>;

    async fn diff_status(&self, expression: &str) -> Result<Option<Vec<FileStatus>>>;

    async fn log(&self, range: &str, limit: Option<usize>) -> Result<Option<LogPage>>;

    /// Continue a previous [`log`](GitQueryService::log) call.
    async fn log_more(&self, cursor: &LogCursor, limit: Option<usize>) -> Result<Option<LogPage>>;
}

#[async_trait]
impl GitQueryService for GitRepository {
    async fn ahead_behind_count(&self, pair: &RangePair) -> Result<Option<AheadBehind>> {
        self.ahead_behind(pair)
    }

    async fn merge_base(&self, ref1: &str, ref2: &str, fork_point: bool) -> Result<Option<String>> {
        GitRepository::merge_base(self, ref1, ref2, fork_point)
    }

    async fn diff_status(&self, expression: &str) -> Result<Option<Vec<FileStatus>>> {
        GitRepository::diff_status(self, expression)
    }

    async fn log(&self, range: &str, limit: Option<usize>) -> Result<Option<LogPage>> {
        GitRepository::log(self, range, limit)
    }

    async fn log_more(&self, cursor: &LogCursor, limit: Option<usize>) -> Result<Option<LogPage>> {
        GitRepository::log_more(self, cursor, limit)
    }
}

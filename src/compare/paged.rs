use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Result;
use crate::git::GitQueryService;
use crate::models::{CommitDetail, LogCursor};

#[derive(Debug, Clone)]
enum PageState {
    Unfetched,
    Open(LogCursor),
    Exhausted,
}

/// Commits accumulated so far for one range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagedCommitResult {
    pub entries: Vec<CommitDetail>,
    pub has_more: bool,
}

/// A commit listing over a fixed range that can be extended page by page.
///
/// `fetch` starts over from the range; `more` continues from the cursor of
/// the last page and appends to what was already fetched.
pub struct PagedCommitQuery {
    git: Arc<dyn GitQueryService>,
    range: String,
    state: PageState,
    result: PagedCommitResult,
}

impl PagedCommitQuery {
    pub fn new(git: Arc<dyn GitQueryService>, range: impl Into<String>) -> Self {
        Self {
            git,
            range: range.into(),
            state: PageState::Unfetched,
            result: PagedCommitResult::default(),
        }
    }

    pub fn range(&self) -> &str {
        &self.range
    }

    pub fn result(&self) -> &PagedCommitResult {
        &self.result
    }

    /// Whether `more` can still add entries.
    pub fn can_fetch_more(&self) -> bool {
        matches!(self.state, PageState::Open(_))
    }

    /// (Re)start the query. `limit = None` fetches the whole range at once.
    pub async fn fetch(&mut self, limit: Option<usize>) -> Result<&PagedCommitResult> {
        let page = self.git.log(&self.range, limit).await?;

        match page {
            Some(page) => {
                self.result = PagedCommitResult {
                    entries: page.entries,
                    has_more: page.has_more,
                };
                self.state = match page.cursor {
                    Some(cursor) if page.has_more => PageState::Open(cursor),
                    _ => PageState::Exhausted,
                };
            }
            None => {
                self.result = PagedCommitResult::default();
                self.state = PageState::Exhausted;
            }
        }

        tracing::debug!(
            "Fetched {} commits for {} (has_more={})",
            self.result.entries.len(),
            self.range,
            self.result.has_more
        );
        Ok(&self.result)
    }

    /// Append the next page. A no-op once the range is exhausted.
    pub async fn more(&mut self, limit: Option<usize>) -> Result<&PagedCommitResult> {
        if matches!(self.state, PageState::Unfetched) {
            return self.fetch(limit).await;
        }
        let PageState::Open(cursor) = &self.state else {
            return Ok(&self.result);
        };
        let cursor = cursor.clone();

        match self.git.log_more(&cursor, limit).await? {
            Some(page) => {
                let seen: HashSet<String> = self.result.entries.iter().map(|c| c.oid.clone()).collect();
                self.result
                    .entries
                    .extend(page.entries.into_iter().filter(|c| !seen.contains(&c.oid)));
                self.result.has_more = page.has_more;
                self.state = match page.cursor {
                    Some(next) if page.has_more => PageState::Open(next),
                    _ => PageState::Exhausted,
                };
            }
            None => {
                // No continuation result: entries and has_more stay, the
                // cursor is kept so the next call retries
                tracing::debug!("No continuation for {} at offset {}", self.range, cursor.offset);
            }
        }

        Ok(&self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::testing::FakeGit;

    fn oids(result: &PagedCommitResult) -> Vec<&str> {
        result.entries.iter().map(|c| c.oid.as_str()).collect()
    }

    fn query(git: FakeGit) -> (Arc<FakeGit>, PagedCommitQuery) {
        let git = Arc::new(git);
        let query = PagedCommitQuery::new(git.clone(), "main..feature");
        (git, query)
    }

    #[tokio::test]
    async fn more_appends_pages() {
        let (git, mut query) = query(FakeGit::new().with_log("main..feature", &["e", "d", "c", "b", "a"]));

        let first = query.fetch(Some(2)).await.unwrap();
        assert_eq!(oids(first), vec!["e", "d"]);
        assert!(first.has_more);
        assert!(query.can_fetch_more());

        let second = query.more(Some(2)).await.unwrap();
        assert_eq!(oids(second), vec!["e", "d", "c", "b"]);
        assert!(second.has_more);

        let third = query.more(Some(2)).await.unwrap();
        assert_eq!(oids(third), vec!["e", "d", "c", "b", "a"]);
        assert!(!third.has_more);
        assert!(!query.can_fetch_more());

        // Continuation goes through the cursor, not a fresh range query
        assert_eq!(
            git.calls(),
            vec![
                "log main..feature limit=Some(2)",
                "log_more main..feature offset=2 limit=Some(2)",
                "log_more main..feature offset=4 limit=Some(2)",
            ]
        );
    }

    #[tokio::test]
    async fn more_after_exhaustion_is_a_no_op() {
        let (git, mut query) = query(FakeGit::new().with_log("main..feature", &["b", "a"]));
        query.fetch(Some(5)).await.unwrap();
        let before = query.result().clone();
        git.clear_calls();

        let after = query.more(Some(5)).await.unwrap();
        assert_eq!(*after, before);
        assert!(git.calls().is_empty());
    }

    #[tokio::test]
    async fn unlimited_fetch_is_exhausted_immediately() {
        let (_git, mut query) = query(FakeGit::new().with_log("main..feature", &["c", "b", "a"]));
        let result = query.fetch(None).await.unwrap();
        assert_eq!(result.entries.len(), 3);
        assert!(!result.has_more);
        assert!(!query.can_fetch_more());
    }

    #[tokio::test]
    async fn lost_continuation_keeps_entries_and_has_more() {
        let (git, mut query) = query(
            FakeGit::new()
                .with_log("main..feature", &["c", "b", "a"])
                .dropping_continuations(),
        );
        query.fetch(Some(1)).await.unwrap();
        let result = query.more(Some(1)).await.unwrap();
        assert_eq!(oids(result), vec!["c"]);
        assert!(result.has_more);
        assert!(query.can_fetch_more());

        query.more(Some(1)).await.unwrap();
        assert_eq!(
            git.calls(),
            vec![
                "log main..feature limit=Some(1)",
                "log_more main..feature offset=1 limit=Some(1)",
                "log_more main..feature offset=1 limit=Some(1)",
            ]
        );
    }

    #[tokio::test]
    async fn fetch_restarts_from_scratch() {
        let (_git, mut query) = query(FakeGit::new().with_log("main..feature", &["c", "b", "a"]));
        query.fetch(Some(1)).await.unwrap();
        query.more(Some(1)).await.unwrap();
        let restarted = query.fetch(Some(1)).await.unwrap();
        assert_eq!(oids(restarted), vec!["c"]);
    }

    #[tokio::test]
    async fn more_before_fetch_fetches() {
        let (_git, mut query) = query(FakeGit::new().with_log("main..feature", &["b", "a"]));
        assert!(!query.can_fetch_more());
        let result = query.more(Some(1)).await.unwrap();
        assert_eq!(oids(result), vec!["b"]);
        assert!(query.can_fetch_more());
    }

    #[tokio::test]
    async fn missing_log_is_empty_and_exhausted() {
        let (_git, mut query) = query(FakeGit::new());
        let result = query.fetch(Some(10)).await.unwrap();
        assert!(result.entries.is_empty());
        assert!(!query.can_fetch_more());
    }

    #[tokio::test]
    async fn errors_propagate() {
        let (_git, mut query) = query(FakeGit::new().failing_ref("feature"));
        assert!(query.fetch(Some(10)).await.is_err());
    }
}

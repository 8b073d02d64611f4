//! Canned git answers for exercising the comparison layer without a repository.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::{AppError, Result};
use crate::git::GitQueryService;
use crate::models::{AheadBehind, AuthorInfo, CommitDetail, FileStatus, LogCursor, LogPage, RangePair};

#[derive(Default)]
pub struct FakeGit {
    merge_bases: HashMap<(String, String, bool), String>,
    counts: HashMap<(String, String), AheadBehind>,
    diffs: HashMap<String, Vec<FileStatus>>,
    logs: HashMap<String, Vec<CommitDetail>>,
    failing: HashSet<String>,
    /// `log_more` answers `None`, as if the continuation was lost.
    drop_continuations: bool,
    calls: Mutex<Vec<String>>,
}

pub fn commit(oid: &str) -> CommitDetail {
    let author = AuthorInfo {
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
    };
    CommitDetail {
        oid: oid.to_string(),
        message: format!("commit {}", oid),
        author: author.clone(),
        committer: author,
        timestamp: 0,
        relative_time: "just now".to_string(),
        parent_count: 1,
        parents: Vec::new(),
    }
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_merge_base(mut self, ref1: &str, ref2: &str, fork_point: bool, base: &str) -> Self {
        self.merge_bases
            .insert((ref1.to_string(), ref2.to_string(), fork_point), base.to_string());
        self
    }

    pub fn with_counts(mut self, ref1: &str, ref2: &str, ahead: usize, behind: usize) -> Self {
        self.counts
            .insert((ref1.to_string(), ref2.to_string()), AheadBehind { ahead, behind });
        self
    }

    pub fn with_diff(mut self, expression: &str, files: Vec<FileStatus>) -> Self {
        self.diffs.insert(expression.to_string(), files);
        self
    }

    pub fn with_log(mut self, range: &str, oids: &[&str]) -> Self {
        self.logs
            .insert(range.to_string(), oids.iter().map(|o| commit(o)).collect());
        self
    }

    pub fn failing_ref(mut self, reference: &str) -> Self {
        self.failing.insert(reference.to_string());
        self
    }

    pub fn dropping_continuations(mut self) -> Self {
        self.drop_continuations = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, text: &str) -> Result<()> {
        match self.failing.iter().find(|r| text.contains(r.as_str())) {
            Some(r) => Err(AppError::RefNotFound(r.clone())),
            None => Ok(()),
        }
    }

    fn page(&self, range: &str, offset: usize, limit: Option<usize>) -> Option<LogPage> {
        let all = self.logs.get(range)?;
        let rest: Vec<_> = all.iter().skip(offset).cloned().collect();
        let (entries, has_more) = match limit {
            Some(l) if rest.len() > l => (rest[..l].to_vec(), true),
            _ => (rest, false),
        };
        let cursor = has_more.then(|| LogCursor {
            range: range.to_string(),
            offset: offset + entries.len(),
        });
        Some(LogPage {
            entries,
            has_more,
            cursor,
        })
    }
}

#[async_trait]
impl GitQueryService for FakeGit {
    async fn ahead_behind_count(&self, pair: &RangePair) -> Result<Option<AheadBehind>> {
        self.record(format!("ahead_behind {}...{}", pair.ref1, pair.ref2));
        self.check(&pair.ref1)?;
        self.check(&pair.ref2)?;
        Ok(self.counts.get(&(pair.ref1.clone(), pair.ref2.clone())).copied())
    }

    async fn merge_base(&self, ref1: &str, ref2: &str, fork_point: bool) -> Result<Option<String>> {
        self.record(format!("merge_base {} {} fork_point={}", ref1, ref2, fork_point));
        self.check(ref1)?;
        self.check(ref2)?;
        Ok(self
            .merge_bases
            .get(&(ref1.to_string(), ref2.to_string(), fork_point))
            .cloned())
    }

    async fn diff_status(&self, expression: &str) -> Result<Option<Vec<FileStatus>>> {
        self.record(format!("diff_status {}", expression));
        self.check(expression)?;
        Ok(self.diffs.get(expression).cloned())
    }

    async fn log(&self, range: &str, limit: Option<usize>) -> Result<Option<LogPage>> {
        self.record(format!("log {} limit={:?}", range, limit));
        self.check(range)?;
        Ok(self.page(range, 0, limit))
    }

    async fn log_more(&self, cursor: &LogCursor, limit: Option<usize>) -> Result<Option<LogPage>> {
        self.record(format!("log_more {} offset={} limit={:?}", cursor.range, cursor.offset, limit));
        if self.drop_continuations {
            return Ok(None);
        }
        Ok(self.page(&cursor.range, cursor.offset, limit))
    }
}

//! Paged commit history over range expressions.
//!
//! Pages are cut from a fresh revwalk each time; a [`LogCursor`] records the
//! range and how many commits were already handed out, so continuing a query
//! skips exactly what the caller has seen.

use git2::{Repository, Revwalk, Sort};

use crate::error::Result;
use crate::git::graph::plain_merge_base;
use crate::git::repository::{commit_to_detail, head_is_unborn, resolve_commit, GitRepository};
use crate::git::revspec::RevRange;
use crate::models::{LogCursor, LogPage};

impl GitRepository {
    /// First page of commits for `range`; `limit = None` returns everything.
    pub fn log(&self, range: &str, limit: Option<usize>) -> Result<Option<LogPage>> {
        self.log_from(range, 0, limit)
    }

    /// The page following `cursor`.
    pub fn log_more(&self, cursor: &LogCursor, limit: Option<usize>) -> Result<Option<LogPage>> {
        self.log_from(&cursor.range, cursor.offset, limit)
    }

    fn log_from(&self, range: &str, offset: usize, limit: Option<usize>) -> Result<Option<LogPage>> {
        let spec = RevRange::parse(range)?;

        self.with_repo(|repo| {
            if head_is_unborn(repo)? {
                return Ok(None);
            }

            let revwalk = build_revwalk(repo, &spec)?;

            // Fetch one extra to learn whether another page exists
            let take = limit.map(|l| l.saturating_add(1)).unwrap_or(usize::MAX);
            let mut entries = Vec::new();
            for oid in revwalk.skip(offset).take(take) {
                let commit = repo.find_commit(oid?)?;
                entries.push(commit_to_detail(&commit));
            }

            let has_more = match limit {
                Some(l) if entries.len() > l => {
                    entries.truncate(l);
                    true
                }
                _ => false,
            };

            let cursor = has_more.then(|| LogCursor {
                range: range.to_string(),
                offset: offset + entries.len(),
            });

            tracing::debug!(
                "log {} offset={} limit={:?}: {} entries, has_more={}",
                range,
                offset,
                limit,
                entries.len(),
                has_more
            );

            Ok(Some(LogPage {
                entries,
                has_more,
                cursor,
            }))
        })
    }
}

fn build_revwalk<'r>(repo: &'r Repository, spec: &RevRange) -> Result<Revwalk<'r>> {
    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

    match spec {
        RevRange::Single(tip) => {
            revwalk.push(resolve_commit(repo, tip)?.id())?;
        }
        RevRange::TwoDot(from, to) => {
            let from = resolve_commit(repo, from)?.id();
            let to = resolve_commit(repo, to)?.id();
            revwalk.push(to)?;
            revwalk.hide(from)?;
        }
        RevRange::ThreeDot(left, right) => {
            let left_oid = resolve_commit(repo, left)?.id();
            let right_oid = resolve_commit(repo, right)?.id();
            revwalk.push(left_oid)?;
            revwalk.push(right_oid)?;
            if let Some(base) = plain_merge_base(repo, left, right)? {
                revwalk.hide(base)?;
            }
        }
    }

    Ok(revwalk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fixture::TestRepo;

    fn linear(count: usize) -> TestRepo {
        let fx = TestRepo::new();
        for i in 0..count {
            fx.commit_file("f.txt", &i.to_string(), &format!("commit {}", i));
        }
        fx
    }

    #[test]
    fn pages_through_history_without_overlap() {
        let fx = linear(5);
        let repo = GitRepository::open(fx.path()).unwrap();

        let first = repo.log("HEAD", Some(2)).unwrap().unwrap();
        assert_eq!(first.entries.len(), 2);
        assert!(first.has_more);
        assert_eq!(first.entries[0].message, "commit 4");

        let cursor = first.cursor.clone().unwrap();
        assert_eq!(cursor.offset, 2);

        let second = repo.log_more(&cursor, Some(2)).unwrap().unwrap();
        assert_eq!(second.entries[0].message, "commit 2");
        assert!(second.has_more);

        let third = repo.log_more(second.cursor.as_ref().unwrap(), Some(2)).unwrap().unwrap();
        assert_eq!(third.entries.len(), 1);
        assert!(!third.has_more);
        assert!(third.cursor.is_none());
    }

    #[test]
    fn no_limit_returns_everything() {
        let fx = linear(3);
        let repo = GitRepository::open(fx.path()).unwrap();
        let page = repo.log("HEAD", None).unwrap().unwrap();
        assert_eq!(page.entries.len(), 3);
        assert!(!page.has_more);
    }

    #[test]
    fn exact_limit_has_no_more() {
        let fx = linear(3);
        let repo = GitRepository::open(fx.path()).unwrap();
        let page = repo.log("HEAD", Some(3)).unwrap().unwrap();
        assert_eq!(page.entries.len(), 3);
        assert!(!page.has_more);
    }

    #[test]
    fn two_dot_range_lists_one_side() {
        let fx = linear(1);
        fx.branch("feature");
        fx.commit_file("main.txt", "m", "on main");
        fx.checkout("feature");
        fx.commit_file("feat.txt", "f1", "feature 1");
        fx.commit_file("feat.txt", "f2", "feature 2");

        let repo = GitRepository::open(fx.path()).unwrap();
        let ahead = repo.log("main..feature", None).unwrap().unwrap();
        let messages: Vec<_> = ahead.entries.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["feature 2", "feature 1"]);

        let behind = repo.log("feature..main", None).unwrap().unwrap();
        assert_eq!(behind.entries.len(), 1);
        assert_eq!(behind.entries[0].message, "on main");

        let both = repo.log("main...feature", None).unwrap().unwrap();
        assert_eq!(both.entries.len(), 3);
    }

    #[test]
    fn empty_repository_has_no_log() {
        let fx = TestRepo::new();
        let repo = GitRepository::open(fx.path()).unwrap();
        assert!(repo.log("HEAD", Some(10)).unwrap().is_none());
    }

    #[test]
    fn unborn_non_default_branch_has_no_log() {
        let fx = TestRepo::new();
        fx.repo.set_head("refs/heads/trunk").unwrap();
        let repo = GitRepository::open(fx.path()).unwrap();
        assert!(repo.log("HEAD", Some(10)).unwrap().is_none());
        assert!(repo.log("main..HEAD", None).unwrap().is_none());
    }

    #[test]
    fn largest_limit_returns_whole_history() {
        let fx = linear(3);
        let repo = GitRepository::open(fx.path()).unwrap();
        let page = repo.log("HEAD", Some(usize::MAX)).unwrap().unwrap();
        assert_eq!(page.entries.len(), 3);
        assert!(!page.has_more);
        assert!(page.cursor.is_none());
    }
}

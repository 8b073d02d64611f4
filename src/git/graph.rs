//! Commit-graph queries: ahead/behind counts and merge bases.

use git2::{ErrorCode, Oid, Repository};

use crate::error::{AppError, Result};
use crate::git::repository::{head_is_unborn, resolve_commit, GitRepository};
use crate::models::{AheadBehind, RangePair};

impl GitRepository {
    /// Count commits reachable only from `pair.ref1` (ahead) and only from
    /// `pair.ref2` (behind).
    pub fn ahead_behind(&self, pair: &RangePair) -> Result<Option<AheadBehind>> {
        self.with_repo(|repo| {
            if head_is_unborn(repo)? {
                return Ok(None);
            }
            let left = resolve_commit(repo, &pair.ref1)?.id();
            let right = resolve_commit(repo, &pair.ref2)?.id();
            let (ahead, behind) = repo.graph_ahead_behind(left, right)?;
            Ok(Some(AheadBehind { ahead, behind }))
        })
    }

    /// Best common ancestor of two refs, `None` for unrelated histories.
    ///
    /// With `fork_point`, only the reflog of `ref1` is consulted (see
    /// [`find_fork_point`]); a ref without a reflog yields `None`.
    pub fn merge_base(&self, ref1: &str, ref2: &str, fork_point: bool) -> Result<Option<String>> {
        self.with_repo(|repo| {
            let oid = if fork_point {
                find_fork_point(repo, ref1, ref2)?
            } else {
                plain_merge_base(repo, ref1, ref2)?
            };
            Ok(oid.map(|o| o.to_string()))
        })
    }
}

pub(crate) fn plain_merge_base(repo: &Repository, ref1: &str, ref2: &str) -> Result<Option<Oid>> {
    let one = resolve_commit(repo, ref1)?.id();
    let two = resolve_commit(repo, ref2)?.id();
    match repo.merge_base(one, two) {
        Ok(oid) => Ok(Some(oid)),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(AppError::Git(e)),
    }
}

/// The point where `ref2` forked from `ref1`, judged by `ref1`'s reflog: the
/// newest reflog entry that `ref2` contains.
///
/// Unlike the plain merge base this survives `ref1` being rewritten
/// (rebased or force-pushed) after `ref2` was created from it.
fn find_fork_point(repo: &Repository, ref1: &str, ref2: &str) -> Result<Option<Oid>> {
    let tip = resolve_commit(repo, ref2)?.id();

    let Ok(reference) = repo.resolve_reference_from_short_name(ref1) else {
        return Ok(None);
    };
    let Some(refname) = reference.name() else {
        return Ok(None);
    };
    let Ok(reflog) = repo.reflog(refname) else {
        return Ok(None);
    };

    for entry in reflog.iter() {
        let candidate = entry.id_new();
        if candidate.is_zero() {
            continue;
        }
        // Entries may point at commits that have since been pruned
        if candidate == tip || repo.graph_descendant_of(tip, candidate).unwrap_or(false) {
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}

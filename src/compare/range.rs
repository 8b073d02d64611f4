use crate::error::Result;
use crate::git::GitQueryService;
use crate::models::{RangeNotation, RangePair, HEAD};

/// Derives the directional ref pairs and range expressions for one
/// comparison of `base` against `compare_with`.
pub struct RangeResolver<'a> {
    base: &'a str,
    /// Empty means the working tree, which resolves to `HEAD` in ranges.
    compare_with: &'a str,
}

impl<'a> RangeResolver<'a> {
    pub fn new(base: &'a str, compare_with: &'a str) -> Self {
        Self { base, compare_with }
    }

    fn compare_ref(&self) -> &'a str {
        if self.compare_with.is_empty() {
            HEAD
        } else {
            self.compare_with
        }
    }

    /// Commits the base has that the compare-with ref lacks.
    pub fn ahead_pair(&self) -> RangePair {
        RangePair::new(self.compare_ref(), self.base)
    }

    /// Commits the compare-with ref has that the base lacks.
    pub fn behind_pair(&self) -> RangePair {
        RangePair::new(self.base, self.compare_ref())
    }

    /// Fork point first, then the plain merge base. `None` means the histories
    /// share nothing; callers fall back to `ref1` itself.
    pub async fn merge_base(
        git: &dyn GitQueryService,
        ref1: &str,
        ref2: &str,
    ) -> Result<Option<String>> {
        if let Some(fork_point) = git.merge_base(ref1, ref2, true).await? {
            return Ok(Some(fork_point));
        }
        tracing::debug!("No fork point for {} and {}, trying merge base", ref1, ref2);
        git.merge_base(ref1, ref2, false).await
    }
}

/// `ref1..ref2` or `ref1...ref2`.
pub fn create_range(ref1: &str, ref2: &str, notation: RangeNotation) -> String {
    format!("{}{}{}", ref1, notation.as_str(), ref2)
}

//! Parsing of the range expressions passed to log and diff queries.

use crate::error::{AppError, Result};
use crate::models::HEAD;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevRange {
    /// `A`
    Single(String),
    /// `A..B`: reachable from B but not from A.
    TwoDot(String, String),
    /// `A...B`: symmetric difference, or "since the merge base" for diffs.
    ThreeDot(String, String),
}

impl RevRange {
    /// Parse an expression; an empty side of a range means `HEAD`.
    pub fn parse(expression: &str) -> Result<Self> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(AppError::InvalidRange(expression.to_string()));
        }

        if let Some((left, right)) = expression.split_once("...") {
            if right.contains("..") || right.starts_with('.') {
                return Err(AppError::InvalidRange(expression.to_string()));
            }
            return Ok(RevRange::ThreeDot(or_head(left), or_head(right)));
        }

        if let Some((left, right)) = expression.split_once("..") {
            if right.contains("..") || (left.is_empty() && right.is_empty()) {
                return Err(AppError::InvalidRange(expression.to_string()));
            }
            return Ok(RevRange::TwoDot(or_head(left), or_head(right)));
        }

        Ok(RevRange::Single(expression.to_string()))
    }
}

fn or_head(side: &str) -> String {
    if side.is_empty() {
        HEAD.to_string()
    } else {
        side.to_string()
    }
}

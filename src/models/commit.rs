use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitDetail {
    pub oid: String,
    pub message: String,
    pub author: AuthorInfo,
    pub committer: AuthorInfo,
    pub timestamp: i64,
    pub relative_time: String,
    pub parent_count: usize,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorInfo {
    pub name: String,
    pub email: String,
}

/// Continuation point of a log query.
///
/// Holding a cursor means "continue where the last page stopped"; issuing a
/// new query against `range` means "start over".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogCursor {
    pub range: String,
    pub offset: usize,
}

/// One page of commits as returned by the git service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPage {
    pub entries: Vec<CommitDetail>,
    pub has_more: bool,
    /// Present only while `has_more` is true.
    pub cursor: Option<LogCursor>,
}

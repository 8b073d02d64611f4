use git2::{BranchType, ErrorCode, Repository};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{AuthorInfo, CommitDetail, CommitInfo, RefInfo, RefKind, RepositoryInfo};

pub struct GitRepository {
    pub repo: Mutex<Repository>,
    pub path: String,
}

impl GitRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let repo = Repository::discover(&path).map_err(|_| AppError::RepoNotFound(path_str.clone()))?;

        let path = repo
            .workdir()
            .map(|p| p.to_string_lossy().trim_end_matches('/').to_string())
            .unwrap_or(path_str);

        Ok(Self {
            repo: Mutex::new(repo),
            path,
        })
    }

    pub fn info(&self) -> Result<RepositoryInfo> {
        self.with_repo(|repo| {
            let name = Path::new(&self.path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown".to_string());

            let head_commit = repo.head().ok().and_then(|h| {
                h.peel_to_commit().ok().map(|c| commit_to_info(&c))
            });

            Ok(RepositoryInfo {
                name,
                path: self.path.clone(),
                head_branch: head_branch_name(repo),
                head_commit,
                is_bare: repo.is_bare(),
                is_empty: repo.is_empty().unwrap_or(true),
            })
        })
    }

    pub fn with_repo<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Repository) -> Result<T>,
    {
        let repo = self.repo.lock().map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        f(&repo)
    }

    /// Directory holding repository metadata (`.git`).
    pub fn git_dir(&self) -> Result<PathBuf> {
        self.with_repo(|repo| Ok(repo.path().to_path_buf()))
    }

    /// Name of the checked-out branch, `None` when HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<String>> {
        self.with_repo(|repo| Ok(head_branch_name(repo)))
    }

    /// Whether `reference` resolves to a commit.
    pub fn ref_exists(&self, reference: &str) -> Result<bool> {
        self.with_repo(|repo| match resolve_commit(repo, reference) {
            Ok(_) => Ok(true),
            Err(AppError::RefNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        })
    }

    /// What a short ref name names. Local branches shadow remote-tracking
    /// ones, which shadow tags; `None` for anything else (shas, `HEAD~2`).
    pub fn ref_kind(&self, name: &str) -> Result<Option<RefKind>> {
        self.with_repo(|repo| {
            if repo.find_branch(name, BranchType::Local).is_ok() {
                Ok(Some(RefKind::Branch))
            } else if repo.find_branch(name, BranchType::Remote).is_ok() {
                Ok(Some(RefKind::Remote))
            } else if repo.find_reference(&format!("refs/tags/{}", name)).is_ok() {
                Ok(Some(RefKind::Tag))
            } else {
                Ok(None)
            }
        })
    }

    /// Branches (local, then remote) and tags, offered by the reference picker.
    pub fn list_refs(&self, include_tags: bool) -> Result<Vec<RefInfo>> {
        self.with_repo(|repo| {
            let current = head_branch_name(repo);
            let mut refs = Vec::new();

            for (branch_type, kind) in [(BranchType::Local, RefKind::Branch), (BranchType::Remote, RefKind::Remote)] {
                for branch in repo.branches(Some(branch_type))? {
                    let (branch, _) = branch?;
                    let Some(name) = branch.name()?.map(|n| n.to_string()) else {
                        continue;
                    };
                    // Skip symbolic remote heads like origin/HEAD
                    if kind == RefKind::Remote && name.ends_with("/HEAD") {
                        continue;
                    }
                    let last_commit = branch.get().peel_to_commit().ok().map(|c| commit_to_info(&c));
                    refs.push(RefInfo {
                        is_current: kind == RefKind::Branch && current.as_deref() == Some(name.as_str()),
                        name,
                        kind,
                        last_commit,
                    });
                }
            }

            if include_tags {
                let tags = repo.tag_names(None)?;
                for name in tags.iter().flatten() {
                    let last_commit = repo
                        .revparse_single(&format!("refs/tags/{}", name))
                        .and_then(|obj| obj.peel_to_commit())
                        .ok()
                        .map(|c| commit_to_info(&c));
                    refs.push(RefInfo {
                        name: name.to_string(),
                        kind: RefKind::Tag,
                        is_current: false,
                        last_commit,
                    });
                }
            }

            Ok(refs)
        })
    }
}

fn head_branch_name(repo: &Repository) -> Option<String> {
    repo.head().ok().and_then(|h| {
        if h.is_branch() {
            h.shorthand().map(|s| s.to_string())
        } else {
            None
        }
    })
}

/// Whether HEAD points at a branch with no commits yet. Checked directly on
/// HEAD since `Repository::is_empty` only recognises the configured default
/// branch name.
pub fn head_is_unborn(repo: &Repository) -> Result<bool> {
    match repo.head() {
        Ok(_) => Ok(false),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(true),
        Err(e) => Err(AppError::Git(e)),
    }
}

/// Resolve a revision (branch, tag, sha, `HEAD~2`, ...) to a commit.
pub fn resolve_commit<'r>(repo: &'r Repository, reference: &str) -> Result<git2::Commit<'r>> {
    let obj = repo.revparse_single(reference).map_err(|e| match e.code() {
        ErrorCode::NotFound | ErrorCode::InvalidSpec | ErrorCode::Ambiguous | ErrorCode::UnbornBranch => {
            AppError::RefNotFound(reference.to_string())
        }
        _ => AppError::Git(e),
    })?;
    obj.peel_to_commit()
        .map_err(|_| AppError::RefNotFound(reference.to_string()))
}

pub fn commit_to_info(commit: &git2::Commit) -> CommitInfo {
    let timestamp = commit.time().seconds();
    CommitInfo {
        oid: commit.id().to_string(),
        message: commit.message().unwrap_or("").trim().to_string(),
        author: commit.author().name().unwrap_or("Unknown").to_string(),
        timestamp,
        relative_time: format_relative_time(timestamp),
    }
}

pub fn commit_to_detail(commit: &git2::Commit) -> CommitDetail {
    let author = commit.author();
    let committer = commit.committer();
    let timestamp = commit.time().seconds();

    CommitDetail {
        oid: commit.id().to_string(),
        message: commit.message().unwrap_or("").trim().to_string(),
        author: AuthorInfo {
            name: author.name().unwrap_or("Unknown").to_string(),
            email: author.email().unwrap_or("").to_string(),
        },
        committer: AuthorInfo {
            name: committer.name().unwrap_or("Unknown").to_string(),
            email: committer.email().unwrap_or("").to_string(),
        },
        timestamp,
        relative_time: format_relative_time(timestamp),
        parent_count: commit.parent_count(),
        parents: commit.parent_ids().map(|id| id.to_string()).collect(),
    }
}

pub fn format_relative_time(timestamp: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let diff = now - timestamp;

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        let mins = diff / 60;
        format!("{} minute{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if diff < 86400 {
        let hours = diff / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if diff < 2592000 {
        let days = diff / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else if diff < 31536000 {
        let months = diff / 2592000;
        format!("{} month{} ago", months, if months == 1 { "" } else { "s" })
    } else {
        let years = diff / 31536000;
        format!("{} year{} ago", years, if years == 1 { "" } else { "s" })
    }
}

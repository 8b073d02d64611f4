//! Branch comparison endpoints. `branch` defaults to the checked-out branch
//! everywhere.
//!
//! - GET /api/v1/compare?branch=
//!   Comparison view: target, mode, ahead/behind pairs, merge base, child
//!   summaries and the node's revision.
//!
//! - GET /api/v1/compare/commits?branch=&direction=ahead|behind&limit=
//!   Restarts the commit listing for one side and returns the first page.
//!
//! - GET /api/v1/compare/commits/more?branch=&direction=&limit=
//!   Continues the listing; returns everything fetched so far.
//!
//! - GET /api/v1/compare/files?branch=&scope=all|ahead|behind
//!
//! - POST /api/v1/compare/edit { branch?, ref? }
//!   Picks a new compare-with ref. A missing `ref` is a cancelled pick; an
//!   empty `ref` picks the working tree.
//!
//! - POST /api/v1/compare/clear { branch? }
//! - POST /api/v1/compare/mode { branch?, mode }
//! - POST /api/v1/compare/notation { branch?, notation }

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::compare::files::files_changed_label;
use crate::compare::{ComparisonOrchestrator, RequestedRef};
use crate::error::{AppError, Result};
use crate::models::{
    CommitDirection, CommitPageResponse, ComparisonMode, ComparisonView, FileDiffResult, FileScope, RangeNotation,
};
use crate::routes::SharedState;

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/compare", get(get_comparison))
        .route("/api/v1/compare/commits", get(get_commits))
        .route("/api/v1/compare/commits/more", get(get_more_commits))
        .route("/api/v1/compare/files", get(get_files))
        .route("/api/v1/compare/edit", post(edit_comparison))
        .route("/api/v1/compare/clear", post(clear_comparison))
        .route("/api/v1/compare/mode", post(set_mode))
        .route("/api/v1/compare/notation", post(set_notation))
        .with_state(state)
}

async fn view_of(state: &SharedState, node: &mut ComparisonOrchestrator) -> Result<Json<ComparisonView>> {
    let revision = state.refresh.revision(&node.id());
    Ok(Json(node.view(revision).await?))
}

#[derive(Debug, Deserialize)]
struct BranchQuery {
    branch: Option<String>,
}

async fn get_comparison(
    State(state): State<SharedState>,
    Query(query): Query<BranchQuery>,
) -> Result<Json<ComparisonView>> {
    let mut node = state.node(query.branch.as_deref()).await?;
    view_of(&state, &mut node).await
}

#[derive(Debug, Deserialize)]
struct CommitsQuery {
    branch: Option<String>,
    direction: CommitDirection,
    limit: Option<usize>,
}

fn empty_page(direction: CommitDirection) -> CommitPageResponse {
    CommitPageResponse {
        direction,
        commits: Vec::new(),
        has_more: false,
    }
}

async fn get_commits(
    State(state): State<SharedState>,
    Query(query): Query<CommitsQuery>,
) -> Result<Json<CommitPageResponse>> {
    let limit = state.config.page_limit(query.limit);
    let mut node = state.node(query.branch.as_deref()).await?;
    let page = match node.get_children().await? {
        Some(children) => children.commits(query.direction).first_page(limit).await?,
        None => empty_page(query.direction),
    };
    Ok(Json(page))
}

async fn get_more_commits(
    State(state): State<SharedState>,
    Query(query): Query<CommitsQuery>,
) -> Result<Json<CommitPageResponse>> {
    let limit = state.config.page_limit(query.limit);
    let mut node = state.node(query.branch.as_deref()).await?;
    let page = match node.get_children().await? {
        Some(children) => children.commits(query.direction).next_page(limit).await?,
        None => empty_page(query.direction),
    };
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
struct FilesQuery {
    branch: Option<String>,
    #[serde(default)]
    scope: FileScope,
}

async fn get_files(State(state): State<SharedState>, Query(query): Query<FilesQuery>) -> Result<Json<FileDiffResult>> {
    let mut node = state.node(query.branch.as_deref()).await?;
    let result = match node.get_children().await? {
        Some(children) => children.files(query.scope).result(state.git.as_ref()).await?.clone(),
        None => FileDiffResult {
            label: files_changed_label(None),
            files: None,
        },
    };
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct EditRequest {
    branch: Option<String>,
    #[serde(rename = "ref")]
    reference: Option<String>,
}

async fn edit_comparison(
    State(state): State<SharedState>,
    Json(request): Json<EditRequest>,
) -> Result<Json<ComparisonView>> {
    let mut kind = None;
    if let Some(reference) = request.reference.as_deref().filter(|r| !r.is_empty()) {
        if !state.git.ref_exists(reference)? {
            return Err(AppError::RefNotFound(reference.to_string()));
        }
        kind = state.git.ref_kind(reference)?;
    }

    let mut node = state.node(request.branch.as_deref()).await?;
    node.edit(&RequestedRef::new(request.reference).with_kind(kind)).await?;
    view_of(&state, &mut node).await
}

async fn clear_comparison(
    State(state): State<SharedState>,
    Json(request): Json<BranchQuery>,
) -> Result<Json<ComparisonView>> {
    let mut node = state.node(request.branch.as_deref()).await?;
    node.clear().await?;
    view_of(&state, &mut node).await
}

#[derive(Debug, Deserialize)]
struct ModeRequest {
    branch: Option<String>,
    mode: ComparisonMode,
}

async fn set_mode(State(state): State<SharedState>, Json(request): Json<ModeRequest>) -> Result<Json<ComparisonView>> {
    let mut node = state.node(request.branch.as_deref()).await?;
    node.set_comparison_mode(request.mode).await?;
    view_of(&state, &mut node).await
}

#[derive(Debug, Deserialize)]
struct NotationRequest {
    branch: Option<String>,
    notation: Option<RangeNotation>,
}

async fn set_notation(
    State(state): State<SharedState>,
    Json(request): Json<NotationRequest>,
) -> Result<Json<ComparisonView>> {
    let mut node = state.node(request.branch.as_deref()).await?;
    node.set_notation(request.notation).await?;
    view_of(&state, &mut node).await
}

//! Reference listing endpoint.
//!
//! - GET /api/v1/repository/refs?tags=bool
//!   Lists local branches, remote branches and (unless `tags=false`) tags,
//!   with the current branch flagged. These are the choices offered when
//!   picking what to compare a branch with.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::models::RefInfo;
use crate::routes::SharedState;

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/repository/refs", get(list_refs))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RefsQuery {
    #[serde(default = "default_tags")]
    tags: bool,
}

fn default_tags() -> bool {
    true
}

async fn list_refs(State(state): State<SharedState>, Query(query): Query<RefsQuery>) -> Result<Json<Vec<RefInfo>>> {
    let refs = state.git.list_refs(query.tags)?;
    Ok(Json(refs))
}

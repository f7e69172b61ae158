use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use solver_persist::Thread;
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListThreadsQuery {
    #[serde(default)]
    pub owner_id: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListThreadsResponse {
    pub threads: Vec<Thread>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameThreadRequest {
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub new_title: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameThreadResponse {
    pub thread_id: String,
    pub new_title: String,
}

/// List a user's threads, most recently updated first
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListThreadsQuery>, QueryRejection>,
) -> ApiResult<Json<ListThreadsResponse>> {
    let Query(query) = query?;
    let threads = state
        .orchestrator
        .list_threads(&query.owner_id, query.limit)
        .await?;

    Ok(Json(ListThreadsResponse { threads }))
}

/// Rename a thread the caller owns
pub async fn rename_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    payload: Result<Json<RenameThreadRequest>, JsonRejection>,
) -> ApiResult<Json<RenameThreadResponse>> {
    let Json(req) = payload?;

    let new_title = state
        .orchestrator
        .rename_thread(&thread_id, &req.owner_id, &req.new_title)
        .await?;

    Ok(Json(RenameThreadResponse { thread_id, new_title }))
}

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use solver_persist::Message;
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesQuery {
    #[serde(default)]
    pub owner_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<Message>,
}

/// List messages in a thread, oldest first
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    query: Result<Query<ListMessagesQuery>, QueryRejection>,
) -> ApiResult<Json<ListMessagesResponse>> {
    let Query(query) = query?;
    let messages = state
        .orchestrator
        .list_messages(&thread_id, &query.owner_id)
        .await?;

    Ok(Json(ListMessagesResponse { messages }))
}

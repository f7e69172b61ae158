use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use solver_core::{TurnOutcome, TurnRequest};
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTurnRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub owner_id: String,
    pub image_url: Option<String>,
    pub thread_id: Option<String>,
    pub is_new_thread: Option<bool>,
    pub subject_hint: Option<String>,
    pub turn_id: Option<String>,
}

impl From<SubmitTurnRequest> for TurnRequest {
    fn from(req: SubmitTurnRequest) -> Self {
        // Without an explicit flag, a missing thread id means a new thread
        let is_new_thread = req.is_new_thread.unwrap_or(req.thread_id.is_none());
        Self {
            owner_id: req.owner_id,
            content: req.content,
            image_url: req.image_url,
            thread_id: req.thread_id,
            is_new_thread,
            subject_hint: req.subject_hint,
            turn_id: req.turn_id,
        }
    }
}

/// Submit one homework turn and wait for the reply
pub async fn submit_turn(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubmitTurnRequest>, JsonRejection>,
) -> ApiResult<Json<TurnOutcome>> {
    let Json(req) = payload?;
    tracing::debug!(
        owner_id = %req.owner_id,
        thread_id = ?req.thread_id,
        subject_hint = ?req.subject_hint,
        has_image = req.image_url.is_some(),
        "Submitting turn"
    );

    let outcome = state.orchestrator.submit_turn(req.into()).await?;
    Ok(Json(outcome))
}

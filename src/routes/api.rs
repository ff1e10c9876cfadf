// Handlers exposing the browsing session to the frontend

use axum::{
    extract::{Json as JsonExtract, State},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::Settings,
    error::{AppError, AppResult},
    session::{Outcome, Rejection, SearchSession, SessionSnapshot},
};

use super::AppState;

// --- Response Wrappers ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionResponse {
    success: bool,
    outcome: Outcome,
    session: SessionSnapshot,
}

// --- Request Structs ---

#[derive(Deserialize, Debug)]
pub struct SubmitRequest {
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    page_window_size: u32,
}

// --- API Handlers ---

pub async fn health(State(settings): State<Arc<Settings>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        page_window_size: settings.page_window_size,
    })
}

pub async fn get_session(State(session): State<Arc<SearchSession>>) -> impl IntoResponse {
    Json(session.snapshot())
}

pub async fn submit(
    State(app_state): State<AppState>,
    JsonExtract(request): JsonExtract<SubmitRequest>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("[HANDLER] /api/submit - Request received.");
    let session = Arc::clone(&app_state.session);
    // Run on its own task so a client disconnect cannot cancel the fetch midway
    let outcome = tokio::spawn(async move { session.submit(&request.message).await })
        .await
        .map_err(|e| anyhow::anyhow!("submit task failed: {}", e))?;
    respond(&app_state.session, outcome)
}

pub async fn load_more(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    tracing::info!("[HANDLER] /api/load-more - Request received.");
    let session = Arc::clone(&app_state.session);
    let outcome = tokio::spawn(async move { session.load_more().await })
        .await
        .map_err(|e| anyhow::anyhow!("load-more task failed: {}", e))?;
    respond(&app_state.session, outcome)
}

pub async fn reset_session(State(session): State<Arc<SearchSession>>) -> AppResult<impl IntoResponse> {
    tracing::info!("[HANDLER] DELETE /api/session - Request received.");
    session.reset().map_err(rejection_error)?;
    Ok(Json(session.snapshot()))
}

fn respond(session: &SearchSession, outcome: Outcome) -> AppResult<Json<ActionResponse>> {
    if let Outcome::Rejected { reason } = outcome {
        return Err(rejection_error(reason));
    }
    tracing::info!("[HANDLER] Session action finished: {:?}", outcome);
    Ok(Json(ActionResponse {
        success: outcome.is_success(),
        outcome,
        session: session.snapshot(),
    }))
}

fn rejection_error(reason: Rejection) -> AppError {
    match reason {
        Rejection::EmptyQuery => AppError::BadRequest(reason.describe().to_string()),
        Rejection::Busy | Rejection::NoActiveSearch => AppError::Conflict(reason.describe().to_string()),
    }
}

//! Progress and result polling handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;

use fswap_models::JobSnapshot;
use fswap_worker::ResultView;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Completed result response.
#[derive(Debug, Serialize)]
pub struct ResultResponse {
    /// Base64-encoded JPEG
    pub image: String,
    pub result_id: String,
}

#[derive(Debug, Serialize)]
struct StillProcessing {
    message: &'static str,
}

/// GET /progress
///
/// Always succeeds; reflects the current slot. `error` is present only
/// after a failed run.
pub async fn progress(State(state): State<AppState>) -> Json<JobSnapshot> {
    Json(state.slot.snapshot().await)
}

/// GET /result
///
/// Returns:
/// - 200: base64 JPEG and its result id; stable across repeated calls
///   until a new run completes
/// - 202: a run is in flight
/// - 404: never ran, or the last run failed
pub async fn result(State(state): State<AppState>) -> ApiResult<Response> {
    match state.slot.result().await {
        ResultView::Processing => Ok((
            StatusCode::ACCEPTED,
            Json(StillProcessing {
                message: "Still processing",
            }),
        )
            .into_response()),
        ResultView::NotFound => Err(ApiError::not_found("Result not found")),
        ResultView::Ready { jpeg, result_id } => Ok(Json(ResultResponse {
            image: BASE64.encode(jpeg),
            result_id: result_id.to_string(),
        })
        .into_response()),
    }
}

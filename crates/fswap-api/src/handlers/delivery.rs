//! Result delivery handlers: download and email.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use fswap_worker::ResultView;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Attachment filename for downloads and email.
const RESULT_FILENAME: &str = "face_swap_result.jpg";

/// GET /download/{result_id}
///
/// Serves the JPEG as an attachment, but only when `result_id` matches
/// the current result; a stale or unknown id yields 404.
pub async fn download(
    State(state): State<AppState>,
    Path(result_id): Path<String>,
) -> ApiResult<Response> {
    let Some(jpeg) = state.slot.download(&result_id).await else {
        return Err(ApiError::not_found("Result not found"));
    };

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{RESULT_FILENAME}\""),
            ),
        ],
        jpeg,
    )
        .into_response())
}

/// Email delivery request body.
#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub recipient_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub message: String,
}

/// POST /send_email
///
/// Mails the current result to the given address.
///
/// Returns:
/// - 200: sent
/// - 400: missing or empty recipient address
/// - 404: no completed result to send
/// - 500: SMTP not configured, or the transport failed
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> ApiResult<Json<SendEmailResponse>> {
    let recipient = request
        .recipient_email
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing recipient email"))?;

    let ResultView::Ready { jpeg, .. } = state.slot.result().await else {
        return Err(ApiError::not_found("Result not found"));
    };

    let Some(notifier) = &state.notifier else {
        return Err(ApiError::internal("Email delivery is not configured"));
    };

    notifier.send_result(recipient, &jpeg).await?;
    info!(recipient, "Result emailed");

    Ok(Json(SendEmailResponse {
        message: format!("Result sent to {recipient}"),
    }))
}

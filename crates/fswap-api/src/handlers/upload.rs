//! The job submission gateway.
//!
//! Validates the multipart submission, stages both images in the upload
//! directory, admits the run against the single job slot, and spawns the
//! runner. Returns before the run completes.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use fswap_models::SwapOptions;
use fswap_worker::run_swap_job;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Accepted submission response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_email: Option<String>,
}

/// One staged upload: original filename plus the raw bytes.
struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

/// POST /upload
///
/// Multipart fields: `file1`, `file2` (images), `num_faces` (integer,
/// default 1), optional `recipient_email` (echoed back, not used by the
/// pipeline).
///
/// Returns:
/// - 200: run admitted and started in the background
/// - 400: missing file part, empty filename, or invalid `num_faces`
/// - 409: a run is already in flight
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut file1: Option<UploadedFile> = None;
    let mut file2: Option<UploadedFile> = None;
    let mut options = SwapOptions::default();
    let mut recipient_email: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file1" | "file2" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                if filename.is_empty() {
                    return Err(ApiError::bad_request("No selected file"));
                }
                let slot = if name == "file1" { &mut file1 } else { &mut file2 };
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                *slot = Some(UploadedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            "num_faces" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                options.num_faces = text
                    .trim()
                    .parse()
                    .map_err(|_| ApiError::bad_request("Invalid num_faces"))?;
            }
            "recipient_email" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                if !text.is_empty() {
                    recipient_email = Some(text);
                }
            }
            _ => {}
        }
    }

    let (Some(file1), Some(file2)) = (file1, file2) else {
        return Err(ApiError::bad_request("Missing file"));
    };

    let source_path = stage_upload(&state, &file1).await?;
    let target_path = stage_upload(&state, &file2).await?;

    // Admission happens before the spawn so a busy slot is reported
    // synchronously; the staged files are released on rejection.
    let run_id = match state.slot.begin_run().await {
        Ok(run_id) => run_id,
        Err(_) => {
            let _ = tokio::fs::remove_file(&source_path).await;
            let _ = tokio::fs::remove_file(&target_path).await;
            return Err(ApiError::Busy);
        }
    };

    info!(%run_id, num_faces = options.num_faces, "Submission accepted");

    tokio::spawn(run_swap_job(
        Arc::clone(&state.slot),
        Arc::clone(&state.engine),
        run_id,
        source_path,
        target_path,
        options,
    ));

    Ok(Json(UploadResponse {
        message: "Processing started".to_string(),
        recipient_email,
    }))
}

/// Write an upload into the staging directory under a collision-proof
/// name.
async fn stage_upload(state: &AppState, file: &UploadedFile) -> ApiResult<PathBuf> {
    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create upload dir: {e}")))?;

    let name = format!("{}_{}", Uuid::new_v4(), sanitize_filename(&file.filename));
    let path = state.config.upload_dir.join(name);
    tokio::fs::write(&path, &file.bytes)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to stage upload: {e}")))?;
    Ok(path)
}

/// Strip path separators and control characters from a client-supplied
/// filename, keeping it as a flat name inside the staging directory.
fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_flattens_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_filename("my photo (1).png"), "my_photo__1_.png");
    }

    #[test]
    fn test_sanitize_never_empty() {
        assert_eq!(sanitize_filename("..."), "upload");
        assert_eq!(sanitize_filename(""), "upload");
    }
}

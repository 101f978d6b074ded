//! HTTP client for the inference sidecar.
//!
//! The sidecar hosts the actual detection/swap/enhancement models and
//! exposes them over three endpoints:
//!
//! - `POST /detect` — JPEG body in, `{"faces": [...]}` out
//! - `POST /swap` — multipart (source, target, face boxes) in, image out
//! - `POST /enhance` — JPEG body in, image out

use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use fswap_models::FaceBox;

use crate::codec;
use crate::engine::FaceEngine;
use crate::error::{EngineError, EngineResult};

/// Configuration for the sidecar client.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the inference sidecar
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for retryable failures
    pub max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 2,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("FACE_ENGINE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("FACE_ENGINE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            max_retries: std::env::var("FACE_ENGINE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

/// Wire shape of a `/detect` response.
#[derive(Debug, Deserialize)]
struct DetectResponse {
    faces: Vec<FaceBox>,
}

/// [`FaceEngine`] implementation backed by the inference sidecar.
pub struct HttpEngine {
    http: Client,
    config: EngineConfig,
}

impl HttpEngine {
    /// Create a new sidecar client.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(EngineError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> EngineResult<Self> {
        Self::new(EngineConfig::from_env())
    }

    /// Check if the sidecar is healthy.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.config.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Engine health check error: {}", e);
                false
            }
        }
    }

    /// Execute with retry for retryable failures.
    ///
    /// The operation is a factory so multipart bodies can be rebuilt on
    /// each attempt.
    async fn with_retry<F, Fut>(&self, operation: F) -> EngineResult<reqwest::Response>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = EngineResult<reqwest::Response>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Engine request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| EngineError::InvalidResponse("retry exhausted".to_string())))
    }

    /// Map a non-success response into an [`EngineError`].
    async fn check_status(response: reqwest::Response) -> EngineResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(EngineError::ServiceUnavailable(message));
        }
        Err(EngineError::RequestFailed {
            status: status.as_u16(),
            message,
        })
    }

    /// Fetch the response body and decode it as an image.
    async fn read_image(response: reqwest::Response) -> EngineResult<DynamicImage> {
        let bytes = response.bytes().await?;
        codec::decode(&bytes)
    }
}

#[async_trait]
impl FaceEngine for HttpEngine {
    async fn detect_faces(&self, img: &DynamicImage) -> EngineResult<Vec<FaceBox>> {
        let url = format!("{}/detect", self.config.base_url);
        let jpeg = codec::encode_jpeg(img)?;

        debug!("Sending detect request to {}", url);

        let response = self
            .with_retry(|| async {
                self.http
                    .post(&url)
                    .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
                    .body(jpeg.clone())
                    .send()
                    .await
                    .map_err(EngineError::Network)
            })
            .await?;

        let response = Self::check_status(response).await?;
        let detect: DetectResponse = response.json().await?;
        Ok(detect.faces)
    }

    async fn swap_face(
        &self,
        source: &DynamicImage,
        source_face: &FaceBox,
        target: &DynamicImage,
        target_face: &FaceBox,
    ) -> EngineResult<DynamicImage> {
        let url = format!("{}/swap", self.config.base_url);
        let source_jpeg = codec::encode_jpeg(source)?;
        let target_jpeg = codec::encode_jpeg(target)?;
        let source_box = serde_json::to_string(source_face)?;
        let target_box = serde_json::to_string(target_face)?;

        debug!("Sending swap request to {}", url);

        let response = self
            .with_retry(|| async {
                let form = Form::new()
                    .part(
                        "source",
                        Part::bytes(source_jpeg.clone())
                            .file_name("source.jpg")
                            .mime_str("image/jpeg")
                            .map_err(EngineError::Network)?,
                    )
                    .part(
                        "target",
                        Part::bytes(target_jpeg.clone())
                            .file_name("target.jpg")
                            .mime_str("image/jpeg")
                            .map_err(EngineError::Network)?,
                    )
                    .text("source_face", source_box.clone())
                    .text("target_face", target_box.clone());

                self.http
                    .post(&url)
                    .multipart(form)
                    .send()
                    .await
                    .map_err(EngineError::Network)
            })
            .await?;

        let response = Self::check_status(response).await?;
        Self::read_image(response).await
    }

    async fn enhance(&self, img: &DynamicImage) -> EngineResult<DynamicImage> {
        let url = format!("{}/enhance", self.config.base_url);
        let jpeg = codec::encode_jpeg(img)?;

        debug!("Sending enhance request to {}", url);

        let response = self
            .with_retry(|| async {
                self.http
                    .post(&url)
                    .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
                    .body(jpeg.clone())
                    .send()
                    .await
                    .map_err(EngineError::Network)
            })
            .await?;

        let response = Self::check_status(response).await?;
        Self::read_image(response).await
    }
}

//! SMTP delivery of the result image via `lettre`.
//!
//! Configuration is loaded from environment variables; if `SMTP_HOST` is
//! not set, [`SmtpConfig::from_env`] returns `None` and no mailer should
//! be constructed.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Body, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::error::{NotifyError, NotifyResult};
use crate::notifier::Notifier;

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@faceswap.local";

/// Filename used for the attached result.
const ATTACHMENT_NAME: &str = "face_swap_result.jpg";

/// Configuration for the SMTP notifier.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl SmtpConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// Mails the result JPEG as an attachment via SMTP.
pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    /// Create a new SMTP notifier with the given configuration.
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, to: &str, jpeg: &[u8]) -> NotifyResult<Message> {
        let content_type = ContentType::parse("image/jpeg")
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        let attachment =
            Attachment::new(ATTACHMENT_NAME.to_string()).body(Body::new(jpeg.to_vec()), content_type);

        let body = MultiPart::mixed()
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body("Your face swap result is attached.".to_string()),
            )
            .singlepart(attachment);

        Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to.parse()?)
            .subject("Your face swap result")
            .multipart(body)
            .map_err(|e| NotifyError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_result(&self, to: &str, jpeg: &[u8]) -> NotifyResult<()> {
        let email = self.build_message(to, jpeg)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        info!(to, "Result email sent");
        Ok(())
    }
}

//! Result delivery via outbound email.
//!
//! Defines the [`Notifier`] collaborator trait and an SMTP implementation
//! that mails the produced JPEG as an attachment.

pub mod error;
pub mod notifier;
pub mod smtp;

pub use error::{NotifyError, NotifyResult};
pub use notifier::Notifier;
pub use smtp::{SmtpConfig, SmtpNotifier};

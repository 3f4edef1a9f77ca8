//! Transactional notices.
//!
//! Two notices exist: the assignment notice sent to a technician when an
//! order is created for them, and the completion notice sent to the
//! oversight address when a job is closed out. Both are best-effort: they
//! are sent from a spawned task and a failure is only logged.

pub mod email;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;

use sejuk_core::OrderId;

pub use email::SmtpNotifier;
pub use memory::RecordingNotifier;

/// Errors that can occur when sending a notice.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Delivery is not available right now.
    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}

/// Sent to a technician when an order is assigned to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentNotice {
    pub to_email: String,
    pub technician_name: String,
    pub order_id: OrderId,
    pub customer: String,
    pub phone: String,
    pub address: String,
    pub service: String,
    pub problem: String,
    pub price: String,
    pub notes: String,
    /// Local time the order was taken, already formatted.
    pub time: String,
    pub from_name: String,
    pub reply_email: String,
}

/// Sent to the oversight address when a job is completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotice {
    pub to_email: String,
    pub technician_name: String,
    pub order_id: OrderId,
    /// Local completion time, already formatted.
    pub time: String,
    pub from_name: String,
    pub reply_email: String,
}

/// A transactional notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    TechnicianAssignment(AssignmentNotice),
    JobCompleted(CompletionNotice),
}

impl Notice {
    /// Recipient address.
    #[must_use]
    pub fn to_email(&self) -> &str {
        match self {
            Self::TechnicianAssignment(n) => &n.to_email,
            Self::JobCompleted(n) => &n.to_email,
        }
    }

    /// Order the notice is about.
    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        match self {
            Self::TechnicianAssignment(n) => n.order_id,
            Self::JobCompleted(n) => n.order_id,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TechnicianAssignment(_) => "technician_assignment",
            Self::JobCompleted(_) => "job_completed",
        }
    }
}

/// Notice delivery seam.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notice.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if the notice cannot be rendered or delivered.
    async fn send(&self, notice: &Notice) -> Result<(), NotifyError>;
}

/// Send a notice from a detached task.
///
/// The returned handle resolves once delivery was attempted; failures are
/// logged and never surface to the caller. Routes drop the handle.
pub fn dispatch(notifier: Arc<dyn Notifier>, notice: Notice) -> JoinHandle<()> {
    tokio::spawn(async move {
        match notifier.send(&notice).await {
            Ok(()) => {
                tracing::info!(
                    kind = notice.kind(),
                    order_id = %notice.order_id(),
                    "Notice sent"
                );
            }
            Err(e) => {
                tracing::warn!(
                    kind = notice.kind(),
                    order_id = %notice.order_id(),
                    error = %e,
                    "Failed to send notice"
                );
            }
        }
    })
}

//! Completion notifications
//!
//! Once an accepted image finishes processing the upload handler tells the
//! uploading client through a [`Notifier`]. The default implementation only
//! logs the event.

use async_trait::async_trait;
use serde::Serialize;

/// Event sent to the client that uploaded an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ProcessEvent {
    #[serde(rename = "IM_PROCESS_DONE")]
    Done {
        name: String,
        id: String,
        url: String,
        thumbnail_url: String,
    },
    #[serde(rename = "IM_PROCESS_FAILED")]
    Failed {
        name: String,
        media: String,
        media_id: String,
    },
}

impl ProcessEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessEvent::Done { .. } => "IM_PROCESS_DONE",
            ProcessEvent::Failed { .. } => "IM_PROCESS_FAILED",
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `event` to `recipient`, the echo value of the upload session.
    async fn notify(&self, recipient: &str, event: ProcessEvent);
}

#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient: &str, event: ProcessEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => {
                tracing::info!(
                    recipient = %recipient,
                    event = event.kind(),
                    payload = %payload,
                    "Image notification"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, event = event.kind(), "Failed to serialize notification");
            }
        }
    }
}

//! Outbound notifications about run progress
//!
//! Notifications are best-effort: steps inspect the result, log it, and
//! carry on. Nothing here may fail a run.

pub mod slack;

use async_trait::async_trait;
use thiserror::Error;

use crate::workflows::state::RunState;

pub use slack::SlackNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    /// No destination configured for this run.
    Skipped,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `text`, preferring `webhook_override` over any configured default.
    async fn notify(
        &self,
        text: &str,
        webhook_override: Option<&str>,
    ) -> Result<NotifyOutcome, NotifyError>;
}

pub fn approval_pending_message(state: &RunState) -> String {
    format!(
        "*AutoQA Notification*\n\
         ⚠️ *Workflow is awaiting approval.*\n\n\
         *File:* `{}`\n\
         *Test Type:* {}\n\
         *Framework:* {}\n",
        state.file_path, state.test_type, state.framework
    )
}

pub fn completion_message(state: &RunState) -> String {
    format!(
        "*AutoQA Notification*\n\n\
         *File:* `{}`\n\
         *Test Type:* {}\n\
         *Framework:* {}\n\
         *Output Path:* `{}`\n\
         *Status:* {}\n\
         *Retries:* {}\n",
        state.file_path,
        state.test_type,
        state.framework,
        state.output_path,
        state.status,
        state.retry_count
    )
}

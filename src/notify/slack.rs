use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::{NotifyError, NotifyOutcome, Notifier};

/// Posts notifications to a Slack incoming webhook.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    http: reqwest::Client,
    default_webhook: Option<String>,
}

impl SlackNotifier {
    pub fn new(default_webhook: Option<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            default_webhook,
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(
        &self,
        text: &str,
        webhook_override: Option<&str>,
    ) -> Result<NotifyOutcome, NotifyError> {
        let Some(webhook) = webhook_override.or(self.default_webhook.as_deref()) else {
            info!("Slack notification skipped: no webhook URL configured");
            return Ok(NotifyOutcome::Skipped);
        };

        let response = self
            .http
            .post(webhook)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Slack notification sent");
        Ok(NotifyOutcome::Sent)
    }
}

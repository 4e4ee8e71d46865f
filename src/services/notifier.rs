use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Errors that can occur when sending a notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Message rejected: {0}")]
    Rejected(String),
}

/// Channel for operational alerts (bookings, emergency calls)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Disabled notifiers are skipped without building a message
    fn is_enabled(&self) -> bool {
        true
    }

    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Fire-and-forget delivery on a background task
///
/// The returned handle may be dropped; failures are logged by the task.
pub fn spawn_notification(
    notifier: Arc<dyn Notifier>,
    message: String,
) -> JoinHandle<Result<(), NotifyError>> {
    spawn_composed_notification(notifier, async move { message })
}

/// Like [`spawn_notification`], but the message itself is built on the
/// background task, so lookups it needs never delay the caller
pub fn spawn_composed_notification<F>(
    notifier: Arc<dyn Notifier>,
    compose: F,
) -> JoinHandle<Result<(), NotifyError>>
where
    F: Future<Output = String> + Send + 'static,
{
    tokio::spawn(async move {
        let message = compose.await;
        let result = notifier.notify(&message).await;
        match &result {
            Ok(()) => tracing::info!("Notification sent"),
            Err(e) => tracing::warn!("Failed to send notification: {}", e),
        }
        result
    })
}

/// Used when no notification channel is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn notify(&self, _message: &str) -> Result<(), NotifyError> {
        tracing::debug!("Notifications not configured - skipping message");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SlackReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts messages to a Slack channel through `chat.postMessage`
pub struct SlackNotifier {
    api_base: String,
    token: String,
    channel: String,
    client: Client,
}

impl SlackNotifier {
    pub fn new(
        api_base: String,
        token: String,
        channel: String,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_base,
            token,
            channel,
            client,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let url = format!("{}/chat.postMessage", self.api_base.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "channel": self.channel, "text": message }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::ApiError(format!(
                "Slack responded with {}",
                response.status()
            )));
        }

        // Slack reports most failures with HTTP 200 and `ok: false`
        let reply: SlackReply = response.json().await?;
        if !reply.ok {
            return Err(NotifyError::Rejected(
                reply.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        tracing::debug!("Slack message sent to channel {}", self.channel);
        Ok(())
    }
}

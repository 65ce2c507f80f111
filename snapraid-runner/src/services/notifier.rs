// File: snapraid-runner/src/services/notifier.rs
use crate::constants::pushover;
use crate::errors::NotificationError;
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{error, info};

/// Pushover priority scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "i8")]
pub enum Priority {
    Lowest,
    Low,
    Normal,
    High,
    Emergency,
}

impl From<Priority> for i8 {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Lowest => -2,
            Priority::Low => -1,
            Priority::Normal => 0,
            Priority::High => 1,
            Priority::Emergency => 2,
        }
    }
}

/// Best-effort notification capability. Implementations never fail; delivery
/// problems are logged and dropped.
pub trait Notifier: Send + Sync {
    fn notify<'a>(&'a self, message: &'a str, priority: Priority) -> BoxFuture<'a, ()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct PushoverPayload<'a> {
    pub token: &'a str,
    pub user: &'a str,
    pub message: &'a str,
    pub title: &'a str,
    pub sound: &'a str,
    pub priority: Priority,
}

#[derive(Clone)]
pub struct PushoverNotifier {
    api_url: String,
    token: String,
    user: String,
    client: Client,
}

impl PushoverNotifier {
    pub fn new(api_url: String, token: String, user: String) -> Self {
        // Builder only fails when the TLS backend cannot initialise
        let client = Client::builder()
            .timeout(pushover::REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                error!("Failed to build notification client, using defaults: {}", e);
                Client::new()
            });

        Self {
            api_url,
            token,
            user,
            client,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Send a single message, surfacing delivery errors to the caller
    pub async fn send(&self, message: &str, priority: Priority) -> Result<(), NotificationError> {
        let message = truncate_message(message, pushover::MAX_MESSAGE_CHARS);
        let payload = PushoverPayload {
            token: &self.token,
            user: &self.user,
            message: &message,
            title: pushover::TITLE,
            sound: pushover::SOUND,
            priority,
        };

        let response = match timeout(
            pushover::REQUEST_TIMEOUT,
            self.client.post(&self.api_url).json(&payload).send(),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(NotificationError::Transport {
                    reason: e.to_string(),
                })
            }
            Err(_) => return Err(NotificationError::Timeout),
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Pushover notification sent: {}", body);
        Ok(())
    }
}

impl Notifier for PushoverNotifier {
    fn notify<'a>(&'a self, message: &'a str, priority: Priority) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if let Err(e) = self.send(message, priority).await {
                error!("Error sending Pushover notification: {}", e);
            }
        })
    }
}

/// Keep the last `max_chars` characters. Tool output is most useful at the
/// end, where the summary lines are.
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    let total = message.chars().count();
    if total <= max_chars {
        return message.to_string();
    }

    const MARKER: &str = "...\n";
    let keep = max_chars.saturating_sub(MARKER.len());
    let tail: String = message.chars().skip(total - keep).collect();
    format!("{}{}", MARKER, tail)
}

//! Completion notifications.
//!
//! Listens on the [`EventBus`] for finished jobs, looks up the owning user
//! and posts a JSON notification to the configured webhook. Delivery is
//! fire-and-forget: failures are logged and never reach the processor.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use vl_core::events::{EventBus, EventPayload, JobFinished};
use vl_core::{User, VideoStatus};
use vl_db::pool::{get_conn, DbPool};
use vl_db::queries::users;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Body posted to the webhook.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedNotification {
    pub event: &'static str,
    pub video_id: String,
    pub status: VideoStatus,
    pub error: Option<String>,
    pub renditions: usize,
    pub user: Option<NotifiedUser>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotifiedUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl ProcessedNotification {
    pub fn new(finished: &JobFinished, user: Option<&User>) -> Self {
        Self {
            event: "video.processed",
            video_id: finished.video_id.to_string(),
            status: finished.status,
            error: finished.error.clone(),
            renditions: finished.renditions,
            user: user.map(|u| NotifiedUser {
                id: u.id.to_string(),
                name: u.name.clone(),
                email: u.email.clone(),
            }),
        }
    }
}

/// Posts completion notifications to a webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    db: DbPool,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, db: DbPool) -> Self {
        let client = Client::builder()
            .timeout(CONNECTION_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            url: url.into(),
            db,
        }
    }

    /// Notify about one finished job. Errors are logged, not returned.
    pub async fn notify(&self, finished: &JobFinished) {
        let user = match get_conn(&self.db)
            .and_then(|conn| users::get_user_by_id(&conn, finished.user_id))
        {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(video_id = %finished.video_id, error = %e, "Failed to look up video owner");
                None
            }
        };
        let body = ProcessedNotification::new(finished, user.as_ref());

        match self.client.post(&self.url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(
                    video_id = %finished.video_id,
                    status = %finished.status,
                    "Completion notification delivered"
                );
            }
            Ok(resp) => {
                tracing::warn!(
                    video_id = %finished.video_id,
                    http_status = %resp.status(),
                    "Completion webhook rejected notification"
                );
            }
            Err(e) => {
                tracing::warn!(video_id = %finished.video_id, error = %e, "Failed to deliver completion notification");
            }
        }
    }
}

/// Spawn a task forwarding every `VideoProcessed` event to `notifier`.
///
/// The task ends once every sender of the bus has been dropped and the
/// remaining events have been delivered.
pub fn spawn_listener(bus: &EventBus, notifier: Arc<WebhookNotifier>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let EventPayload::VideoProcessed(finished) = event.payload {
                        notifier.notify(&finished).await;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("Notification listener lagged; {} events dropped", n);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

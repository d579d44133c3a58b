//! Outbound webhook channel (feature `webhook`).
//!
//! Server-side delivery path: alerts are POSTed as JSON to a configured
//! endpoint. Sends are fire-and-forget on the ambient tokio runtime so a
//! slow or dead endpoint never stalls a dispatch cycle.

use std::time::Duration;

use tracing::{debug, warn};

use crate::notify::{NotificationChannel, Permission};
use crate::{AlertError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Channel that forwards alerts to an HTTP endpoint.
pub struct WebhookChannel {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookChannel {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl NotificationChannel for WebhookChannel {
    /// Available only inside a tokio runtime, which the spawn needs.
    fn available(&self) -> bool {
        tokio::runtime::Handle::try_current().is_ok()
    }

    /// There is no user to ask on a server-side channel.
    fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn notify(&self, title: &str, body: &str) -> Result<()> {
        let handle =
            tokio::runtime::Handle::try_current().map_err(|_| AlertError::ChannelUnavailable)?;

        let payload = serde_json::json!({
            "title": title,
            "body": body,
            "source": "wayguard",
            "sent_at": chrono::Utc::now().to_rfc3339(),
        });

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        handle.spawn(async move {
            match client.post(&endpoint).json(&payload).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!("Webhook alert accepted by {}", endpoint);
                }
                Ok(resp) => {
                    warn!("Webhook {} answered {}", endpoint, resp.status());
                }
                Err(e) => {
                    warn!("Webhook delivery to {} failed: {}", endpoint, e);
                }
            }
        });

        Ok(())
    }
}

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use storage::repository::dispatch::DispatchRepository;
use uuid::Uuid;

use crate::error::DispatcherError;
use crate::traits::OutboundChannel;
use crate::Result;

pub const DEFAULT_PROVIDER: &str = "workchat";

#[derive(Debug, Clone, Serialize)]
struct SendMessageRequest<'a> {
    recipient_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    success: bool,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Chat-provider client. Sends are authenticated with the per-project
/// access credential resolved by (provider, project).
pub struct WebhookChannel {
    client: Client,
    base_url: String,
    provider: String,
    pool: PgPool,
}

impl WebhookChannel {
    pub fn new(pool: PgPool, base_url: String, provider: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            provider,
            pool,
        }
    }
}

#[async_trait::async_trait]
impl OutboundChannel for WebhookChannel {
    async fn send(&self, project_id: Uuid, recipient: &str, content: &str) -> Result<()> {
        let credential = DispatchRepository::new(&self.pool)
            .credential_for_project(project_id, &self.provider)
            .await?
            .ok_or_else(|| {
                DispatcherError::ChannelError(format!(
                    "no {} credential configured for project {}",
                    self.provider, project_id
                ))
            })?;

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .bearer_auth(&credential.access_token)
            .json(&SendMessageRequest {
                recipient_id: recipient,
                text: content,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatcherError::ChannelError(format!(
                "provider returned {status}: {body}"
            )));
        }

        let body: SendMessageResponse = response.json().await?;
        if !body.success {
            let detail = body
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unspecified provider error".to_string());
            return Err(DispatcherError::ChannelError(detail));
        }

        Ok(())
    }
}

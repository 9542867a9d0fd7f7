//! Push notifications via Expo push API

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

/// Expo accetta al massimo 100 messaggi per richiesta
const EXPO_CHUNK_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push delivery is disabled")]
    Disabled,
    #[error("request to push service failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("push service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("push delivery timed out")]
    Timeout,
}

#[derive(Debug, Serialize)]
pub struct ExpoPushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExpoPushResponse {
    pub data: Vec<ExpoPushTicket>,
}

#[derive(Debug, Deserialize)]
pub struct ExpoPushTicket {
    pub status: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Solo i token Expo vengono inoltrati, il resto viene scartato
pub fn is_expo_push_token(token: &str) -> bool {
    (token.starts_with("ExponentPushToken[") || token.starts_with("ExpoPushToken["))
        && token.ends_with(']')
}

#[derive(Debug, Clone)]
pub struct PushClient {
    client: Client,
    endpoint: Option<String>,
    timeout: Duration,
}

impl PushClient {
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            timeout,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(0))
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Invia lo stesso messaggio a tutti i token, a blocchi. L'intero invio è limitato dal timeout.
    #[instrument(skip(self, tokens, body, data), fields(tokens = tokens.len()))]
    pub async fn send(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: Option<serde_json::Value>,
    ) -> Result<Vec<ExpoPushTicket>, PushError> {
        let endpoint = self.endpoint.as_deref().ok_or(PushError::Disabled)?;

        let messages: Vec<ExpoPushMessage> = tokens
            .iter()
            .filter(|t| is_expo_push_token(t))
            .map(|token| ExpoPushMessage {
                to: token.clone(),
                title: title.to_string(),
                body: body.to_string(),
                data: data.clone(),
                sound: Some("default".to_string()),
            })
            .collect();

        if messages.is_empty() {
            debug!("No valid push tokens, skipping push notification");
            return Ok(Vec::new());
        }

        tokio::time::timeout(self.timeout, self.send_chunks(endpoint, &messages))
            .await
            .map_err(|_| PushError::Timeout)?
    }

    async fn send_chunks(
        &self,
        endpoint: &str,
        messages: &[ExpoPushMessage],
    ) -> Result<Vec<ExpoPushTicket>, PushError> {
        let mut tickets = Vec::with_capacity(messages.len());

        for chunk in messages.chunks(EXPO_CHUNK_SIZE) {
            info!("Sending {} push notifications to Expo", chunk.len());
            let response = self
                .client
                .post(endpoint)
                .header("Accept", "application/json")
                .json(chunk)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                error!("Expo push API returned error status {}: {}", status, body);
                return Err(PushError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let parsed: ExpoPushResponse = response.json().await?;
            for ticket in parsed.data.iter().filter(|t| t.status != "ok") {
                error!(
                    "Push notification failed: status={}, message={:?}",
                    ticket.status, ticket.message
                );
            }
            tickets.extend(parsed.data);
        }

        Ok(tickets)
    }
}

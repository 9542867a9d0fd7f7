//! Message DTOs - Data Transfer Objects per i messaggi della chat di viaggio

use crate::entities::ChatMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageDTO {
    pub message_id: i32,
    pub trip_id: i32,
    pub sender_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for MessageDTO {
    fn from(value: ChatMessage) -> Self {
        Self {
            message_id: value.message_id,
            trip_id: value.trip_id,
            sender_id: value.sender_id,
            content: value.content,
            created_at: value.created_at,
        }
    }
}

/// Messaggio inviato dal client, via REST (solo `content`) o via websocket (anche `trip_id`)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SendMessageDTO {
    #[serde(default)]
    pub trip_id: Option<i32>,
    pub content: String,
}

/// DTO per creare un nuovo messaggio (senza message_id)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateMessageDTO {
    pub trip_id: i32,
    pub sender_id: i32,

    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub content: String,

    pub created_at: DateTime<Utc>,
}

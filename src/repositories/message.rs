//! MessageRepository - Repository per la gestione dei messaggi della chat di viaggio

use super::{Create, Document, DocumentStore, StoreError};
use crate::dtos::CreateMessageDTO;
use crate::entities::ChatMessage;
use chrono::{DateTime, Utc};
use serde_json::json;

impl Document for ChatMessage {
    const COLLECTION: &'static str = "messages";

    fn id(&self) -> i32 {
        self.message_id
    }

    fn set_id(&mut self, id: i32) {
        self.message_id = id;
    }
}

// MESSAGE REPO
pub struct MessageRepository {
    store: DocumentStore,
}

impl MessageRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Get paginated messages for a trip chat
    ///
    /// Supports both:
    /// - Loading recent messages (when `before` is None): gets the most recent `limit` messages
    /// - Loading older messages (when `before` is Some): gets `limit` messages before that date
    ///
    /// # Returns
    /// Messages ordered from newest to oldest, limited to `limit` count
    pub async fn find_many_paginated(
        &self,
        trip_id: i32,
        before: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let mut messages: Vec<ChatMessage> = self
            .store
            .find_by_field("trip_id", json!(trip_id))
            .await?;

        if let Some(before) = before {
            messages.retain(|m| m.created_at < before);
        }
        messages.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.message_id.cmp(&a.message_id))
        });
        messages.truncate(limit);
        Ok(messages)
    }

    pub async fn delete_by_trip(&self, trip_id: i32) -> Result<u64, StoreError> {
        self.store
            .delete_by_field::<ChatMessage>("trip_id", json!(trip_id))
            .await
    }
}

impl Create<ChatMessage, CreateMessageDTO> for MessageRepository {
    async fn create(&self, data: &CreateMessageDTO) -> Result<ChatMessage, StoreError> {
        let message = ChatMessage {
            message_id: 0,
            trip_id: data.trip_id,
            sender_id: data.sender_id,
            content: data.content.clone(),
            created_at: data.created_at,
        };
        self.store.insert(message).await
    }
}

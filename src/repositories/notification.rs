//! NotificationRepository - Repository per la gestione delle notifiche

use super::{Create, Delete, Document, DocumentStore, Read, StoreError};
use crate::dtos::CreateNotificationDTO;
use crate::entities::{Notification, NotificationType};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, instrument};

impl Document for Notification {
    const COLLECTION: &'static str = "notifications";

    fn id(&self) -> i32 {
        self.notification_id
    }

    fn set_id(&mut self, id: i32) {
        self.notification_id = id;
    }
}

// NOTIFICATION REPO
pub struct NotificationRepository {
    store: DocumentStore,
}

impl NotificationRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Notifiche del destinatario, dalla più recente
    pub async fn find_many_by_recipient(
        &self,
        recipient_id: i32,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut notifications: Vec<Notification> = self
            .store
            .find_by_field("recipient_id", json!(recipient_id))
            .await?;
        notifications.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.notification_id.cmp(&a.notification_id))
        });
        Ok(notifications)
    }

    pub async fn find_unread_by_recipient(
        &self,
        recipient_id: i32,
    ) -> Result<Vec<Notification>, StoreError> {
        let notifications = self.find_many_by_recipient(recipient_id).await?;
        Ok(notifications.into_iter().filter(|n| !n.is_read).collect())
    }

    pub async fn mark_read(&self, mut notification: Notification) -> Result<Notification, StoreError> {
        notification.is_read = true;
        self.store.save(&notification).await?;
        Ok(notification)
    }

    /// Elimina le notifiche del destinatario che hanno originato una risposta.
    /// `requesting_user_id` distingue le richieste di utenti diversi sullo stesso viaggio.
    #[instrument(skip(self))]
    pub async fn delete_matching(
        &self,
        recipient_id: i32,
        trip_id: i32,
        notification_type: NotificationType,
        requesting_user_id: Option<i32>,
    ) -> Result<u64, StoreError> {
        let candidates: Vec<Notification> = self
            .store
            .find_by_field("recipient_id", json!(recipient_id))
            .await?;

        let mut deleted = 0;
        for n in candidates.iter().filter(|n| {
            n.trip_id == trip_id
                && n.notification_type == notification_type
                && n.requesting_user_id == requesting_user_id
        }) {
            if self.store.delete::<Notification>(n.notification_id).await? {
                deleted += 1;
            }
        }
        debug!(deleted, "Notifications cleared");
        Ok(deleted)
    }

    pub async fn delete_by_trip(&self, trip_id: i32) -> Result<u64, StoreError> {
        self.store
            .delete_by_field::<Notification>("trip_id", json!(trip_id))
            .await
    }
}

impl Create<Notification, CreateNotificationDTO> for NotificationRepository {
    async fn create(&self, data: &CreateNotificationDTO) -> Result<Notification, StoreError> {
        let notification = Notification {
            notification_id: 0,
            recipient_id: data.recipient_id,
            trip_id: data.trip_id,
            message: data.message.clone(),
            notification_type: data.notification_type,
            requesting_user_id: data.requesting_user_id,
            is_read: false,
            created_at: Utc::now(),
        };
        self.store.insert(notification).await
    }
}

impl Read<Notification, i32> for NotificationRepository {
    async fn read(&self, id: &i32) -> Result<Option<Notification>, StoreError> {
        self.store.get(*id).await
    }
}

impl Delete<i32> for NotificationRepository {
    async fn delete(&self, id: &i32) -> Result<(), StoreError> {
        self.store.delete::<Notification>(*id).await?;
        Ok(())
    }
}

//! Notification entity - Entità notifica

use super::enums::NotificationType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Notification {
    pub notification_id: i32,
    pub recipient_id: i32, // utente destinatario
    pub trip_id: i32,
    pub message: String,
    pub notification_type: NotificationType,
    // solo per le notifiche di tipo request: chi ha chiesto di entrare
    pub requesting_user_id: Option<i32>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

//! Notification DTOs - Data Transfer Objects per notifiche

use crate::entities::{Notification, NotificationType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NotificationDTO {
    pub notification_id: i32,
    pub trip_id: i32,
    pub message: String,
    pub notification_type: NotificationType,
    pub requesting_user_id: Option<i32>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDTO {
    fn from(value: Notification) -> Self {
        Self {
            notification_id: value.notification_id,
            trip_id: value.trip_id,
            message: value.message,
            notification_type: value.notification_type,
            requesting_user_id: value.requesting_user_id,
            is_read: value.is_read,
            created_at: value.created_at,
        }
    }
}

/// DTO per creare una notifica (senza notification_id), costruito solo lato server
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateNotificationDTO {
    pub recipient_id: i32,
    pub trip_id: i32,
    pub message: String,
    pub notification_type: NotificationType,
    pub requesting_user_id: Option<i32>,
}

impl CreateNotificationDTO {
    pub fn invitation(recipient_id: i32, trip_id: i32, message: String) -> Self {
        Self {
            recipient_id,
            trip_id,
            message,
            notification_type: NotificationType::Invitation,
            requesting_user_id: None,
        }
    }

    pub fn request(host_id: i32, trip_id: i32, requesting_user_id: i32, message: String) -> Self {
        Self {
            recipient_id: host_id,
            trip_id,
            message,
            notification_type: NotificationType::Request,
            requesting_user_id: Some(requesting_user_id),
        }
    }

    pub fn alert(recipient_id: i32, trip_id: i32, message: String) -> Self {
        Self {
            recipient_id,
            trip_id,
            message,
            notification_type: NotificationType::Alert,
            requesting_user_id: None,
        }
    }
}

//! Notify - Emissione delle notifiche verso gli utenti
//!
//! Una notifica viene:
//! 1. salvata nel document store
//! 2. inoltrata in tempo reale all'utente se è connesso via websocket
//! 3. inviata come push (Expo) in un task separato, con timeout
//!
//! Nessun errore di questi passi risale al chiamante: vengono loggati e ignorati, una
//! transizione di membership già salvata non deve mai fallire per una notifica.

pub mod email;
pub mod push;

use crate::core::AppState;
use crate::dtos::{CreateNotificationDTO, NotificationDTO};
use crate::entities::{Notification, NotificationType};
use crate::repositories::{Create, Read};
use crate::ws::usermap::InternalSignal;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Titolo delle notifiche push
const PUSH_TITLE: &str = "Trip update";

pub struct Notifier<'a> {
    state: &'a Arc<AppState>,
}

impl<'a> Notifier<'a> {
    pub fn new(state: &'a Arc<AppState>) -> Self {
        Self { state }
    }

    /// Salva e recapita una notifica. Ritorna `None` se il salvataggio è fallito.
    #[instrument(skip(self, data), fields(recipient = data.recipient_id, trip_id = data.trip_id))]
    pub async fn emit(&self, data: CreateNotificationDTO) -> Option<Notification> {
        let notification = match self.state.notification.create(&data).await {
            Ok(n) => n,
            Err(e) => {
                error!("Failed to store notification: {:?}", e);
                return None;
            }
        };
        debug!(
            notification_id = notification.notification_id,
            "Notification stored"
        );

        self.state.users_online.send_server_message_if_online(
            notification.recipient_id,
            InternalSignal::Notification(NotificationDTO::from(notification.clone())),
        );

        if self.state.push.is_enabled() {
            tokio::spawn(deliver_push(self.state.clone(), notification.clone()));
        }

        Some(notification)
    }

    /// Elimina le notifiche che hanno originato una risposta (invito o richiesta)
    #[instrument(skip(self))]
    pub async fn clear(
        &self,
        recipient_id: i32,
        trip_id: i32,
        notification_type: NotificationType,
        requesting_user_id: Option<i32>,
    ) {
        if let Err(e) = self
            .state
            .notification
            .delete_matching(recipient_id, trip_id, notification_type, requesting_user_id)
            .await
        {
            warn!("Failed to clear notifications: {:?}", e);
        }
    }
}

async fn deliver_push(state: Arc<AppState>, notification: Notification) {
    let tokens = match state.user.read(&notification.recipient_id).await {
        Ok(Some(user)) => user.push_tokens,
        Ok(None) => return,
        Err(e) => {
            warn!("Failed to load push tokens: {:?}", e);
            return;
        }
    };
    if tokens.is_empty() {
        return;
    }

    let data = json!({
        "notificationId": notification.notification_id,
        "tripId": notification.trip_id,
        "type": notification.notification_type,
    });

    if let Err(e) = state
        .push
        .send(&tokens, PUSH_TITLE, &notification.message, Some(data))
        .await
    {
        warn!(
            notification_id = notification.notification_id,
            "Push delivery failed: {}", e
        );
    }
}

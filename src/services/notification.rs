//! Notification services - Lettura, gestione e risposta alle notifiche

use crate::core::{AppError, AppState};
use crate::dtos::{NotificationDTO, TripDTO};
use crate::entities::{Decision, Notification, NotificationType, User};
use crate::repositories::{Delete, Read};
use crate::services::membership::{apply_invitation_response, apply_request_response};
use axum::{
    Extension,
    extract::{Json, Path, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Solo il destinatario vede la notifica: per chiunque altro non esiste
async fn load_own_notification(
    state: &AppState,
    notification_id: i32,
    user_id: i32,
) -> Result<Notification, AppError> {
    match state.notification.read(&notification_id).await? {
        Some(n) if n.recipient_id == user_id => Ok(n),
        _ => {
            warn!("Notification not found or not owned by user");
            Err(AppError::not_found("Notification not found"))
        }
    }
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<NotificationDTO>>, AppError> {
    let notifications = state
        .notification
        .find_many_by_recipient(current_user.user_id)
        .await?;
    debug!("Found {} notifications", notifications.len());
    Ok(Json(notifications.into_iter().map(NotificationDTO::from).collect()))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_unread_notifications(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<NotificationDTO>>, AppError> {
    let notifications = state
        .notification
        .find_unread_by_recipient(current_user.user_id)
        .await?;
    Ok(Json(notifications.into_iter().map(NotificationDTO::from).collect()))
}

#[instrument(skip(state, current_user), fields(notification_id = %notification_id, user_id = %current_user.user_id))]
pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<Json<NotificationDTO>, AppError> {
    let notification =
        load_own_notification(&state, notification_id, current_user.user_id).await?;

    if notification.is_read {
        return Ok(Json(NotificationDTO::from(notification)));
    }

    let notification = state.notification.mark_read(notification).await?;
    info!("Notification marked as read");
    Ok(Json(NotificationDTO::from(notification)))
}

#[instrument(skip(state, current_user), fields(notification_id = %notification_id, user_id = %current_user.user_id))]
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<(), AppError> {
    load_own_notification(&state, notification_id, current_user.user_id).await?;
    state.notification.delete(&notification_id).await?;
    info!("Notification deleted");
    Ok(())
}

#[instrument(skip(state, current_user), fields(notification_id = %notification_id, action = %action, user_id = %current_user.user_id))]
pub async fn respond_via_notification(
    State(state): State<Arc<AppState>>,
    Path((notification_id, action)): Path<(i32, String)>,
    Extension(current_user): Extension<User>,
) -> Result<Json<TripDTO>, AppError> {
    debug!("Responding through notification");
    // 1. La notifica deve appartenere all'utente corrente
    // 2. Validare l'azione (accept / reject)
    // 3. invitation -> risposta all'invito, request -> risposta dell'host alla richiesta
    // 4. Gli alert non prevedono risposta

    let notification =
        load_own_notification(&state, notification_id, current_user.user_id).await?;

    let decision = Decision::from_action(&action)
        .ok_or_else(|| AppError::bad_request("Action must be 'accept' or 'reject'"))?;

    let trip = match notification.notification_type {
        NotificationType::Invitation => {
            apply_invitation_response(&state, notification.trip_id, &current_user, decision)
                .await?
        }
        NotificationType::Request => {
            let requesting_user_id = notification.requesting_user_id.ok_or_else(|| {
                warn!("Request notification without requesting user");
                AppError::bad_request("Notification does not reference a join request")
            })?;
            apply_request_response(
                &state,
                notification.trip_id,
                &current_user,
                requesting_user_id,
                decision,
            )
            .await?
        }
        NotificationType::Alert => {
            warn!("Attempt to respond to an alert notification");
            return Err(AppError::bad_request("This notification cannot be answered"));
        }
    };

    info!("Notification response processed");
    Ok(Json(TripDTO::from(trip)))
}

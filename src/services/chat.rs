//! Chat services - Messaggi della chat di viaggio

use crate::core::{AppError, AppState};
use crate::dtos::{CreateMessageDTO, MessageDTO, MessagesQuery, SendMessageDTO};
use crate::entities::{Trip, User};
use crate::membership::require_view_access;
use crate::repositories::{Create, Read};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 100;

/// Salva un messaggio della chat del viaggio e lo inoltra ai client connessi.
/// Usata sia dall'endpoint REST sia dal websocket.
pub async fn publish_message(
    state: &Arc<AppState>,
    sender_id: i32,
    trip_id: i32,
    content: String,
) -> Result<MessageDTO, AppError> {
    // 1. Il mittente deve avere accesso in lettura al viaggio
    // 2. Validare il contenuto
    // 3. Salvare il messaggio e inviarlo sul canale broadcast del viaggio

    let trip = state.trip.read(&trip_id).await?.ok_or_else(|| {
        warn!("Trip not found: {}", trip_id);
        AppError::not_found("Trip not found")
    })?;
    require_view_access(&trip, sender_id)?;

    let data = CreateMessageDTO {
        trip_id,
        sender_id,
        content,
        created_at: Utc::now(),
    };
    data.validate()?;

    let message = MessageDTO::from(state.msg.create(&data).await?);
    let receivers = state.chats_online.send(trip_id, Arc::new(message.clone()));
    debug!(receivers, "Message broadcast");
    Ok(message)
}

#[instrument(skip(state, trip, params), fields(trip_id = %trip.trip_id))]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MessagesQuery>,
    Extension(trip): Extension<Trip>, // ottenuto dal trip_participant_middleware
) -> Result<Json<Vec<MessageDTO>>, AppError> {
    debug!("Fetching trip messages");
    // 1. Accesso al viaggio già verificato dal middleware
    // 2. Se before presente: messaggi precedenti a quella data, altrimenti gli ultimi
    // 3. Dal più recente al più vecchio

    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE) as usize;

    let messages = state
        .msg
        .find_many_paginated(trip.trip_id, params.before, limit)
        .await?;

    info!("Retrieved {} messages for trip", messages.len());
    Ok(Json(messages.into_iter().map(MessageDTO::from).collect()))
}

#[instrument(skip(state, current_user, body), fields(trip_id = %trip_id, user_id = %current_user.user_id))]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<i32>,
    Extension(current_user): Extension<User>,
    Json(body): Json<SendMessageDTO>,
) -> Result<(StatusCode, Json<MessageDTO>), AppError> {
    let message = publish_message(&state, current_user.user_id, trip_id, body.content).await?;
    info!(message_id = message.message_id, "Message sent");
    Ok((StatusCode::CREATED, Json(message)))
}

//! WebSocket Event Handlers - Handler per eventi WebSocket

use crate::AppState;
use crate::dtos::SendMessageDTO;
use crate::services::chat::publish_message;
use crate::ws::usermap::InternalSignal;
use std::sync::Arc;
use tracing::{debug, warn};

/// Handler per messaggi di chat ricevuti dal websocket
/// Operazioni:
/// 1. Il messaggio deve indicare il viaggio
/// 2. Validazione, salvataggio e broadcast come per l'endpoint REST
/// 3. In caso di errore il client riceve un evento di errore sulla propria connessione
pub async fn process_message(state: &Arc<AppState>, user_id: i32, event: SendMessageDTO) {
    let Some(trip_id) = event.trip_id else {
        warn!("Message without trip_id");
        state
            .users_online
            .send_server_message_if_online(user_id, InternalSignal::Error("Missing trip_id"));
        return;
    };

    match publish_message(state, user_id, trip_id, event.content).await {
        Ok(message) => debug!(message_id = message.message_id, trip_id, "Message published"),
        Err(e) => {
            warn!(trip_id, "Message rejected: {}", e.message());
            state
                .users_online
                .send_server_message_if_online(user_id, InternalSignal::Error(e.message()));
        }
    }
}

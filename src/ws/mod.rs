//! WebSocket Module - Gestione WebSocket per comunicazione real-time
//!
//! Questo modulo gestisce le connessioni WebSocket per la comunicazione in tempo reale
//! tra client e server. Include:
//! - Gestione upgrade HTTP -> WebSocket
//! - Gestione connessioni (split sender/receiver)
//! - Canali broadcast per la chat di ogni viaggio (`chatmap`)
//! - Segnali interni verso le connessioni degli utenti online (`usermap`)

pub mod chatmap;
pub mod connection;
pub mod event_handlers;
pub mod usermap;

// Re-exports pubblici
pub use connection::handle_socket;

use crate::{AppState, entities::User};
use axum::{
    Extension,
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;

/// Intervallo massimo (ms) prima di inviare un batch di messaggi incompleto
pub const BATCH_INTERVAL: u64 = 500;
/// Dimensione del batch oltre la quale i messaggi vengono inviati subito
pub const BATCH_MAX_SIZE: usize = 10;
/// Intervallo minimo (ms) tra due messaggi letti dallo stesso client
pub const RATE_LIMITER_MILLIS: u64 = 100;
/// Connessione chiusa dopo questo tempo senza messaggi dal client
pub const TIMEOUT_DURATION_SECONDS: u64 = 300;
pub const BROADCAST_CHANNEL_CAPACITY: usize = 100;

/// Entry point per gestire richieste di upgrade WebSocket
/// Operazioni:
/// 1. Estrarre user_id dall'autenticazione JWT
/// 2. Eseguire upgrade HTTP -> WebSocket
/// 3. Passare la connessione ad handle_socket
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione JWT
) -> Response {
    let user_id = current_user.user_id;

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

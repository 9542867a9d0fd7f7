//! WebSocket Connection Management - Gestione connessioni WebSocket

use crate::ws::{BATCH_INTERVAL, BATCH_MAX_SIZE, RATE_LIMITER_MILLIS, TIMEOUT_DURATION_SECONDS};
use crate::{
    AppState,
    dtos::{MessageDTO, SendMessageDTO, WsEventDTO},
    repositories::Read,
    ws::{event_handlers::process_message, usermap::InternalSignal},
};
use axum::extract::ws::Utf8Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::Duration;
use tokio::time::{interval, timeout};
use tokio_stream::StreamMap;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, info, instrument, warn};

#[instrument(skip(ws, state), fields(user_id))]
pub async fn handle_socket(ws: WebSocket, state: Arc<AppState>, user_id: i32) {
    info!("WebSocket connection established");

    // Dividiamo il WebSocket in due metà: sender e receiver
    let (ws_tx, ws_rx) = ws.split();

    // canale interno per i segnali del server verso questa connessione
    let (int_tx, int_rx) = unbounded_channel::<InternalSignal>();

    // una eventuale connessione precedente dello stesso utente riceve Shutdown
    state.users_online.register_online(user_id, int_tx.clone());
    info!("User registered as online");

    tokio::spawn(listen_ws(user_id, ws_rx, int_tx, state.clone()));
    tokio::spawn(write_ws(user_id, ws_tx, int_rx, state));
}

#[instrument(skip(websocket_tx, internal_rx, state), fields(user_id))]
pub async fn write_ws(
    user_id: i32,
    mut websocket_tx: SplitSink<WebSocket, Message>,
    mut internal_rx: UnboundedReceiver<InternalSignal>,
    state: Arc<AppState>,
) {
    info!("Write task started");

    // le chat sottoscritte sono quelle dei viaggi nello storico (membership accettata)
    let trip_ids: Vec<i32> = match state.user.read(&user_id).await {
        Ok(Some(user)) => {
            info!(trip_count = user.trip_history.len(), "User trips loaded");
            user.trip_history
        }
        Ok(None) => {
            warn!("User no longer exists, closing connection");
            return;
        }
        Err(e) => {
            error!("Failed to load user trips: {:?}", e);
            return;
        }
    };

    let mut stream_map = StreamMap::new();
    for (trip_id, rx) in state.chats_online.subscribe_multiple(&trip_ids) {
        stream_map.insert(trip_id, BroadcastStream::new(rx));
    }

    let mut batch: Vec<Arc<MessageDTO>> = Vec::new();
    let mut interval = tokio::time::interval(Duration::from_millis(BATCH_INTERVAL));
    interval.tick().await; // Consuma primo tick immediato

    'external: loop {
        tokio::select! {
            Some((_, result)) = tokio_stream::StreamExt::next(&mut stream_map) => {
                match result {
                    Ok(msg) => {
                        batch.push(msg);
                        if batch.len() >= BATCH_MAX_SIZE {
                            if send_batch(&mut websocket_tx, &batch).await.is_err() {
                                warn!("Failed to send batch, closing connection");
                                break 'external;
                            }
                            debug!(batch_size = batch.len(), "Batch sent");
                            batch.clear();
                        }
                    }
                    Err(e) => warn!("Client lagging behind trip chat: {:?}", e),
                }
            }

            // invia anche i batch incompleti, altrimenti i messaggi aspetterebbero troppo
            _ = interval.tick() => {
                if !batch.is_empty() {
                    if send_batch(&mut websocket_tx, &batch).await.is_err() {
                        warn!("Failed to send batch on interval, closing connection");
                        break 'external;
                    }
                    debug!(batch_size = batch.len(), "Batch sent on interval");
                    batch.clear();
                }
            }

            signal = internal_rx.recv() => {
                let event = match signal {
                    Some(InternalSignal::Shutdown) => {
                        info!("Shutdown signal received");
                        break 'external;
                    }
                    Some(InternalSignal::AddTrip(trip_id)) => {
                        info!(trip_id, "Adding trip chat subscription");
                        let rx = state.chats_online.subscribe(trip_id);
                        stream_map.insert(trip_id, BroadcastStream::new(rx));
                        WsEventDTO::TripJoined { trip_id }
                    }
                    Some(InternalSignal::RemoveTrip(trip_id)) => {
                        info!(trip_id, "Removing trip chat subscription");
                        stream_map.remove(&trip_id);
                        WsEventDTO::TripLeft { trip_id }
                    }
                    Some(InternalSignal::Error(err_msg)) => {
                        warn!(error_message = err_msg, "Sending error message to client");
                        WsEventDTO::Error { code: 400, message: err_msg.to_string() }
                    }
                    Some(InternalSignal::Notification(notification)) => {
                        debug!(notification_id = notification.notification_id, "Sending notification to client");
                        WsEventDTO::Notification(notification)
                    }
                    None => {
                        info!("Internal channel closed");
                        break 'external;
                    }
                };

                if send_event(&mut websocket_tx, &event).await.is_err() {
                    break 'external;
                }
            }
        }
    }

    // Invia batch finale prima di terminare
    if !batch.is_empty() {
        info!(batch_size = batch.len(), "Sending final batch before shutdown");
        let _ = send_batch(&mut websocket_tx, &batch).await;
    }

    info!("Write task terminated");
}

async fn send_event(
    websocket_tx: &mut SplitSink<WebSocket, Message>,
    event: &WsEventDTO,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(|e| {
        error!("Failed to serialize event: {:?}", e);
        axum::Error::new(e)
    })?;
    websocket_tx
        .send(Message::Text(Utf8Bytes::from(json)))
        .await
        .map_err(|e| {
            error!("Failed to send event through WebSocket: {:?}", e);
            e
        })
}

#[instrument(skip(websocket_tx, batch))]
async fn send_batch(
    websocket_tx: &mut SplitSink<WebSocket, Message>,
    batch: &[Arc<MessageDTO>],
) -> Result<(), axum::Error> {
    let messages = batch.iter().map(|m| m.as_ref().clone()).collect();
    send_event(websocket_tx, &WsEventDTO::Messages(messages)).await
}

#[instrument(skip(websocket_rx, internal_tx, state), fields(user_id))]
pub async fn listen_ws(
    user_id: i32,
    mut websocket_rx: SplitStream<WebSocket>,
    internal_tx: UnboundedSender<InternalSignal>,
    state: Arc<AppState>,
) {
    info!("Listen task started");

    let mut rate_limiter = interval(Duration::from_millis(RATE_LIMITER_MILLIS));
    let timeout_duration = Duration::from_secs(TIMEOUT_DURATION_SECONDS);

    loop {
        match timeout(timeout_duration, StreamExt::next(&mut websocket_rx)).await {
            Ok(Some(msg_result)) => {
                rate_limiter.tick().await;

                let msg = match msg_result {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("WebSocket error: {:?}", e);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => match serde_json::from_str::<SendMessageDTO>(&text) {
                        Ok(event) => {
                            debug!("Message received from client");
                            process_message(&state, user_id, event).await;
                        }
                        Err(_) => {
                            warn!("Failed to deserialize message");
                            let _ = internal_tx.send(InternalSignal::Error("Malformed message"));
                        }
                    },
                    Message::Close(_) => {
                        info!("Close message received");
                        break;
                    }
                    _ => {}
                }
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(timeout_secs = TIMEOUT_DURATION_SECONDS, "Connection timeout");
                break;
            }
        }
    }

    // Cleanup: se nel frattempo l'utente si è riconnesso la nuova connessione resta registrata
    info!("Cleaning up connection");
    let _ = internal_tx.send(InternalSignal::Shutdown);
    state.users_online.remove_from_online(user_id, &internal_tx);
    info!("Listen task terminated");
}

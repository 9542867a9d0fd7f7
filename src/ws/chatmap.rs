use crate::dtos::MessageDTO;
use crate::ws::BROADCAST_CHANNEL_CAPACITY;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::Sender;
use tracing::{debug, instrument};

/// Canali broadcast delle chat dei viaggi con almeno un membro online
pub struct ChatMap {
    /// Attribute to retrieve the tx head of a broadcast channel by trip_id
    channels: DashMap<i32, Sender<Arc<MessageDTO>>>,
}

impl Default for ChatMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatMap {
    pub fn new() -> Self {
        ChatMap {
            channels: DashMap::new(),
        }
    }

    #[instrument(skip(self))]
    pub fn subscribe(&self, trip_id: i32) -> Receiver<Arc<MessageDTO>> {
        // entry tiene il lock sullo shard: due subscribe concorrenti non creano due canali
        self.channels
            .entry(trip_id)
            .or_insert_with(|| {
                debug!("Creating new broadcast channel for trip chat");
                // Arc<Message> to share the ref, not the message
                broadcast::channel::<Arc<MessageDTO>>(BROADCAST_CHANNEL_CAPACITY).0
            })
            .subscribe()
    }

    pub fn subscribe_multiple(&self, trip_ids: &[i32]) -> Vec<(i32, Receiver<Arc<MessageDTO>>)> {
        trip_ids.iter().map(|&id| (id, self.subscribe(id))).collect()
    }

    /// Inoltra il messaggio ai ricevitori attivi, ritorna quanti lo hanno ricevuto.
    /// Un canale senza ricevitori viene rimosso.
    #[instrument(skip(self, msg))]
    pub fn send(&self, trip_id: i32, msg: Arc<MessageDTO>) -> usize {
        let delivered = match self.channels.get(&trip_id) {
            Some(chat) => chat.send(msg).ok(),
            None => return 0,
        };

        match delivered {
            Some(n) => {
                debug!(receivers = n, "Message broadcast to receivers");
                n
            }
            None => {
                debug!("No active receivers, removing channel");
                self.channels
                    .remove_if(&trip_id, |_, tx| tx.receiver_count() == 0);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn msg(trip_id: i32) -> Arc<MessageDTO> {
        Arc::new(MessageDTO {
            message_id: 1,
            trip_id,
            sender_id: 1,
            content: "ciao".to_string(),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn test_broadcast_reaches_every_subscriber() {
        let map = ChatMap::new();
        let mut a = map.subscribe(3);
        let mut b = map.subscribe(3);
        let mut other = map.subscribe(4);

        assert_eq!(map.send(3, msg(3)), 2);
        assert_eq!(a.try_recv().unwrap().trip_id, 3);
        assert_eq!(b.try_recv().unwrap().trip_id, 3);
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn test_send_without_subscribers() {
        let map = ChatMap::new();
        assert_eq!(map.send(9, msg(9)), 0);

        let rx = map.subscribe(9);
        drop(rx);
        assert_eq!(map.send(9, msg(9)), 0);
        // canale rimosso: una nuova sottoscrizione ne crea uno nuovo funzionante
        let mut rx = map.subscribe(9);
        assert_eq!(map.send(9, msg(9)), 1);
        assert!(rx.try_recv().is_ok());
    }
}

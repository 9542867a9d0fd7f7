use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

use crate::dtos::NotificationDTO;

/// Segnali dal server verso il task di scrittura della connessione di un utente
#[derive(Debug)]
pub enum InternalSignal {
    Shutdown,
    AddTrip(i32),
    RemoveTrip(i32),
    Error(&'static str),
    Notification(NotificationDTO),
}

impl InternalSignal {
    fn kind(&self) -> &'static str {
        match self {
            InternalSignal::Shutdown => "Shutdown",
            InternalSignal::AddTrip(_) => "AddTrip",
            InternalSignal::RemoveTrip(_) => "RemoveTrip",
            InternalSignal::Error(_) => "Error",
            InternalSignal::Notification(_) => "Notification",
        }
    }
}

/// Utenti connessi via websocket, una connessione per utente (l'ultima vince)
pub struct UserMap {
    users_online: DashMap<i32, UnboundedSender<InternalSignal>>,
}

impl Default for UserMap {
    fn default() -> Self {
        Self::new()
    }
}

impl UserMap {
    pub fn new() -> Self {
        UserMap {
            users_online: DashMap::new(),
        }
    }

    #[instrument(skip(self, tx))]
    pub fn register_online(&self, user_id: i32, tx: UnboundedSender<InternalSignal>) {
        if let Some(previous) = self.users_online.insert(user_id, tx) {
            // la connessione precedente viene chiusa
            let _ = previous.send(InternalSignal::Shutdown);
        }
        info!("Total online users: {}", self.users_online.len());
    }

    /// Rimuove l'utente solo se il canale registrato è ancora `tx`: una connessione
    /// vecchia che si chiude non deve staccare quella nuova
    #[instrument(skip(self, tx))]
    pub fn remove_from_online(&self, user_id: i32, tx: &UnboundedSender<InternalSignal>) {
        let removed = self
            .users_online
            .remove_if(&user_id, |_, current| current.same_channel(tx))
            .is_some();
        debug!(removed, "Removing user from online");
    }

    #[instrument(skip(self, message), fields(kind = message.kind()))]
    pub fn send_server_message_if_online(&self, user_id: i32, message: InternalSignal) {
        let kind = message.kind();
        match self.users_online.get(&user_id) {
            Some(entry) => {
                if let Err(e) = entry.value().send(message) {
                    warn!("Failed to send {} message to user: {:?}", kind, e);
                } else {
                    debug!("{} message sent to online user", kind);
                }
            }
            None => debug!("User {} not online, {} message not sent", user_id, kind),
        }
    }

    pub fn online_count(&self) -> usize {
        self.users_online.len()
    }

    pub fn is_user_online(&self, user_id: i32) -> bool {
        self.users_online.contains_key(&user_id)
    }
}

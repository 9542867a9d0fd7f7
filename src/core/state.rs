//! Application State - Stato globale dell'applicazione
//!
//! Contiene tutti i repository, configurazioni e stato condiviso
//! necessario per gestire l'applicazione.

use crate::notify::email::{EmailSender, LogEmailSender};
use crate::notify::push::PushClient;
use crate::repositories::{
    BlogRepository, DocumentStore, MessageRepository, NotificationRepository, QuestionRepository,
    TripRepository, UserRepository,
};
use crate::ws::chatmap::ChatMap;
use crate::ws::usermap::UserMap;
use std::sync::Arc;

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    /// Repository per la gestione degli utenti
    pub user: UserRepository,

    /// Repository per la gestione dei viaggi (e della loro membership)
    pub trip: TripRepository,

    /// Repository per la gestione delle notifiche
    pub notification: NotificationRepository,

    /// Repository per la gestione dei messaggi delle chat di viaggio
    pub msg: MessageRepository,

    pub blog: BlogRepository,

    pub question: QuestionRepository,

    /// Secret key per JWT token
    pub jwt_secret: String,

    /// Client per le notifiche push (Expo)
    pub push: PushClient,

    pub email: Arc<dyn EmailSender>,

    /// Base del link di reset password inviato per email
    pub client_url: String,

    /// Mappa concorrente degli utenti online con i loro canali WebSocket
    /// Key: user_id, Value: Sender per inviare segnali al task di scrittura dell'utente
    pub users_online: UserMap,

    /// Canali broadcast delle chat di viaggio con almeno un utente online
    pub chats_online: ChatMap,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// sullo stesso document store.
    ///
    /// # Arguments
    /// * `store` - Document store condiviso (MySQL o in memoria)
    /// * `jwt_secret` - Chiave segreta per la firma dei token JWT
    /// * `push` - Client push, eventualmente disabilitato
    pub fn new(store: DocumentStore, jwt_secret: String, push: PushClient) -> Self {
        Self {
            user: UserRepository::new(store.clone()),
            trip: TripRepository::new(store.clone()),
            notification: NotificationRepository::new(store.clone()),
            msg: MessageRepository::new(store.clone()),
            blog: BlogRepository::new(store.clone()),
            question: QuestionRepository::new(store),
            jwt_secret,
            push,
            email: Arc::new(LogEmailSender),
            client_url: String::from("http://localhost:3000"),
            users_online: UserMap::new(),
            chats_online: ChatMap::new(),
        }
    }

    pub fn with_email(mut self, email: Arc<dyn EmailSender>, client_url: String) -> Self {
        self.email = email;
        self.client_url = client_url;
        self
    }
}

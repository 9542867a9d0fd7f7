//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Questo modulo organizza i repository in sotto-moduli separati per una migliore manutenibilità.
//! Ogni repository gestisce una collezione del document store (vedi [`store`]).

// ************************* NOTA SULLE QUERY ************************* //

/*
   Le query sqlx stanno tutte in store.rs e sono query runtime (sqlx::query / query_as), non le
   macro query! / query_as!: lo schema è una sola tabella `documents` con il corpo JSON, non c'è
   niente da controllare a compile time e così il crate compila anche senza un database attivo.
   I repository non vedono mai SQL: parlano solo con DocumentStore, che ha anche il backend in
   memoria usato dai test.

   Le modifiche ad un documento esistente passano da DocumentStore::modify (load, closure,
   scrittura condizionale sulla versione, retry). La closure può essere eseguita più volte:
   niente I/O dentro, solo trasformazioni del documento.
*/

// ************************* MODULI REPOSITORY ************************* //

pub mod blog;
pub mod message;
pub mod notification;
pub mod question;
pub mod store;
pub mod traits;
pub mod trip;
pub mod user;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, Delete, Read, ReadMany};

pub use store::{Document, DocumentStore, StoreError, Versioned};

// Re-esportazione delle struct dei repository per facilitare l'import
pub use blog::BlogRepository;
pub use message::MessageRepository;
pub use notification::NotificationRepository;
pub use question::QuestionRepository;
pub use trip::TripRepository;
pub use user::UserRepository;

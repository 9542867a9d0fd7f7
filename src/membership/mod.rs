//! Membership - Macchina a stati inviti/richieste e controllo accessi sui viaggi
//!
//! Le transizioni sono funzioni pure sul documento `Trip`: nessun I/O, nessun log.
//! Possono essere rieseguite dal repository in caso di conflitto di versione, quindi
//! gli effetti collaterali (notifiche, storico, websocket) vanno eseguiti dai service
//! solo dopo il salvataggio.

pub mod access;
pub mod transitions;

pub use access::{
    can_see, has_edit_access, has_view_access, is_host, require_edit_access, require_host,
    require_view_access,
};

use thiserror::Error;

/// Errori delle operazioni sulla membership, ognuno con un messaggio per il client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("bad request: {0}")]
    BadRequest(&'static str),
}

impl MembershipError {
    pub fn message(&self) -> &'static str {
        match self {
            MembershipError::NotFound(m)
            | MembershipError::Forbidden(m)
            | MembershipError::Conflict(m)
            | MembershipError::BadRequest(m) => m,
        }
    }
}

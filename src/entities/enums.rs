//! Enumerazioni - Tipi enumerati utilizzati nelle entità

use serde::{Deserialize, Serialize};

// ********************* ENUMERAZIONI UTILI **********************//

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Host,
    Editor,
    Viewer,
}

impl MemberRole {
    /// Ruoli che l'host può assegnare con un cambio ruolo.
    /// `host` non è mai assegnabile, qualsiasi altra stringa non è un ruolo valido.
    pub fn assignable(value: &str) -> Option<Self> {
        match value {
            "editor" => Some(MemberRole::Editor),
            "viewer" => Some(MemberRole::Viewer),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Pending,
    Accepted,
    // mantenuto per compatibilità dei documenti: le transizioni rimuovono il record invece di marcarlo
    Rejected,
}

/// Come è nato il record membro: serve a distinguere un invito da una richiesta di ingresso
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberOrigin {
    Host,
    Invitation,
    Request,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    #[default]
    Planning,
    Planned,
    Ongoing,
    Completed,
    Posted,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Invitation,
    Request,
    Alert,
}

/// Risposta ad un invito o ad una richiesta di ingresso
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    /// Converte l'azione presa dal path ("accept" / "reject")
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "accept" => Some(Decision::Accept),
            "reject" => Some(Decision::Reject),
            _ => None,
        }
    }
}

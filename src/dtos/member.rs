//! Member DTOs - Data Transfer Objects per i membri di un viaggio

use crate::entities::{Member, MemberOrigin, MemberRole, MemberStatus, User};
use serde::{Deserialize, Serialize};

/// Membro arricchito con i dati pubblici dell'utente
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MemberDTO {
    pub user_id: i32,
    pub name: Option<String>,
    pub photo: Option<String>,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub origin: MemberOrigin,
}

impl MemberDTO {
    /// `user` può mancare se l'account non esiste più
    pub fn new(member: &Member, user: Option<&User>) -> Self {
        Self {
            user_id: member.user_id,
            name: user.map(|u| u.name.clone()),
            photo: user.and_then(|u| u.photo.clone()),
            role: member.role,
            status: member.status,
            origin: member.origin,
        }
    }
}

/// Il ruolo arriva come stringa libera: la validazione è della macchina a stati
#[derive(Serialize, Deserialize, Debug)]
pub struct ChangeRoleDTO {
    pub role: String,
}

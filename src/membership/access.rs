//! Access control - Unico punto in cui si decidono i permessi su un viaggio

use super::MembershipError;
use crate::entities::{MemberRole, MemberStatus, Trip};

pub fn is_host(trip: &Trip, user_id: i32) -> bool {
    trip.host == user_id
}

/// Permesso di modificare i contenuti (titolo, itinerario, ...), non la membership
pub fn has_edit_access(trip: &Trip, user_id: i32) -> bool {
    if is_host(trip, user_id) {
        return true;
    }
    trip.member(user_id).is_some_and(|m| {
        m.status == MemberStatus::Accepted && m.role == MemberRole::Editor
    })
}

/// Partecipazione: host o membro accettato di qualsiasi ruolo
pub fn has_view_access(trip: &Trip, user_id: i32) -> bool {
    if is_host(trip, user_id) {
        return true;
    }
    trip.member(user_id)
        .is_some_and(|m| m.status == MemberStatus::Accepted)
}

/// Visibilità del dettaglio: viaggi pubblici, partecipanti, e chi ha un record pending
/// (deve poter vedere il viaggio per decidere se accettare)
pub fn can_see(trip: &Trip, user_id: i32) -> bool {
    trip.is_public
        || has_view_access(trip, user_id)
        || trip
            .member(user_id)
            .is_some_and(|m| m.status == MemberStatus::Pending)
}

pub fn require_host(
    trip: &Trip,
    user_id: i32,
    message: &'static str,
) -> Result<(), MembershipError> {
    if is_host(trip, user_id) {
        Ok(())
    } else {
        Err(MembershipError::Forbidden(message))
    }
}

pub fn require_edit_access(trip: &Trip, user_id: i32) -> Result<(), MembershipError> {
    if has_edit_access(trip, user_id) {
        Ok(())
    } else {
        Err(MembershipError::Forbidden("Unauthorized to edit this trip"))
    }
}

pub fn require_view_access(trip: &Trip, user_id: i32) -> Result<(), MembershipError> {
    if has_view_access(trip, user_id) {
        Ok(())
    } else {
        Err(MembershipError::Forbidden("You are not a participant of this trip"))
    }
}

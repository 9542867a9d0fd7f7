//! Trip entity - Entità viaggio, possiede la lista dei membri
//!
//! La lista `members` viene modificata solo tramite le transizioni definite in
//! `crate::membership`, mai con modifiche dirette all'array.

use super::enums::{MemberOrigin, MemberRole, MemberStatus, TripStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Member {
    pub user_id: i32,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub origin: MemberOrigin,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expense: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Activity {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
}

/// Alloggio della giornata
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Stay {
    #[serde(default)]
    pub hotel_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Restaurant {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub meal_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DayPlan {
    pub day: u32,
    #[serde(default)]
    pub day_notes: Option<String>,
    #[serde(default)]
    pub places: Vec<Place>,
    #[serde(default)]
    pub stay: Option<Stay>,
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Photo {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Trip {
    pub trip_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub estimated_budget: Option<f64>,
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub itinerary: Vec<DayPlan>,
    #[serde(default)]
    pub packing_essentials: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub cover_photo: Option<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub host: i32, // utente creatore, immutabile
    pub(crate) members: Vec<Member>,
    pub is_public: bool,
    #[serde(default)]
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// Lista membri in sola lettura
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Record membro dell'utente, se esiste (qualsiasi stato)
    pub fn member(&self, user_id: i32) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    /// Id degli utenti con membership accettata, host compreso
    pub fn accepted_member_ids(&self) -> Vec<i32> {
        self.members
            .iter()
            .filter(|m| m.status == MemberStatus::Accepted)
            .map(|m| m.user_id)
            .collect()
    }

    /// Record iniziale dell'host, creato insieme al viaggio
    pub fn host_member(host: i32) -> Member {
        Member {
            user_id: host,
            role: MemberRole::Host,
            status: MemberStatus::Accepted,
            origin: MemberOrigin::Host,
        }
    }
}

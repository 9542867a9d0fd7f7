//! Trip DTOs - Data Transfer Objects per viaggi

use crate::entities::trip::Photo;
use crate::entities::{DayPlan, Member, Trip, TripStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TripDTO {
    pub trip_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub estimated_budget: Option<f64>,
    pub duration_days: Option<u32>,
    pub itinerary: Vec<DayPlan>,
    pub packing_essentials: Vec<String>,
    pub tags: Vec<String>,
    pub cover_photo: Option<String>,
    pub photos: Vec<Photo>,
    pub host: i32,
    pub members: Vec<Member>,
    pub is_public: bool,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Trip> for TripDTO {
    fn from(value: Trip) -> Self {
        Self {
            members: value.members().to_vec(),
            trip_id: value.trip_id,
            title: value.title,
            description: value.description,
            destination: value.destination,
            estimated_budget: value.estimated_budget,
            duration_days: value.duration_days,
            itinerary: value.itinerary,
            packing_essentials: value.packing_essentials,
            tags: value.tags,
            cover_photo: value.cover_photo,
            photos: value.photos,
            host: value.host,
            is_public: value.is_public,
            status: value.status,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// DTO per creare un viaggio (senza trip_id). L'host è sempre l'utente autenticato,
/// viene impostato dal service e mai letto dal body.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateTripDTO {
    #[serde(skip)]
    pub host: i32,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub destination: Option<String>,

    #[validate(range(min = 0.0, message = "Budget cannot be negative"))]
    pub estimated_budget: Option<f64>,

    #[validate(range(min = 1, max = 365, message = "Duration must be between 1 and 365 days"))]
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

    #[serde(default)]
    pub is_public: bool,
}

impl CreateTripDTO {
    /// Contenuto di un viaggio esistente, per la copia: membri, stato e foto non vengono copiati
    pub fn copy_of(trip: &Trip, new_host: i32) -> Self {
        Self {
            host: new_host,
            title: format!("Copy of {}", trip.title),
            description: trip.description.clone(),
            destination: trip.destination.clone(),
            estimated_budget: trip.estimated_budget,
            duration_days: trip.duration_days,
            itinerary: trip.itinerary.clone(),
            packing_essentials: trip.packing_essentials.clone(),
            tags: trip.tags.clone(),
            cover_photo: trip.cover_photo.clone(),
            photos: vec![],
            is_public: false,
        }
    }
}

/// DTO per aggiornare i contenuti di un viaggio (solo campi modificabili, mai la membership)
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateTripDTO {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub destination: Option<String>,

    #[validate(range(min = 0.0, message = "Budget cannot be negative"))]
    pub estimated_budget: Option<f64>,

    #[validate(range(min = 1, max = 365, message = "Duration must be between 1 and 365 days"))]
    pub duration_days: Option<u32>,

    pub itinerary: Option<Vec<DayPlan>>,
    pub packing_essentials: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub cover_photo: Option<String>,
    pub photos: Option<Vec<Photo>>,
    pub is_public: Option<bool>,
    pub status: Option<TripStatus>,
}

impl UpdateTripDTO {
    /// Applica i campi presenti al documento. Pura: usata dentro il retry del repository.
    pub fn apply_to(&self, trip: &mut Trip) {
        if let Some(title) = &self.title {
            trip.title = title.clone();
        }
        if let Some(description) = &self.description {
            trip.description = Some(description.clone());
        }
        if let Some(destination) = &self.destination {
            trip.destination = Some(destination.clone());
        }
        if let Some(budget) = self.estimated_budget {
            trip.estimated_budget = Some(budget);
        }
        if let Some(days) = self.duration_days {
            trip.duration_days = Some(days);
        }
        if let Some(itinerary) = &self.itinerary {
            trip.itinerary = itinerary.clone();
        }
        if let Some(packing) = &self.packing_essentials {
            trip.packing_essentials = packing.clone();
        }
        if let Some(tags) = &self.tags {
            trip.tags = tags.clone();
        }
        if let Some(cover) = &self.cover_photo {
            trip.cover_photo = Some(cover.clone());
        }
        if let Some(photos) = &self.photos {
            trip.photos = photos.clone();
        }
        if let Some(is_public) = self.is_public {
            trip.is_public = is_public;
        }
        if let Some(status) = self.status {
            trip.status = status;
        }
    }
}

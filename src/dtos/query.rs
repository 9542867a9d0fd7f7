//! Query DTOs - Data Transfer Objects per query di ricerca

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// DTO per query parameters di ricerca utenti
#[derive(Serialize, Deserialize, Debug)]
pub struct UserSearchQuery {
    pub search: String,
}

/// DTO per query parameters di paginazione messaggi
#[derive(Serialize, Deserialize, Debug)]
pub struct MessagesQuery {
    #[serde(default)]
    pub before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Ricerca viaggi: testo libero e tag separati da virgola
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct TripSearchQuery {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

impl TripSearchQuery {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TrendingQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

//! User entity - Entità utente con metodi per gestione password

use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub user_id: i32,
    pub name: String,
    pub email: String, // univoca, salvata in minuscolo
    pub password: String,
    pub photo: Option<String>,
    #[serde(default)]
    pub friends: Vec<i32>,
    // viaggi con membership accettata
    #[serde(default)]
    pub trip_history: Vec<i32>,
    #[serde(default)]
    pub public_posts: Vec<i32>,
    #[serde(default)]
    pub push_tokens: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Verify if target_password matches the stored hashed password
    pub fn verify_password(&self, target_password: &str) -> bool {
        verify(target_password, &self.password).unwrap_or(false)
    }

    /// Hash a password using bcrypt with default cost
    pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
        let hash = hash(password, DEFAULT_COST)?;
        Ok(hash)
    }
}

//! User DTOs - Data Transfer Objects per utenti

use crate::entities::User;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    // lettere, cifre, spazi e pochi separatori; niente caratteri di controllo o markup
    static ref NAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 .'_-]*$").unwrap();
}

/// Profilo pubblico, visibile a qualsiasi utente autenticato
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserDTO {
    pub user_id: i32,
    pub name: String,
    pub photo: Option<String>,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            user_id: value.user_id,
            name: value.name,
            photo: value.photo,
        }
    }
}

/// Profilo completo dell'utente corrente (mai la password!!!)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProfileDTO {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
    pub friends: Vec<i32>,
    pub trip_history: Vec<i32>,
    pub public_posts: Vec<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for ProfileDTO {
    fn from(value: User) -> Self {
        Self {
            user_id: value.user_id,
            name: value.name,
            email: value.email,
            photo: value.photo,
            friends: value.friends,
            trip_history: value.trip_history,
            public_posts: value.public_posts,
            created_at: value.created_at,
        }
    }
}

/// DTO per creare un nuovo utente (senza user_id).
/// In registrazione `password` è in chiaro, verso il repository contiene già l'hash.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateUserDTO {
    #[validate(
        length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"),
        regex(path = *NAME_REGEX, message = "Name contains invalid characters")
    )]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,

    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginDTO {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct ForgotPasswordDTO {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct ResetPasswordDTO {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub reset_token: String,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub new_password: String,
}

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct PushTokenDTO {
    #[validate(length(min = 1, max = 255, message = "Push token must be between 1 and 255 characters"))]
    pub token: String,
}

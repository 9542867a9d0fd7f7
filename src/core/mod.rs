//! Core Module - Componenti infrastrutturali dell'applicazione
//!
//! Questo modulo contiene tutti i componenti "core" dell'applicazione:
//! - Autenticazione e JWT
//! - Configurazione
//! - Gestione errori
//! - Stato applicazione

pub mod auth;
pub mod config;
pub mod error;
pub mod state;

// Re-exports per facilitare l'import
pub use auth::{
    Claims, ResetClaims, authentication_middleware, decode_jwt, decode_reset_jwt, encode_jwt,
    encode_reset_jwt,
};
pub use config::{Config, StoreBackend};
pub use error::AppError;
pub use state::AppState;

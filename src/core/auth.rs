use crate::core::{AppError, AppState};
use crate::entities::{Trip, User};
use crate::membership::require_view_access;
use crate::repositories::Read;
use axum::extract::State;
use axum::{Error, body::Body, extract::Request, http, http::Response, middleware::Next};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Durata del token e del cookie di sessione
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Nome del cookie di sessione
pub const SESSION_COOKIE: &str = "token";

/// Durata del token di reset della password
pub const RESET_TOKEN_TTL_MINUTES: i64 = 15;

const RESET_PURPOSE: &str = "password_reset";

// struct che codifica il contenuto del token jwt
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub id: i32,
    pub email: String,
}

#[instrument(skip(secret, email))]
pub fn encode_jwt(email: String, id: i32, secret: &str) -> Result<String, Error> {
    let now = Utc::now();
    let expire: chrono::TimeDelta = Duration::hours(TOKEN_TTL_HOURS);
    let exp: usize = (now + expire).timestamp() as usize;
    let iat: usize = now.timestamp() as usize;
    let claim = Claims { iat, exp, email, id };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        Error::new("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, Error> {
    decode(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data: TokenData<Claims>| {
        debug!("JWT token decoded successfully for user: {}", data.claims.id);
        data
    })
    .map_err(|e| {
        warn!("Failed to decode JWT token: {:?}", e);
        Error::new("Error in decoding jwt token")
    })
}

// Token di reset: niente email, e `purpose` obbligatorio, quindi non è scambiabile
// con un token di sessione (e viceversa)
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetClaims {
    pub exp: usize,
    pub iat: usize,
    pub id: i32,
    pub purpose: String,
}

#[instrument(skip(secret))]
pub fn encode_reset_jwt(id: i32, secret: &str) -> Result<String, Error> {
    let now = Utc::now();
    let claim = ResetClaims {
        iat: now.timestamp() as usize,
        exp: (now + Duration::minutes(RESET_TOKEN_TTL_MINUTES)).timestamp() as usize,
        id,
        purpose: RESET_PURPOSE.to_string(),
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| {
        error!("Failed to encode reset token: {:?}", e);
        Error::new("Error in encoding reset token")
    })
}

#[instrument(skip(token, secret))]
pub fn decode_reset_jwt(token: &str, secret: &str) -> Result<ResetClaims, Error> {
    let data: TokenData<ResetClaims> = decode(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!("Failed to decode reset token: {:?}", e);
        Error::new("Error in decoding reset token")
    })?;

    if data.claims.purpose != RESET_PURPOSE {
        warn!("Token is not a password reset token");
        return Err(Error::new("Wrong token purpose"));
    }
    Ok(data.claims)
}

/// Token dall'header `Authorization: Bearer ...` oppure, in mancanza, dal cookie `token`
fn extract_token(req: &Request) -> Result<String, AppError> {
    if let Some(header) = req.headers().get(http::header::AUTHORIZATION) {
        let header = header.to_str().map_err(|_| {
            warn!("Invalid authorization header format");
            AppError::unauthorized("Invalid authorization header")
        })?;
        let mut parts = header.split_whitespace();
        return match (parts.next(), parts.next()) {
            (Some("Bearer"), Some(token)) => Ok(token.to_string()),
            _ => {
                warn!("Malformed authorization header");
                Err(AppError::unauthorized("Authorization header must be 'Bearer <token>'"))
            }
        };
    }

    CookieJar::from_headers(req.headers())
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| {
            warn!("Missing authorization header");
            AppError::unauthorized("Please add the JWT token to the header")
        })
}

#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let token = extract_token(&req)?;

    let token_data = decode_jwt(&token, &state.jwt_secret)
        .map_err(|_| AppError::unauthorized("Unable to decode token"))?;

    // Fetch the user details from the store
    let current_user = match state.user.read(&token_data.claims.id).await? {
        Some(user) => user,
        None => {
            warn!("User not found: {}", token_data.claims.id);
            return Err(AppError::unauthorized("You are not an authorized user"));
        }
    };
    debug!("User authenticated: {}", current_user.user_id);
    req.extensions_mut().insert(current_user);
    // gli handler recuperano lo user con Extension<User>
    Ok(next.run(req).await)
}

/// Middleware che verifica che l'utente corrente partecipi al viaggio indicato nel path
/// (host o membro accettato) e inserisce il `Trip` nell'Extension
#[instrument(skip(state, req, next))]
pub async fn trip_participant_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    // 1. Ottenere l'utente corrente dall'Extension (inserito dall'authentication_middleware)
    let user_id = req
        .extensions()
        .get::<User>()
        .ok_or_else(|| {
            warn!("User not found in request extensions");
            AppError::unauthorized("User not authenticated")
        })?
        .user_id;

    // 2. Estrarre trip_id dal path
    let trip_id: i32 = req
        .uri()
        .path()
        .split('/')
        .find_map(|segment| segment.parse::<i32>().ok())
        .ok_or_else(|| {
            warn!("Trip ID not found in path: {}", req.uri().path());
            AppError::bad_request("Trip ID not found in path")
        })?;

    // 3. Caricare il viaggio e verificare la partecipazione
    let trip: Trip = state
        .trip
        .read(&trip_id)
        .await?
        .ok_or_else(|| AppError::not_found("Trip not found"))?;

    require_view_access(&trip, user_id).inspect_err(|_| {
        warn!("User {} is not a participant of trip {}", user_id, trip_id);
    })?;

    // 4. Inserire il viaggio nell'Extension per uso successivo negli handler
    req.extensions_mut().insert(trip);

    Ok(next.run(req).await)
}

//! Auth services - Gestione autenticazione e registrazione utenti

use crate::core::auth::{RESET_TOKEN_TTL_MINUTES, SESSION_COOKIE, TOKEN_TTL_HOURS};
use crate::core::{AppError, AppState, decode_reset_jwt, encode_jwt, encode_reset_jwt};
use crate::dtos::{CreateUserDTO, ForgotPasswordDTO, LoginDTO, ProfileDTO, ResetPasswordDTO};
use crate::entities::User;
use crate::repositories::{Create, Read, StoreError};
use axum::{
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

const RESET_EMAIL_SUBJECT: &str = "Reset your password";
const FORGOT_PASSWORD_REPLY: &str = "If the email is registered, a reset link has been sent";

#[instrument(skip(state, jar, body))]
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    // 1. Cercare l'utente tramite email (salvata in minuscolo)
    // 2. Se l'utente non esiste o la password non corrisponde, ritornare UNAUTHORIZED con lo stesso messaggio
    // 3. Generare un token JWT con id ed email
    // 4. Costruire un cookie HttpOnly, Secure, SameSite=Lax con il token e durata 24 ore
    // 5. Ritornare StatusCode::OK con gli headers Set-Cookie e Authorization e il profilo

    let user = match state.user.find_by_email(&body.email).await? {
        Some(user) if user.verify_password(&body.password) => user,
        _ => {
            warn!("Failed login attempt");
            return Err(AppError::unauthorized("Email or password are not correct."));
        }
    };

    let token = encode_jwt(user.email.clone(), user.user_id, &state.jwt_secret)?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::hours(TOKEN_TTL_HOURS))
        .build();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::internal_server_error("Failed to build token header"))?,
    );

    info!(user_id = user.user_id, "User logged in");
    Ok((
        StatusCode::OK,
        jar.add(cookie),
        headers,
        Json(ProfileDTO::from(user)),
    ))
}

#[instrument(skip(state, body))]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserDTO>, // JSON body
) -> Result<(StatusCode, Json<ProfileDTO>), AppError> {
    // 1. Validare il DTO con validator (nome, email, lunghezza password)
    // 2. Se esiste già un utente con la stessa email, ritornare CONFLICT
    // 3. Generare l'hash della password fornita
    // 4. Salvare il nuovo utente con la password hashata
    // 5. Ritornare il profilo dell'utente creato

    body.validate()?;

    if state.user.find_by_email(&body.email).await?.is_some() {
        warn!("Registration with an email already in use");
        return Err(AppError::conflict("Email already registered"));
    }

    let password_hash = User::hash_password(&body.password).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        AppError::internal_server_error("Failed to hash password")
    })?;

    let new_user = CreateUserDTO {
        password: password_hash,
        ..body
    };

    // il controllo sopra è solo una scorciatoia, l'unicità è garantita dallo store
    let created_user = state.user.create(&new_user).await.map_err(|e| match e {
        StoreError::Duplicate => {
            warn!("Concurrent registration with the same email");
            AppError::conflict("Email already registered")
        }
        e => AppError::from(e),
    })?;
    debug!(user_id = created_user.user_id, "User registered");

    Ok((StatusCode::CREATED, Json(ProfileDTO::from(created_user))))
}

#[instrument(skip(state, body))]
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ForgotPasswordDTO>,
) -> Result<Json<Value>, AppError> {
    // 1. Validare l'email
    // 2. Se l'utente non esiste rispondere comunque OK, senza rivelare quali email sono registrate
    // 3. Generare un token di reset valido 15 minuti e costruire il link per il client
    // 4. Inviare l'email; un errore di invio viene loggato ma non cambia la risposta

    body.validate()?;

    let user = match state.user.find_by_email(&body.email).await? {
        Some(user) => user,
        None => {
            debug!("Password reset requested for an unknown email");
            return Ok(Json(json!({ "message": FORGOT_PASSWORD_REPLY })));
        }
    };

    let reset_token = encode_reset_jwt(user.user_id, &state.jwt_secret)?;
    let reset_link = format!(
        "{}/reset-password.html?token={}",
        state.client_url, reset_token
    );
    let html = format!(
        "<p>You requested a password reset.</p>\
         <p><a href=\"{}\">Reset your password</a></p>\
         <p>The link expires in {} minutes. If you did not ask for it, ignore this email.</p>",
        reset_link, RESET_TOKEN_TTL_MINUTES
    );

    if let Err(e) = state.email.send(&user.email, RESET_EMAIL_SUBJECT, &html).await {
        warn!(user_id = user.user_id, "Failed to send reset email: {}", e);
    }

    info!(user_id = user.user_id, "Password reset requested");
    Ok(Json(json!({ "message": FORGOT_PASSWORD_REPLY })))
}

#[instrument(skip(state, body))]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetPasswordDTO>,
) -> Result<Json<Value>, AppError> {
    // 1. Validare il DTO (token presente, lunghezza della nuova password)
    // 2. Verificare il token di reset (firma, scadenza, scopo)
    // 3. L'utente del token deve esistere ancora
    // 4. Salvare l'hash della nuova password

    body.validate()?;

    let claims = decode_reset_jwt(&body.reset_token, &state.jwt_secret)
        .map_err(|_| AppError::bad_request("Invalid or expired reset token"))?;

    let user = state
        .user
        .read(&claims.id)
        .await?
        .ok_or_else(|| AppError::bad_request("Invalid or expired reset token"))?;

    let password_hash = User::hash_password(&body.new_password).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        AppError::internal_server_error("Failed to hash password")
    })?;

    state.user.set_password(user.user_id, password_hash).await?;

    info!(user_id = user.user_id, "Password reset");
    Ok(Json(json!({ "message": "Password reset successful" })))
}

//! User services - Profili, ricerca, amici e token push

use crate::core::{AppError, AppState};
use crate::dtos::{ProfileDTO, PushTokenDTO, UserDTO, UserSearchQuery};
use crate::entities::User;
use crate::repositories::Read;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(current_user), fields(user_id = %current_user.user_id))]
pub async fn get_my_profile(
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
) -> Json<ProfileDTO> {
    Json(ProfileDTO::from(current_user))
}

#[instrument(skip(state), fields(search = %params.search))]
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserSearchQuery>, // query params /users?search=name
) -> Result<Json<Vec<UserDTO>>, AppError> {
    debug!("Searching users by name prefix");
    let users = state.user.search_by_name_prefix(&params.search).await?;
    info!("Found {} users matching search criteria", users.len());
    Ok(Json(users.into_iter().map(UserDTO::from).collect()))
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>, // parametro dalla URL /users/{user_id}
) -> Result<Json<UserDTO>, AppError> {
    let user = state.user.read(&user_id).await?.ok_or_else(|| {
        warn!("User not found");
        AppError::not_found("User not found")
    })?;
    Ok(Json(UserDTO::from(user)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn register_push_token(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<PushTokenDTO>,
) -> Result<Json<ProfileDTO>, AppError> {
    body.validate()?;
    let user = state
        .user
        .add_push_token(current_user.user_id, body.token.trim())
        .await?;
    info!("Push token registered");
    Ok(Json(ProfileDTO::from(user)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, friend_id = %friend_id))]
pub async fn add_friend(
    State(state): State<Arc<AppState>>,
    Path(friend_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<(), AppError> {
    // 1. Non si può aggiungere sé stessi (controllo in memoria)
    // 2. L'amico deve esistere
    // 3. Aggiungere l'amico, BAD_REQUEST se già presente

    if friend_id == current_user.user_id {
        return Err(AppError::bad_request("You cannot add yourself as a friend"));
    }

    if state.user.read(&friend_id).await?.is_none() {
        warn!("Friend not found");
        return Err(AppError::not_found("User not found"));
    }

    if !state.user.add_friend(current_user.user_id, friend_id).await? {
        return Err(AppError::bad_request("Friend already added"));
    }

    info!("Friend added");
    Ok(())
}

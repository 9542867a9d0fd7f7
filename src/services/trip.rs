//! Trip services - Creazione, lettura, modifica, copia, ricerca ed eliminazione dei viaggi

use crate::core::{AppError, AppState};
use crate::dtos::{CreateTripDTO, TripDTO, TripSearchQuery, UpdateTripDTO};
use crate::entities::{Trip, User};
use crate::membership::{can_see, has_view_access, require_edit_access, require_host};
use crate::repositories::{Create, Read, ReadMany};
use crate::ws::usermap::InternalSignal;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Filtro della ricerca: testo case-insensitive su titolo, descrizione e destinazione,
/// tag in OR. Senza criteri ogni viaggio corrisponde.
pub fn matches_search(trip: &Trip, text: Option<&str>, tags: &[String]) -> bool {
    let text_ok = match text.map(str::trim).filter(|t| !t.is_empty()) {
        None => true,
        Some(text) => {
            let needle = text.to_lowercase();
            [
                Some(trip.title.as_str()),
                trip.description.as_deref(),
                trip.destination.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
        }
    };

    let tags_ok = tags.is_empty()
        || trip
            .tags
            .iter()
            .any(|t| tags.contains(&t.trim().to_lowercase()));

    text_ok && tags_ok
}

async fn load_trip(state: &AppState, trip_id: i32) -> Result<Trip, AppError> {
    state.trip.read(&trip_id).await?.ok_or_else(|| {
        warn!("Trip not found: {}", trip_id);
        AppError::not_found("Trip not found")
    })
}

/// Salva un nuovo viaggio con l'utente come host e lo aggiunge al suo storico
async fn create_hosted_trip(
    state: &AppState,
    host: &User,
    mut data: CreateTripDTO,
) -> Result<Trip, AppError> {
    data.host = host.user_id;
    let trip = state.trip.create(&data).await?;

    if let Err(e) = state.user.add_trip_to_history(host.user_id, trip.trip_id).await {
        warn!("Failed to add trip to host history: {:?}", e);
    }
    state
        .users_online
        .send_server_message_if_online(host.user_id, InternalSignal::AddTrip(trip.trip_id));
    Ok(trip)
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_trip(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateTripDTO>,
) -> Result<(StatusCode, Json<TripDTO>), AppError> {
    debug!("Creating trip");
    // 1. Validare il DTO
    // 2. Creare il viaggio con l'utente corrente come host (unico membro, accepted)
    // 3. Aggiungere il viaggio allo storico dell'host e sottoscriverlo alla chat

    body.validate()?;
    let trip = create_hosted_trip(&state, &current_user, body).await?;

    info!(trip_id = trip.trip_id, "Trip created");
    Ok((StatusCode::CREATED, Json(TripDTO::from(trip))))
}

#[instrument(skip(state, current_user), fields(trip_id = %trip_id, user_id = %current_user.user_id))]
pub async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<Json<TripDTO>, AppError> {
    let trip = load_trip(&state, trip_id).await?;

    // chi ha un invito pending deve poter vedere il viaggio per decidere
    if !can_see(&trip, current_user.user_id) {
        warn!("User cannot see private trip");
        return Err(AppError::forbidden("You cannot view this trip"));
    }

    Ok(Json(TripDTO::from(trip)))
}

#[instrument(skip(state, current_user, body), fields(trip_id = %trip_id, user_id = %current_user.user_id))]
pub async fn update_trip(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<i32>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdateTripDTO>,
) -> Result<Json<TripDTO>, AppError> {
    debug!("Updating trip");
    // 1. Validare il DTO
    // 2. Dentro il retry: verificare l'accesso in modifica sulla versione letta e applicare i campi

    body.validate()?;

    let (trip, _) = state
        .trip
        .modify::<_, AppError, _>(trip_id, |trip| {
            require_edit_access(trip, current_user.user_id)?;
            body.apply_to(trip);
            Ok(())
        })
        .await?;

    info!("Trip updated");
    Ok(Json(TripDTO::from(trip)))
}

#[instrument(skip(state, current_user), fields(trip_id = %trip_id, user_id = %current_user.user_id))]
pub async fn delete_trip(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<(), AppError> {
    debug!("Deleting trip");
    // 1. Solo l'host può eliminare il viaggio
    // 2. Eliminare il documento solo se non è cambiato dalla lettura (altrimenti si ricarica)
    // 3. Pulire storico e sottoscrizioni dei membri accettati, notifiche e messaggi del viaggio

    let trip = state
        .trip
        .remove::<AppError, _>(trip_id, |trip| {
            Ok(require_host(trip, current_user.user_id, "Only the host can delete the trip")?)
        })
        .await
        .map_err(|e| {
            if e.status() == StatusCode::NOT_FOUND {
                AppError::not_found("Trip not found")
            } else {
                e
            }
        })?;

    let member_ids = trip.accepted_member_ids();
    let cleanups = join_all(
        member_ids
            .iter()
            .map(|&user_id| state.user.remove_trip_from_history(user_id, trip_id)),
    )
    .await;
    for (user_id, result) in member_ids.into_iter().zip(cleanups) {
        if let Err(e) = result {
            warn!("Failed to clean history of user {}: {:?}", user_id, e);
        }
        state
            .users_online
            .send_server_message_if_online(user_id, InternalSignal::RemoveTrip(trip_id));
    }
    if let Err(e) = state.notification.delete_by_trip(trip_id).await {
        warn!("Failed to delete trip notifications: {:?}", e);
    }
    if let Err(e) = state.msg.delete_by_trip(trip_id).await {
        warn!("Failed to delete trip messages: {:?}", e);
    }

    info!("Trip deleted");
    Ok(())
}

#[instrument(skip(state, current_user), fields(trip_id = %trip_id, user_id = %current_user.user_id))]
pub async fn copy_trip(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<(StatusCode, Json<TripDTO>), AppError> {
    debug!("Copying trip");
    let source = load_trip(&state, trip_id).await?;

    if !source.is_public && !has_view_access(&source, current_user.user_id) {
        warn!("User cannot copy private trip");
        return Err(AppError::forbidden("You cannot copy this trip"));
    }

    let copy = create_hosted_trip(
        &state,
        &current_user,
        CreateTripDTO::copy_of(&source, current_user.user_id),
    )
    .await?;

    info!(new_trip_id = copy.trip_id, "Trip copied");
    Ok((StatusCode::CREATED, Json(TripDTO::from(copy))))
}

#[instrument(skip(state, current_user, params), fields(user_id = %current_user.user_id))]
pub async fn search_trips(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(params): Query<TripSearchQuery>,
) -> Result<Json<Vec<TripDTO>>, AppError> {
    let tags = params.tag_list();
    let trips = state.trip.find_all().await?;

    let result: Vec<TripDTO> = trips
        .into_iter()
        .filter(|t| t.is_public || has_view_access(t, current_user.user_id))
        .filter(|t| matches_search(t, params.query.as_deref(), &tags))
        .map(TripDTO::from)
        .collect();

    debug!("Search returned {} trips", result.len());
    Ok(Json(result))
}

/// Viaggi pubblici in cui l'utente non ha ancora nessun record
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn open_trips(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<TripDTO>>, AppError> {
    let trips = state.trip.find_public().await?;

    let result: Vec<TripDTO> = trips
        .into_iter()
        .filter(|t| t.member(current_user.user_id).is_none())
        .map(TripDTO::from)
        .collect();

    Ok(Json(result))
}

/// Viaggi dello storico dell'utente (membership accettata)
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn my_trips(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<TripDTO>>, AppError> {
    let trips = state.trip.read_many(&current_user.trip_history).await?;

    let result: Vec<TripDTO> = trips
        .into_iter()
        .filter(|t| has_view_access(t, current_user.user_id))
        .map(TripDTO::from)
        .collect();

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::fixtures::trip_with;

    fn tagged(tags: &[&str]) -> Trip {
        let mut trip = trip_with(vec![], true);
        trip.destination = Some("Portugal".to_string());
        trip.tags = tags.iter().map(|t| t.to_string()).collect();
        trip
    }

    #[test]
    fn test_search_text_is_case_insensitive() {
        let trip = tagged(&[]);
        assert!(matches_search(&trip, Some("lisb"), &[]));
        assert!(matches_search(&trip, Some("PORTUGAL"), &[]));
        assert!(!matches_search(&trip, Some("tokyo"), &[]));
    }

    #[test]
    fn test_search_tags_any_match() {
        let trip = tagged(&["Food", "beach"]);
        assert!(matches_search(&trip, None, &["food".to_string()]));
        assert!(matches_search(&trip, None, &["hiking".to_string(), "beach".to_string()]));
        assert!(!matches_search(&trip, None, &["hiking".to_string()]));
    }

    #[test]
    fn test_empty_search_matches_everything() {
        assert!(matches_search(&tagged(&[]), None, &[]));
        assert!(matches_search(&tagged(&[]), Some("   "), &[]));
    }
}

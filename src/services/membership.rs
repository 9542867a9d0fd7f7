//! Membership services - Inviti, richieste di ingresso, uscite e ruoli nei viaggi
//!
//! Ogni handler esegue la transizione di `crate::membership` dentro `TripRepository::modify`
//! e solo dopo il salvataggio esegue gli effetti collaterali (storico, notifiche, websocket).
//! Gli effetti collaterali non fanno mai fallire la richiesta.

use crate::core::{AppError, AppState};
use crate::dtos::{ChangeRoleDTO, CreateNotificationDTO, MemberDTO, TripDTO};
use crate::entities::{Decision, NotificationType, Trip, User};
use crate::notify::Notifier;
use crate::repositories::{Read, ReadMany};
use crate::ws::usermap::InternalSignal;
use axum::{
    Extension,
    extract::{Json, Path, State},
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

fn parse_decision(action: &str) -> Result<Decision, AppError> {
    Decision::from_action(action).ok_or_else(|| {
        warn!("Invalid response action: {}", action);
        AppError::bad_request("Action must be 'accept' or 'reject'")
    })
}

/// Nome da mostrare nelle notifiche, anche se l'utente non esiste più
async fn display_name(state: &AppState, user_id: i32) -> String {
    match state.user.read(&user_id).await {
        Ok(Some(user)) => user.name,
        _ => format!("User {}", user_id),
    }
}

/// Storico e sottoscrizione websocket seguono la membership accettata
async fn on_member_joined(state: &AppState, user_id: i32, trip_id: i32) {
    if let Err(e) = state.user.add_trip_to_history(user_id, trip_id).await {
        warn!("Failed to add trip {} to history of user {}: {:?}", trip_id, user_id, e);
    }
    state
        .users_online
        .send_server_message_if_online(user_id, InternalSignal::AddTrip(trip_id));
}

async fn on_member_left(state: &AppState, user_id: i32, trip_id: i32) {
    if let Err(e) = state.user.remove_trip_from_history(user_id, trip_id).await {
        warn!("Failed to remove trip {} from history of user {}: {:?}", trip_id, user_id, e);
    }
    state
        .users_online
        .send_server_message_if_online(user_id, InternalSignal::RemoveTrip(trip_id));
}

/// Risposta dell'invitato al proprio invito, condivisa dalla route del viaggio e da quella
/// delle notifiche
pub async fn apply_invitation_response(
    state: &Arc<AppState>,
    trip_id: i32,
    current_user: &User,
    decision: Decision,
) -> Result<Trip, AppError> {
    // 1. Transizione pending -> accepted / rimozione, atomica sul documento del viaggio
    let (trip, _) = state
        .trip
        .modify::<_, AppError, _>(trip_id, |trip| {
            Ok(trip.respond_to_invitation(current_user.user_id, decision)?)
        })
        .await?;

    // 2. Effetti collaterali dopo il commit
    let notifier = Notifier::new(state);
    match decision {
        Decision::Accept => {
            on_member_joined(state, current_user.user_id, trip_id).await;
            notifier
                .emit(CreateNotificationDTO::alert(
                    trip.host,
                    trip_id,
                    format!("{} accepted your invitation to \"{}\"", current_user.name, trip.title),
                ))
                .await;
            notifier
                .emit(CreateNotificationDTO::alert(
                    current_user.user_id,
                    trip_id,
                    format!("You joined \"{}\"", trip.title),
                ))
                .await;
        }
        Decision::Reject => {
            notifier
                .emit(CreateNotificationDTO::alert(
                    trip.host,
                    trip_id,
                    format!("{} declined your invitation to \"{}\"", current_user.name, trip.title),
                ))
                .await;
        }
    }

    // 3. L'invito è stato gestito, la notifica che lo ha originato non serve più
    notifier
        .clear(current_user.user_id, trip_id, NotificationType::Invitation, None)
        .await;

    info!(?decision, "Invitation response processed successfully");
    Ok(trip)
}

/// Risposta dell'host ad una richiesta di ingresso di `target_user_id`
pub async fn apply_request_response(
    state: &Arc<AppState>,
    trip_id: i32,
    current_user: &User,
    target_user_id: i32,
    decision: Decision,
) -> Result<Trip, AppError> {
    let (trip, _) = state
        .trip
        .modify::<_, AppError, _>(trip_id, |trip| {
            Ok(trip.respond_to_request(current_user.user_id, target_user_id, decision)?)
        })
        .await?;

    let notifier = Notifier::new(state);
    match decision {
        Decision::Accept => {
            on_member_joined(state, target_user_id, trip_id).await;
            notifier
                .emit(CreateNotificationDTO::alert(
                    target_user_id,
                    trip_id,
                    format!("Your request to join \"{}\" was accepted", trip.title),
                ))
                .await;
        }
        Decision::Reject => {
            notifier
                .emit(CreateNotificationDTO::alert(
                    target_user_id,
                    trip_id,
                    format!("Your request to join \"{}\" was declined", trip.title),
                ))
                .await;
            let name = display_name(state, target_user_id).await;
            notifier
                .emit(CreateNotificationDTO::alert(
                    current_user.user_id,
                    trip_id,
                    format!("You declined {}'s request to join \"{}\"", name, trip.title),
                ))
                .await;
        }
    }

    notifier
        .clear(
            current_user.user_id,
            trip_id,
            NotificationType::Request,
            Some(target_user_id),
        )
        .await;

    info!(?decision, "Join request response processed successfully");
    Ok(trip)
}

#[instrument(skip(state, current_user), fields(trip_id = %trip_id, host = %current_user.user_id, target_user = %user_id))]
pub async fn invite_member(
    State(state): State<Arc<AppState>>,
    Path((trip_id, user_id)): Path<(i32, i32)>,
    Extension(current_user): Extension<User>,
) -> Result<Json<TripDTO>, AppError> {
    debug!("Inviting user to trip");
    // 1. Verificare che l'utente target esista (fail-fast prima di toccare il viaggio)
    // 2. Eseguire la transizione invite (solo host, nessun record esistente per il target)
    // 3. Notificare l'invitato (notifica di tipo invitation)
    // 4. Ritornare il viaggio aggiornato

    if state.user.read(&user_id).await?.is_none() {
        warn!("Target user not found: {}", user_id);
        return Err(AppError::not_found("User not found"));
    }

    let (trip, _) = state
        .trip
        .modify::<_, AppError, _>(trip_id, |trip| {
            Ok(trip.invite(current_user.user_id, user_id)?)
        })
        .await?;

    Notifier::new(&state)
        .emit(CreateNotificationDTO::invitation(
            user_id,
            trip_id,
            format!("{} invited you to join \"{}\"", current_user.name, trip.title),
        ))
        .await;

    info!("User successfully invited to trip");
    Ok(Json(TripDTO::from(trip)))
}

#[instrument(skip(state, current_user), fields(trip_id = %trip_id, user_id = %current_user.user_id))]
pub async fn request_to_join(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<Json<TripDTO>, AppError> {
    debug!("Requesting to join trip");
    // 1. Transizione request_join (solo viaggi pubblici, nessun record esistente)
    // 2. Notificare l'host con il riferimento a chi ha chiesto di entrare

    let (trip, _) = state
        .trip
        .modify::<_, AppError, _>(trip_id, |trip| {
            Ok(trip.request_join(current_user.user_id)?)
        })
        .await?;

    Notifier::new(&state)
        .emit(CreateNotificationDTO::request(
            trip.host,
            trip_id,
            current_user.user_id,
            format!("{} wants to join \"{}\"", current_user.name, trip.title),
        ))
        .await;

    info!("Join request sent");
    Ok(Json(TripDTO::from(trip)))
}

#[instrument(skip(state, current_user), fields(trip_id = %trip_id, action = %action, user_id = %current_user.user_id))]
pub async fn respond_to_invitation(
    State(state): State<Arc<AppState>>,
    Path((trip_id, action)): Path<(i32, String)>,
    Extension(current_user): Extension<User>,
) -> Result<Json<TripDTO>, AppError> {
    debug!("Responding to invitation");
    let decision = parse_decision(&action)?;
    let trip = apply_invitation_response(&state, trip_id, &current_user, decision).await?;
    Ok(Json(TripDTO::from(trip)))
}

#[instrument(skip(state, current_user), fields(trip_id = %trip_id, host = %current_user.user_id, target_user = %user_id, action = %action))]
pub async fn respond_to_join_request(
    State(state): State<Arc<AppState>>,
    Path((trip_id, user_id, action)): Path<(i32, i32, String)>,
    Extension(current_user): Extension<User>,
) -> Result<Json<TripDTO>, AppError> {
    debug!("Responding to join request");
    let decision = parse_decision(&action)?;
    let trip = apply_request_response(&state, trip_id, &current_user, user_id, decision).await?;
    Ok(Json(TripDTO::from(trip)))
}

#[instrument(skip(state, current_user), fields(trip_id = %trip_id, user_id = %current_user.user_id))]
pub async fn leave_trip(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<(), AppError> {
    debug!("User leaving trip");
    // 1. Transizione leave (l'host non può uscire, serve un record accettato)
    // 2. Rimuovere il viaggio dallo storico e la sottoscrizione alla chat

    state
        .trip
        .modify::<_, AppError, _>(trip_id, |trip| Ok(trip.leave(current_user.user_id)?))
        .await?;

    on_member_left(&state, current_user.user_id, trip_id).await;

    info!("User successfully left trip");
    Ok(())
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(trip_id = %trip_id, host = %current_user.user_id, target_user = %user_id))]
pub async fn change_member_role(
    State(state): State<Arc<AppState>>,
    Path((trip_id, user_id)): Path<(i32, i32)>,
    Extension(current_user): Extension<User>,
    Json(body): Json<ChangeRoleDTO>,
) -> Result<Json<TripDTO>, AppError> {
    debug!("Changing member role to {}", body.role);

    let (trip, _) = state
        .trip
        .modify::<_, AppError, _>(trip_id, |trip| {
            Ok(trip.change_role(current_user.user_id, user_id, &body.role)?)
        })
        .await?;

    info!("Member role updated");
    Ok(Json(TripDTO::from(trip)))
}

#[instrument(skip(state, trip), fields(trip_id = %trip.trip_id))]
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    Extension(trip): Extension<Trip>, // ottenuto dal trip_participant_middleware
) -> Result<Json<Vec<MemberDTO>>, AppError> {
    debug!("Listing members for trip");
    // 1. Viaggio e partecipazione già verificati dal middleware
    // 2. Recuperare gli utenti dei membri con una sola lettura
    // 3. Combinare membri e utenti mantenendo l'ordine della lista membri

    let user_ids: Vec<i32> = trip.members().iter().map(|m| m.user_id).collect();
    let users: Vec<User> = state.user.read_many(&user_ids).await?;

    let result: Vec<MemberDTO> = trip
        .members()
        .iter()
        .map(|m| MemberDTO::new(m, users.iter().find(|u| u.user_id == m.user_id)))
        .collect();

    info!("Successfully retrieved {} members", result.len());
    Ok(Json(result))
}

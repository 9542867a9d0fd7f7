//! Trip server library - espone i moduli principali per il binario e per i test

pub mod core;
pub mod dtos;
pub mod entities;
pub mod membership;
pub mod notify;
pub mod repositories;
pub mod services;
pub mod ws;

// Re-export dei tipi principali per facilitare l'import
pub use crate::core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router, middleware,
    routing::{any, get, patch, post, put},
};
use std::sync::Arc;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    use crate::core::authentication_middleware;
    use ws::ws_handler;

    Router::new()
        .route("/", get(root))
        .nest("/auth", configure_auth_routes())
        .nest("/users", configure_user_routes(state.clone()))
        .nest("/trips", configure_trip_routes(state.clone()))
        .nest("/notifications", configure_notification_routes(state.clone()))
        .nest("/blogs", configure_blog_routes(state.clone()))
        .nest("/questions", configure_question_routes(state.clone()))
        .route(
            "/ws",
            any(ws_handler).layer(middleware::from_fn_with_state(
                state.clone(),
                authentication_middleware,
            )),
        )
        .with_state(state)
}

/// Configura le routes di autenticazione (login, register)
fn configure_auth_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/login", post(login_user))
        .route("/register", post(register_user))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// Configura le routes per la gestione degli utenti
fn configure_user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(search_users))
        .route("/me", get(get_my_profile))
        .route("/me/push-token", put(register_push_token))
        .route("/me/friends/{friend_id}", post(add_friend))
        .route("/me/trips", get(my_trips))
        .route("/{user_id}", get(get_user_by_id))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes dei viaggi: contenuto, membership e chat
fn configure_trip_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::{auth::trip_participant_middleware, authentication_middleware};
    use services::*;

    // Rotte che richiedono solo l'autenticazione: i permessi sono verificati dalle transizioni
    let trip_routes = Router::new()
        .route("/", get(search_trips).post(create_trip))
        .route("/open", get(open_trips))
        .route(
            "/{trip_id}",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
        .route("/{trip_id}/copy", post(copy_trip))
        .route("/{trip_id}/invite/{user_id}", post(invite_member))
        .route("/{trip_id}/join", post(request_to_join))
        .route("/{trip_id}/respond/{action}", post(respond_to_invitation))
        .route(
            "/{trip_id}/requests/{user_id}/{action}",
            post(respond_to_join_request),
        )
        .route("/{trip_id}/leave", post(leave_trip))
        .route(
            "/{trip_id}/members/{user_id}/role",
            patch(change_member_role),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    // Rotte che richiedono la partecipazione al viaggio (autenticazione + participant middleware)
    let participant_routes = Router::new()
        .route("/{trip_id}/members", get(list_members))
        .route("/{trip_id}/messages", get(list_messages).post(send_message))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            trip_participant_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    trip_routes.merge(participant_routes)
}

/// Configura le routes delle notifiche
fn configure_notification_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_notifications))
        .route("/unread", get(list_unread_notifications))
        .route("/{notification_id}", axum::routing::delete(delete_notification))
        .route("/{notification_id}/read", patch(mark_notification_read))
        .route("/{notification_id}/{action}", post(respond_via_notification))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes dei blog; la lettura è pubblica
fn configure_blog_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    let public_routes = Router::new()
        .route("/", get(list_blogs))
        .route("/trending", get(trending_blogs))
        .route("/{blog_id}", get(get_blog))
        .route("/{blog_id}/questions", get(list_questions));

    let author_routes = Router::new()
        .route("/", post(create_blog))
        .route("/{blog_id}/rate", post(rate_blog))
        .route("/{blog_id}/questions", post(ask_question))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(author_routes)
}

fn configure_question_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/{question_id}/answers", post(answer_question))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

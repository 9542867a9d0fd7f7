//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Ogni sotto-modulo gestisce gli endpoint HTTP per una specifica funzionalità.

pub mod auth;
pub mod blog;
pub mod chat;
pub mod membership;
pub mod notification;
pub mod question;
pub mod trip;
pub mod user;

// Re-exports per facilitare l'import
pub use auth::{forgot_password, login_user, register_user, reset_password};
pub use blog::{create_blog, get_blog, list_blogs, rate_blog, trending_blogs};
pub use chat::{list_messages, send_message};
pub use membership::{
    change_member_role, invite_member, leave_trip, list_members, request_to_join,
    respond_to_invitation, respond_to_join_request,
};
pub use notification::{
    delete_notification, list_notifications, list_unread_notifications, mark_notification_read,
    respond_via_notification,
};
pub use question::{answer_question, ask_question, list_questions};
pub use trip::{
    copy_trip, create_trip, delete_trip, get_trip, my_trips, open_trips, search_trips, update_trip,
};
pub use user::{add_friend, get_my_profile, get_user_by_id, register_push_token, search_users};

use axum::{http::StatusCode, response::IntoResponse};

/// Root endpoint - health check
pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}

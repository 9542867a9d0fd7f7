//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i documenti persistiti.
//! Ogni entity corrisponde a una collezione del document store.

pub mod blog;
pub mod enums;
pub mod message;
pub mod notification;
pub mod trip;
pub mod user;

// Re-exports per facilitare l'import
pub use blog::{Answer, BlogPost, Photo, Question, Rating};
pub use enums::{Decision, MemberOrigin, MemberRole, MemberStatus, NotificationType, TripStatus};
pub use message::ChatMessage;
pub use notification::Notification;
pub use trip::{Activity, DayPlan, Member, Place, Restaurant, Stay, Trip};
pub use user::User;

//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod blog;
pub mod member;
pub mod message;
pub mod notification;
pub mod query;
pub mod trip;
pub mod user;
pub mod ws_event;

// Re-exports per facilitare l'import
pub use blog::{
    AnswerDTO, BlogDTO, CreateAnswerDTO, CreateBlogDTO, CreateQuestionDTO, QuestionDTO,
    RateBlogDTO,
};
pub use member::{ChangeRoleDTO, MemberDTO};
pub use message::{CreateMessageDTO, MessageDTO, SendMessageDTO};
pub use notification::{CreateNotificationDTO, NotificationDTO};
pub use query::{MessagesQuery, TrendingQuery, TripSearchQuery, UserSearchQuery};
pub use trip::{CreateTripDTO, TripDTO, UpdateTripDTO};
pub use user::{
    CreateUserDTO, ForgotPasswordDTO, LoginDTO, ProfileDTO, PushTokenDTO, ResetPasswordDTO, UserDTO,
};
pub use ws_event::WsEventDTO;

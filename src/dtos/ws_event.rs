//! WebSocket Event DTOs - Data Transfer Objects per eventi WebSocket

use crate::dtos::{MessageDTO, NotificationDTO};
use serde::{Deserialize, Serialize};

/// Tagged union per eventi WebSocket verso il client
/// Serde serializza questo come:
/// { "type": "Messages", "data": [ ... ] }
/// oppure
/// { "type": "Notification", "data": { ... } }
/// etc.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "data")]
pub enum WsEventDTO {
    Messages(Vec<MessageDTO>),
    Notification(NotificationDTO),
    TripJoined { trip_id: i32 },
    TripLeft { trip_id: i32 },
    Error { code: u16, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(WsEventDTO::TripJoined { trip_id: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "TripJoined", "data": {"trip_id": 4}}));

        let json = serde_json::to_value(WsEventDTO::Messages(vec![])).unwrap();
        assert_eq!(json["type"], "Messages");
    }
}

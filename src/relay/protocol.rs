//! Wire protocol for the websocket relay.
//!
//! Frames are JSON objects tagged by an `event` field, field names in
//! camelCase. Payloads are opaque to the server and forwarded as-is.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ClientEvent {
    /// Desktop client enters the room it was issued with its code.
    #[serde(rename = "pc-join", rename_all = "camelCase")]
    PcJoin { room_id: String },

    /// Mobile client enters the room after verifying a code.
    #[serde(rename = "mobile-join", rename_all = "camelCase")]
    MobileJoin { room_id: String },

    /// Push a payload to everyone else in the room.
    #[serde(rename = "send-data", rename_all = "camelCase")]
    SendData {
        room_id: String,
        #[serde(default)]
        payload: Value,
    },
}

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ServerEvent {
    /// A mobile client arrived in the room.
    #[serde(rename = "mobile-connected")]
    MobileConnected,

    /// Payload relayed from another room member.
    #[serde(rename = "receive-data")]
    ReceiveData { payload: Value },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_pc_join() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"pc-join","roomId":"room-1"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::PcJoin {
                room_id: "room-1".to_string()
            }
        );
    }

    #[test]
    fn test_parse_mobile_join() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"mobile-join","roomId":"room-1"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::MobileJoin {
                room_id: "room-1".to_string()
            }
        );
    }

    #[test]
    fn test_parse_send_data() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"event":"send-data","roomId":"room-1","payload":{"kind":"url","value":"https://example.com"}}"#,
        )
        .unwrap();

        assert_eq!(
            event,
            ClientEvent::SendData {
                room_id: "room-1".to_string(),
                payload: json!({"kind": "url", "value": "https://example.com"}),
            }
        );
    }

    #[test]
    fn test_send_data_payload_defaults_to_null() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"send-data","roomId":"room-1"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::SendData {
                room_id: "room-1".to_string(),
                payload: Value::Null,
            }
        );
    }

    #[test]
    fn test_unknown_event_rejected() {
        let result = serde_json::from_str::<ClientEvent>(r#"{"event":"shutdown"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_room_rejected() {
        let result = serde_json::from_str::<ClientEvent>(r#"{"event":"pc-join"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_mobile_connected() {
        let frame = serde_json::to_value(ServerEvent::MobileConnected).unwrap();
        assert_eq!(frame, json!({"event": "mobile-connected"}));
    }

    #[test]
    fn test_serialize_receive_data() {
        let frame = serde_json::to_value(ServerEvent::ReceiveData {
            payload: json!({"text": "hello"}),
        })
        .unwrap();
        assert_eq!(
            frame,
            json!({"event": "receive-data", "payload": {"text": "hello"}})
        );
    }

    #[test]
    fn test_server_events_parse_back() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"event":"receive-data","payload":[1,2,3]}"#).unwrap();
        assert_eq!(
            event,
            ServerEvent::ReceiveData {
                payload: json!([1, 2, 3])
            }
        );
    }
}

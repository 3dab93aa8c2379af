use super::*;

#[derive(Debug, thiserror::Error)]
#[error("room is closed")]
struct RoomClosed;

impl ErrorCode for RoomClosed {
    fn error_code(&self) -> &'static str {
        "E_ROOM_CLOSED"
    }
}

#[test]
fn error_event_carries_code_and_display_message() {
    let event = error_event(&RoomClosed);
    let ServerEvent::Error(payload) = event else {
        panic!("expected error event");
    };
    assert_eq!(payload.code, "E_ROOM_CLOSED");
    assert_eq!(payload.message, "room is closed");
}

#[test]
fn now_ms_is_after_2020() {
    assert!(now_ms() > 1_577_836_800_000);
}

#[test]
fn protocol_errors_map_to_wire_codes() {
    let bad_json = protocol::ClientEvent::decode("{nope").unwrap_err();
    assert_eq!(bad_json.error_code(), "E_INVALID_MESSAGE");

    let bad_payload = protocol::ClientEvent::decode(r#"{"type":"cursor","data":{"position":7}}"#).unwrap_err();
    assert_eq!(bad_payload.error_code(), "E_INVALID_MESSAGE");

    let unknown = protocol::ClientEvent::decode(r#"{"type":"user_join","data":{}}"#).unwrap_err();
    assert_eq!(unknown.error_code(), "E_UNKNOWN_TYPE");
}

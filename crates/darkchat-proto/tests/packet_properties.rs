//! Property-based tests for the Socket.IO packet codec.
//!
//! The decoder faces whatever the network hands it, so the main property is
//! that it never panics. Requests the client emits must also survive a trip
//! through the codec unchanged, since the ack id is what pairs replies.

use darkchat_proto::{EnginePacket, EventName, SocketPacket};
use proptest::prelude::*;
use serde_json::{Value, json};

/// Strategy for the event names the client actually emits.
fn request_event() -> impl Strategy<Value = EventName> {
    prop_oneof![
        Just(EventName::Dashboard),
        Just(EventName::UserList),
        Just(EventName::Chat),
        Just(EventName::Message),
        Just(EventName::CreateGroup),
        Just(EventName::UpdateProfile),
        Just(EventName::LogOut),
        Just(EventName::DeleteProfile),
    ]
}

/// Strategy for small JSON payloads.
fn payload() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(json!({})),
        "[a-z ]{0,24}".prop_map(|text| json!({"message": text, "type": 2})),
        ("[a-z0-9]{1,8}", 1u8..=2).prop_map(|(id, kind)| json!({"channelId": id, "type": kind})),
    ]
}

proptest! {
    #[test]
    fn engine_decode_never_panics(text in any::<String>()) {
        let _ = EnginePacket::decode(&text);
    }

    #[test]
    fn socket_decode_never_panics(prefix in "[0-6]", digits in "[0-9]{0,24}", body in any::<String>()) {
        let _ = SocketPacket::decode(&format!("{prefix}{digits}{body}"));
    }

    #[test]
    fn requests_survive_codec(id in any::<u64>(), event in request_event(), payload in payload()) {
        let packet = EnginePacket::Message(SocketPacket::request(id, event.as_str(), payload.clone()));
        let text = packet.encode().expect("encode");

        let decoded = EnginePacket::decode(&text).expect("decode");
        prop_assert_eq!(
            decoded,
            EnginePacket::Message(SocketPacket::Event {
                id: Some(id),
                name: event.as_str().to_owned(),
                payload,
            })
        );
    }
}

//! Fuzz target for EnginePacket::decode
//!
//! This fuzzer feeds arbitrary WebSocket text frames to the packet codec to
//! find:
//! - Parser crashes or panics
//! - Ack ids that overflow
//! - Namespace prefixes that swallow the body
//! - Packets that decode but do not survive re-encoding
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use darkchat_proto::EnginePacket;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(packet) = EnginePacket::decode(text) else {
        return;
    };

    // Anything accepted must encode, and the encoding must decode back to
    // a packet of the same kind. Payload equality is not checked: JSON
    // floats may shift by one ulp through a reparse.
    let encoded = packet.encode().expect("decoded packet must encode");
    let again = EnginePacket::decode(&encoded).expect("encoded packet must decode");
    assert_eq!(
        std::mem::discriminant(&packet),
        std::mem::discriminant(&again),
        "round trip changed kind of {text:?}"
    );
});

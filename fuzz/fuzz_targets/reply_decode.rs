//! Fuzz target for reply envelopes and push payloads
//!
//! # Strategy
//!
//! - Random JSON: arbitrary text parsed as JSON, then decoded as an envelope
//! - Shaped envelopes: valid `success` codes with arbitrary `response` bodies
//! - Push confusion: known and unknown event names with arbitrary payloads
//!
//! # Invariants
//!
//! - Decoding returns an error for malformed input, never panics
//! - An envelope is ok only for status 200
//! - Unknown push names decode to `None`

#![no_main]

use arbitrary::Arbitrary;
use darkchat_proto::{Conversation, Message, PushEvent, STATUS_OK, SocketResponse};
use libfuzzer_sys::fuzz_target;
use serde_json::{Value, json};

#[derive(Debug, Arbitrary)]
enum Input {
    RandomJson { text: String },
    Envelope { success: u16, errormessage: String, response: String },
    Push { known: bool, name: String, payload: String },
}

fn parse(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or(Value::String(text.to_owned()))
}

fuzz_target!(|input: Input| {
    match input {
        Input::RandomJson { text } => {
            if let Ok(envelope) = SocketResponse::from_value(parse(&text)) {
                let _ = envelope.decode::<Vec<Conversation>>();
                let _ = envelope.decode::<Vec<Message>>();
            }
        },
        Input::Envelope { success, errormessage, response } => {
            let value = json!({"success": success, "errormessage": errormessage, "response": parse(&response)});
            let envelope = SocketResponse::from_value(value).expect("shaped envelope must decode");
            assert_eq!(envelope.is_ok(), success == STATUS_OK);
            let _ = envelope.decode::<Message>();
        },
        Input::Push { known, name, payload } => {
            let name = if known { "newMessage" } else { name.as_str() };
            match PushEvent::decode(name, parse(&payload)) {
                Ok(Some(_)) => assert!(matches!(name, "newMessage" | "groupCreated")),
                Ok(None) | Err(_) => {},
            }
        },
    }
});

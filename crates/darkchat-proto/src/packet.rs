//! Engine.IO v4 / Socket.IO v5 text packet codec.
//!
//! Every WebSocket text frame carries one Engine.IO packet. Engine.IO
//! `message` packets wrap one Socket.IO packet:
//!
//! ```text
//! 0{"sid":..,"pingInterval":..}   engine open (server -> client)
//! 2 / 3                           engine ping / pong
//! 40                              socket connect (default namespace)
//! 42["dashBoard",{}]              socket event, no ack
//! 4217["chat",{"type":2}]         socket event, ack id 17
//! 4317[{"success":200,...}]       socket ack for id 17
//! ```
//!
//! Only the default namespace is used. A namespace prefix on inbound packets
//! is accepted and dropped. Binary attachments are rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ProtocolError, Result};

/// Engine.IO open handshake body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Engine session id.
    pub sid: String,
    /// Transports the session may upgrade to.
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Server ping interval in milliseconds.
    pub ping_interval: u64,
    /// Server ping timeout in milliseconds.
    pub ping_timeout: u64,
    /// Largest accepted payload in bytes.
    #[serde(default)]
    pub max_payload: Option<u64>,
}

/// Engine.IO transport-level packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// Session opened.
    Open(Handshake),
    /// Session closed.
    Close,
    /// Heartbeat probe from the server.
    Ping,
    /// Heartbeat answer.
    Pong,
    /// Socket.IO payload.
    Message(SocketPacket),
    /// Transport upgrade marker.
    Upgrade,
    /// No-op filler.
    Noop,
}

impl EnginePacket {
    /// Encode as WebSocket text.
    pub fn encode(&self) -> Result<String> {
        Ok(match self {
            Self::Open(handshake) => format!("0{}", serde_json::to_string(handshake)?),
            Self::Close => "1".to_owned(),
            Self::Ping => "2".to_owned(),
            Self::Pong => "3".to_owned(),
            Self::Message(packet) => format!("4{}", packet.encode()?),
            Self::Upgrade => "5".to_owned(),
            Self::Noop => "6".to_owned(),
        })
    }

    /// Decode one packet from WebSocket text.
    pub fn decode(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let rest = chars.as_str();

        match kind {
            '0' => Ok(Self::Open(serde_json::from_str(rest)?)),
            '1' => Ok(Self::Close),
            // Pings may carry a probe string, which is not echoed
            '2' => Ok(Self::Ping),
            '3' => Ok(Self::Pong),
            '4' => Ok(Self::Message(SocketPacket::decode(rest)?)),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            found => Err(ProtocolError::UnknownPacketType { layer: "engine", found }),
        }
    }
}

/// Socket.IO packet in the default namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// Namespace connect. The server's reply carries `{"sid": ..}`.
    Connect(Option<Value>),
    /// Namespace disconnect.
    Disconnect,
    /// Named event, optionally requesting an ack.
    Event {
        /// Ack id when a reply is requested.
        id: Option<u64>,
        /// Event name.
        name: String,
        /// First argument; `Null` when the event carried none.
        payload: Value,
    },
    /// Reply to an event that carried an ack id.
    Ack {
        /// Ack id being answered.
        id: u64,
        /// First reply argument; `Null` when the ack carried none.
        payload: Value,
    },
    /// Namespace connection refused.
    ConnectError(Value),
}

impl SocketPacket {
    /// Event with an ack request.
    pub fn request(id: u64, name: impl Into<String>, payload: Value) -> Self {
        Self::Event { id: Some(id), name: name.into(), payload }
    }

    /// Encode without the Engine.IO prefix.
    pub fn encode(&self) -> Result<String> {
        Ok(match self {
            Self::Connect(None) => "0".to_owned(),
            Self::Connect(Some(data)) => format!("0{}", serde_json::to_string(data)?),
            Self::Disconnect => "1".to_owned(),
            Self::Event { id, name, payload } => {
                let body = serde_json::to_string(&(name, payload))?;
                match id {
                    Some(id) => format!("2{id}{body}"),
                    None => format!("2{body}"),
                }
            },
            Self::Ack { id, payload } => format!("3{id}{}", serde_json::to_string(&[payload])?),
            Self::ConnectError(data) => format!("4{}", serde_json::to_string(data)?),
        })
    }

    /// Decode from text following the Engine.IO `4` prefix.
    pub fn decode(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let rest = skip_namespace(chars.as_str());

        match kind {
            '0' => Ok(Self::Connect(parse_optional_json(rest)?)),
            '1' => Ok(Self::Disconnect),
            '2' => {
                let (id, body) = split_ack_id(rest)?;
                let (name, payload) = parse_event_body(body)?;
                Ok(Self::Event { id, name, payload })
            },
            '3' => {
                let (id, body) = split_ack_id(rest)?;
                let id = id.ok_or(ProtocolError::MissingAckId)?;
                let args: Vec<Value> = serde_json::from_str(body)?;
                Ok(Self::Ack { id, payload: args.into_iter().next().unwrap_or(Value::Null) })
            },
            '4' => Ok(Self::ConnectError(parse_optional_json(rest)?.unwrap_or(Value::Null))),
            '5' | '6' => Err(ProtocolError::BinaryUnsupported),
            found => Err(ProtocolError::UnknownPacketType { layer: "socket", found }),
        }
    }
}

/// Drop a `/namespace,` prefix if present.
fn skip_namespace(text: &str) -> &str {
    if text.starts_with('/') {
        text.split_once(',').map_or("", |(_, rest)| rest)
    } else {
        text
    }
}

/// Split leading ack id digits from the JSON body.
fn split_ack_id(text: &str) -> Result<(Option<u64>, &str)> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Ok((None, text));
    }

    let (id, body) = text.split_at(digits);
    let id = id.parse::<u64>().map_err(|_| ProtocolError::MalformedAckId)?;
    Ok((Some(id), body))
}

fn parse_optional_json(text: &str) -> Result<Option<Value>> {
    if text.is_empty() { Ok(None) } else { Ok(Some(serde_json::from_str(text)?)) }
}

fn parse_event_body(text: &str) -> Result<(String, Value)> {
    let args: Vec<Value> = serde_json::from_str(text)?;
    let mut args = args.into_iter();

    let name = match args.next() {
        Some(Value::String(name)) => name,
        Some(_) => return Err(ProtocolError::InvalidEvent("event name is not a string")),
        None => return Err(ProtocolError::InvalidEvent("missing event name")),
    };

    Ok((name, args.next().unwrap_or(Value::Null)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_open_handshake() {
        let text = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        let packet = EnginePacket::decode(text).expect("decode");

        let EnginePacket::Open(handshake) = packet else {
            panic!("expected open, got {packet:?}");
        };
        assert_eq!(handshake.sid, "abc");
        assert_eq!(handshake.ping_interval, 25_000);
    }

    #[test]
    fn encode_request_with_ack_id() {
        let packet = EnginePacket::Message(SocketPacket::request(17, "chat", json!({"type": 2})));
        assert_eq!(packet.encode().expect("encode"), r#"4217["chat",{"type":2}]"#);
    }

    #[test]
    fn decode_ack() {
        let packet = EnginePacket::decode(r#"4317[{"success":200}]"#).expect("decode");
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Ack { id: 17, payload: json!({"success": 200}) })
        );
    }

    #[test]
    fn decode_push_without_payload() {
        let packet = SocketPacket::decode(r#"2["groupCreated"]"#).expect("decode");
        assert_eq!(
            packet,
            SocketPacket::Event { id: None, name: "groupCreated".into(), payload: Value::Null }
        );
    }

    #[test]
    fn namespace_prefix_is_ignored() {
        let packet = SocketPacket::decode(r#"2/chat,["newMessage",{}]"#).expect("decode");
        assert!(matches!(packet, SocketPacket::Event { ref name, .. } if name == "newMessage"));
    }

    #[test]
    fn connect_with_and_without_body() {
        assert_eq!(SocketPacket::decode("0").expect("decode"), SocketPacket::Connect(None));
        assert_eq!(
            SocketPacket::decode(r#"0{"sid":"x"}"#).expect("decode"),
            SocketPacket::Connect(Some(json!({"sid": "x"})))
        );
        assert_eq!(EnginePacket::Message(SocketPacket::Connect(None)).encode(), Ok("40".into()));
    }

    #[test]
    fn malformed_packets_are_errors() {
        assert_eq!(EnginePacket::decode(""), Err(ProtocolError::Empty));
        assert!(matches!(
            EnginePacket::decode("9"),
            Err(ProtocolError::UnknownPacketType { layer: "engine", found: '9' })
        ));
        assert_eq!(SocketPacket::decode("3[]"), Err(ProtocolError::MissingAckId));
        assert_eq!(SocketPacket::decode("51-[\"x\"]"), Err(ProtocolError::BinaryUnsupported));
        assert!(matches!(SocketPacket::decode("2[42]"), Err(ProtocolError::InvalidEvent(_))));
        assert_eq!(
            SocketPacket::decode("299999999999999999999999[]"),
            Err(ProtocolError::MalformedAckId)
        );
    }
}

//! Request-to-gateway translation layer.
//!
//! The [`Bridge`] sits between the [`crate::App`] and the gateway. It turns
//! typed [`Request`]s into [`Outbound`] messages and turns [`Inbound`]
//! messages back into [`AppEvent`]s.
//!
//! # Responsibilities
//!
//! - Remembers the [`RequestKind`] of every in-flight request so the reply,
//!   which carries only the ack id, can be decoded.
//! - Unwraps the reply envelope and reports non-success statuses as
//!   [`AppEvent::RequestFailed`].
//! - Fails every in-flight request when the connection closes.

use std::collections::HashMap;

use darkchat_client::{Inbound, Outbound};
use darkchat_proto::{PushEvent, SocketResponse};
use serde_json::Value;

use crate::{AppError, AppEvent, Reply, Request, RequestId, RequestKind};

/// Pairs replies with the requests they answer.
#[derive(Debug, Default)]
pub struct Bridge {
    pending: HashMap<RequestId, RequestKind>,
}

impl Bridge {
    /// Create a bridge with nothing in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `request` for the gateway and remember its kind.
    pub fn outbound(&mut self, id: RequestId, request: &Request) -> Result<Outbound, AppError> {
        let payload = request.payload()?;
        let kind = request.kind();
        self.pending.insert(id, kind);
        tracing::trace!(%id, event = %kind.event(), "request out");
        Ok(Outbound::Request { id: id.0, event: kind.event(), payload })
    }

    /// The request `id` never reached the gateway.
    pub fn dropped(&mut self, id: RequestId) -> Vec<AppEvent> {
        match self.pending.remove(&id) {
            Some(kind) => {
                vec![AppEvent::RequestFailed { id, kind, message: "not connected".to_owned() }]
            },
            None => vec![],
        }
    }

    /// Translate a gateway notification into App events.
    pub fn handle_inbound(&mut self, inbound: Inbound) -> Vec<AppEvent> {
        match inbound {
            Inbound::Connected => vec![AppEvent::Connected],
            Inbound::Reply { id, payload } => self.handle_reply(RequestId(id), payload),
            Inbound::Push { event, payload } => match PushEvent::decode(event.as_str(), payload) {
                Ok(Some(push)) => vec![AppEvent::Push(push)],
                Ok(None) => {
                    tracing::debug!(%event, "ignoring non-push event");
                    vec![]
                },
                Err(error) => {
                    tracing::warn!(%event, %error, "malformed push");
                    vec![]
                },
            },
            Inbound::Closed { reason } => {
                let in_flight = self.pending.len();
                if in_flight > 0 {
                    tracing::debug!(in_flight, "connection closed with requests in flight");
                }
                self.pending.clear();
                vec![AppEvent::Disconnected { reason }]
            },
        }
    }

    /// Forget every in-flight request.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of requests awaiting a reply.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    fn handle_reply(&mut self, id: RequestId, payload: Value) -> Vec<AppEvent> {
        let Some(kind) = self.pending.remove(&id) else {
            tracing::debug!(%id, "reply for unknown request");
            return vec![];
        };

        match decode_reply(kind, payload) {
            Ok(reply) => vec![AppEvent::Reply { id, reply }],
            Err(error) => vec![AppEvent::RequestFailed { id, kind, message: error.to_string() }],
        }
    }
}

/// Decode a reply envelope for a request of `kind`.
///
/// `logOut` succeeds on any reply; the session ends either way.
fn decode_reply(kind: RequestKind, payload: Value) -> Result<Reply, AppError> {
    if kind == RequestKind::LogOut {
        return Ok(Reply::LoggedOut);
    }

    let envelope = SocketResponse::from_value(payload)?;
    if !envelope.is_ok() {
        let message = if envelope.errormessage.is_empty() {
            "request rejected".to_owned()
        } else {
            envelope.errormessage.clone()
        };
        return Err(AppError::Rejected { status: envelope.success, message });
    }

    let reply = match kind {
        RequestKind::Dashboard => Reply::Dashboard(envelope.decode()?.unwrap_or_default()),
        RequestKind::Directory => Reply::Directory(envelope.decode()?.unwrap_or_default()),
        RequestKind::History => Reply::History(envelope.decode()?.unwrap_or_default()),
        RequestKind::SendMessage => Reply::MessageSent(envelope.decode()?),
        RequestKind::CreateGroup => Reply::GroupCreated(envelope.decode()?),
        RequestKind::UpdateProfile => Reply::ProfileUpdated,
        RequestKind::DeleteProfile => Reply::ProfileDeleted,
        RequestKind::LogOut => Reply::LoggedOut,
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use darkchat_proto::{ConversationId, EventName};
    use serde_json::json;

    use super::*;

    fn sent(bridge: &mut Bridge, id: u64, request: &Request) {
        let out = bridge.outbound(RequestId(id), request).expect("encode");
        assert!(matches!(out, Outbound::Request { id: sent, .. } if sent == id));
    }

    #[test]
    fn reply_pairs_with_request_kind() {
        let mut bridge = Bridge::new();
        sent(&mut bridge, 7, &Request::Dashboard);

        let events = bridge.handle_inbound(Inbound::Reply {
            id: 7,
            payload: json!({
                "success": 200,
                "errormessage": "",
                "response": [{"chatId": "c1", "type": 2, "name": "Bo", "userId": "u2"}],
            }),
        });

        let [AppEvent::Reply { id, reply: Reply::Dashboard(items) }] = events.as_slice() else {
            panic!("unexpected events: {events:?}");
        };
        assert_eq!(*id, RequestId(7));
        assert_eq!(items[0].conversation_id, ConversationId::new("c1"));
        assert_eq!(bridge.in_flight(), 0);
    }

    #[test]
    fn error_status_fails_request() {
        let mut bridge = Bridge::new();
        sent(&mut bridge, 1, &Request::DeleteProfile);

        let events = bridge.handle_inbound(Inbound::Reply {
            id: 1,
            payload: json!({"success": 403, "errormessage": "forbidden"}),
        });

        assert_eq!(events, vec![AppEvent::RequestFailed {
            id: RequestId(1),
            kind: RequestKind::DeleteProfile,
            message: "forbidden (status 403)".into(),
        }]);
    }

    #[test]
    fn logout_accepts_any_reply() {
        let mut bridge = Bridge::new();
        sent(&mut bridge, 2, &Request::LogOut);

        let events = bridge.handle_inbound(Inbound::Reply { id: 2, payload: json!(null) });
        assert_eq!(events, vec![AppEvent::Reply { id: RequestId(2), reply: Reply::LoggedOut }]);
    }

    #[test]
    fn unknown_reply_is_ignored() {
        let mut bridge = Bridge::new();
        assert!(bridge.handle_inbound(Inbound::Reply { id: 9, payload: json!({}) }).is_empty());
    }

    #[test]
    fn dropped_request_fails_once() {
        let mut bridge = Bridge::new();
        sent(&mut bridge, 3, &Request::Directory);

        assert_eq!(bridge.dropped(RequestId(3)).len(), 1);
        assert!(bridge.dropped(RequestId(3)).is_empty());
    }

    #[test]
    fn close_forgets_in_flight() {
        let mut bridge = Bridge::new();
        sent(&mut bridge, 4, &Request::Dashboard);

        let events = bridge.handle_inbound(Inbound::Closed { reason: "bye".into() });
        assert_eq!(events, vec![AppEvent::Disconnected { reason: "bye".into() }]);
        assert_eq!(bridge.in_flight(), 0);
    }

    #[test]
    fn push_decodes() {
        let mut bridge = Bridge::new();
        let events = bridge.handle_inbound(Inbound::Push {
            event: EventName::GroupCreated,
            payload: json!({}),
        });
        assert_eq!(events, vec![AppEvent::Push(PushEvent::GroupCreated)]);
    }
}

//! Socket.IO transport for the client.
//!
//! Provides [`ConnectedGateway`], which handles WebSocket I/O for the event
//! socket, and [`Gateway`], the idempotent lifecycle wrapper the runtime
//! holds. This is a thin layer that moves packets; pairing replies and
//! reconciling state stays in the Sans-IO application core.

use std::collections::HashSet;

use darkchat_proto::{EnginePacket, EventName, Identity, SocketPacket};
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::{GatewayError, Inbound, Outbound};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Channel depth between the runtime and the connection task.
const CHANNEL_CAPACITY: usize = 64;

/// Handle to an open event-socket connection.
///
/// Messages are sent/received via the channels, and an internal task handles
/// the WebSocket I/O and Engine.IO heartbeats.
pub struct ConnectedGateway {
    /// Send instructions to the connection task.
    pub to_server: mpsc::Sender<Outbound>,
    /// Receive replies and pushes.
    pub from_server: mpsc::Receiver<Inbound>,
    /// Abort handle to stop the connection task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedGateway {
    /// Stop the connection.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Build the Socket.IO WebSocket URL for `base_url`.
///
/// `http` maps to `ws` and `https` to `wss`. The identity travels as query
/// parameters at connection time, never per message.
pub fn socket_url(base_url: &str, identity: &Identity) -> Result<Url, GatewayError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| GatewayError::Connection(format!("invalid address: {e}")))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(GatewayError::Connection(format!("unsupported scheme {other}"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| GatewayError::Connection(format!("cannot use scheme {scheme}")))?;

    url.set_path("/socket.io/");
    url.query_pairs_mut()
        .clear()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket")
        .append_pair("userId", &identity.user_id)
        .append_pair("authToken", &identity.auth_token);

    Ok(url)
}

/// Connect to the event socket as `identity`.
///
/// Returns a [`ConnectedGateway`] with channels for message transport. The
/// first [`Inbound::Connected`] arrives once the namespace handshake
/// completes.
pub async fn connect(base_url: &str, identity: &Identity) -> Result<ConnectedGateway, GatewayError> {
    let url = socket_url(base_url, identity)?;

    let (stream, _response) = connect_async(url.as_str())
        .await
        .map_err(|e| GatewayError::Connection(format!("websocket handshake failed: {e}")))?;

    tracing::info!(server = %base_url, user_id = %identity.user_id, "event socket opened");

    let (to_server_tx, to_server_rx) = mpsc::channel::<Outbound>(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel::<Inbound>(CHANNEL_CAPACITY);

    let handle = tokio::spawn(run_connection(stream, to_server_rx, from_server_tx));

    Ok(ConnectedGateway {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// Run the connection, bridging between channels and the WebSocket.
async fn run_connection(
    stream: WsStream,
    mut to_server: mpsc::Receiver<Outbound>,
    from_server: mpsc::Sender<Inbound>,
) {
    let (mut sink, mut source) = stream.split();
    let mut subscriptions: HashSet<EventName> = HashSet::new();

    let reason = loop {
        tokio::select! {
            outbound = to_server.recv() => match outbound {
                Some(Outbound::Subscribe(event)) => {
                    if subscriptions.insert(event) {
                        tracing::debug!(%event, "subscribed");
                    }
                },
                Some(Outbound::Request { id, event, payload }) => {
                    let packet = EnginePacket::Message(SocketPacket::request(id, event.as_str(), payload));
                    if let Err(e) = send_packet(&mut sink, &packet).await {
                        break e.to_string();
                    }
                    tracing::debug!(id, %event, "request sent");
                },
                None => break "gateway dropped".to_owned(),
            },

            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match handle_text(text.as_str(), &mut sink, &subscriptions, &from_server).await {
                        Ok(None) => {},
                        Ok(Some(reason)) => break reason,
                        Err(e) => break e.to_string(),
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    break frame.map_or_else(|| "closed by server".to_owned(), |f| f.reason.to_string());
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => break format!("read failed: {e}"),
                None => break "stream ended".to_owned(),
            },
        }
    };

    tracing::info!(%reason, "event socket closed");
    let _ = from_server.send(Inbound::Closed { reason }).await;
}

/// Handle one text frame. Returns `Some(reason)` when the session ended.
async fn handle_text(
    text: &str,
    sink: &mut futures::stream::SplitSink<WsStream, Message>,
    subscriptions: &HashSet<EventName>,
    from_server: &mpsc::Sender<Inbound>,
) -> Result<Option<String>, GatewayError> {
    let packet = match EnginePacket::decode(text) {
        Ok(packet) => packet,
        Err(e) => {
            tracing::warn!(error = %e, "dropping malformed packet");
            return Ok(None);
        },
    };

    let inbound = match packet {
        EnginePacket::Open(handshake) => {
            tracing::debug!(sid = %handshake.sid, ping_interval = handshake.ping_interval, "engine open");
            send_packet(sink, &EnginePacket::Message(SocketPacket::Connect(None))).await?;
            None
        },
        EnginePacket::Ping => {
            send_packet(sink, &EnginePacket::Pong).await?;
            None
        },
        EnginePacket::Close => return Ok(Some("engine closed".to_owned())),
        EnginePacket::Pong | EnginePacket::Upgrade | EnginePacket::Noop => None,
        EnginePacket::Message(SocketPacket::Connect(_)) => Some(Inbound::Connected),
        EnginePacket::Message(SocketPacket::Ack { id, payload }) => {
            Some(Inbound::Reply { id, payload })
        },
        EnginePacket::Message(SocketPacket::Event { name, payload, .. }) => {
            match name.parse::<EventName>() {
                Ok(event) if subscriptions.contains(&event) => {
                    Some(Inbound::Push { event, payload })
                },
                _ => {
                    tracing::debug!(event = %name, "ignoring unsubscribed event");
                    None
                },
            }
        },
        EnginePacket::Message(SocketPacket::Disconnect) => {
            return Ok(Some("namespace disconnected".to_owned()));
        },
        EnginePacket::Message(SocketPacket::ConnectError(data)) => {
            return Ok(Some(format!("connection refused: {data}")));
        },
    };

    if let Some(inbound) = inbound {
        from_server
            .send(inbound)
            .await
            .map_err(|e| GatewayError::Stream(format!("channel send failed: {e}")))?;
    }
    Ok(None)
}

/// Send one packet as a text frame.
async fn send_packet(
    sink: &mut futures::stream::SplitSink<WsStream, Message>,
    packet: &EnginePacket,
) -> Result<(), GatewayError> {
    let text = packet.encode()?;
    sink.send(Message::Text(text.into()))
        .await
        .map_err(|e| GatewayError::Stream(format!("write failed: {e}")))
}

/// Idempotent connection lifecycle around [`ConnectedGateway`].
///
/// While disconnected, requests and subscriptions are dropped and reported
/// back as `false` so the caller can surface the failure.
#[derive(Default)]
pub struct Gateway {
    server_url: String,
    connection: Option<ConnectedGateway>,
}

impl Gateway {
    /// Gateway for the event socket at `server_url`.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self { server_url: server_url.into(), connection: None }
    }

    /// Open the connection as `identity`.
    ///
    /// No-op when already connected or when no identity is given.
    pub async fn connect(&mut self, identity: Option<&Identity>) -> Result<(), GatewayError> {
        let Some(identity) = identity else {
            tracing::debug!("connect skipped: no identity");
            return Ok(());
        };
        if self.connection.is_some() {
            return Ok(());
        }

        self.connection = Some(connect(&self.server_url, identity).await?);
        Ok(())
    }

    /// Close the connection and forget subscriptions. No-op when closed.
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.stop();
            tracing::info!("event socket disconnected");
        }
    }

    /// Whether a connection is open.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Queue an instruction. Returns `false` if it was dropped.
    pub async fn send(&mut self, outbound: Outbound) -> bool {
        let Some(conn) = &self.connection else {
            tracing::debug!(?outbound, "dropped while disconnected");
            return false;
        };

        if conn.to_server.send(outbound).await.is_err() {
            tracing::warn!("connection task gone, marking gateway disconnected");
            self.connection = None;
            return false;
        }
        true
    }

    /// Next reply or push. Returns `None` when disconnected or nothing is
    /// waiting.
    pub fn try_recv(&mut self) -> Option<Inbound> {
        let conn = self.connection.as_mut()?;
        conn.from_server.try_recv().ok()
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.disconnect();
    }
}

//! Transport abstraction over the device's WebSocket endpoint.
//!
//! The protocol is push-based: after the connection opens, the device sends
//! XML documents whenever its state changes, with no pairing between a
//! request and a later message. The transport therefore exposes a sender
//! half plus a stream of lifecycle events rather than a request/response
//! call interface.

use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::DeviceConfig;
use crate::error::{TransportError, TransportResult};

/// Subprotocol tag the device requires during the WebSocket handshake.
pub const GABBO_SUBPROTOCOL: &str = "gabbo";

/// Lifecycle events delivered by a transport connection.
///
/// This is the closed set of inputs the session's state machine reacts to;
/// delivery for a single connection is serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established and ready to carry messages
    Opened,
    /// An inbound text frame
    Message(String),
    /// The connection failed; no further events follow
    Error(String),
    /// The connection closed; no further events follow
    Closed { reason: String },
}

/// Receiving half of a transport connection.
pub type TransportEvents = mpsc::Receiver<TransportEvent>;

/// Sending half of a transport connection.
#[async_trait]
pub trait MessageSink: Send {
    /// Send one text frame.
    async fn send(&mut self, frame: &str) -> TransportResult<()>;

    /// Close the connection. Failures are logged by callers, never retried.
    async fn close(&mut self) -> TransportResult<()>;
}

/// Factory for transport connections.
///
/// One implementation exists for production ([`WsTransport`]); tests
/// substitute their own to script connection behavior.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a new connection to the configured device.
    async fn connect(
        &self,
        config: &DeviceConfig,
    ) -> TransportResult<(Box<dyn MessageSink>, TransportEvents)>;
}

/// WebSocket transport speaking the device's `gabbo` subprotocol.
#[derive(Debug, Default)]
pub struct WsTransport;

type WsSinkInner = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

struct WsSink {
    sink: WsSinkInner,
}

#[async_trait]
impl MessageSink for WsSink {
    async fn send(&mut self, frame: &str) -> TransportResult<()> {
        self.sink
            .send(Message::text(frame))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.sink
            .close()
            .await
            .map_err(|e| TransportError::CloseFailed(e.to_string()))
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(
        &self,
        config: &DeviceConfig,
    ) -> TransportResult<(Box<dyn MessageSink>, TransportEvents)> {
        let url = config.endpoint_url();
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_static(GABBO_SUBPROTOCOL),
        );

        let (stream, _response) = connect_async(request)
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        tracing::debug!(device = %config.device_id, %url, "websocket connected");

        let (sink, mut read) = stream.split();
        let (tx, rx) = mpsc::channel(64);

        // The connection is usable as soon as the handshake completes.
        let _ = tx.send(TransportEvent::Opened).await;

        tokio::spawn(async move {
            loop {
                match read.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if tx
                            .send(TransportEvent::Message(text.to_string()))
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| f.reason.to_string())
                            .unwrap_or_else(|| "closed by device".to_string());
                        let _ = tx.send(TransportEvent::Closed { reason }).await;
                        return;
                    }
                    // Ping/pong is handled by the protocol layer; binary
                    // frames are not part of this protocol.
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        let _ = tx.send(TransportEvent::Error(e.to_string())).await;
                        return;
                    }
                    None => {
                        let _ = tx
                            .send(TransportEvent::Closed {
                                reason: "stream ended".to_string(),
                            })
                            .await;
                        return;
                    }
                }
            }
        });

        Ok((Box::new(WsSink { sink }), rx))
    }
}

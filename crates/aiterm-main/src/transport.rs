use std::time::Duration;

use aiterm_session::{InboundMessage, OutboundMessage};
use aiterm_tui::{SessionTransport, TransportEvent, TransportFuture};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

type ServerSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket link to the terminal server. A background task owns the socket,
/// reconnects after `reconnect_delay`, and forwards decoded envelopes.
pub struct WebSocketTransport {
    url: String,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    task: JoinHandle<()>,
}

enum LinkEnd {
    ServerClosed,
    ClientGone,
}

impl WebSocketTransport {
    /// Must be called inside a tokio runtime.
    pub fn spawn(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        let url = url.into();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let task = tokio::spawn(connection_loop(
            url.clone(),
            reconnect_delay,
            outbound_rx,
            events_tx,
        ));
        Self {
            url,
            outbound,
            events,
            task,
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl SessionTransport for WebSocketTransport {
    fn send(&mut self, message: OutboundMessage) -> Result<(), String> {
        self.outbound
            .send(message)
            .map_err(|_| "connection task stopped".to_string())
    }

    fn next_event<'a>(&'a mut self) -> TransportFuture<'a, Option<TransportEvent>> {
        Box::pin(async move { self.events.recv().await })
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}

async fn connection_loop(
    url: String,
    reconnect_delay: Duration,
    mut outbound_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((socket, _response)) => {
                info!(%url, "connected to terminal server");
                if events_tx.send(TransportEvent::Connected).is_err() {
                    return;
                }
                match pump(socket, &mut outbound_rx, &events_tx).await {
                    LinkEnd::ClientGone => return,
                    LinkEnd::ServerClosed => {
                        info!(%url, "terminal server connection closed");
                        if events_tx.send(TransportEvent::Disconnected).is_err() {
                            return;
                        }
                    }
                }
            }
            Err(error) => warn!(%url, %error, "connect to terminal server failed"),
        }

        tokio::select! {
            _ = tokio::time::sleep(reconnect_delay) => {}
            _ = events_tx.closed() => return,
        }
        debug!(%url, "reconnecting");
    }
}

/// Outbound messages queued while offline stay in the channel and go out
/// after the next successful connect.
async fn pump(
    socket: ServerSocket,
    outbound_rx: &mut mpsc::UnboundedReceiver<OutboundMessage>,
    events_tx: &mpsc::UnboundedSender<TransportEvent>,
) -> LinkEnd {
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                let Some(message) = outbound else {
                    let _ = sink.send(Message::Close(None)).await;
                    return LinkEnd::ClientGone;
                };
                let text = match message.to_json() {
                    Ok(text) => text,
                    Err(error) => {
                        warn!(%error, "encode outbound message failed");
                        continue;
                    }
                };
                if let Err(error) = sink.send(Message::Text(text)).await {
                    warn!(%error, "send to terminal server failed");
                    return LinkEnd::ServerClosed;
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => match InboundMessage::from_json(&text) {
                    Ok(message) => {
                        if events_tx.send(TransportEvent::Message(message)).is_err() {
                            return LinkEnd::ClientGone;
                        }
                    }
                    Err(error) => warn!(
                        event = error.event_name().unwrap_or("-"),
                        %error,
                        "dropping inbound message"
                    ),
                },
                Some(Ok(Message::Close(_))) | None => return LinkEnd::ServerClosed,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    warn!(%error, "read from terminal server failed");
                    return LinkEnd::ServerClosed;
                }
            }
        }
    }
}

use std::future::Future;
use std::pin::Pin;

use aiterm_session::{InboundMessage, OutboundMessage};

pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    Connected,
    Message(InboundMessage),
    Disconnected,
}

/// Duplex channel to the terminal server.
///
/// `next_event` must be cancel safe: the runtime polls it inside
/// `tokio::select!` and drops the future whenever another branch wins.
pub trait SessionTransport {
    fn send(&mut self, message: OutboundMessage) -> Result<(), String>;

    /// Resolves to `None` once the transport is closed for good.
    fn next_event<'a>(&'a mut self) -> TransportFuture<'a, Option<TransportEvent>>;

    fn endpoint(&self) -> String {
        String::new()
    }
}

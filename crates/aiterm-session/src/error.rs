use thiserror::Error;

/// Errors raised while decoding or encoding protocol envelopes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("event '{event}' has an invalid payload: {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    pub fn event_name(&self) -> Option<&str> {
        match self {
            Self::Decode(_) => None,
            Self::UnknownEvent(event) | Self::InvalidPayload { event, .. } => Some(event.as_str()),
        }
    }
}

//! Client-side session state for the AI-assisted terminal.
//!
//! [`SessionController`] owns the input line, command history, scrollback,
//! suggestion overlay and resource stats. Frontends feed it keystroke
//! operations and decoded server messages, then drain the queued
//! [`OutboundMessage`]s.

pub mod config;
pub mod error;
pub mod history;
pub mod overlay;
pub mod protocol;
pub mod scrollback;
pub mod session;
pub mod stats;

pub use config::SessionConfig;
pub use error::ProtocolError;
pub use history::{HistoryDirection, HistoryStore};
pub use overlay::{PendingProposal, RequestTracker, SuggestionList, SuggestionOverlay};
pub use protocol::{InboundMessage, OutboundMessage, ResultKind, TerminalOutput};
pub use scrollback::{LineKind, OutputLine, Scrollback, ScrollbackEntry};
pub use session::{ConnectionState, InputLine, InputMode, SessionController, SessionPhase};
pub use stats::SessionStats;

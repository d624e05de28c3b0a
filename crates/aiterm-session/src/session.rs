use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::history::{HistoryDirection, HistoryStore};
use crate::overlay::{PendingProposal, RequestTracker, SuggestionOverlay};
use crate::protocol::{
    AiInterpretation, AiSuggestions, CommandExplanation, CommandRequest, ExplainRequest,
    InboundMessage, InterpretRequest, OutboundMessage, SuggestionRequest, SystemInfo,
    TerminalOutput,
};
use crate::scrollback::{LineKind, Scrollback};
use crate::stats::SessionStats;

const CONNECTED_MESSAGE: &str = "Connected to terminal server";
const DISCONNECTED_MESSAGE: &str = "Disconnected from terminal server";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Composing,
    AwaitingResult,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Fresh,
    Browsing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// The command line being composed. `cursor` counts chars, not bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputLine {
    text: String,
    cursor: usize,
    mode: InputMode,
}

impl Default for InputLine {
    fn default() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            mode: InputMode::Fresh,
        }
    }
}

impl InputLine {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn set_text(&mut self, text: String, mode: InputMode) {
        self.cursor = text.chars().count();
        self.text = text;
        self.mode = mode;
    }

    fn clear(&mut self) {
        self.set_text(String::new(), InputMode::Fresh);
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map(|(index, _)| index)
            .unwrap_or(self.text.len())
    }

    fn insert_str(&mut self, text: &str) {
        let byte_pos = self.byte_index(self.cursor);
        self.text.insert_str(byte_pos, text);
        self.cursor += text.chars().count();
    }

    fn delete_before_cursor(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let start = self.byte_index(self.cursor - 1);
        let end = self.byte_index(self.cursor);
        self.text.replace_range(start..end, "");
        self.cursor -= 1;
        true
    }

    fn delete_at_cursor(&mut self) -> bool {
        if self.cursor >= self.char_count() {
            return false;
        }
        let start = self.byte_index(self.cursor);
        let end = self.byte_index(self.cursor + 1);
        self.text.replace_range(start..end, "");
        true
    }
}

/// Single arbiter between keystrokes and server pushes.
///
/// Every mutation of input, history, overlay and scrollback goes through this
/// type, one event at a time. Outbound messages are queued and drained by the
/// owner of the event loop with [`SessionController::take_outbound`].
#[derive(Debug)]
pub struct SessionController {
    config: SessionConfig,
    phase: SessionPhase,
    connection: ConnectionState,
    input: InputLine,
    history: HistoryStore,
    scrollback: Scrollback,
    overlay: SuggestionOverlay,
    stats: Option<SessionStats>,
    suggestion_requests: RequestTracker,
    interpretation_requests: RequestTracker,
    history_panel_open: bool,
    outbox: Vec<OutboundMessage>,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            phase: SessionPhase::Idle,
            connection: ConnectionState::Connecting,
            input: InputLine::default(),
            history: HistoryStore::new(),
            scrollback: Scrollback::new(),
            overlay: SuggestionOverlay::None,
            stats: None,
            suggestion_requests: RequestTracker::default(),
            interpretation_requests: RequestTracker::default(),
            history_panel_open: false,
            outbox: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn input(&self) -> &InputLine {
        &self.input
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    pub fn overlay(&self) -> &SuggestionOverlay {
        &self.overlay
    }

    pub fn stats(&self) -> Option<&SessionStats> {
        self.stats.as_ref()
    }

    pub fn history_panel_open(&self) -> bool {
        self.history_panel_open
    }

    /// Drains every message queued since the previous call, in order.
    pub fn take_outbound(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn pending_outbound(&self) -> &[OutboundMessage] {
        &self.outbox
    }

    // Editing

    pub fn insert_char(&mut self, ch: char) {
        let mut buffer = [0_u8; 4];
        self.insert_text(ch.encode_utf8(&mut buffer));
    }

    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.input.insert_str(text);
        self.after_edit();
    }

    pub fn backspace(&mut self) -> bool {
        if !self.input.delete_before_cursor() {
            return false;
        }
        self.after_edit();
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        if !self.input.delete_at_cursor() {
            return false;
        }
        self.after_edit();
        true
    }

    pub fn move_cursor_left(&mut self) -> bool {
        if self.input.cursor == 0 {
            return false;
        }
        self.input.cursor -= 1;
        true
    }

    pub fn move_cursor_right(&mut self) -> bool {
        if self.input.cursor >= self.input.char_count() {
            return false;
        }
        self.input.cursor += 1;
        true
    }

    pub fn move_cursor_home(&mut self) -> bool {
        if self.input.cursor == 0 {
            return false;
        }
        self.input.cursor = 0;
        true
    }

    pub fn move_cursor_end(&mut self) -> bool {
        let end = self.input.char_count();
        if self.input.cursor == end {
            return false;
        }
        self.input.cursor = end;
        true
    }

    /// Empties the input line, leaves history browsing and drops any
    /// suggestions for the old text.
    pub fn clear_input(&mut self) {
        self.input.clear();
        self.history.end_browsing();
        self.dismiss_suggestions();
        self.refresh_composing_phase();
    }

    fn after_edit(&mut self) {
        self.history.end_browsing();
        self.input.mode = InputMode::Fresh;
        self.refresh_composing_phase();
        self.request_suggestions_for_input();
    }

    fn request_suggestions_for_input(&mut self) {
        if self.input.char_count() < self.config.suggestion_min_chars {
            // Replies for the longer text no longer match the input.
            self.dismiss_suggestions();
            return;
        }
        let request_id = self.suggestion_requests.issue();
        self.outbox
            .push(OutboundMessage::GetAiSuggestions(SuggestionRequest {
                command: self.input.text.clone(),
                request_id,
            }));
    }

    fn refresh_composing_phase(&mut self) {
        if self.phase == SessionPhase::AwaitingResult {
            return;
        }
        self.phase = if self.input.is_empty() {
            SessionPhase::Idle
        } else {
            SessionPhase::Composing
        };
    }

    fn settle_after_result(&mut self) {
        self.phase = if self.input.is_empty() {
            SessionPhase::Idle
        } else {
            SessionPhase::Composing
        };
    }

    // History

    /// Recalls a history entry into the input line. Never changes the phase.
    pub fn navigate_history(&mut self, direction: HistoryDirection) -> bool {
        let Some(text) = self.history.navigate(direction, &self.input.text) else {
            return false;
        };
        let text = text.to_string();
        self.input.set_text(text, InputMode::Browsing);
        true
    }

    pub fn toggle_history_panel(&mut self) -> bool {
        self.history_panel_open = !self.history_panel_open;
        if self.history_panel_open {
            self.outbox.push(OutboundMessage::GetHistory);
        }
        self.history_panel_open
    }

    pub fn close_history_panel(&mut self) {
        self.history_panel_open = false;
    }

    /// Copies a history entry into the input line and closes the panel.
    pub fn recall_history_entry(&mut self, index: usize) -> bool {
        let Some(entry) = self.history.get(index) else {
            return false;
        };
        let entry = entry.to_string();
        self.input.set_text(entry, InputMode::Fresh);
        self.history.end_browsing();
        self.history_panel_open = false;
        self.refresh_composing_phase();
        true
    }

    // Submission

    pub fn submit(&mut self) -> bool {
        let text = self.input.text.clone();
        self.submit_text(&text)
    }

    /// Submits `text` as a command. Blank text only appends a prompt.
    pub fn submit_text(&mut self, text: &str) -> bool {
        let command = text.trim();
        if command.is_empty() {
            self.scrollback.append_prompt();
            return false;
        }

        self.history.record(command);
        self.scrollback.append_command(command);
        self.outbox.push(OutboundMessage::Command(CommandRequest {
            command: command.to_string(),
            os_mode: self.config.os_mode.clone(),
        }));
        self.input.clear();
        self.suggestion_requests.retire();
        self.overlay.dismiss_suggestions();
        self.phase = SessionPhase::AwaitingResult;
        debug!(command, "command submitted");
        true
    }

    // Overlay

    /// Executes the pending proposal. A second call is a no-op.
    pub fn confirm_proposal(&mut self) -> bool {
        let Some(proposal) = self.overlay.take_proposal() else {
            return false;
        };
        info!(
            original = %proposal.original,
            proposed = %proposal.proposed,
            "AI proposal confirmed"
        );
        self.submit_text(&proposal.proposed);
        true
    }

    /// Drops the pending proposal without sending anything.
    pub fn cancel_proposal(&mut self) -> bool {
        let Some(proposal) = self.overlay.take_proposal() else {
            return false;
        };
        debug!(proposed = %proposal.proposed, "AI proposal cancelled");
        self.scrollback.append_prompt();
        true
    }

    /// Puts the highlighted suggestion into the input line without submitting.
    pub fn accept_suggestion(&mut self) -> bool {
        let Some(suggestion) = self.overlay.take_selected_suggestion() else {
            return false;
        };
        self.input.set_text(suggestion, InputMode::Fresh);
        self.history.end_browsing();
        self.suggestion_requests.retire();
        self.refresh_composing_phase();
        true
    }

    pub fn select_next_suggestion(&mut self) -> bool {
        self.overlay.select_next()
    }

    pub fn select_previous_suggestion(&mut self) -> bool {
        self.overlay.select_previous()
    }

    pub fn dismiss_suggestions(&mut self) {
        self.overlay.dismiss_suggestions();
        self.suggestion_requests.retire();
    }

    // Local commands

    /// Completes the input against the built-in command list.
    pub fn complete(&mut self) -> bool {
        let prefix = self.input.text.as_str();
        let matches = self
            .config
            .completion_commands
            .iter()
            .filter(|command| command.starts_with(prefix))
            .cloned()
            .collect::<Vec<_>>();

        match matches.as_slice() {
            [] => false,
            [only] => {
                self.input.set_text(format!("{only} "), InputMode::Fresh);
                self.history.end_browsing();
                self.refresh_composing_phase();
                true
            }
            many => {
                self.scrollback.append_output(
                    &format!("Available commands: {}", many.join(", ")),
                    LineKind::Info,
                );
                true
            }
        }
    }

    pub fn clear_screen(&mut self) {
        self.scrollback.clear();
    }

    pub fn request_explanation(&mut self) -> bool {
        let command = self.input.text.trim();
        if command.is_empty() {
            return false;
        }
        self.outbox
            .push(OutboundMessage::ExplainCommand(ExplainRequest {
                command: command.to_string(),
            }));
        true
    }

    pub fn request_interpretation(&mut self) -> bool {
        let command = self.input.text.trim().to_string();
        if command.is_empty() {
            return false;
        }
        let request_id = self.interpretation_requests.issue();
        self.outbox
            .push(OutboundMessage::InterpretNaturalLanguage(InterpretRequest {
                command,
                request_id,
            }));
        true
    }

    /// Queues the periodic resource poll.
    pub fn request_telemetry(&mut self) {
        self.outbox.push(OutboundMessage::GetSystemInfo);
    }

    // Transport notifications

    pub fn handle_connected(&mut self) {
        self.connection = ConnectionState::Connected;
        self.scrollback
            .append_output(CONNECTED_MESSAGE, LineKind::Success);
    }

    /// Renders the disconnect; phase and overlay are left untouched.
    pub fn handle_disconnected(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.scrollback
            .append_output(DISCONNECTED_MESSAGE, LineKind::Error);
    }

    // Inbound

    pub fn apply_inbound(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::TerminalOutput(output) => self.apply_terminal_output(output),
            InboundMessage::CommandHistory(history) => {
                self.history.replace_all(history.history);
                self.input.mode = InputMode::Fresh;
            }
            InboundMessage::SystemInfo(info) => self.apply_system_info(info),
            InboundMessage::AiSuggestions(suggestions) => self.apply_suggestions(suggestions),
            InboundMessage::AiInterpretation(interpretation) => {
                self.apply_interpretation(interpretation)
            }
            InboundMessage::CommandExplanation(CommandExplanation {
                command,
                explanation,
            }) => {
                self.scrollback
                    .append_output(&format!("💡 {command}: {explanation}"), LineKind::Info);
            }
        }
    }

    fn apply_terminal_output(&mut self, output: TerminalOutput) {
        match output {
            TerminalOutput::Clear => {
                self.scrollback.clear();
                self.settle_after_result();
            }
            TerminalOutput::Welcome { output } => {
                if let Some(output) = output {
                    self.scrollback.append_output(&output, LineKind::Info);
                }
            }
            TerminalOutput::AiInterpretation {
                output,
                interpreted_command,
                original_command,
            } => {
                if let Some(output) = output {
                    self.scrollback.append_output(&output, LineKind::Info);
                }
                match interpreted_command.filter(|command| !command.trim().is_empty()) {
                    Some(proposed) => {
                        let original = original_command
                            .or_else(|| self.history.last().map(ToOwned::to_owned))
                            .unwrap_or_default();
                        self.overlay
                            .show_proposal(PendingProposal { original, proposed });
                    }
                    None => self.scrollback.append_prompt(),
                }
                self.settle_after_result();
            }
            TerminalOutput::Suggestion {
                output,
                suggestions,
            } => {
                if let Some(output) = output.filter(|output| !output.is_empty()) {
                    self.scrollback.append_output(&output, LineKind::Plain);
                }
                self.scrollback.append_prompt();
                self.offer_suggestions(suggestions);
                self.settle_after_result();
            }
            TerminalOutput::Result {
                output,
                kind,
                return_code,
            } => {
                if let Some(output) = output.filter(|output| !output.is_empty()) {
                    self.scrollback.append_output(&output, kind.line_kind());
                }
                if return_code.is_some_and(|code| code != 0) {
                    debug!(?return_code, "command exited with non-zero status");
                }
                self.scrollback.append_prompt();
                self.settle_after_result();
            }
        }
    }

    fn apply_system_info(&mut self, info: SystemInfo) {
        if let Some(error) = info.error.as_deref() {
            warn!(error, "system info update failed");
            return;
        }
        match SessionStats::from_system_info(&info) {
            Some(stats) => self.stats = Some(stats),
            None => debug!("ignoring system info without usage percentages"),
        }
    }

    fn apply_suggestions(&mut self, suggestions: AiSuggestions) {
        if !self.suggestion_requests.accepts(suggestions.request_id) {
            debug!(
                request_id = ?suggestions.request_id,
                latest = ?self.suggestion_requests.latest(),
                "dropping stale suggestions"
            );
            return;
        }
        self.offer_suggestions(suggestions.suggestions.unwrap_or_default());
    }

    fn offer_suggestions(&mut self, items: Vec<String>) {
        if !self.overlay.show_suggestions(items) {
            debug!("suggestions suppressed while a proposal is pending");
        }
    }

    fn apply_interpretation(&mut self, interpretation: AiInterpretation) {
        if !self
            .interpretation_requests
            .accepts(interpretation.request_id)
        {
            debug!(request_id = ?interpretation.request_id, "dropping stale interpretation");
            return;
        }
        if interpretation.confidence <= self.config.proposal_confidence_threshold
            || interpretation.command.trim().is_empty()
        {
            debug!(
                original = %interpretation.original,
                command = %interpretation.command,
                confidence = interpretation.confidence,
                method = ?interpretation.method,
                "low-confidence interpretation not surfaced"
            );
            return;
        }
        self.scrollback.append_output(
            &format!(
                "🤖 AI interpreted: \"{}\" → \"{}\"",
                interpretation.original, interpretation.command
            ),
            LineKind::Info,
        );
        self.overlay.show_proposal(PendingProposal {
            original: interpretation.original,
            proposed: interpretation.command,
        });
    }
}

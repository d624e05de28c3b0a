use std::io;

use aiterm_session::{ConnectionState, SessionController};
use crossterm::event::{
    EnableBracketedPaste, Event, EventStream, KeyEventKind, KeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, enable_raw_mode};
use futures_util::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::terminal::TerminalRestore;
use super::{
    RuntimeControl, SessionTransport, TransportEvent, TuiApp, TuiOptions, dispatch_key_event,
    render_ui,
};

pub(crate) struct TuiRuntime<'a, T: SessionTransport> {
    transport: &'a mut T,
    options: TuiOptions,
    app: TuiApp,
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    events: EventStream,
    _restore: TerminalRestore,
}

enum LoopEvent {
    Terminal(Option<io::Result<Event>>),
    Transport(Option<TransportEvent>),
    TelemetryTick,
}

impl<'a, T: SessionTransport> TuiRuntime<'a, T> {
    pub(crate) fn new(
        transport: &'a mut T,
        session: SessionController,
        options: TuiOptions,
    ) -> Result<Self, String> {
        enable_raw_mode().map_err(|error| format!("enable raw mode failed: {error}"))?;
        let mut restore = TerminalRestore::default();
        execute!(io::stdout(), EnterAlternateScreen)
            .map_err(|error| format!("enter alternate screen failed: {error}"))?;
        restore.alternate_screen_enabled = true;

        restore.keyboard_enhancement_enabled =
            if crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false) {
                execute!(
                    io::stdout(),
                    PushKeyboardEnhancementFlags(
                        KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    )
                )
                .is_ok()
            } else {
                false
            };
        restore.bracketed_paste_enabled = execute!(io::stdout(), EnableBracketedPaste).is_ok();

        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
            .map_err(|error| format!("create terminal failed: {error}"))?;
        terminal
            .clear()
            .map_err(|error| format!("clear terminal failed: {error}"))?;

        let mut app = TuiApp::new(session, options.initial_help);
        let endpoint = transport.endpoint();
        if !endpoint.is_empty() {
            app.status = format!("connecting to {endpoint}");
        }

        Ok(Self {
            transport,
            options,
            app,
            terminal,
            events: EventStream::new(),
            _restore: restore,
        })
    }

    pub(crate) async fn run(&mut self) -> Result<(), String> {
        let mut telemetry = tokio::time::interval(self.options.telemetry_interval);
        telemetry.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut transport_open = true;
        let mut needs_redraw = true;

        loop {
            if needs_redraw {
                self.draw_ui()?;
            }

            let event = tokio::select! {
                terminal_event = self.events.next() => LoopEvent::Terminal(terminal_event),
                transport_event = self.transport.next_event(), if transport_open => {
                    LoopEvent::Transport(transport_event)
                }
                _ = telemetry.tick() => LoopEvent::TelemetryTick,
            };

            needs_redraw = match event {
                LoopEvent::Terminal(None) => return Ok(()),
                LoopEvent::Terminal(Some(result)) => {
                    let event =
                        result.map_err(|error| format!("read terminal event failed: {error}"))?;
                    match self.handle_terminal_event(event) {
                        Some(RuntimeControl::Exit) => return Ok(()),
                        Some(RuntimeControl::Continue) => true,
                        None => false,
                    }
                }
                LoopEvent::Transport(Some(event)) => {
                    self.handle_transport_event(event);
                    true
                }
                LoopEvent::Transport(None) => {
                    debug!("transport closed");
                    transport_open = false;
                    if self.app.session.connection() != ConnectionState::Disconnected {
                        self.app.session.handle_disconnected();
                    }
                    self.app.status = "connection closed".to_string();
                    true
                }
                LoopEvent::TelemetryTick => {
                    if self.app.session.connection() == ConnectionState::Connected {
                        self.app.session.request_telemetry();
                    }
                    false
                }
            };

            self.flush_outbound();
        }
    }

    /// Returns `None` for events that need no redraw.
    fn handle_terminal_event(&mut self, event: Event) -> Option<RuntimeControl> {
        match event {
            Event::Key(key) if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) => {
                Some(dispatch_key_event(&mut self.app, &self.options, key))
            }
            Event::Key(_) | Event::Mouse(_) => None,
            Event::Paste(pasted) => {
                self.app.paste(&pasted);
                Some(RuntimeControl::Continue)
            }
            Event::Resize(_, _) | Event::FocusGained | Event::FocusLost => {
                Some(RuntimeControl::Continue)
            }
        }
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.app.status.clear();
                self.app.session.handle_connected();
            }
            TransportEvent::Message(message) => {
                debug!(event = message.event_name(), "inbound message");
                self.app.apply_inbound(message);
            }
            TransportEvent::Disconnected => self.app.session.handle_disconnected(),
        }
    }

    fn flush_outbound(&mut self) {
        for message in self.app.session.take_outbound() {
            if let Err(error) = self.transport.send(message) {
                warn!(%error, "send to terminal server failed");
                self.app.status = format!("send failed: {error}");
            }
        }
    }

    fn draw_ui(&mut self) -> Result<(), String> {
        let app = &self.app;
        let options = &self.options;
        self.terminal
            .draw(|frame| render_ui(frame, app, options))
            .map(|_| ())
            .map_err(|error| format!("draw UI failed: {error}"))
    }
}

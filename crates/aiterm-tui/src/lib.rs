use aiterm_session::{
    ConnectionState, HistoryDirection, InboundMessage, SessionController, SessionPhase,
    SuggestionOverlay,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

pub mod backend;
mod constants;
pub mod keybindings;
pub mod options;
mod runtime;
mod terminal;
pub mod theme;
mod view;

pub use backend::{SessionTransport, TransportEvent, TransportFuture};
pub use keybindings::{KeyBinding, TuiKeyBindings, parse_key_id, parse_key_list};
pub use options::TuiOptions;
pub use theme::TuiTheme;

use constants::{
    EMPTY_HISTORY_HINT, HISTORY_PANEL_WIDTH_PERCENT, INPUT_AREA_HEIGHT, OVERLAY_MAX_ITEMS,
    PAGE_SCROLL_LINES, PROPOSAL_HINT, STATUS_BAR_HEIGHT,
};
use keybindings::{keybinding_label, matches_keybinding};
use runtime::TuiRuntime;
use view::{flatten_scrollback, visible_scrollback_rows};

/// Runs the full-screen terminal UI until the user quits or the terminal
/// event stream ends.
pub async fn run_tui<T: SessionTransport>(
    transport: &mut T,
    session: SessionController,
    options: TuiOptions,
) -> Result<(), String> {
    let mut runtime = TuiRuntime::new(transport, session, options)?;
    runtime.run().await
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RuntimeControl {
    Continue,
    Exit,
}

struct TuiApp {
    session: SessionController,
    show_help: bool,
    scroll_from_bottom: usize,
    history_selected: usize,
    status: String,
}

impl TuiApp {
    fn new(session: SessionController, initial_help: bool) -> Self {
        Self {
            session,
            show_help: initial_help,
            scroll_from_bottom: 0,
            history_selected: 0,
            status: String::new(),
        }
    }

    fn scroll_up(&mut self, rows: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(rows);
    }

    fn scroll_down(&mut self, rows: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(rows);
    }

    fn toggle_history_panel(&mut self) {
        if self.session.toggle_history_panel() {
            self.history_selected = self.session.history().len().saturating_sub(1);
        }
    }

    fn apply_inbound(&mut self, message: InboundMessage) {
        let replaces_history = matches!(message, InboundMessage::CommandHistory(_));
        self.session.apply_inbound(message);
        if replaces_history && self.session.history_panel_open() {
            self.history_selected = self.session.history().len().saturating_sub(1);
        }
    }

    fn move_history_selection(&mut self, direction: HistoryDirection) {
        let len = self.session.history().len();
        if len == 0 {
            return;
        }
        self.history_selected = match direction {
            HistoryDirection::Older => self.history_selected.saturating_sub(1),
            HistoryDirection::Newer => (self.history_selected + 1).min(len - 1),
        };
    }

    fn paste(&mut self, pasted: &str) {
        let single_line = pasted
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join(" ");
        self.session.insert_text(&single_line);
    }
}

fn dispatch_key_event(app: &mut TuiApp, options: &TuiOptions, key: KeyEvent) -> RuntimeControl {
    let bindings = &options.keybindings;
    if matches_keybinding(&bindings.quit, key) {
        return RuntimeControl::Exit;
    }

    if app.show_help {
        if matches_keybinding(&bindings.show_help, key)
            || matches_keybinding(&bindings.clear_input, key)
        {
            app.show_help = false;
        }
        return RuntimeControl::Continue;
    }

    if app.session.history_panel_open() && handle_history_panel_key(app, options, key) {
        return RuntimeControl::Continue;
    }

    if matches_keybinding(&bindings.confirm_proposal, key) {
        if app.session.confirm_proposal() {
            app.scroll_from_bottom = 0;
            app.status = "proposal executed".to_string();
        }
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.cancel_proposal, key) {
        if app.session.cancel_proposal() {
            app.status = "proposal cancelled".to_string();
        }
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.accept_suggestion, key) {
        app.session.accept_suggestion();
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.suggestion_next, key) {
        app.session.select_next_suggestion();
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.suggestion_prev, key) {
        app.session.select_previous_suggestion();
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.submit, key) {
        app.session.submit();
        app.scroll_from_bottom = 0;
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.history_prev, key) {
        app.session.navigate_history(HistoryDirection::Older);
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.history_next, key) {
        app.session.navigate_history(HistoryDirection::Newer);
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.complete, key) {
        app.session.complete();
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.clear_input, key) {
        app.session.clear_input();
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.clear_screen, key) {
        app.session.clear_screen();
        app.scroll_from_bottom = 0;
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.toggle_history, key) {
        app.toggle_history_panel();
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.show_help, key) {
        app.show_help = true;
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.explain, key) {
        if app.session.request_explanation() {
            app.status = "explaining command...".to_string();
        }
        return RuntimeControl::Continue;
    }
    if matches_keybinding(&bindings.interpret, key) {
        if app.session.request_interpretation() {
            app.status = "interpreting...".to_string();
        }
        return RuntimeControl::Continue;
    }

    if handle_scroll_key(app, key) {
        return RuntimeControl::Continue;
    }
    handle_editor_key_event(app, key);
    RuntimeControl::Continue
}

fn handle_history_panel_key(app: &mut TuiApp, options: &TuiOptions, key: KeyEvent) -> bool {
    let bindings = &options.keybindings;
    if matches_keybinding(&bindings.toggle_history, key)
        || matches_keybinding(&bindings.clear_input, key)
    {
        app.session.close_history_panel();
        return true;
    }
    if matches_keybinding(&bindings.history_prev, key) {
        app.move_history_selection(HistoryDirection::Older);
        return true;
    }
    if matches_keybinding(&bindings.history_next, key) {
        app.move_history_selection(HistoryDirection::Newer);
        return true;
    }
    if matches_keybinding(&bindings.submit, key) {
        app.session.recall_history_entry(app.history_selected);
        return true;
    }
    false
}

fn handle_scroll_key(app: &mut TuiApp, key: KeyEvent) -> bool {
    if key.modifiers != KeyModifiers::NONE {
        return false;
    }
    match key.code {
        KeyCode::PageUp => app.scroll_up(PAGE_SCROLL_LINES),
        KeyCode::PageDown => app.scroll_down(PAGE_SCROLL_LINES),
        _ => return false,
    }
    true
}

fn handle_editor_key_event(app: &mut TuiApp, key: KeyEvent) -> bool {
    let session = &mut app.session;
    match key.code {
        KeyCode::Left if key.modifiers == KeyModifiers::NONE => session.move_cursor_left(),
        KeyCode::Right if key.modifiers == KeyModifiers::NONE => session.move_cursor_right(),
        KeyCode::Home if key.modifiers == KeyModifiers::NONE => session.move_cursor_home(),
        KeyCode::End if key.modifiers == KeyModifiers::NONE => session.move_cursor_end(),
        KeyCode::Backspace if key.modifiers == KeyModifiers::NONE => session.backspace(),
        KeyCode::Delete if key.modifiers == KeyModifiers::NONE => session.delete_forward(),
        KeyCode::Char(ch) if is_plain_char_input(key.modifiers) => {
            session.insert_char(ch);
            true
        }
        KeyCode::Char(ch) if is_ctrl_only(key.modifiers) => match ch.to_ascii_lowercase() {
            'a' => session.move_cursor_home(),
            'u' => {
                let had_input = !session.input().is_empty();
                session.clear_input();
                had_input
            }
            _ => false,
        },
        _ => false,
    }
}

fn is_plain_char_input(modifiers: KeyModifiers) -> bool {
    !modifiers.contains(KeyModifiers::CONTROL)
        && !modifiers.contains(KeyModifiers::ALT)
        && !modifiers.contains(KeyModifiers::SUPER)
}

fn is_ctrl_only(modifiers: KeyModifiers) -> bool {
    modifiers.contains(KeyModifiers::CONTROL)
        && !modifiers.contains(KeyModifiers::ALT)
        && !modifiers.contains(KeyModifiers::SUPER)
}

fn render_ui(frame: &mut Frame, app: &TuiApp, options: &TuiOptions) {
    let overlay_height = overlay_height(app.session.overlay());
    let areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(overlay_height),
            Constraint::Length(INPUT_AREA_HEIGHT),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(frame.area());
    let (main_area, overlay_area, input_area, footer_area) =
        (areas[0], areas[1], areas[2], areas[3]);

    let (scrollback_area, history_area) = if app.session.history_panel_open() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(1),
                Constraint::Percentage(HISTORY_PANEL_WIDTH_PERCENT),
            ])
            .split(main_area);
        (columns[0], Some(columns[1]))
    } else {
        (main_area, None)
    };

    render_scrollback(frame, app, options, scrollback_area);
    if let Some(area) = history_area {
        render_history_panel(frame, app, options, area);
    }
    if overlay_height > 0 {
        render_overlay(frame, app, options, overlay_area);
    }
    render_input(frame, app, options, input_area);
    render_status_bar(frame, app, options, footer_area);

    if app.show_help {
        render_help(frame, options);
    }
}

fn render_scrollback(frame: &mut Frame, app: &TuiApp, options: &TuiOptions, area: Rect) {
    let prompt = app.session.config().prompt.as_str();
    let lines = flatten_scrollback(app.session.scrollback().entries(), prompt);
    let rows = visible_scrollback_rows(
        &lines,
        prompt,
        area.height.saturating_sub(1) as usize,
        area.width as usize,
        app.scroll_from_bottom,
        options.theme,
    );
    let scrollback = Paragraph::new(Text::from(rows))
        .block(
            Block::default()
                .borders(Borders::NONE)
                .title(scrollback_title(&options.app_name, &options.version)),
        )
        .style(options.theme.scrollback_style());
    frame.render_widget(scrollback, area);
}

fn scrollback_title(app_name: &str, version: &str) -> String {
    if version.trim().is_empty() {
        app_name.to_string()
    } else {
        format!("{app_name} v{}", version.trim())
    }
}

fn render_history_panel(frame: &mut Frame, app: &TuiApp, options: &TuiOptions, area: Rect) {
    let entries = app.session.history().entries();
    let lines = if entries.is_empty() {
        vec![Line::from(EMPTY_HISTORY_HINT)]
    } else {
        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let label = format!("{:>3}. {entry}", index + 1);
                if index == app.history_selected {
                    Line::from(Span::styled(label, options.theme.suggestion_selected_style()))
                } else {
                    Line::from(label)
                }
            })
            .collect()
    };

    let visible = area.height.saturating_sub(2) as usize;
    let offset = (app.history_selected + 1).saturating_sub(visible);
    let panel = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .title("History")
                .borders(Borders::ALL)
                .border_style(options.theme.overlay_border_style()),
        )
        .scroll((offset.min(u16::MAX as usize) as u16, 0))
        .style(options.theme.scrollback_style());
    frame.render_widget(Clear, area);
    frame.render_widget(panel, area);
}

fn overlay_height(overlay: &SuggestionOverlay) -> u16 {
    match overlay {
        SuggestionOverlay::None => 0,
        SuggestionOverlay::Suggestions(list) => {
            (list.items().len().min(OVERLAY_MAX_ITEMS) + 2) as u16
        }
        SuggestionOverlay::Proposal(_) => 4,
    }
}

fn render_overlay(frame: &mut Frame, app: &TuiApp, options: &TuiOptions, area: Rect) {
    let theme = options.theme;
    let (title, lines) = match app.session.overlay() {
        SuggestionOverlay::None => return,
        SuggestionOverlay::Suggestions(list) => {
            let selected = list.selected_index();
            let start = (selected + 1).saturating_sub(OVERLAY_MAX_ITEMS);
            let lines = list
                .items()
                .iter()
                .enumerate()
                .skip(start)
                .take(OVERLAY_MAX_ITEMS)
                .map(|(index, item)| {
                    if index == selected {
                        Line::from(Span::styled(
                            format!("> {item}"),
                            theme.suggestion_selected_style(),
                        ))
                    } else {
                        Line::from(format!("  {item}"))
                    }
                })
                .collect::<Vec<_>>();
            ("AI Suggestions", lines)
        }
        SuggestionOverlay::Proposal(proposal) => {
            let lines = vec![
                Line::from(vec![
                    Span::raw(format!("{} → ", proposal.original)),
                    Span::styled(proposal.proposed.clone(), theme.proposal_style()),
                ]),
                Line::from(format!(
                    "{PROPOSAL_HINT} {} execute, {} cancel",
                    keybinding_label(&options.keybindings.confirm_proposal),
                    keybinding_label(&options.keybindings.cancel_proposal)
                )),
            ];
            ("AI Proposal", lines)
        }
    };

    let overlay = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(theme.overlay_border_style()),
        )
        .style(theme.scrollback_style());
    frame.render_widget(overlay, area);
}

fn render_input(frame: &mut Frame, app: &TuiApp, options: &TuiOptions, area: Rect) {
    let prompt = format!("{} ", app.session.config().prompt);
    let input = app.session.input();
    let before_cursor = input
        .text()
        .chars()
        .take(input.cursor())
        .collect::<String>();
    let cursor_col = UnicodeWidthStr::width(prompt.as_str())
        + UnicodeWidthStr::width(before_cursor.as_str());
    let width = area.width as usize;
    let scroll = if width == 0 {
        0
    } else {
        cursor_col.saturating_sub(width.saturating_sub(1))
    };

    let line = Line::from(vec![
        Span::styled(prompt, options.theme.prompt_style()),
        Span::raw(input.text().to_string()),
    ]);
    let paragraph = Paragraph::new(line)
        .block(
            Block::default()
                .borders(Borders::TOP | Borders::BOTTOM)
                .border_style(options.theme.input_border_style()),
        )
        .scroll((0, scroll.min(u16::MAX as usize) as u16))
        .style(options.theme.input_style());
    frame.render_widget(paragraph, area);

    if !app.show_help && area.height >= 2 {
        let x = area.x.saturating_add((cursor_col - scroll).min(u16::MAX as usize) as u16);
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn connection_label(connection: ConnectionState) -> &'static str {
    match connection {
        ConnectionState::Connecting => "◌ connecting",
        ConnectionState::Connected => "● connected",
        ConnectionState::Disconnected => "○ disconnected",
    }
}

fn phase_label(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Idle => "ready",
        SessionPhase::Composing => "composing",
        SessionPhase::AwaitingResult => "running",
    }
}

fn status_left_text(app: &TuiApp, options: &TuiOptions) -> String {
    let mut parts = vec![connection_label(app.session.connection()).to_string()];
    if !options.server_label.is_empty() {
        parts.push(options.server_label.clone());
    }
    parts.push(phase_label(app.session.phase()).to_string());
    if !app.status.is_empty() {
        parts.push(app.status.clone());
    }
    parts.join(" | ")
}

fn status_right_text(app: &TuiApp) -> String {
    app.session
        .stats()
        .map(|stats| stats.summary())
        .unwrap_or_else(|| "CPU: --  RAM: --  Disk: --".to_string())
}

fn render_status_bar(frame: &mut Frame, app: &TuiApp, options: &TuiOptions, area: Rect) {
    let theme = options.theme;
    let left = status_left_text(app, options);
    let right = status_right_text(app);
    let connection_style = match app.session.connection() {
        ConnectionState::Connected => theme.connected_style(),
        ConnectionState::Connecting | ConnectionState::Disconnected => theme.disconnected_style(),
    };

    let label = connection_label(app.session.connection());
    let rest = left.strip_prefix(label).unwrap_or(left.as_str()).to_string();
    let width = area.width as usize;
    let used = UnicodeWidthStr::width(left.as_str()) + UnicodeWidthStr::width(right.as_str());
    let gap = if used >= width { 1 } else { width - used };

    let line = Line::from(vec![
        Span::styled(label.to_string(), connection_style),
        Span::raw(rest),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default()),
    ]);
    frame.render_widget(Paragraph::new(line).style(theme.footer_style()), area);
}

fn help_lines(options: &TuiOptions) -> Vec<Line<'static>> {
    let bindings = &options.keybindings;
    let entries = [
        (&bindings.submit, "run command"),
        (&bindings.history_prev, "previous command"),
        (&bindings.history_next, "next command"),
        (&bindings.complete, "complete command"),
        (&bindings.clear_input, "clear input"),
        (&bindings.clear_screen, "clear screen"),
        (&bindings.toggle_history, "toggle history panel"),
        (&bindings.suggestion_next, "next suggestion"),
        (&bindings.suggestion_prev, "previous suggestion"),
        (&bindings.accept_suggestion, "use suggestion"),
        (&bindings.confirm_proposal, "execute AI proposal"),
        (&bindings.cancel_proposal, "cancel AI proposal"),
        (&bindings.explain, "explain command"),
        (&bindings.interpret, "interpret natural language"),
        (&bindings.show_help, "toggle help"),
        (&bindings.quit, "quit"),
    ];

    let mut lines = vec![Line::from("Keybindings")];
    lines.extend(entries.iter().map(|(keys, description)| {
        Line::from(format!("  {:<24} {description}", keybinding_label(keys)))
    }));
    lines.push(Line::from(""));
    lines.push(Line::from("  PageUp / PageDown scroll output"));
    lines.push(Line::from(""));
    lines.push(Line::from("Use help or escape key to close help."));
    lines
}

fn render_help(frame: &mut Frame, options: &TuiOptions) {
    let popup = centered_rect(80, 60, frame.area());
    frame.render_widget(Clear, popup);
    let help = Paragraph::new(Text::from(help_lines(options)))
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(options.theme.help_border_style()),
        )
        .style(options.theme.scrollback_style())
        .wrap(Wrap { trim: false });
    frame.render_widget(help, popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

#[cfg(test)]
#[path = "../tests/unit/lib_unit.rs"]
mod tests;

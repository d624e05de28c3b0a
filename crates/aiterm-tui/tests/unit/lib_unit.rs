use aiterm_session::protocol::{AiInterpretation, AiSuggestions, CommandHistory, SystemInfo};
use aiterm_session::{InboundMessage, OutboundMessage, SessionConfig};
use ratatui::Terminal;
use ratatui::backend::TestBackend;

use super::*;

fn app() -> TuiApp {
    TuiApp::new(SessionController::new(SessionConfig::default()), false)
}

fn press(app: &mut TuiApp, code: KeyCode, modifiers: KeyModifiers) -> RuntimeControl {
    dispatch_key_event(app, &TuiOptions::default(), KeyEvent::new(code, modifiers))
}

fn type_text(app: &mut TuiApp, text: &str) {
    for ch in text.chars() {
        press(app, KeyCode::Char(ch), KeyModifiers::NONE);
    }
}

fn rendered_text(app: &TuiApp, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("test terminal");
    terminal
        .draw(|frame| render_ui(frame, app, &TuiOptions::default()))
        .expect("draw should succeed");
    let buffer = terminal.backend().buffer();
    let mut text = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            text.push_str(buffer[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}

fn proposal(app: &mut TuiApp) {
    app.session
        .apply_inbound(InboundMessage::AiInterpretation(AiInterpretation {
            original: "lst files".to_string(),
            command: "ls -la".to_string(),
            confidence: 0.9,
            method: None,
            request_id: None,
        }));
}

#[test]
fn quit_key_exits() {
    let mut app = app();
    assert_eq!(
        press(&mut app, KeyCode::Char('d'), KeyModifiers::CONTROL),
        RuntimeControl::Exit
    );
}

#[test]
fn typing_and_enter_queue_command() {
    let mut app = app();
    type_text(&mut app, "ls");
    app.scroll_up(4);
    press(&mut app, KeyCode::Enter, KeyModifiers::NONE);

    let commands = app
        .session
        .take_outbound()
        .into_iter()
        .filter(|message| matches!(message, OutboundMessage::Command(_)))
        .count();
    assert_eq!(commands, 1);
    assert_eq!(app.scroll_from_bottom, 0);
    assert_eq!(app.session.phase(), SessionPhase::AwaitingResult);
}

#[test]
fn arrows_recall_history() {
    let mut app = app();
    app.session
        .apply_inbound(InboundMessage::CommandHistory(CommandHistory {
            history: vec!["pwd".to_string(), "df -h".to_string()],
        }));
    press(&mut app, KeyCode::Up, KeyModifiers::NONE);
    press(&mut app, KeyCode::Up, KeyModifiers::NONE);
    assert_eq!(app.session.input().text(), "pwd");
    press(&mut app, KeyCode::Down, KeyModifiers::NONE);
    press(&mut app, KeyCode::Down, KeyModifiers::NONE);
    assert_eq!(app.session.input().text(), "");
}

#[test]
fn proposal_keys_resolve_once() {
    let mut app = app();
    proposal(&mut app);
    press(&mut app, KeyCode::Char('y'), KeyModifiers::CONTROL);
    press(&mut app, KeyCode::Char('y'), KeyModifiers::CONTROL);
    let submitted = app
        .session
        .take_outbound()
        .into_iter()
        .filter(|message| matches!(message, OutboundMessage::Command(_)))
        .count();
    assert_eq!(submitted, 1);
    assert_eq!(app.status, "proposal executed");

    proposal(&mut app);
    press(&mut app, KeyCode::Char('x'), KeyModifiers::CONTROL);
    assert!(app.session.overlay().is_none());
    assert!(app.session.take_outbound().is_empty());
}

#[test]
fn suggestion_keys_cycle_and_accept() {
    let mut app = app();
    app.session
        .apply_inbound(InboundMessage::AiSuggestions(AiSuggestions {
            suggestions: Some(vec!["git status".to_string(), "git stash".to_string()]),
            request_id: None,
        }));
    press(&mut app, KeyCode::Char('n'), KeyModifiers::CONTROL);
    press(&mut app, KeyCode::Char(' '), KeyModifiers::CONTROL);
    assert_eq!(app.session.input().text(), "git stash");
    assert!(app.session.overlay().is_none());
}

#[test]
fn escape_clears_input_and_suggestions() {
    let mut app = app();
    type_text(&mut app, "git");
    app.session
        .apply_inbound(InboundMessage::AiSuggestions(AiSuggestions {
            suggestions: Some(vec!["git log".to_string()]),
            request_id: None,
        }));
    press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
    assert_eq!(app.session.input().text(), "");
    assert!(app.session.overlay().is_none());
}

#[test]
fn history_panel_keys_select_entry() {
    let mut app = app();
    app.session
        .apply_inbound(InboundMessage::CommandHistory(CommandHistory {
            history: vec!["ls".to_string(), "pwd".to_string(), "df".to_string()],
        }));
    press(&mut app, KeyCode::Char('h'), KeyModifiers::CONTROL);
    assert!(app.session.history_panel_open());
    assert_eq!(app.history_selected, 2);
    assert_eq!(app.session.take_outbound(), vec![OutboundMessage::GetHistory]);

    press(&mut app, KeyCode::Up, KeyModifiers::NONE);
    press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
    assert_eq!(app.session.input().text(), "pwd");
    assert!(!app.session.history_panel_open());
    assert!(app.session.take_outbound().is_empty());
}

#[test]
fn history_reply_moves_selection_to_newest_entry() {
    let mut app = app();
    app.session
        .apply_inbound(InboundMessage::CommandHistory(CommandHistory {
            history: vec!["ls".to_string()],
        }));
    press(&mut app, KeyCode::Char('h'), KeyModifiers::CONTROL);
    assert_eq!(app.history_selected, 0);

    app.apply_inbound(InboundMessage::CommandHistory(CommandHistory {
        history: vec![
            "ls".to_string(),
            "pwd".to_string(),
            "df -h".to_string(),
        ],
    }));
    assert_eq!(app.history_selected, 2);
    press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
    assert_eq!(app.session.input().text(), "df -h");
}

#[test]
fn help_popup_swallows_keys_until_closed() {
    let mut app = app();
    press(&mut app, KeyCode::F(1), KeyModifiers::NONE);
    assert!(app.show_help);
    type_text(&mut app, "ls");
    assert_eq!(app.session.input().text(), "");
    press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
    assert!(!app.show_help);
}

#[test]
fn tab_and_clear_screen_keys() {
    let mut app = app();
    type_text(&mut app, "pw");
    press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
    assert_eq!(app.session.input().text(), "pwd ");

    press(&mut app, KeyCode::Char('l'), KeyModifiers::CONTROL);
    assert_eq!(app.session.scrollback().len(), 1);
}

#[test]
fn explain_key_sets_status() {
    let mut app = app();
    type_text(&mut app, "ls -la");
    app.session.take_outbound();
    press(&mut app, KeyCode::Char('e'), KeyModifiers::CONTROL);
    assert_eq!(app.status, "explaining command...");
    assert_eq!(app.session.take_outbound().len(), 1);
}

#[test]
fn paste_joins_lines() {
    let mut app = app();
    app.paste("echo one\necho two\n");
    assert_eq!(app.session.input().text(), "echo one echo two");
}

#[test]
fn page_keys_scroll_scrollback() {
    let mut app = app();
    press(&mut app, KeyCode::PageUp, KeyModifiers::NONE);
    assert_eq!(app.scroll_from_bottom, PAGE_SCROLL_LINES);
    press(&mut app, KeyCode::PageDown, KeyModifiers::NONE);
    press(&mut app, KeyCode::PageDown, KeyModifiers::NONE);
    assert_eq!(app.scroll_from_bottom, 0);
}

#[test]
fn render_shows_prompt_status_and_stats() {
    let mut app = app();
    app.session.handle_connected();
    app.session
        .apply_inbound(InboundMessage::SystemInfo(SystemInfo {
            cpu_percent: Some(12.5),
            memory_percent: Some(40.0),
            disk_percent: Some(70.0),
            ..SystemInfo::default()
        }));
    type_text(&mut app, "whoami");

    let screen = rendered_text(&app, 100, 20);
    assert!(screen.contains("Connected to terminal server"));
    assert!(screen.contains("user@terminal:~$ whoami"));
    assert!(screen.contains("● connected"));
    assert!(screen.contains("CPU: 12.5%  RAM: 40.0%  Disk: 70.0%"));
}

#[test]
fn render_shows_proposal_overlay() {
    let mut app = app();
    proposal(&mut app);
    let screen = rendered_text(&app, 100, 20);
    assert!(screen.contains("AI Proposal"));
    assert!(screen.contains("lst files → ls -la"));
    assert!(screen.contains("Ctrl+Y execute"));
}

#[test]
fn render_shows_empty_history_hint() {
    let mut app = app();
    app.toggle_history_panel();
    let screen = rendered_text(&app, 100, 20);
    assert!(screen.contains(EMPTY_HISTORY_HINT));
}

#[test]
fn render_help_lists_bindings() {
    let mut app = app();
    app.show_help = true;
    let screen = rendered_text(&app, 120, 40);
    assert!(screen.contains("Keybindings"));
    assert!(screen.contains("execute AI proposal"));
}

#[test]
fn scrollback_title_includes_version() {
    assert_eq!(scrollback_title("aiterm", ""), "aiterm");
    assert_eq!(scrollback_title("aiterm", "0.1.0"), "aiterm v0.1.0");
}

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(ch: char) -> Self {
        Self::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    pub fn matches(self, key: KeyEvent) -> bool {
        if !codes_match(self.code, key.code) {
            return false;
        }
        normalize_modifiers(self.modifiers) == normalize_modifiers(key.modifiers)
    }
}

// Terminals disagree on the case of Ctrl+letter.
fn codes_match(expected: KeyCode, actual: KeyCode) -> bool {
    match (expected, actual) {
        (KeyCode::Char(left), KeyCode::Char(right)) => left.eq_ignore_ascii_case(&right),
        _ => expected == actual,
    }
}

fn normalize_modifiers(modifiers: KeyModifiers) -> KeyModifiers {
    let mut normalized = KeyModifiers::NONE;

    if modifiers.contains(KeyModifiers::SHIFT) {
        normalized |= KeyModifiers::SHIFT;
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        normalized |= KeyModifiers::CONTROL;
    }
    if modifiers.intersects(KeyModifiers::ALT | KeyModifiers::META) {
        normalized |= KeyModifiers::ALT;
    }
    if modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::HYPER) {
        normalized |= KeyModifiers::SUPER;
    }

    normalized
}

pub fn parse_key_id(key_id: &str) -> Option<KeyBinding> {
    let trimmed = key_id.trim().to_ascii_lowercase();
    if trimmed.is_empty() {
        return None;
    }

    let mut modifiers = KeyModifiers::NONE;
    let mut key_name = None;
    for segment in trimmed.split('+').filter(|part| !part.is_empty()) {
        match segment {
            "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "shift" => modifiers |= KeyModifiers::SHIFT,
            "alt" => modifiers |= KeyModifiers::ALT,
            "meta" | "cmd" | "super" => modifiers |= KeyModifiers::SUPER,
            other => key_name = Some(other),
        }
    }

    let code = match key_name.unwrap_or_default() {
        "enter" => KeyCode::Enter,
        "escape" | "esc" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "space" => KeyCode::Char(' '),
        name if name.len() > 1 && name.starts_with('f') => {
            let number = name[1..].parse::<u8>().ok()?;
            KeyCode::F(number)
        }
        name if name.chars().count() == 1 => {
            let ch = name.chars().next()?;
            KeyCode::Char(ch)
        }
        _ => return None,
    };

    Some(KeyBinding { code, modifiers })
}

/// Parses a comma separated list such as `"ctrl+space, alt+enter"`.
pub fn parse_key_list(key_ids: &str) -> Option<Vec<KeyBinding>> {
    key_ids
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_key_id)
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TuiKeyBindings {
    pub submit: Vec<KeyBinding>,
    pub history_prev: Vec<KeyBinding>,
    pub history_next: Vec<KeyBinding>,
    pub complete: Vec<KeyBinding>,
    pub clear_input: Vec<KeyBinding>,
    pub clear_screen: Vec<KeyBinding>,
    pub toggle_history: Vec<KeyBinding>,
    pub show_help: Vec<KeyBinding>,
    pub confirm_proposal: Vec<KeyBinding>,
    pub cancel_proposal: Vec<KeyBinding>,
    pub suggestion_next: Vec<KeyBinding>,
    pub suggestion_prev: Vec<KeyBinding>,
    pub accept_suggestion: Vec<KeyBinding>,
    pub explain: Vec<KeyBinding>,
    pub interpret: Vec<KeyBinding>,
    pub quit: Vec<KeyBinding>,
}

impl Default for TuiKeyBindings {
    fn default() -> Self {
        Self {
            submit: vec![KeyBinding::plain(KeyCode::Enter)],
            history_prev: vec![KeyBinding::plain(KeyCode::Up)],
            history_next: vec![KeyBinding::plain(KeyCode::Down)],
            complete: vec![KeyBinding::plain(KeyCode::Tab)],
            clear_input: vec![KeyBinding::plain(KeyCode::Esc)],
            clear_screen: vec![KeyBinding::ctrl('l')],
            toggle_history: vec![KeyBinding::ctrl('h')],
            show_help: vec![KeyBinding::plain(KeyCode::F(1))],
            confirm_proposal: vec![KeyBinding::ctrl('y')],
            cancel_proposal: vec![KeyBinding::ctrl('x')],
            suggestion_next: vec![KeyBinding::ctrl('n')],
            suggestion_prev: vec![KeyBinding::ctrl('p')],
            accept_suggestion: vec![
                KeyBinding::ctrl(' '),
                KeyBinding::new(KeyCode::Enter, KeyModifiers::ALT),
            ],
            explain: vec![KeyBinding::ctrl('e')],
            interpret: vec![KeyBinding::ctrl('k')],
            quit: vec![KeyBinding::ctrl('d')],
        }
    }
}

impl TuiKeyBindings {
    /// Replaces the bindings of one action by name; returns `false` for an
    /// unknown action.
    pub fn set(&mut self, action: &str, bindings: Vec<KeyBinding>) -> bool {
        let slot = match action.trim() {
            "submit" => &mut self.submit,
            "history_prev" => &mut self.history_prev,
            "history_next" => &mut self.history_next,
            "complete" => &mut self.complete,
            "clear_input" => &mut self.clear_input,
            "clear_screen" => &mut self.clear_screen,
            "toggle_history" => &mut self.toggle_history,
            "show_help" => &mut self.show_help,
            "confirm_proposal" => &mut self.confirm_proposal,
            "cancel_proposal" => &mut self.cancel_proposal,
            "suggestion_next" => &mut self.suggestion_next,
            "suggestion_prev" => &mut self.suggestion_prev,
            "accept_suggestion" => &mut self.accept_suggestion,
            "explain" => &mut self.explain,
            "interpret" => &mut self.interpret,
            "quit" => &mut self.quit,
            _ => return false,
        };
        *slot = bindings;
        true
    }
}

pub(crate) fn matches_keybinding(bindings: &[KeyBinding], key: KeyEvent) -> bool {
    bindings.iter().copied().any(|binding| binding.matches(key))
}

pub(crate) fn keybinding_label(bindings: &[KeyBinding]) -> String {
    if bindings.is_empty() {
        return "(unbound)".to_string();
    }
    bindings
        .iter()
        .copied()
        .map(format_keybinding)
        .collect::<Vec<_>>()
        .join(" / ")
}

fn format_keybinding(binding: KeyBinding) -> String {
    let mut parts = Vec::new();
    if binding.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("Ctrl".to_string());
    }
    if binding.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("Shift".to_string());
    }
    if binding.modifiers.contains(KeyModifiers::ALT) {
        parts.push("Alt".to_string());
    }
    if binding.modifiers.contains(KeyModifiers::SUPER) {
        parts.push("Meta".to_string());
    }
    parts.push(match binding.code {
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::F(number) => format!("F{number}"),
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(ch) => ch.to_ascii_uppercase().to_string(),
        _ => "Key".to_string(),
    });
    parts.join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn ctrl_letter_matches_regardless_of_case() {
        let binding = KeyBinding::ctrl('l');
        assert!(binding.matches(key(KeyCode::Char('L'), KeyModifiers::CONTROL)));
        assert!(!binding.matches(key(KeyCode::Char('l'), KeyModifiers::NONE)));
    }

    #[test]
    fn meta_is_treated_as_alt() {
        let binding = KeyBinding::new(KeyCode::Enter, KeyModifiers::ALT);
        assert!(binding.matches(key(KeyCode::Enter, KeyModifiers::META)));
    }

    #[test]
    fn parse_key_list_accepts_several_bindings() {
        let parsed = parse_key_list("ctrl+space, alt+enter").expect("list should parse");
        assert_eq!(parsed, TuiKeyBindings::default().accept_suggestion);
        assert_eq!(parse_key_list("ctrl+nope"), None);
    }

    #[test]
    fn set_rejects_unknown_actions() {
        let mut bindings = TuiKeyBindings::default();
        assert!(bindings.set("quit", vec![KeyBinding::ctrl('q')]));
        assert_eq!(bindings.quit, vec![KeyBinding::ctrl('q')]);
        assert!(!bindings.set("launch_rockets", vec![]));
    }

    #[test]
    fn labels_join_alternatives() {
        assert_eq!(
            keybinding_label(&TuiKeyBindings::default().accept_suggestion),
            "Ctrl+Space / Alt+Enter"
        );
        assert_eq!(keybinding_label(&[]), "(unbound)");
    }
}

pub const DEFAULT_PROMPT: &str = "user@terminal:~$";
pub const DEFAULT_SUGGESTION_MIN_CHARS: usize = 3;
pub const DEFAULT_PROPOSAL_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Commands offered by Tab completion.
pub const COMPLETION_COMMANDS: &[&str] = &[
    "ls", "cd", "pwd", "mkdir", "rm", "cat", "ps", "top", "df", "free", "clear", "history", "help",
];

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub prompt: String,
    /// Suggestions are requested once the input has at least this many chars.
    pub suggestion_min_chars: usize,
    /// Proposals at or below this confidence are only logged.
    pub proposal_confidence_threshold: f64,
    pub os_mode: Option<String>,
    pub completion_commands: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            suggestion_min_chars: DEFAULT_SUGGESTION_MIN_CHARS,
            proposal_confidence_threshold: DEFAULT_PROPOSAL_CONFIDENCE_THRESHOLD,
            os_mode: None,
            completion_commands: COMPLETION_COMMANDS
                .iter()
                .map(|command| command.to_string())
                .collect(),
        }
    }
}

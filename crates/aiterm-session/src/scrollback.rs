#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Plain,
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
    pub kind: LineKind,
}

impl OutputLine {
    pub fn new(text: impl Into<String>, kind: LineKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScrollbackEntry {
    /// Bare "ready" marker.
    Prompt,
    /// Prompt followed by the echoed command.
    Command(String),
    Output(OutputLine),
}

/// Append-only record of everything rendered in the session.
#[derive(Clone, Debug, Default)]
pub struct Scrollback {
    entries: Vec<ScrollbackEntry>,
}

impl Scrollback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: ScrollbackEntry) {
        self.entries.push(entry);
    }

    pub fn append_prompt(&mut self) {
        self.append(ScrollbackEntry::Prompt);
    }

    pub fn append_command(&mut self, command: &str) {
        self.append(ScrollbackEntry::Command(command.to_string()));
    }

    /// Appends one output line per `\n`-separated segment of `text`.
    pub fn append_output(&mut self, text: &str, kind: LineKind) {
        for line in text.split('\n') {
            self.append(ScrollbackEntry::Output(OutputLine::new(line, kind)));
        }
    }

    /// Drops all content and leaves a single prompt behind.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.append_prompt();
    }

    pub fn entries(&self) -> &[ScrollbackEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ScrollbackEntry> {
        self.entries.last()
    }

    pub fn output_lines(&self) -> impl Iterator<Item = &OutputLine> {
        self.entries.iter().filter_map(|entry| match entry {
            ScrollbackEntry::Output(line) => Some(line),
            _ => None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryDirection {
    /// Towards the oldest entry (Up).
    Older,
    /// Towards the fresh-typing position (Down).
    Newer,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct BrowseState {
    /// In `[0, len]`; `len` is the fresh-typing position.
    cursor: usize,
    saved_input: String,
}

/// Commands submitted during this session plus the Up/Down recall cursor.
#[derive(Clone, Debug, Default)]
pub struct HistoryStore {
    entries: Vec<String>,
    browse: Option<BrowseState>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, command: &str) {
        if command.is_empty() {
            return;
        }
        self.entries.push(command.to_string());
        self.browse = None;
    }

    /// Replaces every entry with the server's copy of the history.
    pub fn replace_all(&mut self, entries: Vec<String>) {
        self.entries = entries;
        self.browse = None;
    }

    /// Steps the recall cursor and returns the text the input line should show.
    ///
    /// The first step after fresh typing snapshots `current_input`; stepping
    /// back past the newest entry returns that snapshot. Both ends clamp.
    pub fn navigate(&mut self, direction: HistoryDirection, current_input: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let end = self.entries.len();
        let browse = self.browse.get_or_insert_with(|| BrowseState {
            cursor: end,
            saved_input: current_input.to_string(),
        });
        browse.cursor = match direction {
            HistoryDirection::Older => browse.cursor.saturating_sub(1),
            HistoryDirection::Newer => (browse.cursor + 1).min(end),
        };

        if browse.cursor == end {
            Some(browse.saved_input.as_str())
        } else {
            Some(self.entries[browse.cursor].as_str())
        }
    }

    pub fn end_browsing(&mut self) {
        self.browse = None;
    }

    pub fn is_browsing(&self) -> bool {
        self.browse.is_some()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.browse.as_ref().map(|browse| browse.cursor)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

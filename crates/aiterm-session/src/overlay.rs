/// An AI-proposed replacement command awaiting explicit confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingProposal {
    pub original: String,
    pub proposed: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestionList {
    items: Vec<String>,
    selected: usize,
}

impl SuggestionList {
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&str> {
        self.items.get(self.selected).map(String::as_str)
    }
}

/// Transient advisory surface; at most one of suggestions or a proposal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SuggestionOverlay {
    #[default]
    None,
    Suggestions(SuggestionList),
    Proposal(PendingProposal),
}

impl SuggestionOverlay {
    /// Shows a new suggestion list unless a proposal is pending.
    ///
    /// Returns `false` when the list was suppressed. An empty list tears down
    /// any list currently shown.
    pub fn show_suggestions(&mut self, items: Vec<String>) -> bool {
        if self.is_proposal() {
            return false;
        }
        *self = if items.is_empty() {
            Self::None
        } else {
            Self::Suggestions(SuggestionList { items, selected: 0 })
        };
        true
    }

    pub fn show_proposal(&mut self, proposal: PendingProposal) {
        *self = Self::Proposal(proposal);
    }

    /// Removes and returns the pending proposal; later calls get `None`.
    pub fn take_proposal(&mut self) -> Option<PendingProposal> {
        match std::mem::take(self) {
            Self::Proposal(proposal) => Some(proposal),
            other => {
                *self = other;
                None
            }
        }
    }

    /// Removes and returns the highlighted suggestion, closing the list.
    pub fn take_selected_suggestion(&mut self) -> Option<String> {
        match std::mem::take(self) {
            Self::Suggestions(mut list) if list.selected < list.items.len() => {
                Some(list.items.swap_remove(list.selected))
            }
            Self::Suggestions(_) => None,
            other => {
                *self = other;
                None
            }
        }
    }

    pub fn dismiss_suggestions(&mut self) {
        if matches!(self, Self::Suggestions(_)) {
            *self = Self::None;
        }
    }

    pub fn select_next(&mut self) -> bool {
        let Self::Suggestions(list) = self else {
            return false;
        };
        list.selected = (list.selected + 1) % list.items.len().max(1);
        true
    }

    pub fn select_previous(&mut self) -> bool {
        let Self::Suggestions(list) = self else {
            return false;
        };
        let len = list.items.len().max(1);
        list.selected = (list.selected + len - 1) % len;
        true
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn is_proposal(&self) -> bool {
        matches!(self, Self::Proposal(_))
    }

    pub fn proposal(&self) -> Option<&PendingProposal> {
        match self {
            Self::Proposal(proposal) => Some(proposal),
            _ => None,
        }
    }

    pub fn suggestions(&self) -> Option<&SuggestionList> {
        match self {
            Self::Suggestions(list) => Some(list),
            _ => None,
        }
    }
}

/// Hands out monotonically increasing request ids and recognises stale replies.
#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
    issued: u64,
    latest: Option<u64>,
}

impl RequestTracker {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.latest = Some(self.issued);
        self.issued
    }

    /// Forgets the outstanding request so any late reply is treated as stale.
    pub fn retire(&mut self) {
        self.latest = None;
    }

    /// Replies without an id cannot be correlated and are always accepted.
    pub fn accepts(&self, reply_id: Option<u64>) -> bool {
        match reply_id {
            None => true,
            Some(id) => self.latest == Some(id),
        }
    }

    pub fn latest(&self) -> Option<u64> {
        self.latest
    }
}

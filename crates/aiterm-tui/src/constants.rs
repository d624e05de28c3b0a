pub(crate) const INPUT_AREA_HEIGHT: u16 = 3;
pub(crate) const STATUS_BAR_HEIGHT: u16 = 1;
pub(crate) const OVERLAY_MAX_ITEMS: usize = 5;
pub(crate) const HISTORY_PANEL_WIDTH_PERCENT: u16 = 35;
pub(crate) const PAGE_SCROLL_LINES: usize = 10;
pub(crate) const EMPTY_HISTORY_HINT: &str = "No commands in history";
pub(crate) const PROPOSAL_HINT: &str = "Execute this command?";

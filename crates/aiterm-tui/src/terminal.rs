use std::io;

use crossterm::event::{DisableBracketedPaste, PopKeyboardEnhancementFlags};
use crossterm::execute;
use crossterm::terminal::{LeaveAlternateScreen, disable_raw_mode};

/// Undoes every terminal mode the runtime switched on, including on panic unwind.
#[derive(Default)]
pub(crate) struct TerminalRestore {
    pub(crate) keyboard_enhancement_enabled: bool,
    pub(crate) bracketed_paste_enabled: bool,
    pub(crate) alternate_screen_enabled: bool,
}

impl Drop for TerminalRestore {
    fn drop(&mut self) {
        if self.keyboard_enhancement_enabled {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
        if self.bracketed_paste_enabled {
            let _ = execute!(io::stdout(), DisableBracketedPaste);
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

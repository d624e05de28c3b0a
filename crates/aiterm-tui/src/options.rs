use std::time::Duration;

use crate::{TuiKeyBindings, TuiTheme};

pub const DEFAULT_TELEMETRY_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Clone, Debug)]
pub struct TuiOptions {
    pub app_name: String,
    pub version: String,
    pub keybindings: TuiKeyBindings,
    pub initial_help: bool,
    pub theme: TuiTheme,
    /// Shown in the status bar next to the connection state.
    pub server_label: String,
    pub telemetry_interval: Duration,
}

impl Default for TuiOptions {
    fn default() -> Self {
        Self {
            app_name: "aiterm".to_string(),
            version: String::new(),
            keybindings: TuiKeyBindings::default(),
            initial_help: false,
            theme: TuiTheme::default(),
            server_label: String::new(),
            telemetry_interval: DEFAULT_TELEMETRY_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TuiOptions;

    #[test]
    fn default_polls_telemetry_every_two_seconds() {
        let options = TuiOptions::default();
        assert_eq!(options.app_name, "aiterm");
        assert_eq!(options.telemetry_interval.as_millis(), 2000);
    }
}

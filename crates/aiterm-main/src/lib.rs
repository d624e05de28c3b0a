use std::path::PathBuf;

use aiterm_session::SessionController;
use aiterm_tui::{TuiOptions, run_tui};
use tracing::info;

pub mod config;
pub mod logging;
pub mod transport;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LogConfig};
pub use logging::init_tracing;
pub use transport::WebSocketTransport;

#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub conf_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

pub fn resolve_app_config(launch: &LaunchOptions) -> Result<AppConfig, ConfigError> {
    config::init_conf_dir(launch.conf_dir.clone());
    let path = launch
        .config_path
        .clone()
        .unwrap_or_else(config::default_config_path);
    let mut app_config = config::load_config(&path)?;
    app_config.apply_overrides(&launch.overrides)?;
    Ok(app_config)
}

pub fn build_tui_options(app_config: &AppConfig) -> TuiOptions {
    TuiOptions {
        version: env!("CARGO_PKG_VERSION").to_string(),
        keybindings: app_config.keybindings.clone(),
        theme: app_config.theme,
        server_label: app_config.server_url.clone(),
        telemetry_interval: app_config.telemetry_interval,
        ..TuiOptions::default()
    }
}

pub async fn run(launch: LaunchOptions) -> Result<(), String> {
    let app_config = resolve_app_config(&launch).map_err(|error| error.to_string())?;
    init_tracing(&app_config.log);
    info!(
        server = %app_config.server_url,
        theme = app_config.theme.name(),
        "starting aiterm"
    );

    let session = SessionController::new(app_config.session.clone());
    let options = build_tui_options(&app_config);
    let mut transport =
        WebSocketTransport::spawn(app_config.server_url.clone(), app_config.reconnect_delay);
    let result = run_tui(&mut transport, session, options).await;
    info!(ok = result.is_ok(), "aiterm stopped");
    result
}

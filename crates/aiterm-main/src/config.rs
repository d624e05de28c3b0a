use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use aiterm_session::SessionConfig;
use aiterm_tui::{TuiKeyBindings, TuiTheme, parse_key_list};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONF_DIR_NAME: &str = ".aiterm";
const CONFIG_FILE_NAME: &str = "aiterm.toml";
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:5000/ws";
const DEFAULT_TELEMETRY_INTERVAL_MS: u64 = 2000;
const DEFAULT_RECONNECT_DELAY_MS: u64 = 2000;
const DEFAULT_LOG_FILE_NAME: &str = "aiterm.log";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_ROTATE_SIZE_MB: u64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {} failed: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse {} failed: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid {field}: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub file_path: PathBuf,
    pub level: String,
    pub rotate_size_bytes: u64,
    pub stderr: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_url: String,
    pub reconnect_delay: Duration,
    pub telemetry_interval: Duration,
    pub session: SessionConfig,
    pub theme: TuiTheme,
    pub keybindings: TuiKeyBindings,
    pub log: LogConfig,
}

/// Values given on the command line; they win over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub theme: Option<String>,
    pub os_mode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AitermTomlFile {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    session: SessionSection,
    #[serde(default)]
    tui: TuiSection,
    #[serde(default)]
    log: LogSection,
    #[serde(default)]
    env: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ServerSection {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    reconnect_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SessionSection {
    #[serde(default)]
    telemetry_interval_ms: Option<u64>,
    #[serde(default)]
    suggestion_min_chars: Option<usize>,
    #[serde(default)]
    proposal_confidence_threshold: Option<f64>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    os_mode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TuiSection {
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    keybindings: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LogSection {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    rotate_size_mb: Option<u64>,
    #[serde(default)]
    stderr: Option<bool>,
}

static CONF_DIR: OnceLock<PathBuf> = OnceLock::new();

pub fn init_conf_dir(conf_dir: Option<PathBuf>) {
    let resolved = conf_dir
        .as_deref()
        .map(expand_path_with_home)
        .unwrap_or_else(default_conf_dir);
    let _ = CONF_DIR.set(resolved);
}

pub fn current_conf_dir() -> PathBuf {
    CONF_DIR.get().cloned().unwrap_or_else(default_conf_dir)
}

fn default_conf_dir() -> PathBuf {
    home_dir().join(DEFAULT_CONF_DIR_NAME)
}

pub fn default_config_path() -> PathBuf {
    current_conf_dir().join(CONFIG_FILE_NAME)
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn expand_path_with_home(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    if raw == "~" {
        return home_dir();
    }
    if let Some(suffix) = raw.strip_prefix("~/") {
        return home_dir().join(suffix);
    }
    path.to_path_buf()
}

/// Loads `path`; a missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return parse_config("", path);
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, path)
}

pub fn parse_config(content: &str, path: &Path) -> Result<AppConfig, ConfigError> {
    let parsed: AitermTomlFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    build_app_config(parsed)
}

fn build_app_config(file: AitermTomlFile) -> Result<AppConfig, ConfigError> {
    let env_map = &file.env;
    let server_url = file
        .server
        .url
        .as_deref()
        .and_then(|value| resolve_config_value(value, env_map))
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    validate_server_url(&server_url)?;

    let telemetry_interval_ms = file
        .session
        .telemetry_interval_ms
        .unwrap_or(DEFAULT_TELEMETRY_INTERVAL_MS);
    if telemetry_interval_ms == 0 {
        return Err(ConfigError::invalid(
            "session.telemetry_interval_ms",
            "must be greater than zero",
        ));
    }

    let mut session = SessionConfig::default();
    if let Some(min_chars) = file.session.suggestion_min_chars {
        session.suggestion_min_chars = min_chars;
    }
    if let Some(threshold) = file.session.proposal_confidence_threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::invalid(
                "session.proposal_confidence_threshold",
                format!("{threshold} is outside [0, 1]"),
            ));
        }
        session.proposal_confidence_threshold = threshold;
    }
    if let Some(prompt) = file
        .session
        .prompt
        .filter(|prompt| !prompt.trim().is_empty())
    {
        session.prompt = prompt;
    }
    session.os_mode = file
        .session
        .os_mode
        .as_deref()
        .and_then(|value| resolve_config_value(value, env_map));

    let theme = match file.tui.theme.as_deref() {
        Some(name) => TuiTheme::from_name(name)
            .ok_or_else(|| ConfigError::invalid("tui.theme", format!("unknown theme '{name}'")))?,
        None => TuiTheme::default(),
    };

    let mut keybindings = TuiKeyBindings::default();
    for (action, keys) in &file.tui.keybindings {
        let bindings = parse_key_list(keys).ok_or_else(|| {
            ConfigError::invalid(
                format!("tui.keybindings.{action}"),
                format!("cannot parse '{keys}'"),
            )
        })?;
        if !keybindings.set(action, bindings) {
            return Err(ConfigError::invalid(
                format!("tui.keybindings.{action}"),
                "unknown action",
            ));
        }
    }

    Ok(AppConfig {
        server_url,
        reconnect_delay: Duration::from_millis(
            file.server
                .reconnect_delay_ms
                .unwrap_or(DEFAULT_RECONNECT_DELAY_MS),
        ),
        telemetry_interval: Duration::from_millis(telemetry_interval_ms),
        session,
        theme,
        keybindings,
        log: build_log_config(&file.log, env_map),
    })
}

fn build_log_config(log: &LogSection, env_map: &HashMap<String, String>) -> LogConfig {
    let file_path = log
        .path
        .as_deref()
        .and_then(|value| resolve_config_value(value, env_map))
        .map(|value| expand_path_with_home(Path::new(value.trim())))
        .unwrap_or_else(|| current_conf_dir().join("logs").join(DEFAULT_LOG_FILE_NAME));
    let level = log
        .level
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .to_string();
    let rotate_size_mb = log
        .rotate_size_mb
        .unwrap_or(DEFAULT_LOG_ROTATE_SIZE_MB)
        .max(1);

    LogConfig {
        file_path,
        level,
        rotate_size_bytes: rotate_size_mb * 1024 * 1024,
        stderr: log.stderr.unwrap_or(false),
    }
}

/// `$NAME` reads from the `[env]` table first, then the process environment.
fn resolve_config_value(value: &str, env_map: &HashMap<String, String>) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(env_key) = trimmed.strip_prefix('$') {
        return env_map
            .get(env_key)
            .cloned()
            .or_else(|| std::env::var(env_key).ok())
            .filter(|resolved| !resolved.trim().is_empty());
    }
    Some(trimmed.to_string())
}

fn validate_server_url(url: &str) -> Result<(), ConfigError> {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            "server.url",
            format!("'{url}' must start with ws:// or wss://"),
        ))
    }
}

impl AppConfig {
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(url) = overrides.server_url.as_deref() {
            validate_server_url(url)?;
            self.server_url = url.to_string();
        }
        if let Some(name) = overrides.theme.as_deref() {
            self.theme = TuiTheme::from_name(name)
                .ok_or_else(|| ConfigError::invalid("--theme", format!("unknown theme '{name}'")))?;
        }
        if let Some(os_mode) = overrides.os_mode.as_deref() {
            let os_mode = os_mode.trim();
            self.session.os_mode = (!os_mode.is_empty()).then(|| os_mode.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use aiterm_tui::KeyBinding;

    use super::*;

    fn parse(content: &str) -> Result<AppConfig, ConfigError> {
        parse_config(content, Path::new("aiterm.toml"))
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse("").expect("defaults");
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.telemetry_interval, Duration::from_millis(2000));
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.theme, TuiTheme::Dark);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.rotate_size_bytes, 100 * 1024 * 1024);
        assert!(config.log.file_path.ends_with("logs/aiterm.log"));
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse(
            r#"
            [server]
            url = "ws://10.0.0.2:5000/ws"
            reconnect_delay_ms = 500

            [session]
            telemetry_interval_ms = 5000
            suggestion_min_chars = 2
            proposal_confidence_threshold = 0.75
            prompt = "ops@box:~$"
            os_mode = "linux"

            [tui]
            theme = "light"

            [tui.keybindings]
            quit = "ctrl+q"

            [log]
            path = "/tmp/aiterm-test/aiterm.log"
            level = "debug"
            rotate_size_mb = 0
            stderr = true
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.server_url, "ws://10.0.0.2:5000/ws");
        assert_eq!(config.reconnect_delay, Duration::from_millis(500));
        assert_eq!(config.telemetry_interval, Duration::from_millis(5000));
        assert_eq!(config.session.suggestion_min_chars, 2);
        assert_eq!(config.session.proposal_confidence_threshold, 0.75);
        assert_eq!(config.session.prompt, "ops@box:~$");
        assert_eq!(config.session.os_mode.as_deref(), Some("linux"));
        assert_eq!(config.theme, TuiTheme::Light);
        assert_eq!(config.keybindings.quit, vec![KeyBinding::ctrl('q')]);
        assert_eq!(
            config.log.file_path,
            PathBuf::from("/tmp/aiterm-test/aiterm.log")
        );
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.rotate_size_bytes, 1024 * 1024);
        assert!(config.log.stderr);
    }

    #[test]
    fn server_url_resolves_from_env_table() {
        let config = parse(
            r#"
            [server]
            url = "$AITERM_TEST_SERVER"

            [env]
            AITERM_TEST_SERVER = "ws://example.internal/ws"
            "#,
        )
        .expect("config should parse");
        assert_eq!(config.server_url, "ws://example.internal/ws");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            ("[server]\nurl = \"http://localhost\"", "server.url"),
            ("[session]\ntelemetry_interval_ms = 0", "session.telemetry_interval_ms"),
            (
                "[session]\nproposal_confidence_threshold = 1.5",
                "session.proposal_confidence_threshold",
            ),
            ("[tui]\ntheme = \"neon\"", "tui.theme"),
            ("[tui.keybindings]\nlaunch = \"ctrl+l\"", "tui.keybindings.launch"),
            ("[tui.keybindings]\nquit = \"ctrl+\"", "tui.keybindings.quit"),
        ];
        for (content, expected_field) in cases {
            match parse(content) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected_field),
                other => panic!("expected invalid {expected_field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let error = parse("[server\nurl = 1").expect_err("parse should fail");
        assert!(matches!(error, ConfigError::Parse { .. }));
        assert!(error.to_string().starts_with("parse aiterm.toml failed"));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config = parse("[session]\nos_mode = \"linux\"").expect("config should parse");
        config
            .apply_overrides(&ConfigOverrides {
                server_url: Some("wss://remote.example/ws".to_string()),
                theme: Some("light".to_string()),
                os_mode: Some("windows".to_string()),
            })
            .expect("overrides should apply");
        assert_eq!(config.server_url, "wss://remote.example/ws");
        assert_eq!(config.theme, TuiTheme::Light);
        assert_eq!(config.session.os_mode.as_deref(), Some("windows"));

        let error = config
            .apply_overrides(&ConfigOverrides {
                server_url: Some("localhost:5000".to_string()),
                ..ConfigOverrides::default()
            })
            .expect_err("bad url");
        assert!(error.to_string().contains("server.url"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = load_config(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
    }
}

use std::sync::OnceLock;

use aiterm_session::LineKind;
use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

const DARK_THEME_JSON: &str = include_str!("../themes/dark.json");
const LIGHT_THEME_JSON: &str = include_str!("../themes/light.json");

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TuiTheme {
    #[default]
    Dark,
    Light,
}

impl TuiTheme {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    fn palette(self) -> &'static ThemePalette {
        static DARK: OnceLock<ThemePalette> = OnceLock::new();
        static LIGHT: OnceLock<ThemePalette> = OnceLock::new();

        match self {
            Self::Dark => DARK.get_or_init(|| {
                ThemePalette::from_json(self.name(), DARK_THEME_JSON)
                    .unwrap_or_else(|error| panic!("load built-in dark theme failed: {error}"))
            }),
            Self::Light => LIGHT.get_or_init(|| {
                ThemePalette::from_json(self.name(), LIGHT_THEME_JSON)
                    .unwrap_or_else(|error| panic!("load built-in light theme failed: {error}"))
            }),
        }
    }

    pub(crate) fn scrollback_style(self) -> Style {
        let colors = &self.palette().colors;
        Style::default().fg(colors.scrollback_fg).bg(colors.scrollback_bg)
    }

    pub(crate) fn prompt_style(self) -> Style {
        Style::default()
            .fg(self.palette().colors.prompt_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn command_style(self) -> Style {
        Style::default().fg(self.palette().colors.command_fg)
    }

    pub(crate) fn line_style(self, kind: LineKind) -> Style {
        let colors = &self.palette().colors;
        match kind {
            LineKind::Plain => Style::default(),
            LineKind::Success => Style::default().fg(colors.success_fg),
            LineKind::Error => Style::default().fg(colors.error_fg),
            LineKind::Info => Style::default()
                .fg(colors.info_fg)
                .add_modifier(Modifier::ITALIC),
        }
    }

    pub(crate) fn input_style(self) -> Style {
        let colors = &self.palette().colors;
        Style::default().fg(colors.input_fg).bg(colors.scrollback_bg)
    }

    pub(crate) fn input_border_style(self) -> Style {
        Style::default().fg(self.palette().colors.input_border)
    }

    pub(crate) fn footer_style(self) -> Style {
        let colors = &self.palette().colors;
        Style::default().fg(colors.footer_fg).bg(colors.footer_bg)
    }

    pub(crate) fn connected_style(self) -> Style {
        Style::default().fg(self.palette().colors.connected_fg)
    }

    pub(crate) fn disconnected_style(self) -> Style {
        Style::default().fg(self.palette().colors.disconnected_fg)
    }

    pub(crate) fn overlay_border_style(self) -> Style {
        Style::default().fg(self.palette().colors.overlay_border)
    }

    pub(crate) fn suggestion_selected_style(self) -> Style {
        let colors = &self.palette().colors;
        Style::default()
            .fg(colors.suggestion_selected_fg)
            .bg(colors.suggestion_selected_bg)
    }

    pub(crate) fn proposal_style(self) -> Style {
        Style::default()
            .fg(self.palette().colors.proposal_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn help_border_style(self) -> Style {
        match self.palette().colors.help_border {
            Some(color) => Style::default().fg(color),
            None => Style::default(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ThemeColors {
    scrollback_fg: Color,
    scrollback_bg: Color,
    prompt_fg: Color,
    command_fg: Color,
    success_fg: Color,
    error_fg: Color,
    info_fg: Color,
    input_fg: Color,
    input_border: Color,
    footer_fg: Color,
    footer_bg: Color,
    connected_fg: Color,
    disconnected_fg: Color,
    overlay_border: Color,
    suggestion_selected_fg: Color,
    suggestion_selected_bg: Color,
    proposal_fg: Color,
    help_border: Option<Color>,
}

#[derive(Clone, Debug)]
struct ThemePalette {
    colors: ThemeColors,
}

impl ThemePalette {
    fn from_json(expected_name: &str, raw_json: &str) -> Result<Self, String> {
        let parsed: ThemeFile = serde_json::from_str(raw_json)
            .map_err(|error| format!("invalid theme json: {error}"))?;
        let ThemeFile { name, colors } = parsed;

        if name.trim().to_ascii_lowercase() != expected_name {
            return Err(format!(
                "theme name mismatch, expected '{expected_name}' got '{name}'"
            ));
        }

        let field = |label: &str, value: &str| {
            parse_color(value).map_err(|error| format!("invalid {label}: {error}"))
        };

        let scrollback_fg = field("scrollbackFg", &colors.scrollback_fg)?;
        let scrollback_bg = field("scrollbackBg", &colors.scrollback_bg)?;
        let footer_fg = field("footerFg", &colors.footer_fg)?;
        let input_fg = colors
            .input_fg
            .as_deref()
            .map(|value| field("inputFg", value))
            .transpose()?
            .unwrap_or(scrollback_fg);
        let help_border = colors
            .help_border
            .as_deref()
            .map(|value| field("helpBorder", value))
            .transpose()?;
        let overlay_border = colors
            .overlay_border
            .as_deref()
            .map(|value| field("overlayBorder", value))
            .transpose()?
            .unwrap_or(footer_fg);

        Ok(Self {
            colors: ThemeColors {
                scrollback_fg,
                scrollback_bg,
                prompt_fg: field("promptFg", &colors.prompt_fg)?,
                command_fg: field("commandFg", &colors.command_fg)?,
                success_fg: field("successFg", &colors.success_fg)?,
                error_fg: field("errorFg", &colors.error_fg)?,
                info_fg: field("infoFg", &colors.info_fg)?,
                input_fg,
                input_border: field("inputBorder", &colors.input_border)?,
                footer_fg,
                footer_bg: field("footerBg", &colors.footer_bg)?,
                connected_fg: field("connectedFg", &colors.connected_fg)?,
                disconnected_fg: field("disconnectedFg", &colors.disconnected_fg)?,
                overlay_border,
                suggestion_selected_fg: field(
                    "suggestionSelectedFg",
                    &colors.suggestion_selected_fg,
                )?,
                suggestion_selected_bg: field(
                    "suggestionSelectedBg",
                    &colors.suggestion_selected_bg,
                )?,
                proposal_fg: field("proposalFg", &colors.proposal_fg)?,
                help_border,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct ThemeFile {
    name: String,
    colors: ThemeFileColors,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeFileColors {
    scrollback_fg: String,
    scrollback_bg: String,
    prompt_fg: String,
    command_fg: String,
    success_fg: String,
    error_fg: String,
    info_fg: String,
    input_fg: Option<String>,
    input_border: String,
    footer_fg: String,
    footer_bg: String,
    connected_fg: String,
    disconnected_fg: String,
    overlay_border: Option<String>,
    suggestion_selected_fg: String,
    suggestion_selected_bg: String,
    proposal_fg: String,
    help_border: Option<String>,
}

fn parse_color(raw: &str) -> Result<Color, String> {
    let normalized = raw.trim();
    if normalized.is_empty() {
        return Err("empty color value".to_string());
    }

    if let Some(hex) = normalized.strip_prefix('#') {
        return parse_hex_color(hex);
    }

    match normalized.to_ascii_lowercase().as_str() {
        "black" => Ok(Color::Black),
        "white" => Ok(Color::White),
        "green" => Ok(Color::Green),
        "darkgray" | "dark_gray" => Ok(Color::DarkGray),
        "gray" => Ok(Color::Gray),
        "red" => Ok(Color::Red),
        "yellow" => Ok(Color::Yellow),
        "blue" => Ok(Color::Blue),
        "cyan" => Ok(Color::Cyan),
        "magenta" => Ok(Color::Magenta),
        "lightyellow" | "light_yellow" => Ok(Color::LightYellow),
        other => Err(format!("unsupported named color '{other}'")),
    }
}

fn parse_hex_color(hex: &str) -> Result<Color, String> {
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("expected 6 hex digits, got '{hex}'"));
    }

    let channel = |range: std::ops::Range<usize>, label: &str| {
        u8::from_str_radix(&hex[range.clone()], 16)
            .map_err(|error| format!("invalid {label} channel '{}': {error}", &hex[range]))
    };
    Ok(Color::Rgb(
        channel(0..2, "red")?,
        channel(2..4, "green")?,
        channel(4..6, "blue")?,
    ))
}

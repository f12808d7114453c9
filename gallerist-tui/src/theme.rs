use ratatui::style::Color;
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TuiTheme {
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub border_fg: Color,
    pub help_fg: Color,
    pub checked_fg: Color,
}

impl Default for TuiTheme {
    fn default() -> Self {
        Self {
            highlight_fg: Color::Black,
            highlight_bg: Color::Cyan,
            border_fg: Color::Gray,
            help_fg: Color::Yellow,
            checked_fg: Color::Green,
        }
    }
}

#[derive(Deserialize)]
struct RawTheme {
    highlight_fg: Option<String>,
    highlight_bg: Option<String>,
    border_fg: Option<String>,
    help_fg: Option<String>,
    checked_fg: Option<String>,
}

pub fn load_tui_theme(dir: &Path) -> TuiTheme {
    let path = dir.join("theme.toml");
    std::fs::read_to_string(&path)
        .ok()
        .and_then(|s| toml::from_str::<RawTheme>(&s).ok())
        .map(from_raw)
        .unwrap_or_default()
}

fn from_raw(raw: RawTheme) -> TuiTheme {
    let d = TuiTheme::default();
    let pick = |key: &str, value: Option<String>, fallback: Color| match value {
        None => fallback,
        Some(v) => parse_color(&v).unwrap_or_else(|| {
            tracing::warn!(key, value = %v, "unknown theme colour, keeping default");
            fallback
        }),
    };
    TuiTheme {
        highlight_fg: pick("highlight_fg", raw.highlight_fg, d.highlight_fg),
        highlight_bg: pick("highlight_bg", raw.highlight_bg, d.highlight_bg),
        border_fg: pick("border_fg", raw.border_fg, d.border_fg),
        help_fg: pick("help_fg", raw.help_fg, d.help_fg),
        checked_fg: pick("checked_fg", raw.checked_fg, d.checked_fg),
    }
}

/// Anything ratatui's `Color` parses (names, `#rrggbb`, a palette index),
/// plus `rgb(r, g, b)`.
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    let Some(args) = s.strip_prefix("rgb(").and_then(|t| t.strip_suffix(')')) else {
        return s.parse().ok();
    };
    let mut channels = args.split(',').map(|c| c.trim().parse::<u8>());
    match (channels.next(), channels.next(), channels.next(), channels.next()) {
        (Some(Ok(r)), Some(Ok(g)), Some(Ok(b)), None) => Some(Color::Rgb(r, g, b)),
        _ => None,
    }
}

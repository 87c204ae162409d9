//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for titles and the status card.
    pub highlight: Color,
    /// Line and label color for accepted traffic.
    pub accepted: Color,
    /// Line and label color for blocked traffic and dropping rules.
    pub blocked: Color,
    /// Color for stale-data indicators.
    pub warning: Color,
    /// Color for borders and axes.
    pub border: Color,
    /// Style for table header rows.
    pub header: Style,
    /// Style for the selected rule row.
    pub selected: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            accepted: Color::Green,
            blocked: Color::Red,
            warning: Color::Yellow,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            accepted: Color::Green,
            blocked: Color::Red,
            warning: Color::Yellow,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Style for a rule action: dropping actions in the blocked color,
    /// accepting ones in the accepted color.
    pub fn action_style(&self, action: &str) -> Style {
        match action.to_ascii_uppercase().as_str() {
            "DROP" | "REJECT" | "BLOCK" | "DENY" => Style::default().fg(self.blocked),
            "ACCEPT" | "ALLOW" | "PASS" => Style::default().fg(self.accepted),
            _ => Style::default(),
        }
    }

    /// Style for stale-data text.
    pub fn stale_style(&self) -> Style {
        Style::default().fg(self.warning).add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_style_is_case_insensitive() {
        let theme = Theme::dark();
        assert_eq!(theme.action_style("drop").fg, Some(Color::Red));
        assert_eq!(theme.action_style("ACCEPT").fg, Some(Color::Green));
        assert_eq!(theme.action_style("LOG").fg, None);
    }
}

//! Common UI components shared across panels.
//!
//! This module contains the header bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;

/// Render the header bar: overall indicator, engine state, backend.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.view;

    let indicator = if view.is_stale() {
        Span::styled(" ● ", app.theme.stale_style())
    } else if view.state.is_some() {
        Span::styled(" ● ", Style::default().fg(app.theme.accepted))
    } else {
        Span::styled(" ○ ", Style::default().add_modifier(Modifier::DIM))
    };

    let state = match view.state {
        Some(ref state) => Span::styled(state.clone(), Style::default().fg(app.theme.highlight)),
        None => Span::styled("connecting", Style::default().add_modifier(Modifier::DIM)),
    };

    let line = Line::from(vec![
        indicator,
        Span::styled("PHANTOMFIREWALL ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        state,
        Span::raw(" │ "),
        Span::raw(app.source_description().to_string()),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar at the bottom.
///
/// Shows stale channels when any refresh failed, otherwise the controls.
/// Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let view = &app.view;
    if view.is_stale() {
        let channels: Vec<String> = view
            .stale
            .iter()
            .map(|s| format!("{} ({})", s.channel, s.kind))
            .collect();
        let paragraph = Paragraph::new(format!(
            " Stale: {} | ?:help q:quit",
            channels.join(", ")
        ))
        .style(app.theme.stale_style());
        frame.render_widget(paragraph, area);
        return;
    }

    let status = if view.state.is_none() {
        " Loading... | q:quit".to_string()
    } else {
        format!(
            " Live | {} rules | j/k:scroll e:export ?:help q:quit",
            view.rules.len()
        )
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Rules"),
        Line::from("  ↑/↓ j/k     Select rule"),
        Line::from("  PgUp/PgDn   Jump 10 rules"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from(""),
        section(" General"),
        Line::from("  e           Export to JSON"),
        Line::from("  ?           Toggle help"),
        Line::from("  q/Esc       Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Status and traffic refresh automatically",
            Style::default().add_modifier(Modifier::DIM),
        )]),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 44u16.min(area.width.saturating_sub(4));
    let help_height = 17u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

//! Terminal UI rendering using ratatui.
//!
//! Every panel renders from the [`DashboardView`] held by the [`App`], never
//! from the slots directly, so drawing is a pure function of that view plus
//! the selection and overlay flags.
//!
//! ## Submodules
//!
//! - [`view`]: Projection of slot state into cards, chart points and rows
//! - [`cards`]: Status summary cards
//! - [`traffic`]: Accepted/blocked line chart
//! - [`rules`]: Firewall rules table
//! - [`common`]: Shared components (header, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Status cards (cards::render)         │
//! ├──────────────────────────────────────┤
//! │ Traffic chart (traffic::render)      │
//! ├──────────────────────────────────────┤
//! │ Rules table (rules::render)          │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlay rendered on top:
//!    - common::render_help
//! ```

pub mod cards;
pub mod common;
pub mod rules;
pub mod theme;
pub mod traffic;
pub mod view;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

pub use theme::Theme;
pub use view::{DashboardView, RuleRow, StaleChannel, StatusCard, TrafficChart};

use crate::app::App;

/// Minimum terminal size for a usable display.
pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 16;

/// Row where the rules table body starts, for a given terminal height.
pub fn rules_body_row(height: u16) -> u16 {
    let chunks = split(Rect::new(0, 0, MIN_WIDTH, height));
    // Border plus header row.
    chunks[3].y + 2
}

fn split(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::vertical([
        Constraint::Length(1),      // Header bar
        Constraint::Length(3),      // Status cards
        Constraint::Percentage(45), // Traffic chart
        Constraint::Min(5),         // Rules table
        Constraint::Length(1),      // Status bar
    ])
    .split(area)
}

/// Draw the whole dashboard into `frame`.
///
/// Only the rules table scroll offset in `app` is updated.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let top = (area.height / 2).saturating_sub(2);
        let centered = Rect::new(0, top, area.width, 5u16.min(area.height - top));
        frame.render_widget(paragraph, centered);
        return;
    }

    let chunks = split(area);

    common::render_header(frame, app, chunks[0]);
    cards::render(frame, &app.view.cards, &app.theme, chunks[1]);
    traffic::render(frame, &app.view.traffic, &app.theme, chunks[2]);
    rules::render(
        frame,
        &app.view.rules,
        app.selected_rule,
        &mut app.rules_table,
        &app.theme,
        chunks[3],
    );
    common::render_status_bar(frame, app, chunks[4]);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}

//! Firewall rules table.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::theme::Theme;
use super::view::RuleRow;

/// Render the rules with the row at `selected` highlighted.
///
/// `state` keeps the scroll offset across frames; ratatui moves it just far
/// enough to keep the selection visible.
pub fn render(
    frame: &mut Frame,
    rows: &[RuleRow],
    selected: usize,
    state: &mut TableState,
    theme: &Theme,
    area: Rect,
) {
    let title = if rows.is_empty() {
        " Firewall Rules ".to_string()
    } else {
        format!(" Firewall Rules ({}/{}) ", selected.min(rows.len() - 1) + 1, rows.len())
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));

    if rows.is_empty() {
        *state = TableState::default();
        let paragraph = Paragraph::new(" No rules loaded")
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec!["Name", "Priority", "Action", "Protocol"])
        .style(theme.header)
        .height(1);

    let body: Vec<Row> = rows
        .iter()
        .map(|rule| {
            Row::new(vec![
                Cell::from(rule.name.clone()),
                Cell::from(rule.priority.clone()),
                Cell::from(rule.action.clone()).style(theme.action_style(&rule.action)),
                Cell::from(rule.protocol.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Length(9),
        Constraint::Length(10),
        Constraint::Length(10),
    ];

    let table = Table::new(body, widths)
        .header(header)
        .block(block)
        .row_highlight_style(theme.selected)
        .highlight_symbol("▶ ");

    state.select(Some(selected.min(rows.len() - 1)));

    frame.render_stateful_widget(table, area, state);
}

//! Row of status cards above the chart.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::theme::Theme;
use super::view::{CardKind, StatusCard, EMPTY_VALUE};

/// Render one bordered card per entry, sharing the width evenly.
pub fn render(frame: &mut Frame, cards: &[StatusCard], theme: &Theme, area: Rect) {
    if cards.is_empty() {
        return;
    }

    let constraints = cards.iter().map(|_| Constraint::Ratio(1, cards.len() as u32));
    let chunks = Layout::horizontal(constraints).split(area);

    for (card, chunk) in cards.iter().zip(chunks.iter()) {
        let block = Block::default()
            .title(format!(" {} ", card.title))
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.border));

        let value = Line::from(Span::styled(card.value.clone(), value_style(card, theme)));
        let paragraph = Paragraph::new(value).alignment(Alignment::Center).block(block);

        frame.render_widget(paragraph, *chunk);
    }
}

fn value_style(card: &StatusCard, theme: &Theme) -> Style {
    if card.value == EMPTY_VALUE {
        return Style::default().add_modifier(Modifier::DIM);
    }
    let color = match card.kind {
        CardKind::State => theme.highlight,
        CardKind::ThreatsBlocked => theme.blocked,
        CardKind::RulesActive | CardKind::PacketsProcessed => theme.accepted,
        CardKind::Uptime => theme.border,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

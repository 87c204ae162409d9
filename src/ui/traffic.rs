//! Dual-line traffic chart: accepted versus blocked per sample.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph},
    Frame,
};

use super::theme::Theme;
use super::view::{format_count, TrafficChart};

pub fn render(frame: &mut Frame, chart: &TrafficChart, theme: &Theme, area: Rect) {
    let block = Block::default()
        .title(" Network Traffic ")
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));

    if chart.is_empty() {
        let paragraph = Paragraph::new("No traffic data")
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let datasets = vec![
        Dataset::default()
            .name("accepted")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme.accepted))
            .data(&chart.accepted),
        Dataset::default()
            .name("blocked")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme.blocked))
            .data(&chart.blocked),
    ];

    let x_max = chart.labels.len().saturating_sub(1).max(1) as f64;
    // Headroom above the peak so the top line stays visible.
    let y_max = (chart.peak.max(1) as f64 * 1.1).ceil();

    let axis_style = Style::default().fg(theme.border);
    let x_axis = Axis::default()
        .style(axis_style)
        .bounds([0.0, x_max])
        .labels(chart.axis_labels().into_iter().map(Span::raw));
    let y_axis = Axis::default().style(axis_style).bounds([0.0, y_max]).labels(vec![
        Span::raw("0"),
        Span::raw(format_count((y_max / 2.0) as u64)),
        Span::raw(format_count(y_max as u64)),
    ]);

    let widget = Chart::new(datasets)
        .block(block)
        .x_axis(x_axis)
        .y_axis(y_axis)
        .legend_position(Some(LegendPosition::TopLeft));

    frame.render_widget(widget, area);
}

//! Pure projection of slot state into what the screen shows.
//!
//! [`DashboardView::from_state`] is the only place slot values are turned
//! into display strings and chart points. The render functions consume the
//! result without looking at the slots again, so identical state always
//! draws identical frames.

use crate::api::{FirewallStatus, Rule, TrafficPoint};
use crate::data::DashboardState;

/// Placeholder shown for values that have not loaded yet.
pub const EMPTY_VALUE: &str = "-";

/// Protocol shown when a rule has no protocol restriction.
pub const ANY_PROTOCOL: &str = "Any";

/// Which status figure a card shows. Drives its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    State,
    ThreatsBlocked,
    RulesActive,
    Uptime,
    PacketsProcessed,
}

/// One summary card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCard {
    pub kind: CardKind,
    pub title: &'static str,
    pub value: String,
}

/// Chart data for the traffic panel, in backend order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrafficChart {
    /// Time label per sample; index matches the x coordinate.
    pub labels: Vec<String>,
    pub accepted: Vec<(f64, f64)>,
    pub blocked: Vec<(f64, f64)>,
    /// Largest count in either line.
    pub peak: u64,
}

impl TrafficChart {
    fn from_series(series: &[TrafficPoint]) -> Self {
        let mut chart = TrafficChart::default();
        for (i, point) in series.iter().enumerate() {
            let x = i as f64;
            chart.labels.push(point.time.clone());
            chart.accepted.push((x, point.accepted as f64));
            chart.blocked.push((x, point.blocked as f64));
            chart.peak = chart.peak.max(point.accepted).max(point.blocked);
        }
        chart
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// First, middle and last time labels for the x axis.
    pub fn axis_labels(&self) -> Vec<String> {
        match self.labels.len() {
            0 => Vec::new(),
            1 | 2 => self.labels.clone(),
            n => vec![
                self.labels[0].clone(),
                self.labels[n / 2].clone(),
                self.labels[n - 1].clone(),
            ],
        }
    }
}

/// One row of the rules table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRow {
    /// Rule id, used only as the row identity.
    pub key: String,
    pub name: String,
    pub priority: String,
    pub action: String,
    pub protocol: String,
}

impl From<&Rule> for RuleRow {
    fn from(rule: &Rule) -> Self {
        Self {
            key: rule.id.clone(),
            name: rule.name.clone(),
            priority: rule.priority.to_string(),
            action: rule.action.clone(),
            protocol: protocol_label(rule.protocol.as_deref()).to_string(),
        }
    }
}

/// A channel whose latest refresh failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleChannel {
    pub channel: &'static str,
    pub kind: &'static str,
    pub message: String,
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub cards: Vec<StatusCard>,
    pub traffic: TrafficChart,
    pub rules: Vec<RuleRow>,
    pub stale: Vec<StaleChannel>,
    /// Engine state, when status has loaded.
    pub state: Option<String>,
}

impl DashboardView {
    /// Project the current slots. Empty slots render as placeholders.
    pub fn from_state(state: &DashboardState) -> Self {
        let status = state.status.value();

        Self {
            cards: status_cards(status),
            traffic: state
                .traffic
                .value()
                .map(|series| TrafficChart::from_series(series))
                .unwrap_or_default(),
            rules: state
                .rules
                .value()
                .map(|rules| rules.iter().map(RuleRow::from).collect())
                .unwrap_or_default(),
            stale: state
                .errors()
                .into_iter()
                .map(|(endpoint, err)| StaleChannel {
                    channel: endpoint.label(),
                    kind: err.kind(),
                    message: err.to_string(),
                })
                .collect(),
            state: status.map(|s| s.state.clone()),
        }
    }

    pub fn is_stale(&self) -> bool {
        !self.stale.is_empty()
    }
}

fn status_cards(status: Option<&FirewallStatus>) -> Vec<StatusCard> {
    let field = |f: fn(&FirewallStatus) -> String| {
        status.map(f).unwrap_or_else(|| EMPTY_VALUE.to_string())
    };

    let mut cards = vec![
        StatusCard {
            kind: CardKind::State,
            title: "Status",
            value: field(|s| s.state.clone()),
        },
        StatusCard {
            kind: CardKind::ThreatsBlocked,
            title: "Threats Blocked",
            value: field(|s| s.threats_blocked.to_string()),
        },
        StatusCard {
            kind: CardKind::RulesActive,
            title: "Active Rules",
            value: field(|s| s.rules_active.to_string()),
        },
        StatusCard {
            kind: CardKind::Uptime,
            title: "Uptime",
            value: field(|s| format_uptime(s.uptime_seconds)),
        },
    ];

    if let Some(packets) = status.and_then(|s| s.packets_processed) {
        cards.push(StatusCard {
            kind: CardKind::PacketsProcessed,
            title: "Packets",
            value: format_count(packets),
        });
    }

    cards
}

/// Render uptime as whole hours and minutes, e.g. 3725 -> "1h 2m".
pub fn format_uptime(seconds: u64) -> String {
    format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
}

/// Display text for a rule's protocol. Missing or empty means "Any".
pub fn protocol_label(protocol: Option<&str>) -> &str {
    match protocol {
        Some(p) if !p.is_empty() => p,
        _ => ANY_PROTOCOL,
    }
}

/// Format large numbers with K/M suffixes
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

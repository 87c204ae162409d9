//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use ratatui::widgets::TableState;

use crate::data::{DashboardState, DashboardWatch};
use crate::ui::{DashboardView, Theme};

/// How long a status message stays in the status bar.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    // Data
    watch: DashboardWatch,
    source: String,
    pub state: DashboardState,
    pub view: DashboardView,

    // Navigation state
    pub selected_rule: usize,
    /// Carries the rules table scroll offset between frames.
    pub rules_table: TableState,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create an app reading from `watch`.
    pub fn new(watch: DashboardWatch, source: impl Into<String>, theme: Theme) -> Self {
        let mut app = Self {
            running: true,
            show_help: false,
            watch,
            source: source.into(),
            state: DashboardState::default(),
            view: DashboardView::from_state(&DashboardState::default()),
            selected_rule: 0,
            rules_table: TableState::default(),
            theme,
            status_message: None,
        };
        let state = app.watch.latest();
        app.apply_state(state);
        app
    }

    /// Returns a description of the backend.
    pub fn source_description(&self) -> &str {
        &self.source
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Pull new slot values if any channel changed.
    ///
    /// Returns true if the view was rebuilt.
    pub fn sync(&mut self) -> bool {
        if !self.watch.has_changed() {
            return false;
        }
        let state = self.watch.latest();
        self.apply_state(state);
        true
    }

    /// Replace the held state and rebuild the view from it.
    pub fn apply_state(&mut self, state: DashboardState) {
        self.view = DashboardView::from_state(&state);
        self.state = state;
        self.clamp_selection();
    }

    fn rule_count(&self) -> usize {
        self.view.rules.len()
    }

    fn clamp_selection(&mut self) {
        let max = self.rule_count().saturating_sub(1);
        if self.selected_rule > max {
            self.selected_rule = max;
        }
    }

    /// Move selection down by one rule.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one rule.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n rules.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.rule_count().saturating_sub(1);
        self.selected_rule = (self.selected_rule + n).min(max);
    }

    /// Move selection up by n rules.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_rule = self.selected_rule.saturating_sub(n);
    }

    /// Jump to the first rule.
    pub fn select_first(&mut self) {
        self.selected_rule = 0;
    }

    /// Jump to the last rule.
    pub fn select_last(&mut self) {
        self.selected_rule = self.rule_count().saturating_sub(1);
    }

    /// Select the rule at `index` if it exists.
    pub fn select(&mut self, index: usize) {
        if index < self.rule_count() {
            self.selected_rule = index;
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export current state to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.state.to_export_json())?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

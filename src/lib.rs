//! # phantom-dash
//!
//! A terminal dashboard and library for watching a PhantomFirewall instance.
//!
//! The dashboard reads four HTTP endpoints (engine status, rule set, threat
//! feed, traffic series), keeps the latest value of each in an observable
//! slot, and renders them as status cards, a traffic chart and a rules table.
//! Status and traffic are polled on a fixed interval; rules and threats are
//! fetched once per mount.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌───────────┐    ┌─────────┐    ┌──────────┐ │
//! │  │   api   │───▶│   data    │───▶│   app   │───▶│    ui    │ │
//! │  │(backend)│    │ (slots)   │    │ (state) │    │ (render) │ │
//! │  └─────────┘    └─────┬─────┘    └─────────┘    └──────────┘ │
//! │                       │                                      │
//! │                 RefreshScheduler                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`api`]**: The [`Backend`] trait, the HTTP implementation, payload
//!   types and the tagged [`FetchError`]
//! - **[`data`]**: Per-endpoint channels and slots, the refresh scheduler and
//!   the [`Dashboard`] that owns their lifetime
//! - **[`app`]**: Interactive state: rule selection, help overlay, export
//! - **[`ui`]**: Pure projection into a [`DashboardView`] and ratatui rendering
//! - **[`config`]**: Layered [`Settings`]
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a local firewall
//! phantom-dash --endpoint http://127.0.0.1:8080
//!
//! # Fetch once and write everything to a file
//! phantom-dash --endpoint http://fw.internal:8080 --export snapshot.json
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use phantom_dash::{Dashboard, HttpBackend};
//!
//! # tokio_test::block_on(async {
//! let backend = HttpBackend::new("http://127.0.0.1:8080", Duration::from_secs(3)).unwrap();
//! let mut dashboard = Dashboard::new(Arc::new(backend), Duration::from_secs(5));
//!
//! let state = dashboard.refresh_all().await;
//! if let Some(status) = state.status.value() {
//!     println!("{} threats blocked", status.threats_blocked);
//! }
//! dashboard.teardown();
//! # });
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod ui;

// Re-export main types for convenience
pub use api::{
    Backend, Endpoint, FetchError, FirewallStatus, HttpBackend, Rule, RuleSet, ThreatList,
    TrafficPoint, TrafficSeries,
};
pub use app::App;
pub use config::{Overrides, Settings};
pub use data::{Dashboard, DashboardState, DashboardWatch, RefreshScheduler, SlotState};
pub use ui::{DashboardView, Theme};

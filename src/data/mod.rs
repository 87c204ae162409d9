//! Data channels and their refresh lifecycle.
//!
//! This module owns everything between the backend and the view: the
//! per-endpoint slots, the channels that fill them, the scheduler that polls
//! them, and the [`Dashboard`] that wires the four together.
//!
//! ## Submodules
//!
//! - [`slot`]: Observable value cells that apply results in issue order
//! - [`channel`]: One endpoint bound to one slot ([`Channel`])
//! - [`scheduler`]: Fixed-interval driver with an explicit lifecycle
//! - [`dashboard`]: The four channels composed, plus mount/teardown
//!
//! ## Data Flow
//!
//! ```text
//! RefreshScheduler ──tick──▶ Channel::refresh()
//!                                  │  seq = slot.issue()
//!                                  ▼
//!                            Backend::fetch() ── bytes ──▶ decode
//!                                  │
//!                                  ▼
//!                            Slot::apply(seq, result) ──watch──▶ DashboardWatch ──▶ App
//! ```

pub mod channel;
pub mod dashboard;
pub mod scheduler;
pub mod slot;

pub use channel::{
    Channel, RefreshTarget, RulesChannel, StatusChannel, ThreatsChannel, TrafficChannel,
};
pub use dashboard::{Dashboard, DashboardState, DashboardWatch};
pub use scheduler::{RefreshScheduler, SchedulerError, SchedulerState, DEFAULT_REFRESH_INTERVAL};
pub use slot::{Applied, Slot, SlotState};

//! The four channels composed into one dashboard.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::channel::{
    Channel, RefreshTarget, RulesChannel, StatusChannel, ThreatsChannel, TrafficChannel,
};
use super::scheduler::{RefreshScheduler, SchedulerError, SchedulerState};
use super::slot::SlotState;
use crate::api::{
    Backend, Endpoint, FetchError, FirewallStatus, RuleSet, ThreatList, TrafficSeries,
};

/// Owns the four data channels and the scheduler that polls them.
///
/// Mounting fires every channel once and arms the scheduler for status and
/// traffic. Tearing down cancels the shared token, which stops the timer and
/// abandons every in-flight fetch before it can land.
#[derive(Debug)]
pub struct Dashboard {
    status: Arc<StatusChannel>,
    rules: Arc<RulesChannel>,
    threats: Arc<ThreatsChannel>,
    traffic: Arc<TrafficChannel>,
    scheduler: RefreshScheduler,
    cancel: CancellationToken,
    description: String,
}

impl Dashboard {
    /// Build an unmounted dashboard over `backend`.
    pub fn new(backend: Arc<dyn Backend>, refresh_interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let description = backend.description().to_string();

        let status =
            Arc::new(Channel::new(Endpoint::Status, backend.clone(), cancel.child_token()));
        let rules = Arc::new(Channel::new(Endpoint::Rules, backend.clone(), cancel.child_token()));
        let threats =
            Arc::new(Channel::new(Endpoint::Threats, backend.clone(), cancel.child_token()));
        let traffic = Arc::new(Channel::new(Endpoint::Traffic, backend, cancel.child_token()));

        let polled = vec![
            status.clone() as Arc<dyn RefreshTarget>,
            traffic.clone() as Arc<dyn RefreshTarget>,
        ];
        let scheduler = RefreshScheduler::new(refresh_interval, polled, cancel.child_token());

        Self {
            status,
            rules,
            threats,
            traffic,
            scheduler,
            cancel,
            description,
        }
    }

    /// Fetch every channel once and start polling status and traffic.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(&mut self) -> Result<(), SchedulerError> {
        self.scheduler.mount()?;

        let once = [
            self.rules.clone() as Arc<dyn RefreshTarget>,
            self.threats.clone() as Arc<dyn RefreshTarget>,
        ];
        for target in once {
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = target.trigger() => {}
                }
            });
        }

        info!(backend = %self.description, "dashboard mounted");
        Ok(())
    }

    /// Stop polling and cancel everything in flight. Idempotent.
    ///
    /// Every slot is closed before this returns, so no refresh still running
    /// on another worker can change what the view shows afterwards.
    pub fn teardown(&mut self) {
        self.cancel.cancel();
        self.scheduler.teardown();
        self.close_channels();
    }

    fn close_channels(&self) {
        self.status.close();
        self.rules.close();
        self.threats.close();
        self.traffic.close();
    }

    pub fn is_mounted(&self) -> bool {
        self.scheduler.state() == SchedulerState::Scheduled
    }

    /// Description of the backend, for the header.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> &StatusChannel {
        &self.status
    }

    pub fn traffic(&self) -> &TrafficChannel {
        &self.traffic
    }

    /// Refresh all four channels concurrently and wait for them.
    ///
    /// Used by the non-interactive export mode.
    pub async fn refresh_all(&self) -> DashboardState {
        let _ = tokio::join!(
            self.status.refresh(),
            self.rules.refresh(),
            self.threats.refresh(),
            self.traffic.refresh(),
        );
        self.snapshot()
    }

    /// Copy of all four slots.
    pub fn snapshot(&self) -> DashboardState {
        DashboardState {
            status: self.status.snapshot(),
            rules: self.rules.snapshot(),
            threats: self.threats.snapshot(),
            traffic: self.traffic.snapshot(),
        }
    }

    /// Subscribe to all four slots at once.
    pub fn watch(&self) -> DashboardWatch {
        DashboardWatch {
            status: self.status.subscribe(),
            rules: self.rules.subscribe(),
            threats: self.threats.subscribe(),
            traffic: self.traffic.subscribe(),
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.close_channels();
    }
}

/// Current contents of every slot.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub status: SlotState<FirewallStatus>,
    pub rules: SlotState<RuleSet>,
    pub threats: SlotState<ThreatList>,
    pub traffic: SlotState<TrafficSeries>,
}

impl DashboardState {
    /// Last recorded failure per channel, in display order.
    pub fn errors(&self) -> Vec<(Endpoint, &FetchError)> {
        [
            (Endpoint::Status, self.status.last_error.as_ref()),
            (Endpoint::Rules, self.rules.last_error.as_ref()),
            (Endpoint::Threats, self.threats.last_error.as_ref()),
            (Endpoint::Traffic, self.traffic.last_error.as_ref()),
        ]
        .into_iter()
        .filter_map(|(endpoint, err)| err.map(|e| (endpoint, e)))
        .collect()
    }

    /// JSON document of the held values and any recorded errors.
    pub fn to_export_json(&self) -> Value {
        let mut errors = Map::new();
        for (endpoint, err) in self.errors() {
            errors.insert(endpoint.label().to_string(), json!(err.to_string()));
        }

        json!({
            "status": self.status.value(),
            "rules": self.rules.value(),
            "threats": self.threats.value(),
            "traffic": self.traffic.value(),
            "errors": Value::Object(errors),
        })
    }
}

/// Receivers for all four slots.
#[derive(Debug, Clone)]
pub struct DashboardWatch {
    status: watch::Receiver<SlotState<FirewallStatus>>,
    rules: watch::Receiver<SlotState<RuleSet>>,
    threats: watch::Receiver<SlotState<ThreatList>>,
    traffic: watch::Receiver<SlotState<TrafficSeries>>,
}

impl DashboardWatch {
    /// True if any slot changed since the last [`latest`](Self::latest).
    pub fn has_changed(&self) -> bool {
        self.status.has_changed().unwrap_or(false)
            || self.rules.has_changed().unwrap_or(false)
            || self.threats.has_changed().unwrap_or(false)
            || self.traffic.has_changed().unwrap_or(false)
    }

    /// Read every slot and mark all as seen.
    pub fn latest(&mut self) -> DashboardState {
        DashboardState {
            status: self.status.borrow_and_update().clone(),
            rules: self.rules.borrow_and_update().clone(),
            threats: self.threats.borrow_and_update().clone(),
            traffic: self.traffic.borrow_and_update().clone(),
        }
    }
}

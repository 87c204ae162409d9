//! Data channels: one endpoint, one slot.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::slot::{Applied, Slot, SlotState};
use crate::api::{
    Backend, Endpoint, FetchError, FirewallStatus, RuleSet, ThreatList, TrafficSeries,
};

/// Aggregate status, polled.
pub type StatusChannel = Channel<FirewallStatus>;
/// Active rules, fetched once at mount.
pub type RulesChannel = Channel<RuleSet>;
/// Recent threat events, fetched once at mount.
pub type ThreatsChannel = Channel<ThreatList>;
/// Accepted/blocked time-series, polled.
pub type TrafficChannel = Channel<TrafficSeries>;

/// Fetches one endpoint and keeps its latest accepted payload.
///
/// Refreshes may overlap. Each takes a sequence number when issued and its
/// result is applied only if nothing issued later has already landed. Once
/// the channel's cancellation token fires, outstanding refreshes are
/// abandoned, and once [`close`](Self::close) returns none of them can touch
/// the slot.
#[derive(Debug)]
pub struct Channel<T> {
    endpoint: Endpoint,
    backend: Arc<dyn Backend>,
    slot: Slot<T>,
    cancel: CancellationToken,
}

impl<T> Channel<T>
where
    T: DeserializeOwned + Debug + Send + Sync + 'static,
{
    /// Create a channel for `endpoint`, bound to `cancel`.
    pub fn new(endpoint: Endpoint, backend: Arc<dyn Backend>, cancel: CancellationToken) -> Self {
        Self {
            endpoint,
            backend,
            slot: Slot::new(),
            cancel,
        }
    }

    /// Fetch and decode the endpoint, then offer the result to the slot.
    ///
    /// Returns the fetched payload or the failure, whether or not the slot
    /// accepted it. Cancellation yields [`FetchError::Cancelled`] and leaves
    /// the slot untouched.
    pub async fn refresh(&self) -> Result<Arc<T>, FetchError> {
        let seq = self.slot.issue();

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FetchError::Cancelled),
            body = self.backend.fetch(self.endpoint) => body.and_then(|bytes| decode::<T>(&bytes)),
        };

        if self.cancel.is_cancelled() {
            debug!(endpoint = self.endpoint.label(), seq, "discarding result after teardown");
            return Err(FetchError::Cancelled);
        }

        match self.slot.apply(seq, &result) {
            Applied::Closed => {
                debug!(endpoint = self.endpoint.label(), seq, "discarding result after teardown");
                return Err(FetchError::Cancelled);
            }
            Applied::Replaced => debug!(endpoint = self.endpoint.label(), seq, "slot replaced"),
            Applied::Failed => {
                if let Err(ref e) = result {
                    warn!(endpoint = self.endpoint.label(), seq, error = %e, "refresh failed");
                }
            }
            Applied::Stale => {
                debug!(endpoint = self.endpoint.label(), seq, "superseded result discarded")
            }
        }

        result
    }

    /// Cancel outstanding refreshes and close the slot.
    ///
    /// Closing takes the slot's write lock, so once this returns no refresh
    /// on any worker can still change the slot.
    pub fn close(&self) {
        self.cancel.cancel();
        self.slot.close();
    }

    /// Subscribe to slot changes.
    pub fn subscribe(&self) -> watch::Receiver<SlotState<T>> {
        self.slot.subscribe()
    }

    /// Copy of the slot's current state.
    pub fn snapshot(&self) -> SlotState<T> {
        self.slot.snapshot()
    }

    /// Latest accepted payload.
    pub fn value(&self) -> Option<Arc<T>> {
        self.slot.value()
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Arc<T>, FetchError> {
    Ok(Arc::new(serde_json::from_slice(bytes)?))
}

/// Something the refresh scheduler can fire.
#[async_trait]
pub trait RefreshTarget: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Run one refresh, discarding the result.
    async fn trigger(&self);
}

#[async_trait]
impl<T> RefreshTarget for Channel<T>
where
    T: DeserializeOwned + Debug + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.endpoint.label()
    }

    async fn trigger(&self) {
        let _ = self.refresh().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedBackend;

    const STATUS_A: &str =
        r#"{"status":"active","threats_blocked":12,"rules_active":4,"uptime":3725}"#;
    const STATUS_B: &str =
        r#"{"status":"degraded","threats_blocked":13,"rules_active":4,"uptime":3730}"#;

    fn status_channel(backend: &Arc<ScriptedBackend>) -> Arc<StatusChannel> {
        let backend: Arc<dyn Backend> = backend.clone();
        Arc::new(Channel::new(Endpoint::Status, backend, CancellationToken::new()))
    }

    #[tokio::test]
    async fn test_refresh_replaces_slot_with_parsed_payload() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(Endpoint::Status, STATUS_A);
        let channel = status_channel(&backend);

        let status = channel.refresh().await.unwrap();
        assert_eq!(status.state, "active");
        assert_eq!(channel.value().unwrap().as_ref(), status.as_ref());
    }

    #[tokio::test]
    async fn test_network_failure_keeps_previous_value() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(Endpoint::Status, STATUS_A);
        backend.push_error(Endpoint::Status, FetchError::Network("connection refused".into()));
        let channel = status_channel(&backend);

        channel.refresh().await.unwrap();
        let err = channel.refresh().await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));

        let state = channel.snapshot();
        assert_eq!(state.value().unwrap().state, "active");
        assert!(state.is_stale());
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_failure() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(Endpoint::Status, r#"{"status": "active""#);
        let channel = status_channel(&backend);

        let err = channel.refresh().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
        assert!(channel.value().is_none());
        assert_eq!(channel.snapshot().last_error.map(|e| e.kind()), Some("decode"));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_decode_failure() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(Endpoint::Status, r#"[1, 2, 3]"#);
        let channel = status_channel(&backend);

        assert!(matches!(channel.refresh().await, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_later_issued_wins_when_it_resolves_first() {
        let backend = Arc::new(ScriptedBackend::new());
        let first_reply = backend.push_deferred(Endpoint::Status);
        let second_reply = backend.push_deferred(Endpoint::Status);
        let channel = status_channel(&backend);

        let c = channel.clone();
        let first = tokio::spawn(async move { c.refresh().await });
        backend.wait_for_calls(1).await;

        let c = channel.clone();
        let second = tokio::spawn(async move { c.refresh().await });
        backend.wait_for_calls(2).await;

        second_reply.send(Ok(STATUS_B.as_bytes().to_vec())).unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(channel.value().unwrap().state, "degraded");

        first_reply.send(Ok(STATUS_A.as_bytes().to_vec())).unwrap();
        let stale = first.await.unwrap().unwrap();
        assert_eq!(stale.state, "active");

        // The older response resolved last but must not win.
        assert_eq!(channel.value().unwrap().state, "degraded");
    }

    #[tokio::test]
    async fn test_cancelled_refresh_never_touches_slot() {
        let backend = Arc::new(ScriptedBackend::new());
        let reply = backend.push_deferred(Endpoint::Status);
        let cancel = CancellationToken::new();
        let dyn_backend: Arc<dyn Backend> = backend.clone();
        let channel = Arc::new(StatusChannel::new(Endpoint::Status, dyn_backend, cancel.clone()));

        let c = channel.clone();
        let pending = tokio::spawn(async move { c.refresh().await });
        backend.wait_for_calls(1).await;

        cancel.cancel();
        let _ = reply.send(Ok(STATUS_A.as_bytes().to_vec()));

        assert_eq!(pending.await.unwrap().unwrap_err(), FetchError::Cancelled);
        let state = channel.snapshot();
        assert!(state.value.is_none());
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_refresh_after_cancel_is_rejected() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_json(Endpoint::Status, STATUS_A);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let dyn_backend: Arc<dyn Backend> = backend.clone();
        let channel = StatusChannel::new(Endpoint::Status, dyn_backend, cancel);

        assert_eq!(channel.refresh().await.unwrap_err(), FetchError::Cancelled);
        assert!(channel.value().is_none());
    }

    #[derive(Debug)]
    struct InstantBackend;

    #[async_trait]
    impl Backend for InstantBackend {
        async fn fetch(&self, _endpoint: Endpoint) -> Result<Vec<u8>, FetchError> {
            tokio::task::yield_now().await;
            Ok(STATUS_A.as_bytes().to_vec())
        }

        fn description(&self) -> &str {
            "instant"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_no_write_lands_after_close_returns() {
        for _ in 0..300 {
            let channel = Arc::new(StatusChannel::new(
                Endpoint::Status,
                Arc::new(InstantBackend),
                CancellationToken::new(),
            ));

            let workers: Vec<_> = (0..8)
                .map(|_| {
                    let c = channel.clone();
                    tokio::spawn(async move {
                        while !matches!(c.refresh().await, Err(FetchError::Cancelled)) {}
                    })
                })
                .collect();
            tokio::task::yield_now().await;

            channel.close();
            let at_close = channel.snapshot();

            for worker in workers {
                worker.await.unwrap();
            }
            let after = channel.snapshot();
            assert!(after.closed);
            assert_eq!(after.value_seq, at_close.value_seq);
            assert_eq!(after.error_seq, at_close.error_seq);
        }
    }

    #[tokio::test]
    async fn test_trigger_swallows_errors() {
        let backend = Arc::new(ScriptedBackend::new());
        let channel = status_channel(&backend);

        channel.trigger().await;
        assert_eq!(backend.calls(Endpoint::Status), 1);
        assert_eq!(channel.name(), "status");
        assert!(channel.snapshot().is_stale());
    }
}

//! Backend abstraction for fetching firewall data.
//!
//! The dashboard talks to the firewall through the [`Backend`] trait, which
//! returns raw response bodies for each [`Endpoint`]. Decoding into payload
//! types happens in the channel that owns the endpoint, so a backend only has
//! to get bytes across the wire.

mod error;
mod http;
mod payload;

pub use error::FetchError;
pub use http::HttpBackend;
pub use payload::{FirewallStatus, Rule, RuleSet, ThreatList, TrafficPoint, TrafficSeries};

use std::fmt::Debug;

use async_trait::async_trait;

/// The four backend endpoints the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    Status,
    Rules,
    Threats,
    Traffic,
}

impl Endpoint {
    /// All endpoints in display order.
    pub const ALL: [Endpoint; 4] = [
        Endpoint::Status,
        Endpoint::Rules,
        Endpoint::Threats,
        Endpoint::Traffic,
    ];

    /// Request path relative to the backend base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Status => "/api/v1/status",
            Endpoint::Rules => "/api/v1/rules",
            Endpoint::Threats => "/api/v1/threats",
            Endpoint::Traffic => "/api/v1/traffic",
        }
    }

    /// Short lowercase name used in logs, exports and the status bar.
    pub fn label(&self) -> &'static str {
        match self {
            Endpoint::Status => "status",
            Endpoint::Rules => "rules",
            Endpoint::Threats => "threats",
            Endpoint::Traffic => "traffic",
        }
    }
}

/// Source of raw response bodies for the dashboard's channels.
///
/// Implementations must be safe to call concurrently; overlapping fetches of
/// the same endpoint are expected.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Fetch the body for `endpoint`.
    ///
    /// Returns the raw bytes of a successful response, or the reason the
    /// request failed.
    async fn fetch(&self, endpoint: Endpoint) -> Result<Vec<u8>, FetchError>;

    /// Returns a human-readable description of the backend.
    ///
    /// Used for display in the TUI header.
    fn description(&self) -> &str;
}

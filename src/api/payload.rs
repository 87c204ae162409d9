//! Payload types returned by the firewall backend.
//!
//! These match the JSON produced by the PhantomFirewall API. Deserialization
//! is lenient where the backend is known to be loose: uptime arrives as float
//! seconds, rule ids arrive as integers, and the threat feed may be either an
//! array of events or a single feed object.

use std::fmt;

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Aggregate firewall status from `/api/v1/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallStatus {
    /// Engine state as reported by the backend (e.g. "running").
    #[serde(rename = "status")]
    pub state: String,

    /// Total number of threats blocked since start.
    pub threats_blocked: u64,

    /// Number of rules currently loaded.
    pub rules_active: u64,

    /// Seconds since the engine started, truncated to whole seconds.
    #[serde(rename = "uptime", deserialize_with = "whole_seconds")]
    pub uptime_seconds: u64,

    /// Packets processed since start, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packets_processed: Option<u64>,
}

/// A single firewall rule from `/api/v1/rules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule identity, used only as the row key when rendering.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    pub name: String,

    pub priority: i64,

    /// Verdict applied on match (e.g. "DROP", "ACCEPT").
    pub action: String,

    /// Protocol restriction. `None` renders as "Any".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_ip: Option<String>,
}

/// The active rule set, in backend order.
pub type RuleSet = Vec<Rule>;

/// One sample of the traffic time-series from `/api/v1/traffic`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficPoint {
    /// Time label for the x axis. Numeric labels are kept as text.
    #[serde(deserialize_with = "string_or_number")]
    pub time: String,
    pub accepted: u64,
    pub blocked: u64,
}

/// Traffic samples ordered by time ascending, as sent by the backend.
pub type TrafficSeries = Vec<TrafficPoint>;

/// Recent threat events from `/api/v1/threats`.
///
/// Records are opaque and passed through untouched. A bare feed object is
/// held as a single record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ThreatList(pub Vec<Value>);

impl ThreatList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for ThreatList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Array(events) => Ok(ThreatList(events)),
            feed @ Value::Object(_) => Ok(ThreatList(vec![feed])),
            other => Err(de::Error::custom(format!(
                "expected an array of threat events or a feed object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn whole_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct SecondsVisitor;

    impl Visitor<'_> for SecondsVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative number of seconds")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<u64, E> {
            if v.is_finite() && v >= 0.0 {
                Ok(v.trunc() as u64)
            } else {
                Err(E::invalid_value(Unexpected::Float(v), &self))
            }
        }
    }

    deserializer.deserialize_any(SecondsVisitor)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct LabelVisitor;

    impl Visitor<'_> for LabelVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_owned())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(LabelVisitor)
}

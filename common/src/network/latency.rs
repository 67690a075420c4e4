use std::cmp::Ordering;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use super::endpoint::{EndpointRecord, SecondaryEndpoint};

/// Outcome of a single round-trip measurement.
///
/// Ordered best-first: any `Reached` sorts before `Unreachable`, and two
/// `Unreachable` values compare equal so a stable sort keeps their order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Latency {
    Reached(Duration),
    Unreachable,
}

impl Latency {
    pub fn is_reached(&self) -> bool {
        matches!(self, Latency::Reached(_))
    }

    /// Milliseconds with sub-millisecond precision, `None` when unreachable.
    pub fn as_millis_f64(&self) -> Option<f64> {
        match self {
            Latency::Reached(rtt) => Some(rtt.as_secs_f64() * 1_000.0),
            Latency::Unreachable => None,
        }
    }
}

impl Ord for Latency {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Latency::Reached(a), Latency::Reached(b)) => a.cmp(b),
            (Latency::Reached(_), Latency::Unreachable) => Ordering::Less,
            (Latency::Unreachable, Latency::Reached(_)) => Ordering::Greater,
            (Latency::Unreachable, Latency::Unreachable) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Latency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_millis_f64() {
            Some(ms) => write!(f, "{ms:.2} ms"),
            None => f.write_str("No response"),
        }
    }
}

/// One measured endpoint. Built once per probed record and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub hostname: String,
    pub address: IpAddr,
    pub latency: Latency,
    pub secondary: Option<SecondaryEndpoint>,
}

impl ProbeResult {
    pub fn new(record: &EndpointRecord, latency: Latency) -> Self {
        Self {
            hostname: record.hostname.clone(),
            address: record.address,
            latency,
            secondary: record.secondary(),
        }
    }
}

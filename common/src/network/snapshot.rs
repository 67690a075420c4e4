use std::time::{Duration, SystemTime};

use super::endpoint::EndpointRecord;

/// An immutable view of the directory as it was at `captured_at`.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    records: Vec<EndpointRecord>,
    captured_at: SystemTime,
}

impl DirectorySnapshot {
    pub fn new(records: Vec<EndpointRecord>, captured_at: SystemTime) -> Self {
        Self {
            records,
            captured_at,
        }
    }

    pub fn records(&self) -> &[EndpointRecord] {
        &self.records
    }

    pub fn captured_at(&self) -> SystemTime {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Elapsed time since capture. A capture time in the future counts as age zero.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.captured_at).unwrap_or(Duration::ZERO)
    }

    pub fn is_fresh(&self, window: Duration, now: SystemTime) -> bool {
        self.age(now) <= window
    }
}

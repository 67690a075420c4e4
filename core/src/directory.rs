//! # Relay Directory
//!
//! Resolves the directory for a run: serve the cached copy while it is inside the
//! freshness window, otherwise fetch from the [`DirectorySource`] and overwrite
//! the cache.
//!
//! The cache is an explicit [`DirectoryCache`] object handed to the service. It is
//! read once at the start of [`DirectoryService::get_directory`] and written once
//! at the end, never kept around between calls.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use relayr_common::network::{DirectorySnapshot, EndpointRecord};
use tracing::{debug, info, warn};

use crate::error::Result;

mod cache;
mod source;

pub use cache::{FileCache, MemoryCache};
pub use source::HttpDirectorySource;

/// Default freshness window: a month.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// A directory body as it was last persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedDirectory {
    pub body: Vec<u8>,
    pub captured_at: SystemTime,
}

/// Local storage for the raw directory body.
pub trait DirectoryCache: Send + Sync {
    /// Returns `None` when nothing usable is stored. Never fails loudly.
    fn load(&self) -> Option<CachedDirectory>;

    /// Replaces whatever was stored before.
    fn store(&self, body: &[u8]) -> std::io::Result<()>;
}

/// Where fresh directory bodies come from.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>>;
}

pub struct DirectoryService {
    source: Box<dyn DirectorySource>,
    cache: Box<dyn DirectoryCache>,
    freshness: Duration,
}

impl DirectoryService {
    pub fn new(
        source: Box<dyn DirectorySource>,
        cache: Box<dyn DirectoryCache>,
        freshness: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            freshness,
        }
    }

    /// Returns the directory, hitting the network only when the cache cannot be used.
    ///
    /// A fetched body is parsed before it is persisted, so a malformed response
    /// never replaces a good cache.
    pub async fn get_directory(&self, force_refresh: bool) -> Result<DirectorySnapshot> {
        if !force_refresh {
            if let Some(snapshot) = self.load_cached() {
                return Ok(snapshot);
            }
        }

        let body: Vec<u8> = self.source.fetch().await?;
        let records: Vec<EndpointRecord> = EndpointRecord::parse_directory(&body)?;
        info!("Fetched {} relays from the directory", records.len());

        if let Err(e) = self.cache.store(&body) {
            warn!("Could not update the directory cache: {e}");
        }

        Ok(DirectorySnapshot::new(records, SystemTime::now()))
    }

    fn load_cached(&self) -> Option<DirectorySnapshot> {
        let cached: CachedDirectory = self.cache.load()?;

        let records = match EndpointRecord::parse_directory(&cached.body) {
            Ok(records) => records,
            Err(e) => {
                debug!("Ignoring unreadable directory cache: {e}");
                return None;
            }
        };

        let snapshot = DirectorySnapshot::new(records, cached.captured_at);
        let now = SystemTime::now();
        if !snapshot.is_fresh(self.freshness, now) {
            debug!(
                "Directory cache is stale ({}s old)",
                snapshot.age(now).as_secs()
            );
            return None;
        }

        debug!(
            "Using cached directory with {} relays ({}s old)",
            snapshot.len(),
            snapshot.age(now).as_secs()
        );
        Some(snapshot)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

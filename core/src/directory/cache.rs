use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use directories_next::ProjectDirs;
use tracing::debug;

use super::{CachedDirectory, DirectoryCache};

const CACHE_FILE_NAME: &str = "relays.json";

/// Keeps the directory body verbatim in a file; the file's modification time is
/// the capture timestamp.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<user cache dir>/relayr/relays.json`, or the temp dir when the platform has
    /// no notion of a cache directory.
    pub fn default_path() -> PathBuf {
        match ProjectDirs::from("net", "relayr", "relayr") {
            Some(dirs) => dirs.cache_dir().join(CACHE_FILE_NAME),
            None => std::env::temp_dir().join("relayr").join(CACHE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DirectoryCache for FileCache {
    fn load(&self) -> Option<CachedDirectory> {
        let body = match fs::read(&self.path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No directory cache at {}", self.path.display());
                return None;
            }
            Err(e) => {
                debug!("Cannot read directory cache {}: {e}", self.path.display());
                return None;
            }
        };

        let captured_at = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                debug!("Cannot date directory cache {}: {e}", self.path.display());
                return None;
            }
        };

        Some(CachedDirectory { body, captured_at })
    }

    fn store(&self, body: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write then rename so a reader never sees a half-written file.
        let staging = self.path.with_extension("json.part");
        fs::write(&staging, body)?;
        fs::rename(&staging, &self.path)?;

        debug!("Directory cache written to {}", self.path.display());
        Ok(())
    }
}

/// In-process cache. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    slot: Arc<Mutex<Option<CachedDirectory>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(body: &[u8], captured_at: SystemTime) -> Self {
        let cache = Self::new();
        cache.put(CachedDirectory {
            body: body.to_vec(),
            captured_at,
        });
        cache
    }

    fn put(&self, entry: CachedDirectory) {
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(entry);
    }
}

impl DirectoryCache for MemoryCache {
    fn load(&self) -> Option<CachedDirectory> {
        match self.slot.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store(&self, body: &[u8]) -> std::io::Result<()> {
        self.put(CachedDirectory {
            body: body.to_vec(),
            captured_at: SystemTime::now(),
        });
        Ok(())
    }
}

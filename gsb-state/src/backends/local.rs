//! Local file store for instance records
//!
//! This store keeps the instance table in a local JSON file (default: gsb.state.json).
//! Writers hold a `.lock` file next to the table and replace the table by renaming a
//! fully written temp file, so readers never see a partial table.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use gsb_core::ServiceInstanceDetails;
use log::{debug, warn};
use tokio::sync::Mutex;

use crate::backend::{InstanceStore, StoreConfig, StoreError, StoreResult};
use crate::table::InstanceTable;

/// Local file store for development and single-host deployments
pub struct LocalStore {
    /// Path to the table file
    path: PathBuf,
    /// Lock file shared with other processes using the same table
    lock_path: PathBuf,
    /// How long a writer waits for another holder of the lock file
    lock_timeout: Duration,
    /// Serializes read-modify-write cycles within this process
    write_guard: Mutex<()>,
}

/// Removes the lock file when dropped
struct LockFile {
    path: PathBuf,
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("failed to remove lock file {}: {}", self.path.display(), e);
        }
    }
}

impl LocalStore {
    /// Default table file name
    pub const DEFAULT_STATE_FILE: &'static str = "gsb.state.json";

    /// Default wait for the lock file
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

    /// Lock files older than this are left over from a crashed writer
    const STALE_LOCK_AGE: Duration = Duration::from_secs(120);

    const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(20);

    /// Create a new LocalStore at the default path in the current directory
    pub fn new() -> Self {
        Self::with_path(PathBuf::from(Self::DEFAULT_STATE_FILE))
    }

    /// Create a new LocalStore with a specific table file path
    pub fn with_path(path: PathBuf) -> Self {
        let lock_path = path.with_extension("lock");
        Self {
            path,
            lock_path,
            lock_timeout: Self::DEFAULT_LOCK_TIMEOUT,
            write_guard: Mutex::new(()),
        }
    }

    /// Set how long writers wait for the lock file
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Create a LocalStore from configuration
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        match config.get_string("path") {
            Some("") => Err(StoreError::configuration("path must not be empty")),
            Some(path) => Ok(Self::with_path(PathBuf::from(path))),
            None => Ok(Self::new()),
        }
    }

    /// Get the table file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Get the lock file path
    pub fn lock_path(&self) -> &PathBuf {
        &self.lock_path
    }

    async fn acquire_lock(&self) -> StoreResult<LockFile> {
        let deadline = tokio::time::Instant::now() + self.lock_timeout;
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&self.lock_path)
            {
                Ok(_) => {
                    return Ok(LockFile {
                        path: self.lock_path.clone(),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if self.lock_is_stale() {
                        warn!("removing stale lock file {}", self.lock_path.display());
                        if std::fs::remove_file(&self.lock_path).is_ok() {
                            continue;
                        }
                    }
                    if tokio::time::Instant::now() >= deadline {
                        return Err(StoreError::Locked(self.lock_path.display().to_string()));
                    }
                    tokio::time::sleep(Self::LOCK_RETRY_INTERVAL).await;
                }
                Err(e) => {
                    return Err(StoreError::Io(format!("Failed to create lock file: {}", e)));
                }
            }
        }
    }

    fn lock_is_stale(&self) -> bool {
        std::fs::metadata(&self.lock_path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age > Self::STALE_LOCK_AGE)
    }

    fn read_table(&self) -> StoreResult<InstanceTable> {
        if !self.path.exists() {
            return Ok(InstanceTable::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| StoreError::Io(format!("Failed to read state file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| StoreError::InvalidState(format!("Failed to parse state file: {}", e)))
    }

    fn write_table(&self, table: &mut InstanceTable) -> StoreResult<()> {
        table.increment_serial();

        let content = serde_json::to_string_pretty(table).map_err(|e| {
            StoreError::Serialization(format!("Failed to serialize instance table: {}", e))
        })?;

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, content)
            .map_err(|e| StoreError::Io(format!("Failed to write state file: {}", e)))?;
        std::fs::rename(&tmp_path, &self.path)
            .map_err(|e| StoreError::Io(format!("Failed to replace state file: {}", e)))?;

        debug!(
            "wrote {} instance records to {} (serial {})",
            table.instances.len(),
            self.path.display(),
            table.serial
        );
        Ok(())
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InstanceStore for LocalStore {
    async fn find_instance(&self, id: &str) -> StoreResult<Option<ServiceInstanceDetails>> {
        let table = self.read_table()?;
        Ok(table.find(id).cloned())
    }

    async fn save_instance(&self, details: &ServiceInstanceDetails) -> StoreResult<()> {
        let _guard = self.write_guard.lock().await;
        let _lock = self.acquire_lock().await?;
        let mut table = self.read_table()?;
        table.upsert(details.clone());
        self.write_table(&mut table)
    }

    async fn delete_instance(&self, id: &str) -> StoreResult<Option<ServiceInstanceDetails>> {
        let _guard = self.write_guard.lock().await;
        let _lock = self.acquire_lock().await?;
        let mut table = self.read_table()?;
        let removed = table.remove(id);
        if removed.is_some() {
            self.write_table(&mut table)?;
        }
        Ok(removed)
    }

    async fn list_instances(&self) -> StoreResult<Vec<ServiceInstanceDetails>> {
        Ok(self.read_table()?.instances)
    }
}

//! Instance table structure persisted by file-backed stores

use chrono::{DateTime, Utc};
use gsb_core::ServiceInstanceDetails;
use serde::{Deserialize, Serialize};

/// The persisted collection of instance records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceTable {
    /// Table format version
    pub version: u32,
    /// Monotonically increasing number for each table modification
    pub serial: u64,
    /// When the table was last written
    pub updated_at: DateTime<Utc>,
    pub instances: Vec<ServiceInstanceDetails>,
}

impl InstanceTable {
    /// Current table format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new empty table
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            updated_at: Utc::now(),
            instances: Vec::new(),
        }
    }

    /// Increment serial and stamp the time for a new write
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.updated_at = Utc::now();
    }

    /// Find a record by instance id
    pub fn find(&self, id: &str) -> Option<&ServiceInstanceDetails> {
        self.instances.iter().find(|i| i.id == id)
    }

    /// Add or replace the record with the same id
    pub fn upsert(&mut self, details: ServiceInstanceDetails) {
        if let Some(existing) = self.instances.iter_mut().find(|i| i.id == details.id) {
            *existing = details;
        } else {
            self.instances.push(details);
        }
    }

    /// Remove a record by instance id
    pub fn remove(&mut self, id: &str) -> Option<ServiceInstanceDetails> {
        let pos = self.instances.iter().position(|i| i.id == id)?;
        Some(self.instances.remove(pos))
    }
}

impl Default for InstanceTable {
    fn default() -> Self {
        Self::new()
    }
}

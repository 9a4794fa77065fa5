//! In-memory store, for tests and embedders that persist records themselves

use async_trait::async_trait;
use gsb_core::ServiceInstanceDetails;
use tokio::sync::RwLock;

use crate::backend::{InstanceStore, StoreResult};
use crate::table::InstanceTable;

#[derive(Default)]
pub struct MemoryStore {
    table: RwLock<InstanceTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`
    pub fn with_instances(records: impl IntoIterator<Item = ServiceInstanceDetails>) -> Self {
        let mut table = InstanceTable::new();
        for record in records {
            table.upsert(record);
        }
        Self {
            table: RwLock::new(table),
        }
    }
}

#[async_trait]
impl InstanceStore for MemoryStore {
    async fn find_instance(&self, id: &str) -> StoreResult<Option<ServiceInstanceDetails>> {
        Ok(self.table.read().await.find(id).cloned())
    }

    async fn save_instance(&self, details: &ServiceInstanceDetails) -> StoreResult<()> {
        let mut table = self.table.write().await;
        table.upsert(details.clone());
        table.increment_serial();
        Ok(())
    }

    async fn delete_instance(&self, id: &str) -> StoreResult<Option<ServiceInstanceDetails>> {
        let mut table = self.table.write().await;
        let removed = table.remove(id);
        if removed.is_some() {
            table.increment_serial();
        }
        Ok(removed)
    }

    async fn list_instances(&self) -> StoreResult<Vec<ServiceInstanceDetails>> {
        Ok(self.table.read().await.instances.clone())
    }
}

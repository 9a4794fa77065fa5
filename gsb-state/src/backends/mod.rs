//! Backend implementations for instance storage

mod local;
mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use crate::backend::{InstanceStore, StoreConfig, StoreError, StoreResult};

/// Create a store from configuration
///
/// This function dispatches to the appropriate store implementation
/// based on the backend_type in the configuration.
pub fn create_store(config: &StoreConfig) -> StoreResult<Box<dyn InstanceStore>> {
    match config.backend_type.as_str() {
        "local" => Ok(Box::new(LocalStore::from_config(config)?)),
        "memory" => Ok(Box::new(MemoryStore::new())),
        other => Err(StoreError::unsupported_backend(other)),
    }
}

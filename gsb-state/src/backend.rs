//! Instance store trait and error types

use std::collections::HashMap;

use async_trait::async_trait;
use gsb_core::ServiceInstanceDetails;
use thiserror::Error;

/// Errors that can occur when interacting with an instance store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend type is not supported
    #[error("Unsupported store backend: {0}")]
    UnsupportedBackend(String),

    /// Configuration error
    #[error("Store configuration error: {0}")]
    Configuration(String),

    /// Stored table is corrupted or invalid
    #[error("Invalid instance table: {0}")]
    InvalidState(String),

    /// Network or I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Another writer holds the store lock
    #[error("Instance store is locked: {0}")]
    Locked(String),
}

impl StoreError {
    /// Create an unsupported backend error
    pub fn unsupported_backend(backend_type: impl Into<String>) -> Self {
        Self::UnsupportedBackend(backend_type.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for instance record storage backends
///
/// Records are keyed by the broker-level instance id, which may differ from the
/// provider-side instance name.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Find the record stored under `id`
    ///
    /// Returns `None` if no record matches
    async fn find_instance(&self, id: &str) -> StoreResult<Option<ServiceInstanceDetails>>;

    /// Insert or replace the record with the same id
    async fn save_instance(&self, details: &ServiceInstanceDetails) -> StoreResult<()>;

    /// Remove the record stored under `id`, returning it if it existed
    async fn delete_instance(&self, id: &str) -> StoreResult<Option<ServiceInstanceDetails>>;

    /// All stored records
    async fn list_instances(&self) -> StoreResult<Vec<ServiceInstanceDetails>>;
}

/// Configuration for an instance store
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Backend type (e.g., "local", "memory")
    pub backend_type: String,
    /// Backend-specific attributes
    pub attributes: HashMap<String, String>,
}

impl StoreConfig {
    /// Local file store at `path`
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            backend_type: "local".to_string(),
            attributes: [("path".to_string(), path.into())].into_iter().collect(),
        }
    }

    pub fn memory() -> Self {
        Self {
            backend_type: "memory".to_string(),
            attributes: HashMap::new(),
        }
    }

    /// Get a string attribute value
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

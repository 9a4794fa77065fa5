//! gsb Instance Storage
//!
//! This crate stores the instance records brokers hand back from provisioning,
//! so that a later deprovision can find the provider-side instance again.
//!
//! # Overview
//!
//! - **InstanceTable**: the persisted collection of `ServiceInstanceDetails`
//! - **InstanceStore**: a trait for storage backends (local file, in-memory)
//!
//! # Example
//!
//! ```ignore
//! use gsb_state::{create_store, StoreConfig};
//!
//! let config = StoreConfig::local("gsb.state.json");
//! let store = create_store(&config)?;
//!
//! store.save_instance(&details).await?;
//! let found = store.find_instance("instance-1").await?;
//! ```

pub mod backend;
pub mod backends;
pub mod table;

// Re-export main types for convenience
pub use backend::{InstanceStore, StoreConfig, StoreError, StoreResult};
pub use backends::{LocalStore, MemoryStore, create_store};
pub use table::InstanceTable;

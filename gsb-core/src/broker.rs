//! Broker - Trait abstracting service provisioning
//!
//! A ServiceBroker handles one service type (Bigtable, Pub/Sub, ...) under the
//! platform-wide broker protocol. It is responsible for converting provision and
//! deprovision requests into actual API calls against the backing provider.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::models::{DeprovisionDetails, PlanDetails, ProvisionDetails, ServiceInstanceDetails};

/// Errors surfaced to the platform by broker operations
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Request parameters were not a JSON object of strings
    #[error("Error unmarshalling parameters: {0}")]
    InvalidParameters(String),

    /// Plan features were not a JSON object of strings
    #[error("Error unmarshalling plan features: {0}")]
    InvalidPlanFeatures(String),

    /// `num_nodes` in the plan features is not an integer
    #[error("Error converting num_nodes to int: {0}")]
    InvalidNumNodes(String),

    /// `storage_type` in the plan features is not a known storage type
    #[error("Unknown storage_type: {0:?}")]
    UnknownStorageType(String),

    /// The provider admin client could not be opened
    #[error("Error creating bigtable client: {0}")]
    ClientCreation(String),

    #[error("Error creating new instance: {0}")]
    CreateInstance(String),

    #[error("Error deleting instance: {0}")]
    DeleteInstance(String),

    /// Provider-specific details could not be encoded or decoded
    #[error("Error marshalling other details: {0}")]
    Serialization(String),

    /// The persistence layer failed while looking up a record
    #[error("Error reading instance record: {0}")]
    Persistence(String),

    /// No persisted record matches the requested instance id
    #[error("instance does not exist")]
    InstanceDoesNotExist,
}

impl BrokerError {
    /// Whether the platform may treat the failed request as already satisfied
    pub fn is_not_found(&self) -> bool {
        matches!(self, BrokerError::InstanceDoesNotExist)
    }
}

pub type BrokerResult<T> = Result<T, BrokerError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Main broker trait
///
/// Each service plugin implements this trait. Both operations are single-shot:
/// they run to completion or failure and are never retried here.
pub trait ServiceBroker: Send + Sync {
    /// Name of the service this broker manages (e.g., "bigtable")
    fn name(&self) -> &'static str;

    /// Create a service instance
    ///
    /// Returns the record the caller must persist to later deprovision the instance.
    fn provision(
        &self,
        instance_id: &str,
        details: &ProvisionDetails,
        plan: &PlanDetails,
    ) -> BoxFuture<'_, BrokerResult<ServiceInstanceDetails>>;

    /// Delete the service instance recorded under `instance_id`
    fn deprovision(
        &self,
        instance_id: &str,
        details: &DeprovisionDetails,
    ) -> BoxFuture<'_, BrokerResult<()>>;
}

/// ServiceBroker implementation for Box<dyn ServiceBroker>
/// This enables dynamic dispatch for brokers
impl ServiceBroker for Box<dyn ServiceBroker> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn provision(
        &self,
        instance_id: &str,
        details: &ProvisionDetails,
        plan: &PlanDetails,
    ) -> BoxFuture<'_, BrokerResult<ServiceInstanceDetails>> {
        (**self).provision(instance_id, details, plan)
    }

    fn deprovision(
        &self,
        instance_id: &str,
        details: &DeprovisionDetails,
    ) -> BoxFuture<'_, BrokerResult<()>> {
        (**self).deprovision(instance_id, details)
    }
}

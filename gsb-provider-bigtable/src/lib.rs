//! gsb Bigtable Broker
//!
//! Service broker plugin that provisions and deprovisions Cloud Bigtable instances.
//!
//! ## Module Structure
//!
//! - `params` - Resolves request parameters and plan features into an instance configuration
//! - `admin` - Bigtable Admin API client
//! - `record` - Instance information stored in the generic instance record
//! - `plan` - Operator-defined plans
//! - `broker` - BigtableBroker implementation

pub mod admin;
pub mod broker;
pub mod params;
pub mod plan;
pub mod record;

// Re-export main types
pub use admin::{AdminConfig, AdminError, InstanceAdmin, RestInstanceAdmin};
pub use broker::BigtableBroker;
pub use params::{InstanceConfiguration, StorageType, resolve};
pub use plan::{BigtableDynamicPlan, map_plan};
pub use record::{InstanceInformation, instance_details, instance_information};

use gsb_core::{
    BoxFuture, BrokerResult, DeprovisionDetails, PlanDetails, ProvisionDetails, ServiceBroker,
    ServiceInstanceDetails,
};

// =============================================================================
// ServiceBroker Trait Implementation
// =============================================================================

impl ServiceBroker for BigtableBroker {
    fn name(&self) -> &'static str {
        "bigtable"
    }

    fn provision(
        &self,
        _instance_id: &str,
        details: &ProvisionDetails,
        plan: &PlanDetails,
    ) -> BoxFuture<'_, BrokerResult<ServiceInstanceDetails>> {
        let details = details.clone();
        let plan = plan.clone();
        Box::pin(async move { self.provision_instance(&details, &plan).await })
    }

    fn deprovision(
        &self,
        instance_id: &str,
        _details: &DeprovisionDetails,
    ) -> BoxFuture<'_, BrokerResult<()>> {
        let instance_id = instance_id.to_string();
        Box::pin(async move { self.deprovision_instance(&instance_id).await })
    }
}

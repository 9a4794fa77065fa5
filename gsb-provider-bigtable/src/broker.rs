//! Bigtable broker implementation
//!
//! Provision resolves the request into an `InstanceConfiguration` and creates the
//! instance; deprovision finds the stored record and deletes the instance it names.

use std::sync::Arc;

use gsb_core::{
    BasicNameGenerator, BrokerError, BrokerResult, NameGenerator, PlanDetails, ProvisionDetails,
    ServiceInstanceDetails,
};
use gsb_state::InstanceStore;
use log::{debug, info};

use crate::admin::{AdminError, InstanceAdmin};
use crate::params;
use crate::record;

/// Broker for Bigtable instances in one project
pub struct BigtableBroker {
    project_id: String,
    admin: Arc<dyn InstanceAdmin>,
    store: Arc<dyn InstanceStore>,
    names: Arc<dyn NameGenerator>,
}

impl BigtableBroker {
    pub fn new(
        project_id: impl Into<String>,
        admin: Arc<dyn InstanceAdmin>,
        store: Arc<dyn InstanceStore>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            admin,
            store,
            names: Arc::new(BasicNameGenerator::new()),
        }
    }

    /// Replace the generator used for instances the user did not name
    pub fn with_name_generator(mut self, names: Arc<dyn NameGenerator>) -> Self {
        self.names = names;
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Create the instance described by the request parameters and plan
    pub async fn provision_instance(
        &self,
        details: &ProvisionDetails,
        plan: &PlanDetails,
    ) -> BrokerResult<ServiceInstanceDetails> {
        let config =
            params::resolve(&details.raw_parameters, &plan.features, self.names.as_ref())?;

        debug!("resolved bigtable instance configuration: {:?}", config);

        self.admin
            .create_instance(&self.project_id, &config)
            .await
            .map_err(|e| provider_error(e, BrokerError::CreateInstance))?;

        info!(
            "created bigtable instance {} in project {}",
            config.name, self.project_id
        );

        record::instance_details(&config.name)
    }

    /// Delete the instance recorded under `instance_id`
    ///
    /// The provider-side name comes from the stored record, never from `instance_id`.
    pub async fn deprovision_instance(&self, instance_id: &str) -> BrokerResult<()> {
        let instance = self
            .store
            .find_instance(instance_id)
            .await
            .map_err(|e| BrokerError::Persistence(e.to_string()))?
            .ok_or(BrokerError::InstanceDoesNotExist)?;

        self.admin
            .delete_instance(&self.project_id, &instance.name)
            .await
            .map_err(|e| provider_error(e, BrokerError::DeleteInstance))?;

        info!(
            "deleted bigtable instance {} (service instance {}) in project {}",
            instance.name, instance_id, self.project_id
        );
        Ok(())
    }
}

fn provider_error(error: AdminError, wrap: fn(String) -> BrokerError) -> BrokerError {
    match error {
        AdminError::Client(message) => BrokerError::ClientCreation(message),
        other => wrap(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use gsb_core::{BoxFuture, DeprovisionDetails, ServiceBroker};
    use gsb_state::{MemoryStore, StoreError, StoreResult};

    use crate::admin::AdminResult;
    use crate::params::{InstanceConfiguration, StorageType};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(String, InstanceConfiguration),
        Delete(String, String),
    }

    /// Records calls and answers with a canned result
    #[derive(Default)]
    struct RecordingAdmin {
        calls: Mutex<Vec<Call>>,
        fail_with: Option<fn() -> AdminError>,
    }

    impl RecordingAdmin {
        fn failing(fail_with: fn() -> AdminError) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: Some(fail_with),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, call: Call) -> BoxFuture<'_, AdminResult<()>> {
            self.calls.lock().unwrap().push(call);
            let result = match self.fail_with {
                Some(fail) => Err(fail()),
                None => Ok(()),
            };
            Box::pin(async move { result })
        }
    }

    impl InstanceAdmin for RecordingAdmin {
        fn create_instance(
            &self,
            project_id: &str,
            config: &InstanceConfiguration,
        ) -> BoxFuture<'_, AdminResult<()>> {
            self.answer(Call::Create(project_id.to_string(), config.clone()))
        }

        fn delete_instance(&self, project_id: &str, name: &str) -> BoxFuture<'_, AdminResult<()>> {
            self.answer(Call::Delete(project_id.to_string(), name.to_string()))
        }
    }

    struct UnreachableStore;

    #[async_trait]
    impl InstanceStore for UnreachableStore {
        async fn find_instance(&self, _id: &str) -> StoreResult<Option<ServiceInstanceDetails>> {
            Err(StoreError::Io("connection refused".to_string()))
        }

        async fn save_instance(&self, _details: &ServiceInstanceDetails) -> StoreResult<()> {
            Err(StoreError::Io("connection refused".to_string()))
        }

        async fn delete_instance(
            &self,
            _id: &str,
        ) -> StoreResult<Option<ServiceInstanceDetails>> {
            Err(StoreError::Io("connection refused".to_string()))
        }

        async fn list_instances(&self) -> StoreResult<Vec<ServiceInstanceDetails>> {
            Err(StoreError::Io("connection refused".to_string()))
        }
    }

    fn broker(admin: Arc<RecordingAdmin>, store: Arc<dyn InstanceStore>) -> BigtableBroker {
        BigtableBroker::new("test-project", admin, store)
    }

    fn ssd_plan() -> PlanDetails {
        PlanDetails::with_features(r#"{"num_nodes":"3","storage_type":"SSD"}"#)
    }

    fn stored_foo() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_instances([ServiceInstanceDetails {
            id: "instance-1".to_string(),
            ..ServiceInstanceDetails::named("foo")
        }]))
    }

    #[tokio::test]
    async fn test_provision_creates_named_instance() {
        let admin = Arc::new(RecordingAdmin::default());
        let broker = broker(admin.clone(), Arc::new(MemoryStore::new()));

        let details = ProvisionDetails::default().with_raw_parameters(r#"{"name":"mytable"}"#);
        let instance = broker
            .provision("instance-1", &details, &ssd_plan())
            .await
            .unwrap();

        assert_eq!(
            admin.calls(),
            vec![Call::Create(
                "test-project".to_string(),
                InstanceConfiguration {
                    name: "mytable".to_string(),
                    cluster_id: "mytable-cluster".to_string(),
                    num_nodes: 3,
                    storage_type: StorageType::Ssd,
                    zone: "us-east1-b".to_string(),
                    display_name: "mytable".to_string(),
                }
            )]
        );

        assert_eq!(instance.name, "mytable");
        let other: serde_json::Value = serde_json::from_str(&instance.other_details).unwrap();
        assert_eq!(other, serde_json::json!({"instance_id": "mytable"}));
    }

    #[tokio::test]
    async fn test_provision_from_request_body() {
        let admin = Arc::new(RecordingAdmin::default());
        let broker = broker(admin.clone(), Arc::new(MemoryStore::new()));

        let details: ProvisionDetails = serde_json::from_str(
            r#"{
                "service_id": "bigtable-service",
                "plan_id": "ssd-3",
                "organization_guid": "org",
                "space_guid": "space",
                "parameters": {"name": "mytable", "display_name": "My Table"}
            }"#,
        )
        .unwrap();

        let instance = broker
            .provision("instance-1", &details, &ssd_plan())
            .await
            .unwrap();

        assert_eq!(instance.name, "mytable");
        match &admin.calls()[..] {
            [Call::Create(_, config)] => {
                assert_eq!(config.name, "mytable");
                assert_eq!(config.display_name, "My Table");
            }
            other => panic!("Expected one create call, got {:?}", other),
        }
    }

    struct FixedName;

    impl NameGenerator for FixedName {
        fn instance_name_with_separator(&self, separator: char) -> String {
            format!("pcf{separator}sb{separator}a-rather-long-generated-name")
        }
    }

    #[tokio::test]
    async fn test_provision_unnamed_instance_uses_generator() {
        let admin = Arc::new(RecordingAdmin::default());
        let broker = broker(admin.clone(), Arc::new(MemoryStore::new()))
            .with_name_generator(Arc::new(FixedName));

        let instance = broker
            .provision("instance-1", &ProvisionDetails::default(), &ssd_plan())
            .await
            .unwrap();

        assert_eq!(instance.name, "pcf-sb-a-rather-long-generated-name");
        match &admin.calls()[..] {
            [Call::Create(_, config)] => {
                assert_eq!(config.cluster_id, "pcf-sb-a-rather-long-cluster");
                assert_eq!(config.display_name, "pcf-sb-a-rather-long-generated-name");
            }
            other => panic!("Expected one create call, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provision_invalid_parameters_skip_provider() {
        let admin = Arc::new(RecordingAdmin::default());
        let broker = broker(admin.clone(), Arc::new(MemoryStore::new()));

        let details = ProvisionDetails::default().with_raw_parameters("{");
        let err = broker
            .provision("instance-1", &details, &ssd_plan())
            .await
            .unwrap_err();

        assert!(matches!(err, BrokerError::InvalidParameters(_)));
        assert!(admin.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provision_wraps_provider_error() {
        let admin = Arc::new(RecordingAdmin::failing(|| AdminError::Api {
            status: 409,
            message: "Instance mytable already exists.".to_string(),
        }));
        let broker = broker(admin.clone(), Arc::new(MemoryStore::new()));

        let details = ProvisionDetails::default().with_raw_parameters(r#"{"name":"mytable"}"#);
        let err = broker
            .provision("instance-1", &details, &ssd_plan())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error creating new instance: Instance mytable already exists. (HTTP 409)"
        );
    }

    #[tokio::test]
    async fn test_provision_client_failure() {
        let admin = Arc::new(RecordingAdmin::failing(|| {
            AdminError::Client("no TLS backend".to_string())
        }));
        let broker = broker(admin, Arc::new(MemoryStore::new()));

        let err = broker
            .provision("instance-1", &ProvisionDetails::default(), &ssd_plan())
            .await
            .unwrap_err();

        assert!(matches!(err, BrokerError::ClientCreation(_)));
    }

    #[tokio::test]
    async fn test_deprovision_unknown_instance() {
        let admin = Arc::new(RecordingAdmin::default());
        let broker = broker(admin.clone(), stored_foo());

        let err = broker
            .deprovision("instance-2", &DeprovisionDetails::default())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(admin.calls().is_empty());
    }

    #[tokio::test]
    async fn test_deprovision_deletes_stored_name() {
        let admin = Arc::new(RecordingAdmin::default());
        let broker = broker(admin.clone(), stored_foo());

        broker
            .deprovision("instance-1", &DeprovisionDetails::default())
            .await
            .unwrap();

        assert_eq!(
            admin.calls(),
            vec![Call::Delete("test-project".to_string(), "foo".to_string())]
        );
    }

    #[tokio::test]
    async fn test_deprovision_wraps_provider_error() {
        let admin = Arc::new(RecordingAdmin::failing(|| AdminError::Api {
            status: 404,
            message: "Instance foo not found.".to_string(),
        }));
        let broker = broker(admin, stored_foo());

        let err = broker
            .deprovision("instance-1", &DeprovisionDetails::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error deleting instance: Instance foo not found. (HTTP 404)"
        );
    }

    #[tokio::test]
    async fn test_deprovision_store_failure() {
        let admin = Arc::new(RecordingAdmin::default());
        let broker = broker(admin.clone(), Arc::new(UnreachableStore));

        let err = broker
            .deprovision("instance-1", &DeprovisionDetails::default())
            .await
            .unwrap_err();

        assert!(matches!(err, BrokerError::Persistence(_)));
        assert!(admin.calls().is_empty());
    }
}

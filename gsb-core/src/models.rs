//! Models - Requests, plans and persisted instance records

use serde::{Deserialize, Serialize};

/// User agent attached to every provider admin call
pub const CUSTOM_USER_AGENT: &str = "gcp-service-broker";

/// Payload of a provision request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvisionDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub organization_guid: String,
    #[serde(default)]
    pub space_guid: String,
    /// User-supplied instance options as raw JSON text (empty when none were given)
    ///
    /// On the wire this is the request's `parameters` object, kept verbatim.
    #[serde(
        default,
        rename = "parameters",
        with = "raw_json",
        skip_serializing_if = "String::is_empty"
    )]
    pub raw_parameters: String,
}

/// Carries an arbitrary JSON value as its exact source text
mod raw_json {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::value::RawValue;

    pub fn serialize<S: Serializer>(raw: &str, serializer: S) -> Result<S::Ok, S::Error> {
        let value = RawValue::from_string(raw.to_string()).map_err(serde::ser::Error::custom)?;
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let raw = Option::<Box<RawValue>>::deserialize(deserializer)?;
        Ok(raw.map(|r| r.get().to_string()).unwrap_or_default())
    }
}

impl ProvisionDetails {
    pub fn with_raw_parameters(mut self, raw: impl Into<String>) -> Self {
        self.raw_parameters = raw.into();
        self
    }
}

/// Payload of a deprovision request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeprovisionDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
}

/// Service plan metadata chosen by the catalog, not by the end user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanDetails {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON-encoded plan configuration (e.g. `{"num_nodes":"3","storage_type":"SSD"}`)
    #[serde(default)]
    pub features: String,
}

impl PlanDetails {
    pub fn with_features(features: impl Into<String>) -> Self {
        Self {
            features: features.into(),
            ..Default::default()
        }
    }
}

/// Generic record of a provisioned instance
///
/// Brokers fill `name`, `url`, `location` and `other_details`; the caller fills the
/// identifying fields before persisting it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInstanceDetails {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub url: String,
    /// Provider-specific identifying data as JSON text
    #[serde(default)]
    pub other_details: String,
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub space_guid: String,
    #[serde(default)]
    pub organization_guid: String,
}

impl ServiceInstanceDetails {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_other_details(mut self, other_details: impl Into<String>) -> Self {
        self.other_details = other_details.into();
        self
    }

    /// Fill the fields owned by the caller from the originating request
    pub fn for_request(
        mut self,
        instance_id: impl Into<String>,
        details: &ProvisionDetails,
    ) -> Self {
        self.id = instance_id.into();
        self.service_id = details.service_id.clone();
        self.plan_id = details.plan_id.clone();
        self.space_guid = details.space_guid.clone();
        self.organization_guid = details.organization_guid.clone();
        self
    }
}

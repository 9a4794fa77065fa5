//! Parameter resolution
//!
//! Merges the user's request parameters, the plan features and generated
//! defaults into a fully-resolved `InstanceConfiguration`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use gsb_core::{BrokerError, BrokerResult, NameGenerator};

/// Zone used when the request does not name one
pub const DEFAULT_ZONE: &str = "us-east1-b";

/// Longest prefix of the instance name kept in a derived cluster id
pub const CLUSTER_ID_NAME_LIMIT: usize = 20;

pub const CLUSTER_ID_SUFFIX: &str = "-cluster";

/// Storage media for the instance's cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Ssd,
    Hdd,
}

impl StorageType {
    /// Name used by plan features and the admin API
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Ssd => "SSD",
            StorageType::Hdd => "HDD",
        }
    }
}

impl FromStr for StorageType {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SSD" => Ok(StorageType::Ssd),
            "HDD" => Ok(StorageType::Hdd),
            other => Err(BrokerError::UnknownStorageType(other.to_string())),
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to issue a create-instance call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceConfiguration {
    /// Instance id on the provider, never empty
    pub name: String,
    pub cluster_id: String,
    pub num_nodes: i32,
    pub storage_type: StorageType,
    pub zone: String,
    pub display_name: String,
}

/// Resolve request parameters and plan features into an `InstanceConfiguration`
///
/// `raw_parameters` may be empty, which is the same as `{}`. Recognized parameters are
/// `name`, `cluster_id`, `zone` and `display_name`; the plan supplies `num_nodes` and
/// `storage_type`.
pub fn resolve(
    raw_parameters: &str,
    plan_features: &str,
    names: &dyn NameGenerator,
) -> BrokerResult<InstanceConfiguration> {
    let mut params = parse_parameters(raw_parameters)?;
    let features: HashMap<String, String> = serde_json::from_str(plan_features)
        .map_err(|e| BrokerError::InvalidPlanFeatures(e.to_string()))?;

    let name = match params.remove("name") {
        Some(name) if !name.is_empty() => name,
        _ => names.instance_name_with_separator('-'),
    };

    let cluster_id = params
        .remove("cluster_id")
        .unwrap_or_else(|| derive_cluster_id(&name));

    let num_nodes_raw = features.get("num_nodes").map(String::as_str).unwrap_or("");
    let num_nodes = num_nodes_raw
        .parse::<i32>()
        .map_err(|e| BrokerError::InvalidNumNodes(format!("{:?}: {}", num_nodes_raw, e)))?;

    let storage_type = features
        .get("storage_type")
        .map(String::as_str)
        .unwrap_or("")
        .parse::<StorageType>()?;

    let zone = params
        .remove("zone")
        .unwrap_or_else(|| DEFAULT_ZONE.to_string());

    let display_name = params.remove("display_name").unwrap_or_else(|| name.clone());

    Ok(InstanceConfiguration {
        name,
        cluster_id,
        num_nodes,
        storage_type,
        zone,
        display_name,
    })
}

fn parse_parameters(raw: &str) -> BrokerResult<HashMap<String, String>> {
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(raw).map_err(|e| BrokerError::InvalidParameters(e.to_string()))
}

/// Cluster id derived from an instance name: at most the first 20 characters plus `-cluster`
pub fn derive_cluster_id(name: &str) -> String {
    let prefix: String = name.chars().take(CLUSTER_ID_NAME_LIMIT).collect();
    format!("{}{}", prefix, CLUSTER_ID_SUFFIX)
}

//! Operator-defined Bigtable plans

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// A plan as operators declare it in broker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigtableDynamicPlan {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub num_nodes: String,
    pub storage_type: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "service")]
    pub service_id: String,
}

/// Plan features kept from a dynamic plan definition
pub fn map_plan(details: &HashMap<String, String>) -> HashMap<String, String> {
    ["num_nodes", "storage_type"]
        .into_iter()
        .map(|key| {
            let value = details.get(key).cloned().unwrap_or_default();
            (key.to_string(), value)
        })
        .collect()
}

impl BigtableDynamicPlan {
    /// Every field of the plan keyed by its configuration name
    pub fn details(&self) -> HashMap<String, String> {
        [
            ("guid", &self.guid),
            ("name", &self.name),
            ("description", &self.description),
            ("num_nodes", &self.num_nodes),
            ("storage_type", &self.storage_type),
            ("display_name", &self.display_name),
            ("service", &self.service_id),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
    }

    /// Plan features as the JSON text carried in `PlanDetails::features`
    pub fn features_json(&self) -> serde_json::Result<String> {
        let features: BTreeMap<String, String> = map_plan(&self.details()).into_iter().collect();
        serde_json::to_string(&features)
    }
}

//! Mapping between Bigtable instances and generic instance records

use gsb_core::{BrokerError, BrokerResult, ServiceInstanceDetails};
use serde::{Deserialize, Serialize};

/// Provider-specific data kept in `ServiceInstanceDetails::other_details`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInformation {
    pub instance_id: String,
}

/// Build the record returned for a newly created instance
///
/// Bigtable instances have no URL or location of their own, so both stay empty.
pub fn instance_details(name: &str) -> BrokerResult<ServiceInstanceDetails> {
    let info = InstanceInformation {
        instance_id: name.to_string(),
    };
    let other_details =
        serde_json::to_string(&info).map_err(|e| BrokerError::Serialization(e.to_string()))?;

    Ok(ServiceInstanceDetails::named(name).with_other_details(other_details))
}

/// Decode the instance information stored in a record
pub fn instance_information(details: &ServiceInstanceDetails) -> BrokerResult<InstanceInformation> {
    serde_json::from_str(&details.other_details)
        .map_err(|e| BrokerError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_details() {
        let details = instance_details("mytable").unwrap();
        assert_eq!(details.name, "mytable");
        assert!(details.url.is_empty());
        assert!(details.location.is_empty());

        let other: serde_json::Value = serde_json::from_str(&details.other_details).unwrap();
        assert_eq!(other, serde_json::json!({"instance_id": "mytable"}));
    }

    #[test]
    fn test_instance_information_rejects_garbage() {
        let details = ServiceInstanceDetails::named("foo").with_other_details("{}");
        assert!(matches!(
            instance_information(&details),
            Err(BrokerError::Serialization(_))
        ));
    }
}

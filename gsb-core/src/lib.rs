//! gsb Core
//!
//! Core library for service broker plugins that speak the Open Service Broker API.
//! Each plugin turns provision/deprovision requests into calls against one managed
//! service.

pub mod broker;
pub mod models;
pub mod name_generator;

pub use broker::{BoxFuture, BrokerError, BrokerResult, ServiceBroker};
pub use models::{
    CUSTOM_USER_AGENT, DeprovisionDetails, PlanDetails, ProvisionDetails, ServiceInstanceDetails,
};
pub use name_generator::{BasicNameGenerator, NameGenerator};

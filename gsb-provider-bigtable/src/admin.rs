//! Bigtable instance administration
//!
//! This module contains the client that talks to the Bigtable Admin v2 REST API
//! to create and delete instances.

use std::collections::HashMap;
use std::time::Duration;

use gsb_core::{BoxFuture, CUSTOM_USER_AGENT};
use log::debug;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::InstanceConfiguration;

pub const DEFAULT_ENDPOINT: &str = "https://bigtableadmin.googleapis.com";

/// Errors returned by the admin API or the transport underneath it
#[derive(Debug, Error)]
pub enum AdminError {
    /// The HTTP client could not be built
    #[error("{0}")]
    Client(String),

    /// The request never produced a response
    #[error("request failed: {0}")]
    Request(String),

    /// The API answered with a non-success status
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// A long-running operation finished with an error
    #[error("operation failed: {message} (code {code})")]
    Operation { code: i32, message: String },

    /// The response body was not what the API documents
    #[error("unexpected response: {0}")]
    Decode(String),
}

pub type AdminResult<T> = Result<T, AdminError>;

/// Remote instance operations the broker needs
///
/// Both calls are single-attempt. They return once the provider reports the
/// operation finished.
pub trait InstanceAdmin: Send + Sync {
    fn create_instance(
        &self,
        project_id: &str,
        config: &InstanceConfiguration,
    ) -> BoxFuture<'_, AdminResult<()>>;

    fn delete_instance(&self, project_id: &str, name: &str) -> BoxFuture<'_, AdminResult<()>>;
}

/// Connection settings for the admin API
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Base URL of the admin API (default: https://bigtableadmin.googleapis.com)
    pub endpoint: String,

    /// OAuth2 bearer token; requests are sent unauthenticated when unset
    pub access_token: Option<String>,

    pub user_agent: String,

    /// Delay between polls of a pending long-running operation
    pub poll_interval: Duration,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_token: None,
            user_agent: CUSTOM_USER_AGENT.to_string(),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Bigtable Admin API client over REST
///
/// A fresh HTTP client is opened for every call; nothing is pooled across calls.
pub struct RestInstanceAdmin {
    config: AdminConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateInstanceRequest<'a> {
    instance_id: &'a str,
    instance: InstanceBody<'a>,
    clusters: HashMap<&'a str, ClusterBody<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InstanceBody<'a> {
    display_name: &'a str,
    #[serde(rename = "type")]
    instance_type: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClusterBody<'a> {
    location: String,
    serve_nodes: i32,
    default_storage_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Status,
}

impl RestInstanceAdmin {
    pub fn new(config: AdminConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    fn open_client(&self) -> AdminResult<Client> {
        Client::builder()
            .user_agent(self.config.user_agent.as_str())
            .build()
            .map_err(|e| AdminError::Client(e.to_string()))
    }

    /// API URL for the given path segments, each percent-encoded on its own
    fn url(&self, segments: &[&str]) -> AdminResult<Url> {
        let mut url = Url::parse(&self.config.endpoint)
            .map_err(|e| AdminError::Client(format!("invalid endpoint: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                AdminError::Client(format!("invalid endpoint: {}", self.config.endpoint))
            })?
            .pop_if_empty()
            .push("v2")
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and return the body of a successful response
    async fn send(&self, request: RequestBuilder) -> AdminResult<String> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| AdminError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdminError::Request(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AdminError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    /// Create an instance with a single cluster and wait for the operation to finish
    pub async fn create(
        &self,
        project_id: &str,
        config: &InstanceConfiguration,
    ) -> AdminResult<()> {
        let client = self.open_client()?;

        let clusters = [(
            config.cluster_id.as_str(),
            ClusterBody {
                location: format!("projects/{}/locations/{}", project_id, config.zone),
                serve_nodes: config.num_nodes,
                default_storage_type: config.storage_type.as_str(),
            },
        )]
        .into_iter()
        .collect();

        let body = CreateInstanceRequest {
            instance_id: &config.name,
            instance: InstanceBody {
                display_name: &config.display_name,
                instance_type: "PRODUCTION",
            },
            clusters,
        };

        debug!(
            "creating bigtable instance {} in projects/{} (cluster {}, {} {} nodes in {})",
            config.name,
            project_id,
            config.cluster_id,
            config.num_nodes,
            config.storage_type,
            config.zone
        );

        let url = self.url(&["projects", project_id, "instances"])?;
        let response = self.send(client.post(url).json(&body)).await?;

        let operation = parse_operation(&response)?;
        self.wait_for_operation(&client, operation).await
    }

    /// Delete an instance by name
    pub async fn delete(&self, project_id: &str, name: &str) -> AdminResult<()> {
        let client = self.open_client()?;

        debug!("deleting bigtable instance {} in projects/{}", name, project_id);

        let url = self.url(&["projects", project_id, "instances", name])?;
        self.send(client.delete(url)).await?;
        Ok(())
    }

    /// Poll a long-running operation until it is done
    ///
    /// There is no attempt limit: the call lasts as long as the provider operation.
    async fn wait_for_operation(
        &self,
        client: &Client,
        mut operation: Operation,
    ) -> AdminResult<()> {
        loop {
            if operation.done {
                return match operation.error {
                    Some(status) => Err(AdminError::Operation {
                        code: status.code,
                        message: status.message,
                    }),
                    None => Ok(()),
                };
            }

            if operation.name.is_empty() {
                return Err(AdminError::Decode("pending operation has no name".to_string()));
            }

            tokio::time::sleep(self.config.poll_interval).await;

            debug!("polling operation {}", operation.name);
            let segments: Vec<&str> = operation.name.split('/').collect();
            let response = self.send(client.get(self.url(&segments)?)).await?;
            operation = parse_operation(&response)?;
        }
    }
}

fn parse_operation(body: &str) -> AdminResult<Operation> {
    serde_json::from_str(body).map_err(|e| AdminError::Decode(e.to_string()))
}

impl InstanceAdmin for RestInstanceAdmin {
    fn create_instance(
        &self,
        project_id: &str,
        config: &InstanceConfiguration,
    ) -> BoxFuture<'_, AdminResult<()>> {
        let project_id = project_id.to_string();
        let config = config.clone();
        Box::pin(async move { self.create(&project_id, &config).await })
    }

    fn delete_instance(&self, project_id: &str, name: &str) -> BoxFuture<'_, AdminResult<()>> {
        let project_id = project_id.to_string();
        let name = name.to_string();
        Box::pin(async move { self.delete(&project_id, &name).await })
    }
}

// labforge-core/src/infrastructure/adapters/databricks.rs

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::domain::permission::{GroupGrant, PermissionLevel};
use crate::domain::policy::PolicyDefinition;
use crate::domain::pool::InstancePoolSpec;
use crate::domain::resource::{InstancePoolId, PolicyId, Upserted};
use crate::error::LabforgeError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::workspace::WorkspaceApi;

// --- WIRE TYPES ---

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PoolSummary {
    instance_pool_id: String,
    instance_pool_name: String,
}

#[derive(Debug, Deserialize)]
struct ListPoolsResponse {
    #[serde(default)]
    instance_pools: Vec<PoolSummary>,
}

fn no_versions(versions: &&[String]) -> bool {
    versions.is_empty()
}

#[derive(Debug, Serialize)]
struct PoolBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    instance_pool_id: Option<&'a str>,
    instance_pool_name: &'a str,
    min_idle_instances: u32,
    idle_instance_autotermination_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    node_type_id: Option<&'a str>,
    #[serde(skip_serializing_if = "no_versions")]
    preloaded_spark_versions: &'a [String],
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    custom_tags: IndexMap<&'a str, &'a str>,
}

impl<'a> PoolBody<'a> {
    fn from_spec(spec: &'a InstancePoolSpec) -> Self {
        Self {
            instance_pool_id: None,
            instance_pool_name: &spec.name,
            min_idle_instances: spec.min_idle_instances,
            idle_instance_autotermination_minutes: spec.idle_instance_autotermination_minutes,
            node_type_id: spec.node_type_id.as_deref(),
            preloaded_spark_versions: &spec.preloaded_spark_versions,
            custom_tags: spec
                .tags
                .iter()
                .map(|t| (t.key.as_str(), t.value.as_str()))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatePoolResponse {
    instance_pool_id: String,
}

#[derive(Debug, Deserialize)]
struct PolicySummary {
    policy_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ListPoliciesResponse {
    #[serde(default)]
    policies: Vec<PolicySummary>,
}

#[derive(Debug, Serialize)]
struct PolicyBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    policy_id: Option<&'a str>,
    name: &'a str,
    definition: String,
}

#[derive(Debug, Deserialize)]
struct CreatePolicyResponse {
    policy_id: String,
}

#[derive(Debug, Serialize)]
struct AccessControlRequest {
    access_control_list: Vec<GroupGrant>,
}

// --- CLIENT ---

/// `WorkspaceApi` over the workspace REST API (2.0 endpoints, bearer token).
///
/// No retries: a failed call surfaces as [`InfrastructureError::Api`] or
/// [`InfrastructureError::Http`] and the reconcile attempt stops there.
pub struct DatabricksClient {
    http: reqwest::Client,
    host: String,
    token: String,
}

impl DatabricksClient {
    pub fn new(
        host: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InfrastructureError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            host: host.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api/2.0/{}", self.host, path);
        debug!(%method, %url, "➡️  Workspace API call");
        self.http.request(method, url).bearer_auth(&self.token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, InfrastructureError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed: Option<ApiErrorBody> = serde_json::from_str(&body).ok();
            let (error_code, message) = match parsed {
                Some(ApiErrorBody {
                    error_code,
                    message,
                }) => (
                    error_code.unwrap_or_else(|| status.as_str().to_string()),
                    message.unwrap_or_else(|| body.clone()),
                ),
                None => (status.as_str().to_string(), body),
            };
            return Err(InfrastructureError::Api {
                status: status.as_u16(),
                error_code,
                message,
            });
        }

        // Some endpoints answer with an empty body
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_str("{}")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn list_pools(&self) -> Result<Vec<PoolSummary>, InfrastructureError> {
        let response: ListPoolsResponse = self
            .send(self.request(Method::GET, "instance-pools/list"))
            .await?;
        Ok(response.instance_pools)
    }

    async fn list_policies(&self) -> Result<Vec<PolicySummary>, InfrastructureError> {
        let response: ListPoliciesResponse = self
            .send(self.request(Method::GET, "policies/clusters/list"))
            .await?;
        Ok(response.policies)
    }

    async fn grant(&self, path: String, group: &str, level: PermissionLevel) -> Result<(), InfrastructureError> {
        let body = AccessControlRequest {
            access_control_list: vec![GroupGrant::new(group, level)],
        };
        let _: serde_json::Value = self
            .send(self.request(Method::PATCH, &path).json(&body))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WorkspaceApi for DatabricksClient {
    #[instrument(skip(self))]
    async fn delete_instance_pool_by_name(&self, name: &str) -> Result<bool, LabforgeError> {
        let matching: Vec<PoolSummary> = self
            .list_pools()
            .await?
            .into_iter()
            .filter(|p| p.instance_pool_name == name)
            .collect();

        if matching.len() > 1 {
            warn!(count = matching.len(), "Several pools share this name, deleting all of them");
        }

        let mut deleted = false;
        for pool in matching {
            let body = serde_json::json!({ "instance_pool_id": pool.instance_pool_id });
            let result: Result<serde_json::Value, _> = self
                .send(self.request(Method::POST, "instance-pools/delete").json(&body))
                .await;
            match result {
                Ok(_) => deleted = true,
                // Deleted by someone else between list and delete
                Err(e) if e.is_not_found() => {
                    debug!(pool_id = %pool.instance_pool_id, "Pool already gone");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(deleted)
    }

    #[instrument(skip(self, spec), fields(pool = %spec.name))]
    async fn create_or_update_instance_pool(
        &self,
        spec: &InstancePoolSpec,
    ) -> Result<Upserted<InstancePoolId>, LabforgeError> {
        let existing_id = self
            .list_pools()
            .await?
            .into_iter()
            .find(|p| p.instance_pool_name == spec.name)
            .map(|p| p.instance_pool_id);

        let mut body = PoolBody::from_spec(spec);
        body.instance_pool_id = existing_id.as_deref();

        match &existing_id {
            Some(id) => {
                let _: serde_json::Value = self
                    .send(self.request(Method::POST, "instance-pools/edit").json(&body))
                    .await?;
                Ok(Upserted::updated(InstancePoolId::new(id.clone())))
            }
            None => {
                let created: CreatePoolResponse = self
                    .send(self.request(Method::POST, "instance-pools/create").json(&body))
                    .await?;
                Ok(Upserted::created(InstancePoolId::new(created.instance_pool_id)))
            }
        }
    }

    #[instrument(skip(self, definition))]
    async fn create_or_update_cluster_policy(
        &self,
        name: &str,
        definition: &PolicyDefinition,
    ) -> Result<Upserted<PolicyId>, LabforgeError> {
        let existing = self
            .list_policies()
            .await?
            .into_iter()
            .find(|p| p.name == name);

        let definition = definition
            .to_json_string()
            .map_err(InfrastructureError::Json)?;

        match existing {
            Some(policy) => {
                let body = PolicyBody {
                    policy_id: Some(&policy.policy_id),
                    name,
                    definition,
                };
                let _: serde_json::Value = self
                    .send(self.request(Method::POST, "policies/clusters/edit").json(&body))
                    .await?;
                Ok(Upserted::updated(PolicyId::new(policy.policy_id.clone())))
            }
            None => {
                let body = PolicyBody {
                    policy_id: None,
                    name,
                    definition,
                };
                let created: CreatePolicyResponse = self
                    .send(self.request(Method::POST, "policies/clusters/create").json(&body))
                    .await?;
                Ok(Upserted::created(PolicyId::new(created.policy_id)))
            }
        }
    }

    async fn update_pool_group_permission(
        &self,
        pool_id: &InstancePoolId,
        group: &str,
        level: PermissionLevel,
    ) -> Result<(), LabforgeError> {
        self.grant(format!("permissions/instance-pools/{}", pool_id), group, level)
            .await?;
        Ok(())
    }

    async fn update_policy_group_permission(
        &self,
        policy_id: &PolicyId,
        group: &str,
        level: PermissionLevel,
    ) -> Result<(), LabforgeError> {
        self.grant(format!("permissions/cluster-policies/{}", policy_id), group, level)
            .await?;
        Ok(())
    }
}

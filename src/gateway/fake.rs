//! In-memory stand-in for the three services.
//!
//! The fake keeps just enough state to replay a reconciliation twice and
//! reproduces the echo quirks of the real service: suppressed response
//! headers and empty templates are accepted but never reported back.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{RemoteError, Result, SyncError};
use crate::model::{
    AlarmNode, AuthorizerNode, IntegrationDocument, IntegrationResponseDocument, MethodRequest,
    MethodResponseDocument, MethodTarget, ROOT_PATH, child_path,
};
use crate::planner::{PatchOp, PatchOperation, to_value};

use super::api::{AlarmApi, Backends, FunctionApi, GatewayApi};
use super::types::{
    DeploymentRequest, InvokePermission, KeyPage, NewApiKey, RemoteAuthorizer, RemoteMethod,
    RemoteResource, ResourcePage, RestApiInfo,
};

const PAGE_SIZE: usize = 2;
pub const ROOT_ID: &str = "root";
pub const ACCOUNT_ID: &str = "123456789012";
pub const REGION: &str = "us-east-1";

#[derive(Debug, Default)]
struct State {
    api: RestApiInfo,
    resources: BTreeMap<String, RemoteResource>,
    next_id: usize,
    authorizers: Vec<RemoteAuthorizer>,
    vpc_links: BTreeSet<String>,
    api_keys: BTreeMap<String, String>,
    usage_plan_keys: BTreeMap<String, Vec<String>>,
    deployments: Vec<DeploymentRequest>,
    functions: BTreeMap<String, Vec<String>>,
    permissions: Vec<InvokePermission>,
    alarms: Vec<AlarmNode>,
    calls: Vec<String>,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn method(&mut self, target: &MethodTarget, operation: &str) -> Result<&mut RemoteMethod> {
        self.resources
            .get_mut(&target.resource_id)
            .and_then(|r| r.methods.get_mut(target.http_method.as_str()))
            .ok_or_else(|| RemoteError::not_found(operation, target.to_string()).into())
    }
}

/// Shared in-memory cloud.
#[derive(Debug, Clone)]
pub struct FakeCloud {
    state: Arc<Mutex<State>>,
}

impl FakeCloud {
    /// An API holding only its root resource.
    pub fn new(rest_api_id: &str) -> Self {
        let mut state = State {
            api: RestApiInfo {
                id: rest_api_id.to_string(),
                name: String::from("users-api"),
                binary_media_types: Vec::new(),
            },
            ..State::default()
        };
        state.resources.insert(
            String::from(ROOT_ID),
            RemoteResource {
                id: String::from(ROOT_ID),
                path: String::from(ROOT_PATH),
                ..RemoteResource::default()
            },
        );
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("fake state")
    }

    fn log(&self, operation: &str) -> MutexGuard<'_, State> {
        let mut state = self.lock();
        state.calls.push(operation.to_string());
        state
    }

    /// Registers a Lambda function with its aliases.
    pub fn with_function(self, name: &str, aliases: &[&str]) -> Self {
        self.lock().functions.insert(
            name.to_string(),
            aliases.iter().map(|a| (*a).to_string()).collect(),
        );
        self
    }

    /// Registers a VPC link.
    pub fn with_vpc_link(self, id: &str) -> Self {
        self.lock().vpc_links.insert(id.to_string());
        self
    }

    /// Registers an existing API key.
    pub fn with_api_key(self, name: &str, id: &str) -> Self {
        self.lock().api_keys.insert(name.to_string(), id.to_string());
        self
    }

    /// Registers usage plan members, in listing order.
    pub fn with_usage_plan_keys(self, plan: &str, key_ids: &[&str]) -> Self {
        self.lock().usage_plan_keys.insert(
            plan.to_string(),
            key_ids.iter().map(|k| (*k).to_string()).collect(),
        );
        self
    }

    /// Service handles backed by this fake.
    pub fn backends(&self) -> Backends {
        Backends::new(
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
        )
    }

    /// Every operation called so far.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Operations that changed remote state.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !["Get", "List", "Describe"].iter().any(|p| c.starts_with(p)))
            .collect()
    }

    /// Forgets the call log.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Resource paths currently present.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.lock().resources.values().map(|r| r.path.clone()).collect();
        paths.sort();
        paths
    }

    /// The method stored at a path.
    pub fn method_at(&self, path: &str, verb: &str) -> Option<RemoteMethod> {
        self.lock()
            .resources
            .values()
            .find(|r| r.path == path)
            .and_then(|r| r.methods.get(verb).cloned())
    }

    /// Seeds a resource with one method, bypassing the call log.
    pub fn seed(&self, path: &str, verb: &str, method: RemoteMethod) -> String {
        let mut state = self.lock();
        let mut parent_id = String::from(ROOT_ID);
        let mut parent_path = String::from(ROOT_PATH);
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let full = child_path(&parent_path, segment);
            let existing = state
                .resources
                .values()
                .find(|r| r.path == full)
                .map(|r| r.id.clone());
            let id = match existing {
                Some(id) => id,
                None => {
                    let id = state.id("seed");
                    state.resources.insert(
                        id.clone(),
                        RemoteResource {
                            id: id.clone(),
                            parent_id: Some(parent_id.clone()),
                            path: full.clone(),
                            path_part: Some(segment.to_string()),
                            methods: BTreeMap::new(),
                        },
                    );
                    id
                }
            };
            parent_id = id;
            parent_path = full;
        }
        if let Some(resource) = state.resources.get_mut(&parent_id) {
            resource.methods.insert(verb.to_string(), method);
        }
        parent_id
    }

    /// Registered permissions.
    pub fn permissions(&self) -> Vec<InvokePermission> {
        self.lock().permissions.clone()
    }

    /// Created alarms.
    pub fn alarms(&self) -> Vec<AlarmNode> {
        self.lock().alarms.clone()
    }

    /// Recorded deployments.
    pub fn deployments(&self) -> Vec<DeploymentRequest> {
        self.lock().deployments.clone()
    }

    /// Binary media types of the API.
    pub fn binary_media_types(&self) -> Vec<String> {
        self.lock().api.binary_media_types.clone()
    }

    /// Usage plan memberships.
    pub fn usage_plan_keys(&self, plan: &str) -> Vec<String> {
        self.lock().usage_plan_keys.get(plan).cloned().unwrap_or_default()
    }
}

/// Drops what the real service never echoes back.
fn settle(mut response: IntegrationResponseDocument) -> IntegrationResponseDocument {
    response.response_parameters.retain(|_, v| v.is_some());
    response.response_templates.retain(|_, v| !v.is_empty());
    response
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Patch values travel as strings; booleans are restored on the way in.
fn parse_value(value: Option<&String>) -> Value {
    match value.map(String::as_str) {
        Some("true") => Value::Bool(true),
        Some("false") => Value::Bool(false),
        Some(s) => Value::String(s.to_string()),
        None => Value::Null,
    }
}

fn apply_patch<T: Serialize + DeserializeOwned>(document: &T, operations: &[PatchOperation]) -> Result<T> {
    let mut value = to_value(document)?;
    for operation in operations {
        let segments: Vec<String> = operation.path.split('/').skip(1).map(unescape).collect();
        let Some((leaf, parents)) = segments.split_last() else {
            continue;
        };
        let mut slot = &mut value;
        for parent in parents {
            if !slot.is_object() {
                break;
            }
            let Some(map) = slot.as_object_mut() else {
                unreachable!("checked is_object above");
            };
            slot = map
                .entry(parent.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        let Some(map) = slot.as_object_mut() else {
            continue;
        };
        match operation.op {
            PatchOp::Remove => {
                map.remove(leaf);
            }
            PatchOp::Add | PatchOp::Replace => {
                map.insert(leaf.clone(), parse_value(operation.value.as_ref()));
            }
        }
    }
    serde_json::from_value(value).map_err(|e| SyncError::internal(e.to_string()))
}

#[async_trait]
impl GatewayApi for FakeCloud {
    async fn get_rest_api(&self, rest_api_id: &str) -> Result<RestApiInfo> {
        let state = self.log("GetRestApi");
        if state.api.id == rest_api_id {
            Ok(state.api.clone())
        } else {
            Err(RemoteError::not_found("GetRestApi", rest_api_id).into())
        }
    }

    async fn update_rest_api(&self, _rest_api_id: &str, operations: Vec<PatchOperation>) -> Result<()> {
        let mut state = self.log("UpdateRestApi");
        for operation in operations {
            if let Some(media_type) = operation.path.strip_prefix("/binaryMediaTypes/") {
                let media_type = unescape(media_type);
                match operation.op {
                    PatchOp::Add => state.api.binary_media_types.push(media_type),
                    PatchOp::Remove => state.api.binary_media_types.retain(|t| *t != media_type),
                    PatchOp::Replace => {}
                }
            }
        }
        Ok(())
    }

    async fn get_resources(&self, _rest_api_id: &str, position: Option<String>) -> Result<ResourcePage> {
        let state = self.log("GetResources");
        let start: usize = position.and_then(|p| p.parse().ok()).unwrap_or(0);
        let items: Vec<RemoteResource> = state
            .resources
            .values()
            .skip(start)
            .take(PAGE_SIZE)
            .cloned()
            .collect();
        let next = start + PAGE_SIZE;
        Ok(ResourcePage {
            items,
            position: (next < state.resources.len()).then(|| next.to_string()),
        })
    }

    async fn create_resource(&self, _rest_api_id: &str, parent_id: &str, path_part: &str) -> Result<String> {
        let mut state = self.log("CreateResource");
        let parent_path = state
            .resources
            .get(parent_id)
            .map(|p| p.path.clone())
            .ok_or_else(|| RemoteError::not_found("CreateResource", parent_id))?;
        let path = child_path(&parent_path, path_part);
        if state.resources.values().any(|r| r.path == path) {
            return Err(RemoteError::conflict("CreateResource", path).into());
        }
        let id = state.id("res");
        state.resources.insert(
            id.clone(),
            RemoteResource {
                id: id.clone(),
                parent_id: Some(parent_id.to_string()),
                path,
                path_part: Some(path_part.to_string()),
                methods: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    async fn delete_resource(&self, _rest_api_id: &str, resource_id: &str) -> Result<()> {
        let mut state = self.log("DeleteResource");
        let path = state
            .resources
            .get(resource_id)
            .map(|r| r.path.clone())
            .ok_or_else(|| RemoteError::not_found("DeleteResource", resource_id))?;
        let nested = format!("{path}/");
        state
            .resources
            .retain(|_, r| r.path != path && !r.path.starts_with(&nested));
        Ok(())
    }

    async fn put_method(&self, target: &MethodTarget, request: &MethodRequest) -> Result<()> {
        let mut state = self.log("PutMethod");
        let resource = state
            .resources
            .get_mut(&target.resource_id)
            .ok_or_else(|| RemoteError::not_found("PutMethod", target.to_string()))?;
        if resource.methods.contains_key(target.http_method.as_str()) {
            return Err(RemoteError::conflict("PutMethod", target.to_string()).into());
        }
        resource.methods.insert(
            target.http_method.to_string(),
            RemoteMethod {
                request: request.clone(),
                ..RemoteMethod::default()
            },
        );
        Ok(())
    }

    async fn update_method(&self, target: &MethodTarget, operations: Vec<PatchOperation>) -> Result<()> {
        let mut state = self.log("UpdateMethod");
        let method = state.method(target, "UpdateMethod")?;
        method.request = apply_patch(&method.request, &operations)?;
        Ok(())
    }

    async fn put_integration(&self, target: &MethodTarget, integration: &IntegrationDocument) -> Result<()> {
        let mut state = self.log("PutIntegration");
        let method = state.method(target, "PutIntegration")?;
        method.integration = Some(integration.clone());
        method.integration_responses.clear();
        Ok(())
    }

    async fn update_integration(&self, target: &MethodTarget, operations: Vec<PatchOperation>) -> Result<()> {
        let mut state = self.log("UpdateIntegration");
        let method = state.method(target, "UpdateIntegration")?;
        let current = method
            .integration
            .clone()
            .ok_or_else(|| RemoteError::not_found("UpdateIntegration", target.to_string()))?;
        method.integration = Some(apply_patch(&current, &operations)?);
        Ok(())
    }

    async fn put_method_response(
        &self,
        target: &MethodTarget,
        status_code: &str,
        response: &MethodResponseDocument,
    ) -> Result<()> {
        let mut state = self.log("PutMethodResponse");
        let method = state.method(target, "PutMethodResponse")?;
        method
            .method_responses
            .insert(status_code.to_string(), response.clone());
        Ok(())
    }

    async fn update_method_response(
        &self,
        target: &MethodTarget,
        status_code: &str,
        operations: Vec<PatchOperation>,
    ) -> Result<()> {
        let mut state = self.log("UpdateMethodResponse");
        let method = state.method(target, "UpdateMethodResponse")?;
        let current = method
            .method_responses
            .get(status_code)
            .cloned()
            .ok_or_else(|| RemoteError::not_found("UpdateMethodResponse", status_code))?;
        method
            .method_responses
            .insert(status_code.to_string(), apply_patch(&current, &operations)?);
        Ok(())
    }

    async fn put_integration_response(
        &self,
        target: &MethodTarget,
        status_code: &str,
        response: &IntegrationResponseDocument,
    ) -> Result<()> {
        let mut state = self.log("PutIntegrationResponse");
        let method = state.method(target, "PutIntegrationResponse")?;
        if method.integration.is_none() {
            return Err(RemoteError::not_found("PutIntegrationResponse", target.to_string()).into());
        }
        method
            .integration_responses
            .insert(status_code.to_string(), settle(response.clone()));
        Ok(())
    }

    async fn update_integration_response(
        &self,
        target: &MethodTarget,
        status_code: &str,
        operations: Vec<PatchOperation>,
    ) -> Result<()> {
        let mut state = self.log("UpdateIntegrationResponse");
        let method = state.method(target, "UpdateIntegrationResponse")?;
        let current = method
            .integration_responses
            .get(status_code)
            .cloned()
            .ok_or_else(|| RemoteError::not_found("UpdateIntegrationResponse", status_code))?;
        let patched = settle(apply_patch(&current, &operations)?);
        method
            .integration_responses
            .insert(status_code.to_string(), patched);
        Ok(())
    }

    async fn get_authorizers(&self, _rest_api_id: &str) -> Result<Vec<RemoteAuthorizer>> {
        Ok(self.log("GetAuthorizers").authorizers.clone())
    }

    async fn create_authorizer(&self, _rest_api_id: &str, authorizer: &AuthorizerNode) -> Result<String> {
        let mut state = self.log("CreateAuthorizer");
        let id = state.id("auth");
        state.authorizers.push(RemoteAuthorizer {
            id: id.clone(),
            name: authorizer.name.clone(),
        });
        Ok(id)
    }

    async fn vpc_link_exists(&self, vpc_link_id: &str) -> Result<bool> {
        Ok(self.log("GetVpcLink").vpc_links.contains(vpc_link_id))
    }

    async fn find_api_key(&self, name: &str) -> Result<Option<String>> {
        Ok(self.log("GetApiKeys").api_keys.get(name).cloned())
    }

    async fn create_api_key(&self, key: &NewApiKey) -> Result<String> {
        let mut state = self.log("CreateApiKey");
        let id = state.id("key");
        state.api_keys.insert(key.name.clone(), id.clone());
        Ok(id)
    }

    async fn get_usage_plan_keys(&self, usage_plan_id: &str, position: Option<String>) -> Result<KeyPage> {
        let state = self.log("GetUsagePlanKeys");
        let members = state.usage_plan_keys.get(usage_plan_id).map_or(&[][..], Vec::as_slice);
        let start: usize = position.and_then(|p| p.parse().ok()).unwrap_or(0);
        let next = start + PAGE_SIZE;
        Ok(KeyPage {
            items: members.iter().skip(start).take(PAGE_SIZE).cloned().collect(),
            position: (next < members.len()).then(|| next.to_string()),
        })
    }

    async fn create_usage_plan_key(&self, usage_plan_id: &str, key_id: &str) -> Result<()> {
        let mut state = self.log("CreateUsagePlanKey");
        let members = state.usage_plan_keys.entry(usage_plan_id.to_string()).or_default();
        if members.iter().any(|k| k == key_id) {
            return Err(RemoteError::conflict("CreateUsagePlanKey", key_id).into());
        }
        members.push(key_id.to_string());
        Ok(())
    }

    async fn create_deployment(&self, request: &DeploymentRequest) -> Result<String> {
        let mut state = self.log("CreateDeployment");
        let id = state.id("dep");
        state.deployments.push(request.clone());
        Ok(id)
    }
}

#[async_trait]
impl FunctionApi for FakeCloud {
    async fn function_arn(&self, function_name: &str) -> Result<Option<String>> {
        let state = self.log("GetFunction");
        Ok(state
            .functions
            .contains_key(function_name)
            .then(|| format!("arn:aws:lambda:{REGION}:{ACCOUNT_ID}:function:{function_name}")))
    }

    async fn list_aliases(&self, function_name: &str) -> Result<Vec<String>> {
        self.log("ListAliases")
            .functions
            .get(function_name)
            .cloned()
            .ok_or_else(|| RemoteError::not_found("ListAliases", function_name).into())
    }

    async fn add_permission(&self, permission: &InvokePermission) -> Result<()> {
        let mut state = self.log("AddPermission");
        let duplicate = state.permissions.iter().any(|p| {
            p.function_name == permission.function_name && p.statement_id == permission.statement_id
        });
        if duplicate {
            return Err(RemoteError::conflict("AddPermission", &permission.statement_id).into());
        }
        state.permissions.push(permission.clone());
        Ok(())
    }
}

#[async_trait]
impl AlarmApi for FakeCloud {
    async fn alarm_exists(&self, alarm_name: &str, metric_name: &str) -> Result<bool> {
        Ok(self
            .log("DescribeAlarms")
            .alarms
            .iter()
            .any(|a| a.name == alarm_name && a.metric.as_str() == metric_name))
    }

    async fn put_metric_alarm(&self, alarm: &AlarmNode) -> Result<()> {
        self.log("PutMetricAlarm").alarms.push(alarm.clone());
        Ok(())
    }
}

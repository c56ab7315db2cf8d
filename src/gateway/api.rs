//! Remote service interfaces.
//!
//! The reconciler only talks to these traits. The AWS SDK implementations
//! live in [`super::client`]; tests use mocks or the in-memory fake.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{
    AlarmNode, AuthorizerNode, IntegrationDocument, IntegrationResponseDocument, MethodRequest,
    MethodResponseDocument, MethodTarget,
};
use crate::planner::PatchOperation;

use super::types::{
    DeploymentRequest, InvokePermission, KeyPage, NewApiKey, RemoteAuthorizer, ResourcePage,
    RestApiInfo,
};

/// API Gateway operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Fetches the REST API summary.
    async fn get_rest_api(&self, rest_api_id: &str) -> Result<RestApiInfo>;

    /// Patches the REST API itself.
    async fn update_rest_api(&self, rest_api_id: &str, operations: Vec<PatchOperation>) -> Result<()>;

    /// Lists one page of resources, with methods embedded.
    async fn get_resources(&self, rest_api_id: &str, position: Option<String>) -> Result<ResourcePage>;

    /// Creates a resource and returns its id.
    async fn create_resource(&self, rest_api_id: &str, parent_id: &str, path_part: &str) -> Result<String>;

    /// Deletes a resource and everything under it.
    async fn delete_resource(&self, rest_api_id: &str, resource_id: &str) -> Result<()>;

    /// Creates or overwrites a method request.
    async fn put_method(&self, target: &MethodTarget, request: &MethodRequest) -> Result<()>;

    /// Patches a method request.
    async fn update_method(&self, target: &MethodTarget, operations: Vec<PatchOperation>) -> Result<()>;

    /// Creates or overwrites an integration.
    async fn put_integration(&self, target: &MethodTarget, integration: &IntegrationDocument) -> Result<()>;

    /// Patches an integration.
    async fn update_integration(&self, target: &MethodTarget, operations: Vec<PatchOperation>) -> Result<()>;

    /// Creates or overwrites a method response.
    async fn put_method_response(
        &self,
        target: &MethodTarget,
        status_code: &str,
        response: &MethodResponseDocument,
    ) -> Result<()>;

    /// Patches a method response.
    async fn update_method_response(
        &self,
        target: &MethodTarget,
        status_code: &str,
        operations: Vec<PatchOperation>,
    ) -> Result<()>;

    /// Creates or overwrites an integration response.
    async fn put_integration_response(
        &self,
        target: &MethodTarget,
        status_code: &str,
        response: &IntegrationResponseDocument,
    ) -> Result<()>;

    /// Patches an integration response.
    async fn update_integration_response(
        &self,
        target: &MethodTarget,
        status_code: &str,
        operations: Vec<PatchOperation>,
    ) -> Result<()>;

    /// Lists authorizers.
    async fn get_authorizers(&self, rest_api_id: &str) -> Result<Vec<RemoteAuthorizer>>;

    /// Creates an authorizer and returns its id.
    async fn create_authorizer(&self, rest_api_id: &str, authorizer: &AuthorizerNode) -> Result<String>;

    /// Returns true if the VPC link exists.
    async fn vpc_link_exists(&self, vpc_link_id: &str) -> Result<bool>;

    /// Looks an API key up by name.
    async fn find_api_key(&self, name: &str) -> Result<Option<String>>;

    /// Creates an API key and returns its id.
    async fn create_api_key(&self, key: &NewApiKey) -> Result<String>;

    /// Lists one page of key ids attached to a usage plan.
    async fn get_usage_plan_keys(&self, usage_plan_id: &str, position: Option<String>) -> Result<KeyPage>;

    /// Attaches a key to a usage plan.
    async fn create_usage_plan_key(&self, usage_plan_id: &str, key_id: &str) -> Result<()>;

    /// Deploys the API to a stage and returns the deployment id.
    async fn create_deployment(&self, request: &DeploymentRequest) -> Result<String>;
}

/// Lambda operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FunctionApi: Send + Sync {
    /// Resolves a function name to its ARN; `None` if it does not exist.
    async fn function_arn(&self, function_name: &str) -> Result<Option<String>>;

    /// Lists alias names of a function.
    async fn list_aliases(&self, function_name: &str) -> Result<Vec<String>>;

    /// Grants invoke permission. Fails with a conflict if the statement exists.
    async fn add_permission(&self, permission: &InvokePermission) -> Result<()>;
}

/// CloudWatch operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlarmApi: Send + Sync {
    /// Returns true if an alarm with this name watches this metric.
    async fn alarm_exists(&self, alarm_name: &str, metric_name: &str) -> Result<bool>;

    /// Creates an alarm.
    async fn put_metric_alarm(&self, alarm: &AlarmNode) -> Result<()>;
}

/// The three service handles a run needs.
#[derive(Clone)]
pub struct Backends {
    /// API Gateway.
    pub gateway: Arc<dyn GatewayApi>,
    /// Lambda.
    pub functions: Arc<dyn FunctionApi>,
    /// CloudWatch.
    pub alarms: Arc<dyn AlarmApi>,
}

impl Backends {
    /// Bundles the three services.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn GatewayApi>,
        functions: Arc<dyn FunctionApi>,
        alarms: Arc<dyn AlarmApi>,
    ) -> Self {
        Self {
            gateway,
            functions,
            alarms,
        }
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}

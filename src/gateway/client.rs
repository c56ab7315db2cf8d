//! AWS SDK implementations of the service traits.
//!
//! Each client is built from its own SDK config so that per-service
//! credentials can differ. Responses are converted into the normalized model
//! here; nothing above this module sees an SDK type.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_apigateway::error::ProvideErrorMetadata;
use aws_sdk_apigateway::types::{
    AuthorizerType, ConnectionType, ContentHandlingStrategy, Integration, IntegrationResponse,
    IntegrationType, Method, MethodResponse, Op, Resource,
};
use aws_sdk_cloudwatch::types::{ComparisonOperator, Dimension, Statistic};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{CredentialSet, Service};
use crate::error::{ConfigError, RemoteError, Result, SyncError};
use crate::model::{
    ALARM_NAMESPACE, AlarmNode, AuthorizerNode, IntegrationDocument, IntegrationResponseDocument,
    MethodRequest, MethodResponseDocument, MethodTarget,
};
use crate::planner::{PatchOp, PatchOperation};

use super::api::{AlarmApi, Backends, FunctionApi, GatewayApi};
use super::types::{
    DeploymentRequest, InvokePermission, KeyPage, NewApiKey, RESOURCE_PAGE_SIZE, RemoteAuthorizer,
    RemoteMethod, RemoteResource, ResourcePage, RestApiInfo,
};

/// Builds the three AWS clients from a credential set.
///
/// # Errors
///
/// Returns an error if a service has no usable credentials.
pub async fn connect(credentials: &CredentialSet) -> Result<Backends> {
    let gateway = AwsGateway::new(&sdk_config(credentials, Service::ApiGateway).await?);
    let functions = AwsFunctions::new(&sdk_config(credentials, Service::Lambda).await?);
    let alarms = AwsAlarms::new(&sdk_config(credentials, Service::CloudWatch).await?);
    info!("Connected to AWS in region {}", credentials.region);

    Ok(Backends::new(
        Arc::new(gateway),
        Arc::new(functions),
        Arc::new(alarms),
    ))
}

async fn sdk_config(credentials: &CredentialSet, service: Service) -> Result<SdkConfig> {
    let pair = credentials.for_service(service).ok_or_else(|| ConfigError::MissingEnvVar {
        names: vec![
            format!("AWS_ACCESS_KEY_ID_{}", service.suffix()),
            format!("AWS_SECRET_ACCESS_KEY_{}", service.suffix()),
        ],
    })?;
    debug!("Loading SDK config for {service:?}");

    Ok(aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(credentials.region.clone()))
        .credentials_provider(pair.to_credentials())
        .load()
        .await)
}

/// Maps an SDK failure onto the remote error taxonomy.
fn remote_error<E>(operation: &str, err: &E) -> SyncError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    let message = err.message().map_or_else(|| err.to_string(), str::to_string);
    let error = match err.code().unwrap_or_default() {
        "ConflictException" | "ResourceConflictException" => {
            RemoteError::conflict(operation, message)
        }
        "NotFoundException" | "ResourceNotFoundException" => {
            RemoteError::not_found(operation, message)
        }
        "TooManyRequestsException" | "ThrottlingException" | "Throttling" => {
            RemoteError::Throttled {
                operation: operation.to_string(),
                message,
            }
        }
        _ => RemoteError::service(operation, message),
    };
    error.into()
}

fn missing_id(operation: &str) -> SyncError {
    RemoteError::service(operation, "response carried no id").into()
}

fn to_btree<V: Clone>(map: &HashMap<String, V>) -> BTreeMap<String, V> {
    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn to_hash<V: Clone>(map: &BTreeMap<String, V>) -> HashMap<String, V> {
    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn non_empty<V: Clone>(map: &BTreeMap<String, V>) -> Option<HashMap<String, V>> {
    (!map.is_empty()).then(|| to_hash(map))
}

fn sdk_patch(operations: Vec<PatchOperation>) -> Vec<aws_sdk_apigateway::types::PatchOperation> {
    operations
        .into_iter()
        .map(|operation| {
            let op = match operation.op {
                PatchOp::Add => Op::Add,
                PatchOp::Replace => Op::Replace,
                PatchOp::Remove => Op::Remove,
            };
            aws_sdk_apigateway::types::PatchOperation::builder()
                .op(op)
                .path(operation.path)
                .set_value(operation.value)
                .build()
        })
        .collect()
}

fn method_request(method: &Method) -> MethodRequest {
    MethodRequest {
        api_key_required: method.api_key_required().unwrap_or(false),
        authorization_type: method.authorization_type().unwrap_or("NONE").to_string(),
        authorizer_id: method.authorizer_id().map(str::to_string),
        request_parameters: method.request_parameters().map(to_btree).unwrap_or_default(),
    }
}

fn integration_document(integration: &Integration) -> IntegrationDocument {
    IntegrationDocument {
        integration_type: integration
            .r#type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        uri: integration.uri().map(str::to_string),
        integration_http_method: integration.http_method().map(str::to_string),
        content_handling: integration.content_handling().map(|c| c.as_str().to_string()),
        connection_id: integration.connection_id().map(str::to_string),
        connection_type: integration.connection_type().map(|c| c.as_str().to_string()),
        request_parameters: integration.request_parameters().map(to_btree).unwrap_or_default(),
        request_templates: integration.request_templates().map(to_btree).unwrap_or_default(),
    }
}

fn method_response_document(response: &MethodResponse) -> MethodResponseDocument {
    MethodResponseDocument {
        response_models: response.response_models().map(to_btree).unwrap_or_default(),
        response_parameters: response.response_parameters().map(to_btree).unwrap_or_default(),
    }
}

fn integration_response_document(response: &IntegrationResponse) -> IntegrationResponseDocument {
    IntegrationResponseDocument {
        selection_pattern: response.selection_pattern().map(str::to_string),
        response_templates: response.response_templates().map(to_btree).unwrap_or_default(),
        response_parameters: response
            .response_parameters()
            .map(|params| {
                params
                    .iter()
                    .map(|(k, v)| (k.clone(), Some(v.clone())))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn remote_method(method: &Method) -> RemoteMethod {
    let integration = method.method_integration();
    RemoteMethod {
        request: method_request(method),
        integration: integration.map(integration_document),
        method_responses: method
            .method_responses()
            .map(|responses| {
                responses
                    .iter()
                    .map(|(code, r)| (code.clone(), method_response_document(r)))
                    .collect()
            })
            .unwrap_or_default(),
        integration_responses: integration
            .and_then(Integration::integration_responses)
            .map(|responses| {
                responses
                    .iter()
                    .map(|(code, r)| (code.clone(), integration_response_document(r)))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn remote_resource(resource: &Resource) -> RemoteResource {
    RemoteResource {
        id: resource.id().unwrap_or_default().to_string(),
        parent_id: resource.parent_id().map(str::to_string),
        path: resource.path().unwrap_or_default().to_string(),
        path_part: resource.path_part().map(str::to_string),
        methods: resource
            .resource_methods()
            .map(|methods| {
                methods
                    .iter()
                    .map(|(verb, m)| (verb.clone(), remote_method(m)))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// API Gateway client.
#[derive(Debug, Clone)]
pub struct AwsGateway {
    client: aws_sdk_apigateway::Client,
}

impl AwsGateway {
    /// Creates a client from an SDK config.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_apigateway::Client::new(config),
        }
    }
}

#[async_trait]
impl GatewayApi for AwsGateway {
    async fn get_rest_api(&self, rest_api_id: &str) -> Result<RestApiInfo> {
        let output = self
            .client
            .get_rest_api()
            .rest_api_id(rest_api_id)
            .send()
            .await
            .map_err(|e| remote_error("GetRestApi", &e))?;

        Ok(RestApiInfo {
            id: output.id().unwrap_or(rest_api_id).to_string(),
            name: output.name().unwrap_or_default().to_string(),
            binary_media_types: output.binary_media_types().to_vec(),
        })
    }

    async fn update_rest_api(&self, rest_api_id: &str, operations: Vec<PatchOperation>) -> Result<()> {
        self.client
            .update_rest_api()
            .rest_api_id(rest_api_id)
            .set_patch_operations(Some(sdk_patch(operations)))
            .send()
            .await
            .map_err(|e| remote_error("UpdateRestApi", &e))?;
        Ok(())
    }

    async fn get_resources(&self, rest_api_id: &str, position: Option<String>) -> Result<ResourcePage> {
        let output = self
            .client
            .get_resources()
            .rest_api_id(rest_api_id)
            .limit(RESOURCE_PAGE_SIZE)
            .embed("methods")
            .set_position(position)
            .send()
            .await
            .map_err(|e| remote_error("GetResources", &e))?;

        Ok(ResourcePage {
            items: output.items().iter().map(remote_resource).collect(),
            position: output.position().map(str::to_string),
        })
    }

    async fn create_resource(&self, rest_api_id: &str, parent_id: &str, path_part: &str) -> Result<String> {
        let output = self
            .client
            .create_resource()
            .rest_api_id(rest_api_id)
            .parent_id(parent_id)
            .path_part(path_part)
            .send()
            .await
            .map_err(|e| remote_error("CreateResource", &e))?;

        output
            .id()
            .map(str::to_string)
            .ok_or_else(|| missing_id("CreateResource"))
    }

    async fn delete_resource(&self, rest_api_id: &str, resource_id: &str) -> Result<()> {
        self.client
            .delete_resource()
            .rest_api_id(rest_api_id)
            .resource_id(resource_id)
            .send()
            .await
            .map_err(|e| remote_error("DeleteResource", &e))?;
        Ok(())
    }

    async fn put_method(&self, target: &MethodTarget, request: &MethodRequest) -> Result<()> {
        self.client
            .put_method()
            .rest_api_id(&target.rest_api_id)
            .resource_id(&target.resource_id)
            .http_method(target.http_method.as_str())
            .authorization_type(&request.authorization_type)
            .set_authorizer_id(request.authorizer_id.clone())
            .api_key_required(request.api_key_required)
            .set_request_parameters(non_empty(&request.request_parameters))
            .send()
            .await
            .map_err(|e| remote_error("PutMethod", &e))?;
        Ok(())
    }

    async fn update_method(&self, target: &MethodTarget, operations: Vec<PatchOperation>) -> Result<()> {
        self.client
            .update_method()
            .rest_api_id(&target.rest_api_id)
            .resource_id(&target.resource_id)
            .http_method(target.http_method.as_str())
            .set_patch_operations(Some(sdk_patch(operations)))
            .send()
            .await
            .map_err(|e| remote_error("UpdateMethod", &e))?;
        Ok(())
    }

    async fn put_integration(&self, target: &MethodTarget, integration: &IntegrationDocument) -> Result<()> {
        self.client
            .put_integration()
            .rest_api_id(&target.rest_api_id)
            .resource_id(&target.resource_id)
            .http_method(target.http_method.as_str())
            .r#type(IntegrationType::from(integration.integration_type.as_str()))
            .set_uri(integration.uri.clone())
            .set_integration_http_method(integration.integration_http_method.clone())
            .set_content_handling(
                integration
                    .content_handling
                    .as_deref()
                    .map(ContentHandlingStrategy::from),
            )
            .set_connection_id(integration.connection_id.clone())
            .set_connection_type(integration.connection_type.as_deref().map(ConnectionType::from))
            .set_request_parameters(non_empty(&integration.request_parameters))
            .set_request_templates(non_empty(&integration.request_templates))
            .send()
            .await
            .map_err(|e| remote_error("PutIntegration", &e))?;
        Ok(())
    }

    async fn update_integration(&self, target: &MethodTarget, operations: Vec<PatchOperation>) -> Result<()> {
        self.client
            .update_integration()
            .rest_api_id(&target.rest_api_id)
            .resource_id(&target.resource_id)
            .http_method(target.http_method.as_str())
            .set_patch_operations(Some(sdk_patch(operations)))
            .send()
            .await
            .map_err(|e| remote_error("UpdateIntegration", &e))?;
        Ok(())
    }

    async fn put_method_response(
        &self,
        target: &MethodTarget,
        status_code: &str,
        response: &MethodResponseDocument,
    ) -> Result<()> {
        self.client
            .put_method_response()
            .rest_api_id(&target.rest_api_id)
            .resource_id(&target.resource_id)
            .http_method(target.http_method.as_str())
            .status_code(status_code)
            .set_response_models(non_empty(&response.response_models))
            .set_response_parameters(non_empty(&response.response_parameters))
            .send()
            .await
            .map_err(|e| remote_error("PutMethodResponse", &e))?;
        Ok(())
    }

    async fn update_method_response(
        &self,
        target: &MethodTarget,
        status_code: &str,
        operations: Vec<PatchOperation>,
    ) -> Result<()> {
        self.client
            .update_method_response()
            .rest_api_id(&target.rest_api_id)
            .resource_id(&target.resource_id)
            .http_method(target.http_method.as_str())
            .status_code(status_code)
            .set_patch_operations(Some(sdk_patch(operations)))
            .send()
            .await
            .map_err(|e| remote_error("UpdateMethodResponse", &e))?;
        Ok(())
    }

    async fn put_integration_response(
        &self,
        target: &MethodTarget,
        status_code: &str,
        response: &IntegrationResponseDocument,
    ) -> Result<()> {
        // Suppressed headers cannot be sent; the service drops them anyway.
        let parameters: HashMap<String, String> = response
            .response_parameters
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
            .collect();

        self.client
            .put_integration_response()
            .rest_api_id(&target.rest_api_id)
            .resource_id(&target.resource_id)
            .http_method(target.http_method.as_str())
            .status_code(status_code)
            .set_selection_pattern(response.selection_pattern.clone())
            .set_response_templates(Some(to_hash(&response.response_templates)))
            .set_response_parameters(Some(parameters))
            .send()
            .await
            .map_err(|e| remote_error("PutIntegrationResponse", &e))?;
        Ok(())
    }

    async fn update_integration_response(
        &self,
        target: &MethodTarget,
        status_code: &str,
        operations: Vec<PatchOperation>,
    ) -> Result<()> {
        self.client
            .update_integration_response()
            .rest_api_id(&target.rest_api_id)
            .resource_id(&target.resource_id)
            .http_method(target.http_method.as_str())
            .status_code(status_code)
            .set_patch_operations(Some(sdk_patch(operations)))
            .send()
            .await
            .map_err(|e| remote_error("UpdateIntegrationResponse", &e))?;
        Ok(())
    }

    async fn get_authorizers(&self, rest_api_id: &str) -> Result<Vec<RemoteAuthorizer>> {
        let output = self
            .client
            .get_authorizers()
            .rest_api_id(rest_api_id)
            .limit(RESOURCE_PAGE_SIZE)
            .send()
            .await
            .map_err(|e| remote_error("GetAuthorizers", &e))?;

        Ok(output
            .items()
            .iter()
            .filter_map(|a| {
                Some(RemoteAuthorizer {
                    id: a.id()?.to_string(),
                    name: a.name()?.to_string(),
                })
            })
            .collect())
    }

    async fn create_authorizer(&self, rest_api_id: &str, authorizer: &AuthorizerNode) -> Result<String> {
        let output = self
            .client
            .create_authorizer()
            .rest_api_id(rest_api_id)
            .name(&authorizer.name)
            .r#type(AuthorizerType::from(AuthorizerNode::AUTHORIZER_TYPE))
            .auth_type(AuthorizerNode::AUTH_TYPE)
            .authorizer_uri(&authorizer.authorizer_uri)
            .identity_source(&authorizer.identity_source)
            .authorizer_result_ttl_in_seconds(i32::try_from(authorizer.ttl_seconds).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(|e| remote_error("CreateAuthorizer", &e))?;

        output
            .id()
            .map(str::to_string)
            .ok_or_else(|| missing_id("CreateAuthorizer"))
    }

    async fn vpc_link_exists(&self, vpc_link_id: &str) -> Result<bool> {
        match self.client.get_vpc_link().vpc_link_id(vpc_link_id).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = remote_error("GetVpcLink", &e);
                if err.is_not_found() { Ok(false) } else { Err(err) }
            }
        }
    }

    async fn find_api_key(&self, name: &str) -> Result<Option<String>> {
        // The name query is a prefix match, so the exact name can sit on a later page.
        let mut position = None;
        loop {
            let output = self
                .client
                .get_api_keys()
                .name_query(name)
                .limit(RESOURCE_PAGE_SIZE)
                .set_position(position.take())
                .send()
                .await
                .map_err(|e| remote_error("GetApiKeys", &e))?;

            let found = output
                .items()
                .iter()
                .find(|key| key.name() == Some(name))
                .and_then(|key| key.id())
                .map(str::to_string);
            if found.is_some() {
                return Ok(found);
            }
            match output.position() {
                Some(next) => position = Some(next.to_string()),
                None => return Ok(None),
            }
        }
    }

    async fn create_api_key(&self, key: &NewApiKey) -> Result<String> {
        let output = self
            .client
            .create_api_key()
            .name(&key.name)
            .set_description(key.description.clone())
            .enabled(key.enabled)
            .set_value(key.value.clone())
            .send()
            .await
            .map_err(|e| remote_error("CreateApiKey", &e))?;

        output
            .id()
            .map(str::to_string)
            .ok_or_else(|| missing_id("CreateApiKey"))
    }

    async fn get_usage_plan_keys(&self, usage_plan_id: &str, position: Option<String>) -> Result<KeyPage> {
        let output = self
            .client
            .get_usage_plan_keys()
            .usage_plan_id(usage_plan_id)
            .limit(RESOURCE_PAGE_SIZE)
            .set_position(position)
            .send()
            .await
            .map_err(|e| remote_error("GetUsagePlanKeys", &e))?;

        Ok(KeyPage {
            items: output
                .items()
                .iter()
                .filter_map(|key| key.id().map(str::to_string))
                .collect(),
            position: output.position().map(str::to_string),
        })
    }

    async fn create_usage_plan_key(&self, usage_plan_id: &str, key_id: &str) -> Result<()> {
        self.client
            .create_usage_plan_key()
            .usage_plan_id(usage_plan_id)
            .key_id(key_id)
            .key_type("API_KEY")
            .send()
            .await
            .map_err(|e| remote_error("CreateUsagePlanKey", &e))?;
        Ok(())
    }

    async fn create_deployment(&self, request: &DeploymentRequest) -> Result<String> {
        let output = self
            .client
            .create_deployment()
            .rest_api_id(&request.rest_api_id)
            .stage_name(&request.stage_name)
            .description(&request.description)
            .set_variables(non_empty(&request.variables))
            .cache_cluster_enabled(false)
            .send()
            .await
            .map_err(|e| remote_error("CreateDeployment", &e))?;

        output
            .id()
            .map(str::to_string)
            .ok_or_else(|| missing_id("CreateDeployment"))
    }
}

/// Lambda client.
#[derive(Debug, Clone)]
pub struct AwsFunctions {
    client: aws_sdk_lambda::Client,
}

impl AwsFunctions {
    /// Creates a client from an SDK config.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_lambda::Client::new(config),
        }
    }
}

#[async_trait]
impl FunctionApi for AwsFunctions {
    async fn function_arn(&self, function_name: &str) -> Result<Option<String>> {
        match self.client.get_function().function_name(function_name).send().await {
            Ok(output) => Ok(output
                .configuration()
                .and_then(|c| c.function_arn())
                .map(str::to_string)),
            Err(e) => {
                let err = remote_error("GetFunction", &e);
                if err.is_not_found() { Ok(None) } else { Err(err) }
            }
        }
    }

    async fn list_aliases(&self, function_name: &str) -> Result<Vec<String>> {
        let mut aliases = Vec::new();
        let mut marker = None;
        loop {
            let output = self
                .client
                .list_aliases()
                .function_name(function_name)
                .set_marker(marker)
                .send()
                .await
                .map_err(|e| remote_error("ListAliases", &e))?;

            aliases.extend(
                output
                    .aliases()
                    .iter()
                    .filter_map(|a| a.name().map(str::to_string)),
            );
            match output.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(aliases)
    }

    async fn add_permission(&self, permission: &InvokePermission) -> Result<()> {
        self.client
            .add_permission()
            .function_name(&permission.function_name)
            .statement_id(&permission.statement_id)
            .action(InvokePermission::ACTION)
            .principal(InvokePermission::PRINCIPAL)
            .source_arn(&permission.source_arn)
            .send()
            .await
            .map_err(|e| remote_error("AddPermission", &e))?;
        Ok(())
    }
}

/// CloudWatch client.
#[derive(Debug, Clone)]
pub struct AwsAlarms {
    client: aws_sdk_cloudwatch::Client,
}

impl AwsAlarms {
    /// Creates a client from an SDK config.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_cloudwatch::Client::new(config),
        }
    }
}

#[async_trait]
impl AlarmApi for AwsAlarms {
    async fn alarm_exists(&self, alarm_name: &str, metric_name: &str) -> Result<bool> {
        let output = self
            .client
            .describe_alarms()
            .alarm_names(alarm_name)
            .send()
            .await
            .map_err(|e| remote_error("DescribeAlarms", &e))?;

        Ok(output.metric_alarms().iter().any(|alarm| {
            alarm.alarm_name() == Some(alarm_name) && alarm.metric_name() == Some(metric_name)
        }))
    }

    async fn put_metric_alarm(&self, alarm: &AlarmNode) -> Result<()> {
        self.client
            .put_metric_alarm()
            .alarm_name(&alarm.name)
            .alarm_description(alarm.description())
            .actions_enabled(true)
            .set_ok_actions(Some(alarm.ok_actions.clone()))
            .set_alarm_actions(Some(alarm.alarm_actions.clone()))
            .set_insufficient_data_actions(Some(alarm.insufficient_data_actions.clone()))
            .metric_name(alarm.metric.as_str())
            .namespace(ALARM_NAMESPACE)
            .statistic(Statistic::Average)
            .dimensions(
                Dimension::builder()
                    .name("ApiName")
                    .value(&alarm.api_name)
                    .build(),
            )
            .period(alarm.period)
            .evaluation_periods(1)
            .datapoints_to_alarm(1)
            .threshold(alarm.threshold)
            .comparison_operator(ComparisonOperator::GreaterThanOrEqualToThreshold)
            .treat_missing_data("notBreaching")
            .send()
            .await
            .map_err(|e| remote_error("PutMetricAlarm", &e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_apigateway::error::ErrorMetadata;
    use aws_sdk_apigateway::operation::get_vpc_link::GetVpcLinkError;

    fn sdk_error(code: &str) -> GetVpcLinkError {
        GetVpcLinkError::generic(
            ErrorMetadata::builder()
                .code(code)
                .message(format!("{code} raised"))
                .build(),
        )
    }

    #[test]
    fn test_conflict_codes() {
        for code in ["ConflictException", "ResourceConflictException"] {
            let err = remote_error("AddPermission", &sdk_error(code));
            assert!(err.is_conflict(), "{code} should be a conflict");
            assert!(err.to_string().contains(&format!("{code} raised")));
        }
    }

    #[test]
    fn test_not_found_codes() {
        for code in ["NotFoundException", "ResourceNotFoundException"] {
            let err = remote_error("GetVpcLink", &sdk_error(code));
            assert!(err.is_not_found(), "{code} should be not found");
            assert!(!err.is_conflict());
        }
    }

    #[test]
    fn test_throttling_codes() {
        for code in ["TooManyRequestsException", "ThrottlingException", "Throttling"] {
            let err = remote_error("PutMethod", &sdk_error(code));
            assert!(
                matches!(&err, SyncError::Remote(RemoteError::Throttled { operation, .. }) if operation == "PutMethod"),
                "{code} mapped to {err:?}"
            );
        }
    }

    #[test]
    fn test_other_codes_are_service_errors() {
        let err = remote_error("CreateDeployment", &sdk_error("BadRequestException"));
        assert!(matches!(err, SyncError::Remote(RemoteError::Service { .. })));
        assert!(!err.is_conflict());
        assert!(!err.is_not_found());

        let bare = GetVpcLinkError::generic(ErrorMetadata::builder().build());
        let err = remote_error("GetVpcLink", &bare);
        assert!(matches!(err, SyncError::Remote(RemoteError::Service { .. })));
    }
}

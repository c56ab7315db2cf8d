//! Shapes exchanged with the remote services.

use std::collections::BTreeMap;

use crate::model::{IntegrationDocument, IntegrationResponseDocument, MethodRequest, MethodResponseDocument};

/// Page size used when listing resources.
pub const RESOURCE_PAGE_SIZE: i32 = 500;

/// Summary of the target REST API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RestApiInfo {
    /// REST API id.
    pub id: String,
    /// REST API name (used in alarm names and dimensions).
    pub name: String,
    /// Accepted binary media types.
    pub binary_media_types: Vec<String>,
}

/// One method as listed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteMethod {
    /// Request half.
    pub request: MethodRequest,
    /// Integration, when one is attached.
    pub integration: Option<IntegrationDocument>,
    /// Method responses by status code.
    pub method_responses: BTreeMap<String, MethodResponseDocument>,
    /// Integration responses by status code.
    pub integration_responses: BTreeMap<String, IntegrationResponseDocument>,
}

/// One resource as listed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteResource {
    /// Resource id.
    pub id: String,
    /// Parent id; absent for the root.
    pub parent_id: Option<String>,
    /// Full path.
    pub path: String,
    /// Last path segment; absent for the root.
    pub path_part: Option<String>,
    /// Methods keyed by verb, as reported.
    pub methods: BTreeMap<String, RemoteMethod>,
}

/// One page of resources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourcePage {
    /// Resources on this page.
    pub items: Vec<RemoteResource>,
    /// Token for the next page; absent on the last page.
    pub position: Option<String>,
}

/// One page of usage plan members.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPage {
    /// Key ids on this page.
    pub items: Vec<String>,
    /// Token for the next page; absent on the last page.
    pub position: Option<String>,
}

/// A remote authorizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAuthorizer {
    /// Authorizer id.
    pub id: String,
    /// Authorizer name.
    pub name: String,
}

/// A grant allowing API Gateway to invoke a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokePermission {
    /// Function name, optionally `name:alias`.
    pub function_name: String,
    /// Statement id, unique per function.
    pub statement_id: String,
    /// `arn:aws:execute-api:...` the grant is scoped to.
    pub source_arn: String,
}

impl InvokePermission {
    /// Action granted.
    pub const ACTION: &'static str = "lambda:InvokeFunction";

    /// Principal granted.
    pub const PRINCIPAL: &'static str = "apigateway.amazonaws.com";
}

/// A new API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApiKey {
    /// Key name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Enabled on creation.
    pub enabled: bool,
    /// Fixed value; generated when absent.
    pub value: Option<String>,
}

/// A stage deployment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    /// REST API id.
    pub rest_api_id: String,
    /// Stage name.
    pub stage_name: String,
    /// Stage variables.
    pub variables: BTreeMap<String, String>,
    /// Description recorded on the deployment.
    pub description: String,
}

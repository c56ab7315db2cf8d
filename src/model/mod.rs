//! Normalized model of a REST API.
//!
//! Both the desired state (built from a definition) and the current state
//! (mirrored from the service) are expressed with these types, so the two
//! can be compared field by field.

mod alarm;
mod authorizer;
mod integration;
mod method;
mod resource;
mod response;

pub use alarm::{ALARM_NAMESPACE, AlarmMetric, AlarmNode, DEFAULT_ALARM_PERIOD};
pub use authorizer::{AuthorizerNode, DEFAULT_AUTHORIZER_TTL, MAX_AUTHORIZER_TTL};
pub use integration::{
    AWS_PROXY, HTTP, HTTP_PROXY, HttpIntegration, IntegrationDocument, IntegrationKind,
    IntegrationNode, LambdaIntegration, MOCK, VpcIntegration, integration_request_parameters,
};
pub use method::{
    AuthorizationType, HttpMethod, METHOD_REQUEST_FIELDS, MethodNode, MethodRequest, MethodTarget,
};
pub use resource::{ROOT_PATH, ResourceNode, ResourceTree, child_path};
pub use response::{
    CONTENT_TYPE_HEADER, HeaderPresence, INTEGRATION_RESPONSE_FIELDS, IntegrationResponseDocument,
    METHOD_RESPONSE_FIELDS, MethodResponseDocument, ResponseNode,
};

//! Integration variants.
//!
//! Every integration a method can carry is one of four closed variants. Each
//! variant knows how to render its request document and which fields of that
//! document may be patched in place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::config::{MethodDef, ParameterHooks};
use crate::error::ConfigError;

use super::method::HttpMethod;

/// Integration type reported for Lambda proxy integrations.
pub const AWS_PROXY: &str = "AWS_PROXY";
/// Integration type reported for plain HTTP proxy integrations.
pub const HTTP_PROXY: &str = "HTTP_PROXY";
/// Integration type reported for VPC link integrations.
pub const HTTP: &str = "HTTP";
/// Integration type reported for mock integrations.
pub const MOCK: &str = "MOCK";

const LAMBDA_STAGE_ALIAS: &str = ":${stageVariables.environment}";

/// The declared `integrationType` of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationKind {
    /// Lambda proxy.
    Lambda,
    /// HTTP proxy to a public URL.
    Http,
    /// HTTP through a VPC link.
    Vpc,
    /// CORS preflight answered by a mock.
    Cors,
}

impl IntegrationKind {
    /// Every accepted kind.
    pub const ALL: [Self; 4] = [Self::Lambda, Self::Http, Self::Vpc, Self::Cors];

    /// Name used in definitions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lambda => "lambda",
            Self::Http => "http",
            Self::Vpc => "vpc",
            Self::Cors => "cors",
        }
    }

    /// Parses the `integrationType` of a method, treating absence as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownIntegrationType`] for a missing or
    /// unrecognised value.
    pub fn of(method: &MethodDef) -> Result<Self, ConfigError> {
        method
            .integration_type
            .as_deref()
            .unwrap_or_default()
            .parse()
    }
}

impl FromStr for IntegrationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownIntegrationType {
                value: s.to_string(),
            })
    }
}

/// The integration document, in the shape the service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationDocument {
    /// `AWS_PROXY`, `HTTP_PROXY`, `HTTP` or `MOCK`.
    #[serde(rename = "type")]
    pub integration_type: String,
    /// Backend URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Verb used towards the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_http_method: Option<String>,
    /// Payload conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_handling: Option<String>,
    /// VPC link id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    /// `INTERNET` or `VPC_LINK`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<String>,
    /// `integration.request.{place}.{name}` -> source expression.
    #[serde(default)]
    pub request_parameters: BTreeMap<String, String>,
    /// Request templates keyed by content type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub request_templates: BTreeMap<String, String>,
}

/// Lambda proxy integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaIntegration {
    /// Function name as declared.
    pub function_name: String,
    /// Resolved (or derived) function ARN.
    pub function_arn: String,
    /// Region of the API.
    pub region: String,
    /// Route through the `environment` stage variable alias.
    pub with_stage: bool,
}

impl LambdaIntegration {
    /// Invocation URI.
    #[must_use]
    pub fn uri(&self) -> String {
        let alias = if self.with_stage { LAMBDA_STAGE_ALIAS } else { "" };
        format!(
            "arn:aws:apigateway:{}:lambda:path/2015-03-31/functions/{}{alias}/invocations",
            self.region, self.function_arn
        )
    }
}

/// HTTP proxy integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpIntegration {
    /// Target URL.
    pub url: String,
    /// Forwarded request parameters.
    pub request_parameters: BTreeMap<String, String>,
}

/// VPC link integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcIntegration {
    /// Verb forwarded to the backend.
    pub http_method: HttpMethod,
    /// VPC link id.
    pub vpc_link_id: String,
    /// Backend URI.
    pub uri: String,
    /// Forwarded request parameters.
    pub request_parameters: BTreeMap<String, String>,
}

impl VpcIntegration {
    /// Builds the backend URI for a VPC method.
    ///
    /// Returns the URI and whether `backendPath` replaced the resource path.
    ///
    /// # Errors
    ///
    /// Returns an error when neither `fixedHost` nor `serviceName` with a
    /// base domain is available.
    pub fn backend_uri(
        method: &MethodDef,
        resource_path: &str,
        base_domain: Option<&str>,
    ) -> Result<(String, bool), ConfigError> {
        let scheme = if method.https_proxy { "https" } else { "http" };
        let host = match (&method.fixed_host, &method.service_name) {
            (Some(host), _) => host.clone(),
            (None, Some(service)) => {
                let domain = base_domain.ok_or_else(|| ConfigError::missing("baseDomain"))?;
                format!("{service}.{domain}")
            }
            (None, None) => return Err(ConfigError::missing("serviceName or fixedHost")),
        };
        let (path, overridden) = match &method.backend_path {
            Some(backend) => (backend.as_str(), true),
            None => (resource_path, false),
        };
        Ok((format!("{scheme}://{host}{path}"), overridden))
    }
}

/// One of the four integration variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationNode {
    /// Lambda proxy.
    Lambda(LambdaIntegration),
    /// HTTP proxy.
    HttpProxy(HttpIntegration),
    /// VPC link.
    VpcLink(VpcIntegration),
    /// CORS mock.
    Mock,
}

impl IntegrationNode {
    /// Renders the document sent on creation.
    #[must_use]
    pub fn document(&self) -> IntegrationDocument {
        match self {
            Self::Lambda(lambda) => IntegrationDocument {
                integration_type: String::from(AWS_PROXY),
                uri: Some(lambda.uri()),
                integration_http_method: Some(String::from("POST")),
                content_handling: Some(String::from("CONVERT_TO_BINARY")),
                ..IntegrationDocument::default()
            },
            Self::HttpProxy(http) => IntegrationDocument {
                integration_type: String::from(HTTP_PROXY),
                uri: Some(http.url.clone()),
                integration_http_method: Some(String::from("ANY")),
                request_parameters: http.request_parameters.clone(),
                ..IntegrationDocument::default()
            },
            Self::VpcLink(vpc) => IntegrationDocument {
                integration_type: String::from(HTTP),
                uri: Some(vpc.uri.clone()),
                integration_http_method: Some(vpc.http_method.to_string()),
                connection_id: Some(vpc.vpc_link_id.clone()),
                connection_type: Some(String::from("VPC_LINK")),
                request_parameters: vpc.request_parameters.clone(),
                ..IntegrationDocument::default()
            },
            Self::Mock => IntegrationDocument {
                integration_type: String::from(MOCK),
                request_templates: BTreeMap::from([(
                    String::from("application/json"),
                    String::from(r#"{"statusCode": 200}"#),
                )]),
                ..IntegrationDocument::default()
            },
        }
    }

    /// Fields of the document that may be patched in place.
    #[must_use]
    pub const fn mutable_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Lambda(_) => &["type", "uri", "integrationHttpMethod", "contentHandling"],
            Self::HttpProxy(_) => &["type", "uri", "integrationHttpMethod", "requestParameters"],
            Self::VpcLink(_) => &[
                "type",
                "integrationHttpMethod",
                "connectionId",
                "connectionType",
                "requestParameters",
                "uri",
            ],
            Self::Mock => &["type"],
        }
    }

    /// Whether method and integration responses are reconciled for this
    /// variant. Lambda proxies answer with their own status codes.
    #[must_use]
    pub const fn has_responses(&self) -> bool {
        !matches!(self, Self::Lambda(_))
    }
}

/// Builds `integration.request.*` mappings for every declared request
/// parameter, plus whatever the hooks add.
#[must_use]
pub fn integration_request_parameters(
    method: &MethodDef,
    hooks: &dyn ParameterHooks,
) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    for (place, names) in [
        ("header", &method.headers),
        ("querystring", &method.query_strings),
        ("path", &method.paths),
    ] {
        for name in names.keys() {
            params.insert(
                format!("integration.request.{place}.{name}"),
                format!("method.request.{place}.{name}"),
            );
        }
    }
    params.extend(hooks.integration_parameters(method));
    params
}

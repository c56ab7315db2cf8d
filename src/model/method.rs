//! Methods and their request shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::integration::IntegrationDocument;
use super::response::{IntegrationResponseDocument, MethodResponseDocument};

/// Fields of a method request the engine is allowed to patch.
pub const METHOD_REQUEST_FIELDS: &[&str] = &[
    "apiKeyRequired",
    "authorizationType",
    "authorizerId",
    "requestParameters",
];

/// HTTP verbs accepted on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
    /// DELETE.
    Delete,
    /// HEAD.
    Head,
    /// OPTIONS.
    Options,
    /// PATCH.
    Patch,
    /// PUT.
    Put,
    /// Catch-all.
    Any,
}

impl HttpMethod {
    /// Every accepted verb.
    pub const ALL: [Self; 8] = [
        Self::Get,
        Self::Post,
        Self::Delete,
        Self::Head,
        Self::Options,
        Self::Patch,
        Self::Put,
        Self::Any,
    ];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Put => "PUT",
            Self::Any => "ANY",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "{s} must be one of {}",
                    Self::ALL.map(Self::as_str).join(", ")
                )
            })
    }
}

/// Authorization applied to a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationType {
    /// Open method.
    #[default]
    None,
    /// `SigV4` signed requests.
    AwsIam,
    /// Cognito user pool tokens.
    CognitoUserPools,
    /// Custom (Lambda) authorizer.
    Custom,
}

impl AuthorizationType {
    /// Every accepted value.
    pub const ALL: [Self; 4] = [Self::None, Self::AwsIam, Self::CognitoUserPools, Self::Custom];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::AwsIam => "AWS_IAM",
            Self::CognitoUserPools => "COGNITO_USER_POOLS",
            Self::Custom => "CUSTOM",
        }
    }
}

impl FromStr for AuthorizationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "{s} must be one of {}",
                    Self::ALL.map(Self::as_str).join(", ")
                )
            })
    }
}

/// Identifies one method on one resource of one API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodTarget {
    /// REST API id.
    pub rest_api_id: String,
    /// Resource id.
    pub resource_id: String,
    /// HTTP verb.
    pub http_method: HttpMethod,
    /// Resource path, for logging and ARNs.
    pub path: String,
}

impl fmt::Display for MethodTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.http_method, self.path)
    }
}

/// The request half of a method, in the shape the service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodRequest {
    /// Whether an API key is required.
    pub api_key_required: bool,
    /// `NONE`, `AWS_IAM`, `COGNITO_USER_POOLS` or `CUSTOM`.
    pub authorization_type: String,
    /// Authorizer id when `authorization_type` is `CUSTOM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorizer_id: Option<String>,
    /// `method.request.{place}.{name}` -> required.
    #[serde(default)]
    pub request_parameters: BTreeMap<String, bool>,
}

impl Default for MethodRequest {
    fn default() -> Self {
        Self {
            api_key_required: false,
            authorization_type: String::from(AuthorizationType::None.as_str()),
            authorizer_id: None,
            request_parameters: BTreeMap::new(),
        }
    }
}

/// A method and everything hanging off it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodNode {
    /// Request shape.
    pub request: MethodRequest,
    /// Backend binding, if any.
    #[serde(default)]
    pub integration: Option<IntegrationDocument>,
    /// Method responses keyed by status code.
    #[serde(default)]
    pub method_responses: BTreeMap<String, MethodResponseDocument>,
    /// Integration responses keyed by status code.
    #[serde(default)]
    pub integration_responses: BTreeMap<String, IntegrationResponseDocument>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_round_trip() {
        for method in HttpMethod::ALL {
            assert_eq!(method.as_str().parse::<HttpMethod>(), Ok(method));
        }
        let err = "FETCH".parse::<HttpMethod>().unwrap_err();
        assert!(err.starts_with("FETCH must be one of GET, POST"));
    }

    #[test]
    fn test_authorization_type_parse() {
        assert_eq!("CUSTOM".parse::<AuthorizationType>(), Ok(AuthorizationType::Custom));
        assert!("custom".parse::<AuthorizationType>().is_err());
    }

    #[test]
    fn test_method_request_omits_missing_authorizer() {
        let value = serde_json::to_value(MethodRequest::default()).expect("serializable");
        assert!(value.get("authorizerId").is_none());
        assert_eq!(value["authorizationType"], "NONE");
    }
}

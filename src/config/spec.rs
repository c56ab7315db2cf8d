//! Definition document types.
//!
//! These structs map one-to-one onto the YAML definition a user writes. Fields
//! that are checked by the validator (verbs, integration and authorizer types)
//! stay as plain strings here so that a single bad value does not abort
//! parsing before every other problem has been reported.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The root of a definition document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    /// Resources keyed by their full path.
    #[serde(default)]
    pub resources: Vec<ResourceDef>,
    /// Custom authorizers keyed by name.
    #[serde(default)]
    pub authorizers: BTreeMap<String, AuthorizerDef>,
    /// CloudWatch alarms keyed by metric name.
    #[serde(default)]
    pub alarms: BTreeMap<String, AlarmDef>,
    /// API keys to ensure.
    #[serde(default)]
    pub api_keys: Vec<ApiKeyDef>,
    /// Accept every binary media type on the API.
    #[serde(default)]
    pub enable_binary: bool,
}

/// A single resource path and its methods.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDef {
    /// Full slash-delimited path, e.g. `/users/{id}`.
    pub path: String,
    /// Human-readable description (required by validation).
    #[serde(default)]
    pub description: Option<String>,
    /// Accept every binary media type on the API.
    #[serde(default)]
    pub enable_binary: bool,
    /// Methods keyed by HTTP verb.
    #[serde(default)]
    pub methods: BTreeMap<String, MethodDef>,
}

/// A method declared on a resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MethodDef {
    /// One of `lambda`, `http`, `vpc`, `cors`.
    #[serde(default)]
    pub integration_type: Option<String>,
    /// Whether callers must present an API key.
    #[serde(default)]
    pub api_key_required: bool,
    /// One of `NONE`, `AWS_IAM`, `COGNITO_USER_POOLS`, `CUSTOM`.
    #[serde(default)]
    pub authorizer_type: Option<String>,
    /// Name of an authorizer from the `authorizers` section.
    #[serde(default)]
    pub authorizer: Option<String>,
    /// Request headers (name -> required).
    #[serde(default)]
    pub headers: BTreeMap<String, bool>,
    /// Query string parameters (name -> required).
    #[serde(default)]
    pub query_strings: BTreeMap<String, bool>,
    /// Path parameters (name -> required).
    #[serde(default)]
    pub paths: BTreeMap<String, bool>,
    /// Responses keyed by status code.
    #[serde(default)]
    pub responses: BTreeMap<String, ResponseDef>,
    /// Lambda function name (`lambda`).
    #[serde(default)]
    pub function: Option<String>,
    /// Target URL (`http`).
    #[serde(default)]
    pub url: Option<String>,
    /// VPC link id (`vpc`).
    #[serde(default)]
    pub vpc_link_id: Option<String>,
    /// Service name, joined with the base domain to form the host (`vpc`).
    #[serde(default)]
    pub service_name: Option<String>,
    /// Fixed host overriding `service_name` (`vpc`).
    #[serde(default)]
    pub fixed_host: Option<String>,
    /// Backend path overriding the resource path (`vpc`).
    #[serde(default)]
    pub backend_path: Option<String>,
    /// Use https towards the backend (`vpc`).
    #[serde(default)]
    pub https_proxy: bool,
}

/// A declared response for one status code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDef {
    /// Headers: `true` passes through, `null`/`false` suppresses, a string is
    /// used verbatim as the mapping expression.
    #[serde(default)]
    pub headers: BTreeMap<String, Option<HeaderDef>>,
    /// Selection pattern; defaults to the status code.
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Value of a declared response header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum HeaderDef {
    /// `true` passes through the integration header, `false` suppresses it.
    Flag(bool),
    /// A literal mapping expression such as `'*'`.
    Expression(String),
}

/// A custom (request) authorizer backed by a Lambda function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerDef {
    /// Must be `lambda`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Authorizer function name.
    #[serde(default)]
    pub function: Option<String>,
    /// Header carrying the identity.
    #[serde(default)]
    pub source_header: Option<String>,
    /// Query string parameter carrying the identity.
    #[serde(default)]
    pub source_query: Option<String>,
    /// Result cache TTL in seconds.
    #[serde(default)]
    pub ttl: Option<u32>,
}

/// A CloudWatch alarm on one API Gateway metric.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlarmDef {
    /// Threshold value (required by validation).
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Evaluation period in seconds.
    #[serde(default)]
    pub period: Option<i32>,
    /// Topics notified on OK.
    #[serde(default)]
    pub ok: Option<Vec<String>>,
    /// Topics notified on ALARM.
    #[serde(default)]
    pub alarm: Option<Vec<String>>,
    /// Topics notified on `INSUFFICIENT_DATA`.
    #[serde(default)]
    pub insufficient: Option<Vec<String>>,
}

/// An API key, optionally attached to a usage plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyDef {
    /// Key name (lookup key).
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the key is enabled on creation.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Fixed key value; generated remotely when absent.
    #[serde(default)]
    pub value: Option<String>,
    /// Usage plan to attach the key to.
    #[serde(default)]
    pub usage_plan_id: Option<String>,
}

const fn default_enabled() -> bool {
    true
}

impl Definition {
    /// Returns true if binary media types should be enabled on the API.
    #[must_use]
    pub fn binary_enabled(&self) -> bool {
        self.enable_binary || self.resources.iter().any(|r| r.enable_binary)
    }
}

impl ResourceDef {
    /// Returns the path without a trailing slash (the root stays `/`).
    #[must_use]
    pub fn normalized_path(&self) -> String {
        normalize_path(&self.path)
    }
}

/// Strips a trailing slash from a path, leaving the root untouched.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    if path == "/" {
        return path.to_string();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        String::from("/")
    } else {
        trimmed.to_string()
    }
}

/// Number of non-empty segments in a path.
#[must_use]
pub fn path_depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/users/"), "/users");
        assert_eq!(normalize_path("/users/{id}"), "/users/{id}");
    }

    #[test]
    fn test_path_depth() {
        assert_eq!(path_depth("/"), 0);
        assert_eq!(path_depth("/a"), 1);
        assert_eq!(path_depth("/a/b/c"), 3);
    }

    #[test]
    fn test_parse_response_headers() {
        let yaml = r#"
headers:
  X-Request-Id: true
  X-Internal: ~
  Access-Control-Allow-Origin: "'*'"
pattern: ".*NotFound.*"
"#;
        let response: ResponseDef = serde_yaml::from_str(yaml).expect("valid response");
        assert_eq!(
            response.headers.get("X-Request-Id"),
            Some(&Some(HeaderDef::Flag(true)))
        );
        assert_eq!(response.headers.get("X-Internal"), Some(&None));
        assert_eq!(
            response.headers.get("Access-Control-Allow-Origin"),
            Some(&Some(HeaderDef::Expression(String::from("'*'"))))
        );
        assert_eq!(response.pattern.as_deref(), Some(".*NotFound.*"));
    }

    #[test]
    fn test_binary_enabled_on_any_resource() {
        let definition = Definition {
            resources: vec![ResourceDef {
                path: String::from("/files"),
                enable_binary: true,
                ..ResourceDef::default()
            }],
            ..Definition::default()
        };
        assert!(definition.binary_enabled());
        assert!(!Definition::default().binary_enabled());
    }
}

//! Method and integration responses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{HeaderDef, ResponseDef};

/// Fields of a method response that may be patched.
pub const METHOD_RESPONSE_FIELDS: &[&str] = &["responseModels", "responseParameters"];

/// Fields of an integration response that may be patched.
pub const INTEGRATION_RESPONSE_FIELDS: &[&str] =
    &["responseTemplates", "selectionPattern", "responseParameters"];

/// Header mapped on every response.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// What happens to one declared response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderPresence {
    /// Copied from the integration response header of the same name.
    Passthrough,
    /// Declared on the method but never mapped.
    Suppressed,
    /// Mapped from a literal expression.
    Expression(String),
}

impl From<Option<&HeaderDef>> for HeaderPresence {
    fn from(value: Option<&HeaderDef>) -> Self {
        match value {
            Some(HeaderDef::Flag(true)) => Self::Passthrough,
            Some(HeaderDef::Flag(false)) | None => Self::Suppressed,
            Some(HeaderDef::Expression(expression)) => Self::Expression(expression.clone()),
        }
    }
}

/// Method response, in the shape the service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodResponseDocument {
    /// Models keyed by content type.
    #[serde(default)]
    pub response_models: BTreeMap<String, String>,
    /// `method.response.header.{name}` -> required.
    #[serde(default)]
    pub response_parameters: BTreeMap<String, bool>,
}

/// Integration response, in the shape the service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationResponseDocument {
    /// Regex selecting this response from the backend status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_pattern: Option<String>,
    /// Templates keyed by content type.
    #[serde(default)]
    pub response_templates: BTreeMap<String, String>,
    /// `method.response.header.{name}` -> mapping expression. `None` marks a
    /// suppressed header.
    #[serde(default)]
    pub response_parameters: BTreeMap<String, Option<String>>,
}

/// A response declared for one status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseNode {
    /// Status code, e.g. `200`.
    pub status_code: String,
    /// Declared headers.
    pub headers: BTreeMap<String, HeaderPresence>,
    /// Selection pattern; the status code when absent.
    pub selection_pattern: Option<String>,
}

impl ResponseNode {
    /// Builds a response node from its definition.
    #[must_use]
    pub fn from_def(status_code: &str, def: &ResponseDef) -> Self {
        Self {
            status_code: status_code.to_string(),
            headers: def
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), HeaderPresence::from(value.as_ref())))
                .collect(),
            selection_pattern: def.pattern.clone(),
        }
    }

    /// Renders the method response document.
    #[must_use]
    pub fn method_document(&self) -> MethodResponseDocument {
        let mut response_parameters =
            BTreeMap::from([(method_header(CONTENT_TYPE_HEADER), false)]);
        for (name, presence) in &self.headers {
            response_parameters.insert(
                method_header(name),
                !matches!(presence, HeaderPresence::Suppressed),
            );
        }
        MethodResponseDocument {
            response_models: BTreeMap::from([(
                String::from("application/json"),
                String::from("Empty"),
            )]),
            response_parameters,
        }
    }

    /// Renders the integration response document.
    #[must_use]
    pub fn integration_document(&self) -> IntegrationResponseDocument {
        let mut response_parameters = BTreeMap::from([(
            method_header(CONTENT_TYPE_HEADER),
            Some(integration_header(CONTENT_TYPE_HEADER)),
        )]);
        for (name, presence) in &self.headers {
            let mapping = match presence {
                HeaderPresence::Passthrough => Some(integration_header(name)),
                HeaderPresence::Suppressed => None,
                HeaderPresence::Expression(expression) => Some(expression.clone()),
            };
            response_parameters.insert(method_header(name), mapping);
        }
        IntegrationResponseDocument {
            selection_pattern: Some(
                self.selection_pattern
                    .clone()
                    .unwrap_or_else(|| self.status_code.clone()),
            ),
            response_templates: BTreeMap::from([(String::from("application/json"), String::new())]),
            response_parameters,
        }
    }
}

fn method_header(name: &str) -> String {
    format!("method.response.header.{name}")
}

fn integration_header(name: &str) -> String {
    format!("integration.response.header.{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> ResponseNode {
        let def: ResponseDef = serde_yaml::from_str(
            r#"
headers:
  X-Request-Id: true
  X-Internal: ~
  Access-Control-Allow-Origin: "'*'"
"#,
        )
        .expect("valid response");
        ResponseNode::from_def("200", &def)
    }

    #[test]
    fn test_method_document() {
        let document = node().method_document();
        assert_eq!(document.response_models["application/json"], "Empty");
        assert!(!document.response_parameters["method.response.header.Content-Type"]);
        assert!(document.response_parameters["method.response.header.X-Request-Id"]);
        assert!(!document.response_parameters["method.response.header.X-Internal"]);
        assert!(document.response_parameters["method.response.header.Access-Control-Allow-Origin"]);
    }

    #[test]
    fn test_integration_document() {
        let document = node().integration_document();
        assert_eq!(document.selection_pattern.as_deref(), Some("200"));
        assert_eq!(document.response_templates["application/json"], "");
        assert_eq!(
            document.response_parameters["method.response.header.X-Request-Id"].as_deref(),
            Some("integration.response.header.X-Request-Id")
        );
        assert_eq!(
            document.response_parameters["method.response.header.X-Internal"],
            None
        );
        assert_eq!(
            document.response_parameters["method.response.header.Access-Control-Allow-Origin"]
                .as_deref(),
            Some("'*'")
        );
        assert_eq!(
            document.response_parameters["method.response.header.Content-Type"].as_deref(),
            Some("integration.response.header.Content-Type")
        );
    }

    #[test]
    fn test_suppressed_header_serializes_as_null() {
        let value = serde_json::to_value(node().integration_document()).expect("serializable");
        assert!(value["responseParameters"]["method.response.header.X-Internal"].is_null());
    }
}

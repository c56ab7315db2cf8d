//! Definition validation.
//!
//! Every check appends to a [`ValidationResult`] instead of returning early,
//! so one pass reports every problem in the document. Checks that need the
//! remote services (function, alias and VPC link existence) live in the
//! reconciler's preflight and append to the same result.

use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::model::{
    AlarmMetric, AuthorizationType, CONTENT_TYPE_HEADER, HttpMethod, IntegrationKind,
    MAX_AUTHORIZER_TTL,
};

use super::spec::{AlarmDef, ApiKeyDef, AuthorizerDef, Definition, MethodDef, ResourceDef};

const PATH_PATTERN: &str = r"^/[\w\-_{}+/.]*$";
const STATUS_CODE_PATTERN: &str = r"^[1-5]\d\d$";

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationResult {
    /// Records an error.
    pub fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Records a warning.
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Appends another result.
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Returns true if no error was recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts the result into the warnings, or a single aggregated error.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] listing every recorded error.
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(SyncError::Validation {
                messages: self.errors.iter().map(ToString::to_string).collect(),
            })
        }
    }
}

/// Local (schema and cross-reference) validator for definitions.
#[derive(Debug)]
pub struct DefinitionValidator {
    path_pattern: Regex,
    status_code_pattern: Regex,
    base_domain: Option<String>,
}

impl DefinitionValidator {
    /// Creates a validator.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| SyncError::internal(format!("Failed to compile regex: {e}")))
        };
        Ok(Self {
            path_pattern: compile(PATH_PATTERN)?,
            status_code_pattern: compile(STATUS_CODE_PATTERN)?,
            base_domain: None,
        })
    }

    /// Sets the base domain VPC service names are joined with.
    #[must_use]
    pub fn with_base_domain(mut self, base_domain: Option<String>) -> Self {
        self.base_domain = base_domain.filter(|d| !d.is_empty());
        self
    }

    /// Validates a definition.
    #[must_use]
    pub fn validate(&self, definition: &Definition) -> ValidationResult {
        let mut result = ValidationResult::default();

        for (name, authorizer) in &definition.authorizers {
            Self::validate_authorizer(name, authorizer, &mut result);
        }
        for (key, alarm) in &definition.alarms {
            Self::validate_alarm(key, alarm, &mut result);
        }
        self.validate_resources(definition, &mut result);
        Self::validate_api_keys(&definition.api_keys, &mut result);

        if result.is_valid() {
            debug!("Definition validation passed");
        } else {
            debug!("Definition validation found {} errors", result.errors.len());
        }
        result
    }

    fn validate_authorizer(name: &str, authorizer: &AuthorizerDef, result: &mut ValidationResult) {
        let prefix = format!("authorizers.{name}");

        if authorizer.kind.as_deref() != Some("lambda") {
            result.error(format!("{prefix}.type"), "type must be lambda");
        }
        match (&authorizer.source_header, &authorizer.source_query) {
            (None, None) => result.error(
                &prefix,
                "one of sourceHeader or sourceQuery must be specified",
            ),
            (Some(_), Some(_)) => result.error(
                &prefix,
                "sourceHeader and sourceQuery are mutually exclusive",
            ),
            _ => {}
        }
        if authorizer.ttl.is_some_and(|ttl| ttl > MAX_AUTHORIZER_TTL) {
            result.error(
                format!("{prefix}.ttl"),
                format!("ttl must be less than or equal to {MAX_AUTHORIZER_TTL}"),
            );
        }
        if authorizer.function.as_deref().is_none_or(str::is_empty) {
            result.error(format!("{prefix}.function"), "function must be specified");
        }
    }

    fn validate_alarm(key: &str, alarm: &AlarmDef, result: &mut ValidationResult) {
        let prefix = format!("alarms.{key}");

        if let Err(message) = key.parse::<AlarmMetric>() {
            result.error(&prefix, message);
        }
        if alarm.threshold.is_none() {
            result.error(format!("{prefix}.threshold"), "threshold must be specified");
        }
        if alarm.ok.is_none() && alarm.alarm.is_none() && alarm.insufficient.is_none() {
            result.warn(format!(
                "{prefix}: no ok, alarm or insufficient target, the alarm will be skipped"
            ));
        }
    }

    fn validate_resources(&self, definition: &Definition, result: &mut ValidationResult) {
        if definition.resources.is_empty() {
            result.error("resources", "resources must not be empty");
            return;
        }

        let mut seen_paths = HashSet::new();
        for (i, resource) in definition.resources.iter().enumerate() {
            let prefix = format!("resources[{i}]");

            if !self.path_pattern.is_match(&resource.path) {
                result.error(
                    format!("{prefix}.path"),
                    format!("path '{}' must match {PATH_PATTERN}", resource.path),
                );
            }
            if !seen_paths.insert(resource.normalized_path()) {
                result.error(
                    format!("{prefix}.path"),
                    format!("duplicate resource path: {}", resource.path),
                );
            }
            if resource.description.as_deref().is_none_or(str::is_empty) {
                result.error(format!("{prefix}.description"), "description must be specified");
            }

            self.validate_methods(&prefix, resource, definition, result);
        }
    }

    fn validate_methods(
        &self,
        prefix: &str,
        resource: &ResourceDef,
        definition: &Definition,
        result: &mut ValidationResult,
    ) {
        for (verb, method) in &resource.methods {
            let prefix = format!("{prefix}.methods.{verb}");

            if let Err(message) = verb.parse::<HttpMethod>() {
                result.error(&prefix, message);
            }

            let authorization = match method.authorizer_type.as_deref() {
                Some(value) => match value.parse::<AuthorizationType>() {
                    Ok(authorization) => Some(authorization),
                    Err(message) => {
                        result.error(format!("{prefix}.authorizerType"), message);
                        None
                    }
                },
                None => Some(AuthorizationType::None),
            };
            if authorization == Some(AuthorizationType::Custom) && method.authorizer.is_none() {
                result.error(
                    format!("{prefix}.authorizer"),
                    "authorizer must be specified for CUSTOM authorization",
                );
            }
            if let Some(name) = &method.authorizer {
                if !definition.authorizers.contains_key(name) {
                    result.error(
                        format!("{prefix}.authorizer"),
                        format!("authorizer {name} is not defined"),
                    );
                }
            }

            self.validate_integration(&prefix, method, result);
            self.validate_responses(&prefix, method, result);
        }
    }

    fn validate_integration(&self, prefix: &str, method: &MethodDef, result: &mut ValidationResult) {
        let kind = match IntegrationKind::of(method) {
            Ok(kind) => kind,
            Err(e) => {
                result.error(format!("{prefix}.integrationType"), e.to_string());
                return;
            }
        };

        match kind {
            IntegrationKind::Lambda => {
                if method.function.as_deref().is_none_or(str::is_empty) {
                    result.error(format!("{prefix}.function"), "function must be specified");
                }
            }
            IntegrationKind::Http => match method.url.as_deref() {
                None | Some("") => result.error(format!("{prefix}.url"), "url must be specified"),
                Some(raw) => {
                    if let Err(e) = url::Url::parse(raw) {
                        result.error(format!("{prefix}.url"), format!("url '{raw}' is invalid: {e}"));
                    }
                }
            },
            IntegrationKind::Vpc => {
                if method.vpc_link_id.as_deref().is_none_or(str::is_empty) {
                    result.error(format!("{prefix}.vpcLinkId"), "vpcLinkId must be specified");
                }
                match (&method.fixed_host, &method.service_name) {
                    (None, None) => result.error(
                        prefix,
                        "one of serviceName or fixedHost must be specified",
                    ),
                    (None, Some(_)) if self.base_domain.is_none() => result.error(
                        prefix,
                        "baseDomain must be specified when serviceName is used",
                    ),
                    _ => {}
                }
            }
            IntegrationKind::Cors => {}
        }
    }

    fn validate_responses(&self, prefix: &str, method: &MethodDef, result: &mut ValidationResult) {
        for (status_code, response) in &method.responses {
            let field = format!("{prefix}.responses.{status_code}");
            if !self.status_code_pattern.is_match(status_code) {
                result.error(&field, format!("status code {status_code} is invalid"));
            }
            if response
                .headers
                .keys()
                .any(|h| h.eq_ignore_ascii_case(CONTENT_TYPE_HEADER))
            {
                result.error(
                    format!("{field}.headers"),
                    "Content-Type is always mapped and must not be declared",
                );
            }
        }
    }

    fn validate_api_keys(keys: &[ApiKeyDef], result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, key) in keys.iter().enumerate() {
            if key.name.trim().is_empty() {
                result.error(format!("apiKeys[{i}].name"), "name must be specified");
            } else if !seen.insert(key.name.as_str()) {
                result.error(
                    format!("apiKeys[{i}].name"),
                    format!("duplicate api key name: {}", key.name),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefinitionParser;

    fn parse(yaml: &str) -> Definition {
        DefinitionParser::new()
            .parse_yaml(yaml, None)
            .expect("valid yaml")
    }

    fn validator() -> DefinitionValidator {
        DefinitionValidator::new().expect("patterns compile")
    }

    #[test]
    fn test_valid_definition() {
        let definition = parse(
            r"
authorizers:
  main:
    type: lambda
    function: auth
    sourceHeader: Authorization
resources:
  - path: /users/{id}
    description: one user
    methods:
      GET:
        integrationType: http
        url: http://backend/users
        authorizerType: CUSTOM
        authorizer: main
        responses:
          '200':
            headers:
              X-Request-Id: true
",
        );
        let result = validator().validate(&definition);
        assert!(result.is_valid(), "{:?}", result.errors);
    }

    #[test]
    fn test_errors_are_aggregated() {
        let definition = parse(
            r"
authorizers:
  main:
    type: cognito
    ttl: 7200
alarms:
  Errors:
    ok: [topic]
resources:
  - path: users
    methods:
      FETCH:
        integrationType: grpc
      POST:
        integrationType: lambda
        authorizer: missing
",
        );
        let result = validator().validate(&definition);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();

        assert!(fields.contains(&"authorizers.main.type"));
        assert!(fields.contains(&"authorizers.main"));
        assert!(fields.contains(&"authorizers.main.ttl"));
        assert!(fields.contains(&"authorizers.main.function"));
        assert!(fields.contains(&"alarms.Errors"));
        assert!(fields.contains(&"alarms.Errors.threshold"));
        assert!(fields.contains(&"resources[0].path"));
        assert!(fields.contains(&"resources[0].description"));
        assert!(fields.contains(&"resources[0].methods.FETCH"));
        assert!(fields.contains(&"resources[0].methods.FETCH.integrationType"));
        assert!(fields.contains(&"resources[0].methods.POST.function"));
        assert!(fields.contains(&"resources[0].methods.POST.authorizer"));

        let err = result.into_result().unwrap_err();
        assert!(err.to_string().contains("unknown integration type: grpc"));
    }

    #[test]
    fn test_vpc_requires_base_domain_for_service_name() {
        let definition = parse(
            r"
resources:
  - path: /orders
    description: orders
    methods:
      ANY:
        integrationType: vpc
        vpcLinkId: abc
        serviceName: orders
",
        );
        assert!(!validator().validate(&definition).is_valid());
        assert!(
            validator()
                .with_base_domain(Some(String::from("svc.local")))
                .validate(&definition)
                .is_valid()
        );
    }

    #[test]
    fn test_invalid_url_and_status_code() {
        let definition = parse(
            r"
resources:
  - path: /a
    description: a
    methods:
      GET:
        integrationType: http
        url: not a url
        responses:
          '600':
            headers:
              Content-Type: true
",
        );
        let result = validator().validate(&definition);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"resources[0].methods.GET.url"));
        assert!(fields.contains(&"resources[0].methods.GET.responses.600"));
        assert!(fields.contains(&"resources[0].methods.GET.responses.600.headers"));
    }

    #[test]
    fn test_duplicate_paths_and_empty_resources() {
        let definition = parse(
            r"
resources:
  - path: /a
    description: a
  - path: /a/
    description: again
",
        );
        assert_eq!(validator().validate(&definition).errors.len(), 1);
        assert!(!validator().validate(&Definition::default()).is_valid());
    }

    #[test]
    fn test_alarm_without_target_warns() {
        let definition = parse(
            r"
alarms:
  Latency:
    threshold: 1000
resources:
  - path: /a
    description: a
",
        );
        let result = validator().validate(&definition);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }
}

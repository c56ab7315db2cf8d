//! Remote referential checks run before anything is changed.

use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{Definition, ValidationResult};
use crate::error::{IntegrationError, Result};
use crate::gateway::RestApiInfo;
use crate::model::IntegrationKind;
use crate::planner::Phase;

use super::context::RunContext;

/// Function name -> function ARN.
pub type FunctionIndex = BTreeMap<String, String>;

/// What the remote checks found.
#[derive(Debug, Default)]
pub struct Preflight {
    /// The target API, when it exists.
    pub api: Option<RestApiInfo>,
    /// ARNs of every referenced function that resolved.
    pub functions: FunctionIndex,
    /// Problems found remotely.
    pub findings: ValidationResult,
}

enum Check {
    Function { name: String, aliases: bool },
    VpcLink(String),
}

enum Outcome {
    Function {
        name: String,
        arn: Option<String>,
        missing_aliases: Vec<String>,
    },
    VpcLink {
        id: String,
        exists: bool,
    },
}

/// Checks that the API, every referenced function, alias and VPC link exist.
///
/// With `skip_function_existence`, function ARNs are derived from the
/// account and region instead of being looked up.
///
/// # Errors
///
/// Returns an error only when a lookup itself fails; missing objects are
/// reported as findings.
pub async fn preflight(ctx: &RunContext<'_>, definition: &Definition) -> Result<Preflight> {
    let options = ctx.options;
    let mut report = Preflight::default();

    match ctx
        .read("GetRestApi", ctx.backends.gateway.get_rest_api(&options.rest_api_id))
        .await
    {
        Ok(api) => report.api = Some(api),
        Err(e) if e.is_not_found() => report.findings.error(
            "restApiId",
            format!("REST API {} is not found", options.rest_api_id),
        ),
        Err(e) => return Err(e),
    }

    let (functions, vpc_links) = references(definition);

    let mut checks: Vec<Check> = vpc_links.into_iter().map(Check::VpcLink).collect();
    if options.skip_function_existence {
        for name in functions.into_keys() {
            let arn = format!(
                "arn:aws:lambda:{}:{}:function:{name}",
                options.region, options.account_id
            );
            report.functions.insert(name, arn);
        }
    } else {
        checks.extend(
            functions
                .into_iter()
                .map(|(name, aliases)| Check::Function { name, aliases }),
        );
    }

    let outcomes = ctx
        .sequencer
        .run(Phase::Preflight, checks, |check| run_check(ctx, check))
        .await?;

    for outcome in outcomes {
        match outcome {
            Outcome::Function {
                name,
                arn: Some(arn),
                missing_aliases,
            } => {
                if !missing_aliases.is_empty() {
                    let err = IntegrationError::AliasNotFound {
                        function: name.clone(),
                        aliases: missing_aliases,
                    };
                    report.findings.error(format!("functions.{name}"), err.to_string());
                }
                report.functions.insert(name, arn);
            }
            Outcome::Function { name, arn: None, .. } => {
                let err = IntegrationError::FunctionNotFound {
                    function: name.clone(),
                };
                report.findings.error(format!("functions.{name}"), err.to_string());
            }
            Outcome::VpcLink { id, exists: false } => {
                let err = IntegrationError::VpcLinkNotFound {
                    vpc_link_id: id.clone(),
                };
                report.findings.error(format!("vpcLinks.{id}"), err.to_string());
            }
            Outcome::VpcLink { exists: true, .. } => {}
        }
    }

    debug!(
        "Preflight resolved {} function(s) with {} finding(s)",
        report.functions.len(),
        report.findings.errors.len()
    );
    Ok(report)
}

/// Functions (name -> whether aliases apply) and VPC links referenced by a
/// definition. Methods with an unknown integration type are skipped here;
/// the local validator reports them.
fn references(definition: &Definition) -> (BTreeMap<String, bool>, Vec<String>) {
    let mut functions = BTreeMap::new();
    let mut vpc_links = Vec::new();

    for method in definition.resources.iter().flat_map(|r| r.methods.values()) {
        match IntegrationKind::of(method) {
            Ok(IntegrationKind::Lambda) => {
                if let Some(function) = &method.function {
                    functions.insert(function.clone(), true);
                }
            }
            Ok(IntegrationKind::Vpc) => {
                if let Some(id) = &method.vpc_link_id
                    && !vpc_links.contains(id)
                {
                    vpc_links.push(id.clone());
                }
            }
            _ => {}
        }
    }
    for authorizer in definition.authorizers.values() {
        if let Some(function) = &authorizer.function {
            functions.entry(function.clone()).or_insert(false);
        }
    }

    (functions, vpc_links)
}

async fn run_check(ctx: &RunContext<'_>, check: Check) -> Result<Outcome> {
    match check {
        Check::Function { name, aliases } => {
            let arn = ctx
                .read("GetFunction", ctx.backends.functions.function_arn(&name))
                .await?;
            let mut missing_aliases = Vec::new();
            if arn.is_some() && aliases && !ctx.options.lambda_aliases.is_empty() {
                let existing = ctx
                    .read("ListAliases", ctx.backends.functions.list_aliases(&name))
                    .await?;
                missing_aliases = ctx
                    .options
                    .lambda_aliases
                    .iter()
                    .filter(|alias| !existing.contains(alias))
                    .cloned()
                    .collect();
            }
            Ok(Outcome::Function {
                name,
                arn,
                missing_aliases,
            })
        }
        Check::VpcLink(id) => {
            let exists = ctx
                .read("GetVpcLink", ctx.backends.gateway.vpc_link_exists(&id))
                .await?;
            Ok(Outcome::VpcLink { id, exists })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MethodDef, ResourceDef, SyncOptions};
    use crate::gateway::fake::{ACCOUNT_ID, FakeCloud, REGION};
    use std::time::Duration;

    fn definition() -> Definition {
        let lambda = MethodDef {
            integration_type: Some(String::from("lambda")),
            function: Some(String::from("users")),
            ..MethodDef::default()
        };
        let vpc = MethodDef {
            integration_type: Some(String::from("vpc")),
            vpc_link_id: Some(String::from("link-1")),
            fixed_host: Some(String::from("backend")),
            ..MethodDef::default()
        };
        Definition {
            resources: vec![ResourceDef {
                path: String::from("/users"),
                methods: [(String::from("GET"), lambda), (String::from("POST"), vpc)]
                    .into_iter()
                    .collect(),
                ..ResourceDef::default()
            }],
            ..Definition::default()
        }
    }

    fn options() -> SyncOptions {
        SyncOptions::new("api")
            .with_account(REGION, ACCOUNT_ID)
            .with_call_interval(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_missing_objects_are_collected() {
        let cloud = FakeCloud::new("api");
        let backends = cloud.backends();
        let options = options();
        let ctx = RunContext::new(&options, &backends);

        let report = preflight(&ctx, &definition()).await.expect("preflight");

        assert!(report.api.is_some());
        assert!(report.functions.is_empty());
        let messages = report.findings.into_result().unwrap_err().to_string();
        assert!(messages.contains("function users is not found"));
        assert!(messages.contains("vpc link link-1 is not found"));
    }

    #[tokio::test]
    async fn test_missing_alias_reported() {
        let cloud = FakeCloud::new("api")
            .with_function("users", &["live"])
            .with_vpc_link("link-1");
        let backends = cloud.backends();
        let options = options().with_lambda_aliases(vec![String::from("live"), String::from("canary")]);
        let ctx = RunContext::new(&options, &backends);

        let report = preflight(&ctx, &definition()).await.expect("preflight");

        assert_eq!(
            report.functions.get("users").map(String::as_str),
            Some("arn:aws:lambda:us-east-1:123456789012:function:users")
        );
        let messages = report.findings.into_result().unwrap_err().to_string();
        assert!(messages.contains("function users is missing aliases: canary"));
    }

    #[tokio::test]
    async fn test_skip_function_existence_derives_arns() {
        let cloud = FakeCloud::new("api").with_vpc_link("link-1");
        let backends = cloud.backends();
        let options = options().with_skip_function_existence(true);
        let ctx = RunContext::new(&options, &backends);

        let report = preflight(&ctx, &definition()).await.expect("preflight");

        assert!(report.findings.is_valid());
        assert!(report.functions.contains_key("users"));
        assert!(!cloud.calls().iter().any(|c| c == "GetFunction"));
    }

    #[tokio::test]
    async fn test_unknown_api_is_a_finding() {
        let cloud = FakeCloud::new("other");
        let backends = cloud.backends();
        let options = options();
        let ctx = RunContext::new(&options, &backends);

        let report = preflight(&ctx, &Definition::default()).await.expect("preflight");
        assert!(report.api.is_none());
        assert!(!report.findings.is_valid());
    }
}

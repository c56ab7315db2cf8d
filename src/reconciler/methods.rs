//! Method, integration, permission and response reconciliation.
//!
//! Each declared method is first turned into a [`DesiredMethod`]. That step is
//! pure and only needs the resolved function ARNs and authorizer ids. The
//! desired method is then compared with the mirrored one: absent objects are
//! put, present ones are patched on their mutable fields only.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::{MethodDef, SyncOptions};
use crate::error::{ConfigError, IntegrationError, Result};
use crate::gateway::InvokePermission;
use crate::model::{
    AuthorizationType, HttpIntegration, HttpMethod, INTEGRATION_RESPONSE_FIELDS,
    IntegrationDocument, IntegrationKind, IntegrationNode, LambdaIntegration,
    METHOD_REQUEST_FIELDS, METHOD_RESPONSE_FIELDS, MethodNode, MethodRequest, MethodTarget,
    ResponseNode, VpcIntegration, integration_request_parameters,
};
use crate::planner::{Change, Phase, Target, compute_patch, diff_documents, merge_unechoed, to_value};

use super::context::RunContext;
use super::preflight::FunctionIndex;

/// Longest statement id Lambda accepts.
pub const MAX_STATEMENT_ID_LEN: usize = 100;

const DIGEST_SUFFIX_LEN: usize = 16;

/// Desired state of one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredMethod {
    /// Request half.
    pub request: MethodRequest,
    /// Backend binding.
    pub integration: IntegrationNode,
    /// Declared responses, in status code order.
    pub responses: Vec<ResponseNode>,
}

/// Builds desired methods from definitions.
#[derive(Debug, Clone, Copy)]
pub struct MethodBuilder<'a> {
    options: &'a SyncOptions,
    functions: &'a FunctionIndex,
    authorizers: &'a BTreeMap<String, String>,
}

impl<'a> MethodBuilder<'a> {
    /// Creates a builder.
    #[must_use]
    pub const fn new(
        options: &'a SyncOptions,
        functions: &'a FunctionIndex,
        authorizers: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            options,
            functions,
            authorizers,
        }
    }

    /// Builds the desired state of `verb` on `path`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown integration or authorization type, an
    /// unresolved authorizer, an unresolved function, or a VPC method without
    /// a usable host.
    pub fn build(&self, verb: HttpMethod, path: &str, def: &MethodDef) -> Result<DesiredMethod> {
        let integration = match IntegrationKind::of(def)? {
            IntegrationKind::Lambda => {
                let name = def.function.clone().unwrap_or_default();
                let arn = self
                    .functions
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| IntegrationError::FunctionNotFound {
                        function: name.clone(),
                    })?;
                IntegrationNode::Lambda(LambdaIntegration {
                    function_name: name,
                    function_arn: arn,
                    region: self.options.region.clone(),
                    with_stage: self.options.use_lambda_with_stage,
                })
            }
            IntegrationKind::Http => IntegrationNode::HttpProxy(HttpIntegration {
                url: def.url.clone().unwrap_or_default(),
                request_parameters: integration_request_parameters(def, self.options.hooks.as_ref()),
            }),
            IntegrationKind::Vpc => {
                let (uri, overridden) =
                    VpcIntegration::backend_uri(def, path, self.options.base_domain.as_deref())?;
                if overridden {
                    warn!("{verb} {path} forwards to a different backend path: {uri}");
                }
                IntegrationNode::VpcLink(VpcIntegration {
                    http_method: verb,
                    vpc_link_id: def.vpc_link_id.clone().unwrap_or_default(),
                    uri,
                    request_parameters: integration_request_parameters(def, self.options.hooks.as_ref()),
                })
            }
            IntegrationKind::Cors => IntegrationNode::Mock,
        };

        let responses = def
            .responses
            .iter()
            .map(|(status, response)| ResponseNode::from_def(status, response))
            .collect();

        Ok(DesiredMethod {
            request: self.request(def)?,
            integration,
            responses,
        })
    }

    fn request(&self, def: &MethodDef) -> Result<MethodRequest> {
        let authorization_type = def
            .authorizer_type
            .as_deref()
            .map(str::parse::<AuthorizationType>)
            .transpose()
            .map_err(|message| ConfigError::ParseError {
                message,
                location: None,
            })?
            .unwrap_or_default();

        let authorizer_id = if authorization_type == AuthorizationType::Custom {
            let name = def
                .authorizer
                .as_deref()
                .ok_or_else(|| ConfigError::missing("authorizer"))?;
            let id = self
                .authorizers
                .get(name)
                .ok_or_else(|| ConfigError::missing(format!("authorizer {name}")))?;
            Some(id.clone())
        } else {
            None
        };

        let mut request_parameters = BTreeMap::new();
        for (place, names) in [
            ("header", &def.headers),
            ("querystring", &def.query_strings),
            ("path", &def.paths),
        ] {
            for (name, required) in names {
                request_parameters.insert(format!("method.request.{place}.{name}"), *required);
            }
        }
        request_parameters.extend(self.options.hooks.method_request_parameters(def));

        Ok(MethodRequest {
            api_key_required: def.api_key_required,
            authorization_type: authorization_type.as_str().to_string(),
            authorizer_id,
            request_parameters,
        })
    }
}

/// Statement id of one invoke permission.
///
/// Characters outside `[A-Za-z0-9-_]` become `-`. Ids longer than
/// [`MAX_STATEMENT_ID_LEN`] are cut and suffixed with a digest of the full id,
/// so distinct long ids stay distinct.
#[must_use]
pub fn statement_id(prefix: &str, resource_id: &str, function_name: &str, verb: HttpMethod) -> String {
    let raw = format!("{prefix}-{resource_id}-{function_name}-{verb}");
    let sanitized: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    if sanitized.len() <= MAX_STATEMENT_ID_LEN {
        return sanitized;
    }

    let digest = hex::encode(Sha256::digest(raw.as_bytes()));
    let keep = MAX_STATEMENT_ID_LEN - DIGEST_SUFFIX_LEN - 1;
    format!(
        "{}-{}",
        &sanitized[..keep],
        &digest[..DIGEST_SUFFIX_LEN]
    )
}

/// `execute-api` ARN an invoke permission is scoped to.
#[must_use]
pub fn source_arn(options: &SyncOptions, target: &MethodTarget) -> String {
    let verb = match target.http_method {
        HttpMethod::Any => "*",
        other => other.as_str(),
    };
    format!(
        "arn:aws:execute-api:{}:{}:{}/*/{verb}{}",
        options.region, options.account_id, target.rest_api_id, target.path
    )
}

/// Permissions a Lambda method needs: one per configured alias, then the
/// base function.
#[must_use]
pub fn permissions(options: &SyncOptions, target: &MethodTarget, function_name: &str) -> Vec<InvokePermission> {
    let arn = source_arn(options, target);
    options
        .lambda_aliases
        .iter()
        .map(|alias| format!("{function_name}:{alias}"))
        .chain(std::iter::once(function_name.to_string()))
        .map(|name| InvokePermission {
            statement_id: statement_id(
                &options.statement_id_prefix,
                &target.resource_id,
                &name,
                target.http_method,
            ),
            function_name: name,
            source_arn: arn.clone(),
        })
        .collect()
}

/// Reconciles one method against its mirrored counterpart.
///
/// # Errors
///
/// Returns the first failing remote call. Permission conflicts are not
/// failures.
pub async fn reconcile_method(
    ctx: &RunContext<'_>,
    target: &MethodTarget,
    desired: &DesiredMethod,
    current: Option<&MethodNode>,
) -> Result<()> {
    let gateway = ctx.backends.gateway.as_ref();
    let subject = target.to_string();

    match current {
        None => {
            ctx.mutate(Change::create(Target::Method, &subject), "PutMethod", || {
                gateway.put_method(target, &desired.request)
            })
            .await?;
        }
        Some(current) => {
            if let Some(ops) = diff_documents(&desired.request, &current.request, METHOD_REQUEST_FIELDS)? {
                ctx.mutate(
                    Change::update(Target::Method, &subject, ops.clone()),
                    "UpdateMethod",
                    || gateway.update_method(target, ops),
                )
                .await?;
            }
        }
    }

    // Invoke rights go in before the integration that relies on them.
    if let IntegrationNode::Lambda(lambda) = &desired.integration {
        let grants = permissions(ctx.options, target, &lambda.function_name);
        ctx.sequencer
            .run(Phase::Permissions, grants, |permission| grant(ctx, permission))
            .await?;
    }

    let current_integration = current.and_then(|m| m.integration.as_ref());
    let replaced = reconcile_integration(ctx, target, &desired.integration, current_integration).await?;

    if !desired.integration.has_responses() {
        debug!("{subject}: proxy integration, responses are not managed");
        return Ok(());
    }

    // A re-put integration drops its integration responses remotely.
    let empty = MethodNode::default();
    let stripped;
    let current = match current {
        Some(method) if !replaced => method,
        Some(method) => {
            stripped = MethodNode {
                integration_responses: BTreeMap::new(),
                ..method.clone()
            };
            &stripped
        }
        None => &empty,
    };

    ctx.sequencer
        .run(Phase::Responses, &desired.responses, |response| {
            reconcile_response(ctx, target, response, current)
        })
        .await?;
    Ok(())
}

/// Puts or patches the integration. Returns true if it was put.
async fn reconcile_integration(
    ctx: &RunContext<'_>,
    target: &MethodTarget,
    desired: &IntegrationNode,
    current: Option<&IntegrationDocument>,
) -> Result<bool> {
    let gateway = ctx.backends.gateway.as_ref();
    let document = desired.document();
    let subject = target.to_string();

    match current {
        Some(current) if current.integration_type == document.integration_type => {
            if let Some(ops) = diff_documents(&document, current, desired.mutable_fields())? {
                ctx.mutate(
                    Change::update(Target::Integration, &subject, ops.clone()),
                    "UpdateIntegration",
                    || gateway.update_integration(target, ops),
                )
                .await?;
            }
            Ok(false)
        }
        Some(current) => {
            debug!(
                "{subject}: integration type changes from {} to {}",
                current.integration_type, document.integration_type
            );
            ctx.mutate(
                Change::update(Target::Integration, &subject, Vec::new()),
                "PutIntegration",
                || gateway.put_integration(target, &document),
            )
            .await?;
            Ok(true)
        }
        None => {
            ctx.mutate(Change::create(Target::Integration, &subject), "PutIntegration", || {
                gateway.put_integration(target, &document)
            })
            .await?;
            Ok(true)
        }
    }
}

async fn grant(ctx: &RunContext<'_>, permission: InvokePermission) -> Result<()> {
    let subject = format!("{} ({})", permission.function_name, permission.statement_id);
    let result = ctx
        .mutate(Change::grant(&subject), "AddPermission", || {
            ctx.backends.functions.add_permission(&permission)
        })
        .await;

    match result {
        Err(e) if e.is_conflict() => {
            debug!("Permission {subject} already present");
            Ok(())
        }
        other => other.map(|_| ()),
    }
}

async fn reconcile_response(
    ctx: &RunContext<'_>,
    target: &MethodTarget,
    response: &ResponseNode,
    current: &MethodNode,
) -> Result<()> {
    let gateway = ctx.backends.gateway.as_ref();
    let code = response.status_code.as_str();
    let subject = format!("{target} {code}");

    let method_document = response.method_document();
    match current.method_responses.get(code) {
        None => {
            ctx.mutate(
                Change::create(Target::MethodResponse, &subject),
                "PutMethodResponse",
                || gateway.put_method_response(target, code, &method_document),
            )
            .await?;
        }
        Some(existing) => {
            if let Some(ops) = diff_documents(&method_document, existing, METHOD_RESPONSE_FIELDS)? {
                ctx.mutate(
                    Change::update(Target::MethodResponse, &subject, ops.clone()),
                    "UpdateMethodResponse",
                    || gateway.update_method_response(target, code, ops),
                )
                .await?;
            }
        }
    }

    let integration_document = response.integration_document();
    match current.integration_responses.get(code) {
        None => {
            ctx.mutate(
                Change::create(Target::IntegrationResponse, &subject),
                "PutIntegrationResponse",
                || gateway.put_integration_response(target, code, &integration_document),
            )
            .await?;
        }
        Some(existing) => {
            let desired = to_value(&integration_document)?;
            let mut remote = to_value(existing)?;
            // Suppressed headers and empty templates are accepted but never echoed.
            merge_unechoed(&desired, &mut remote, "responseParameters");
            merge_unechoed(&desired, &mut remote, "responseTemplates");
            if let Some(ops) = compute_patch(&desired, &remote, INTEGRATION_RESPONSE_FIELDS) {
                ctx.mutate(
                    Change::update(Target::IntegrationResponse, &subject, ops.clone()),
                    "UpdateIntegrationResponse",
                    || gateway.update_integration_response(target, code, ops),
                )
                .await?;
            }
        }
    }
    Ok(())
}

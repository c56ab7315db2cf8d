//! Run options.
//!
//! A single `SyncOptions` value is built once per run and passed by reference
//! to every component. Nothing is stored globally, so two runs in the same
//! process never observe each other's settings.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;

use super::spec::MethodDef;

/// Default region when `AWS_DEFAULT_REGION` is not set.
pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// Default prefix for generated alarm names.
pub const DEFAULT_ALARM_PREFIX: &str = "apigw-sync-alarm";

/// Default prefix for Lambda permission statement ids.
pub const DEFAULT_STATEMENT_PREFIX: &str = "apigw-sync";

/// Default minimum delay between two remote calls.
pub const DEFAULT_CALL_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of concurrent calls in fan-out phases.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// User-supplied hooks injecting extra request/integration parameters.
pub trait ParameterHooks: Send + Sync + fmt::Debug {
    /// Extra integration request parameters for a method.
    fn integration_parameters(&self, _method: &MethodDef) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Extra method request parameters for a method.
    fn method_request_parameters(&self, _method: &MethodDef) -> BTreeMap<String, bool> {
        BTreeMap::new()
    }
}

/// Hooks that inject nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl ParameterHooks for NoHooks {}

/// Hooks that inject the same parameters into every method.
#[derive(Debug, Default, Clone)]
pub struct StaticParameterHooks {
    /// Integration request parameters added to every non-lambda method.
    pub integration: BTreeMap<String, String>,
    /// Method request parameters added to every method.
    pub method_request: BTreeMap<String, bool>,
}

impl ParameterHooks for StaticParameterHooks {
    fn integration_parameters(&self, _method: &MethodDef) -> BTreeMap<String, String> {
        self.integration.clone()
    }

    fn method_request_parameters(&self, _method: &MethodDef) -> BTreeMap<String, bool> {
        self.method_request.clone()
    }
}

/// Options for one synchronization run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Target REST API id.
    pub rest_api_id: String,
    /// Stage to deploy to (required unless dry-run).
    pub deployment_stage: Option<String>,
    /// Compute and log every decision without mutating anything.
    pub dry_run: bool,
    /// Point Lambda integrations at `${stageVariables.environment}`.
    pub use_lambda_with_stage: bool,
    /// Aliases that receive their own invoke permission.
    pub lambda_aliases: Vec<String>,
    /// Domain joined to VPC service names.
    pub base_domain: Option<String>,
    /// Verbose logging.
    pub verbose: bool,
    /// Do not look Lambda functions up before wiring them.
    pub skip_function_existence: bool,
    /// Prefix for generated alarm names.
    pub alarm_name_prefix: String,
    /// Prefix for Lambda permission statement ids.
    pub statement_id_prefix: String,
    /// AWS region.
    pub region: String,
    /// AWS account id.
    pub account_id: String,
    /// Minimum delay between two remote calls.
    pub call_interval: Duration,
    /// Concurrent calls allowed in fan-out phases.
    pub max_in_flight: usize,
    /// Upper bound on the whole run.
    pub deadline: Option<Duration>,
    /// Parameter injection hooks.
    pub hooks: Arc<dyn ParameterHooks>,
}

impl SyncOptions {
    /// Creates options for the given REST API with defaults everywhere else.
    #[must_use]
    pub fn new(rest_api_id: impl Into<String>) -> Self {
        Self {
            rest_api_id: rest_api_id.into(),
            deployment_stage: None,
            dry_run: false,
            use_lambda_with_stage: false,
            lambda_aliases: Vec::new(),
            base_domain: None,
            verbose: false,
            skip_function_existence: false,
            alarm_name_prefix: String::from(DEFAULT_ALARM_PREFIX),
            statement_id_prefix: String::from(DEFAULT_STATEMENT_PREFIX),
            region: String::from(DEFAULT_REGION),
            account_id: String::new(),
            call_interval: DEFAULT_CALL_INTERVAL,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            deadline: None,
            hooks: Arc::new(NoHooks),
        }
    }

    /// Sets the deployment stage.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.deployment_stage = Some(stage.into());
        self
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the account and region used to build ARNs.
    #[must_use]
    pub fn with_account(mut self, region: impl Into<String>, account_id: impl Into<String>) -> Self {
        self.region = region.into();
        self.account_id = account_id.into();
        self
    }

    /// Sets the VPC base domain.
    #[must_use]
    pub fn with_base_domain(mut self, domain: impl Into<String>) -> Self {
        self.base_domain = Some(domain.into());
        self
    }

    /// Sets the Lambda aliases.
    #[must_use]
    pub fn with_lambda_aliases(mut self, aliases: Vec<String>) -> Self {
        self.lambda_aliases = aliases;
        self
    }

    /// Points Lambda integrations at the `${stageVariables.environment}`
    /// qualified ARN.
    #[must_use]
    pub const fn with_lambda_stage(mut self, enabled: bool) -> Self {
        self.use_lambda_with_stage = enabled;
        self
    }

    /// Enables verbose logging.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Skips Lambda existence checks.
    #[must_use]
    pub const fn with_skip_function_existence(mut self, skip: bool) -> Self {
        self.skip_function_existence = skip;
        self
    }

    /// Sets the minimum delay between remote calls.
    #[must_use]
    pub const fn with_call_interval(mut self, interval: Duration) -> Self {
        self.call_interval = interval;
        self
    }

    /// Sets the fan-out width.
    #[must_use]
    pub const fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Sets the run deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Installs parameter hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn ParameterHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Checks required options.
    ///
    /// # Errors
    ///
    /// Returns an error if `rest_api_id` is empty, or if no deployment stage
    /// is set outside dry-run mode.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rest_api_id.trim().is_empty() {
            return Err(ConfigError::missing("restApiId"));
        }
        if !self.dry_run && self.deployment_stage.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::missing("deploymentStage"));
        }
        Ok(())
    }
}

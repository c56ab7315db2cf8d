//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CredentialSet, StaticParameterHooks, SyncOptions, parse_key_value};

/// apigw-sync - Declarative API Gateway synchronization.
#[derive(Parser, Debug)]
#[command(name = "apigw-sync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Log format (text, json).
    #[arg(long, global = true, default_value = "text", env = "APIGW_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render and validate definitions, including remote lookups.
    Validate {
        /// Synchronization arguments.
        #[command(flatten)]
        sync: SyncArgs,
    },

    /// Show what a run would change, without changing anything.
    Plan {
        /// Synchronization arguments.
        #[command(flatten)]
        sync: SyncArgs,
    },

    /// Synchronize the API with the definitions.
    Apply {
        /// Synchronization arguments.
        #[command(flatten)]
        sync: SyncArgs,

        /// Deploy to the stage once the run succeeds.
        #[arg(long)]
        deploy: bool,

        /// Deployment arguments, used with `--deploy`.
        #[command(flatten)]
        deployment: DeploymentArgs,
    },

    /// Deploy the API to a stage.
    Deploy {
        /// Target API arguments.
        #[command(flatten)]
        api: ApiArgs,

        /// Deployment arguments.
        #[command(flatten)]
        deployment: DeploymentArgs,
    },

    /// Print the rendered definition as YAML.
    Render {
        /// Definition files, concatenated in order.
        #[arg(short = 'f', long = "file", required = true)]
        files: Vec<PathBuf>,

        /// Placeholder binding (repeatable).
        #[arg(long = "bind", value_name = "KEY=VALUE", value_parser = key_value)]
        bindings: Vec<(String, String)>,
    },
}

/// Arguments identifying the API and pacing remote calls.
#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// REST API id.
    #[arg(long, env = "APIGW_REST_API_ID")]
    pub rest_api_id: String,

    /// Deployment stage.
    #[arg(long, env = "APIGW_STAGE")]
    pub stage: Option<String>,

    /// Minimum delay between remote calls, in milliseconds.
    #[arg(long, default_value = "1000")]
    pub call_interval_ms: u64,

    /// Concurrent calls in fan-out phases.
    #[arg(long, default_value = "4")]
    pub max_in_flight: usize,

    /// Upper bound on the whole run, in seconds.
    #[arg(long)]
    pub deadline_secs: Option<u64>,
}

/// Arguments of a synchronization run.
#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// Definition files, concatenated in order.
    #[arg(short = 'f', long = "file", required = true)]
    pub files: Vec<PathBuf>,

    /// Target API arguments.
    #[command(flatten)]
    pub api: ApiArgs,

    /// Domain joined to VPC service names.
    #[arg(long, env = "APIGW_BASE_DOMAIN")]
    pub base_domain: Option<String>,

    /// Lambda alias granted its own invoke permission (repeatable).
    #[arg(long = "lambda-alias")]
    pub lambda_aliases: Vec<String>,

    /// Qualify Lambda ARNs with the `environment` stage variable.
    #[arg(long)]
    pub use_lambda_with_stage: bool,

    /// Do not look Lambda functions up before wiring them.
    #[arg(long)]
    pub skip_function_existence: bool,

    /// Placeholder binding (repeatable).
    #[arg(long = "bind", value_name = "KEY=VALUE", value_parser = key_value)]
    pub bindings: Vec<(String, String)>,

    /// Integration request parameter added to every non-Lambda method
    /// (repeatable).
    #[arg(long = "integration-parameter", value_name = "KEY=VALUE", value_parser = key_value)]
    pub integration_parameters: Vec<(String, String)>,

    /// Method request parameter added to every method, with its required
    /// flag (repeatable).
    #[arg(long = "method-parameter", value_name = "KEY=BOOL", value_parser = key_flag)]
    pub method_parameters: Vec<(String, bool)>,
}

/// Arguments of a deployment.
#[derive(Args, Debug, Clone, Default)]
pub struct DeploymentArgs {
    /// Stage variable (repeatable).
    #[arg(long = "variable", value_name = "KEY=VALUE", value_parser = key_value)]
    pub variables: Vec<(String, String)>,

    /// Revision label recorded in the deployment description.
    #[arg(long)]
    pub revision: Option<String>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Log format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl ApiArgs {
    /// Builds run options for this API.
    #[must_use]
    pub fn options(&self, credentials: &CredentialSet, dry_run: bool) -> SyncOptions {
        let mut options = SyncOptions::new(&self.rest_api_id)
            .with_account(&credentials.region, &credentials.account_id)
            .with_dry_run(dry_run)
            .with_call_interval(Duration::from_millis(self.call_interval_ms))
            .with_max_in_flight(self.max_in_flight);
        if let Some(stage) = &self.stage {
            options = options.with_stage(stage);
        }
        if let Some(secs) = self.deadline_secs {
            options = options.with_deadline(Duration::from_secs(secs));
        }
        options
    }
}

impl SyncArgs {
    /// Builds run options, hooks included.
    #[must_use]
    pub fn options(&self, credentials: &CredentialSet, dry_run: bool, verbose: bool) -> SyncOptions {
        let mut options = self
            .api
            .options(credentials, dry_run)
            .with_lambda_aliases(self.lambda_aliases.clone())
            .with_lambda_stage(self.use_lambda_with_stage)
            .with_skip_function_existence(self.skip_function_existence)
            .with_verbose(verbose);
        if let Some(domain) = &self.base_domain {
            options = options.with_base_domain(domain);
        }
        if !self.integration_parameters.is_empty() || !self.method_parameters.is_empty() {
            options = options.with_hooks(Arc::new(StaticParameterHooks {
                integration: self.integration_parameters.iter().cloned().collect(),
                method_request: self.method_parameters.iter().cloned().collect(),
            }));
        }
        options
    }
}

impl DeploymentArgs {
    /// Stage variables as a map. Later values win.
    #[must_use]
    pub fn variables(&self) -> BTreeMap<String, String> {
        self.variables.iter().cloned().collect()
    }
}

fn key_value(input: &str) -> Result<(String, String), String> {
    parse_key_value(input).map_err(|e| e.to_string())
}

fn key_flag(input: &str) -> Result<(String, bool), String> {
    let (key, value) = key_value(input)?;
    let required = value
        .parse::<bool>()
        .map_err(|_| format!("'{value}' must be true or false"))?;
    Ok((key, required))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn credentials() -> CredentialSet {
        CredentialSet::from_lookup(|key| match key {
            "AWS_ACCOUNT_ID" => Some(String::from("123456789012")),
            "AWS_ACCESS_KEY_ID" | "AWS_SECRET_ACCESS_KEY" => Some(String::from("x")),
            "AWS_DEFAULT_REGION" => Some(String::from("eu-west-1")),
            _ => None,
        })
        .expect("credentials")
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plan_builds_dry_run_options() {
        let cli = Cli::try_parse_from([
            "apigw-sync",
            "plan",
            "-f",
            "api.yaml",
            "--rest-api-id",
            "abc",
            "--lambda-alias",
            "live",
            "--call-interval-ms",
            "250",
            "--method-parameter",
            "method.request.header.X-Trace=false",
        ])
        .expect("parse");

        let Commands::Plan { sync } = cli.command else {
            panic!("expected plan");
        };
        let options = sync.options(&credentials(), true, cli.verbose);
        assert!(options.dry_run);
        assert!(options.validate().is_ok());
        assert_eq!(options.rest_api_id, "abc");
        assert_eq!(options.region, "eu-west-1");
        assert_eq!(options.account_id, "123456789012");
        assert_eq!(options.lambda_aliases, vec![String::from("live")]);
        assert_eq!(options.call_interval, Duration::from_millis(250));
        let extra = options.hooks.method_request_parameters(&crate::config::MethodDef::default());
        assert_eq!(extra.get("method.request.header.X-Trace"), Some(&false));
    }

    #[test]
    fn test_deploy_collects_variables() {
        let cli = Cli::try_parse_from([
            "apigw-sync",
            "deploy",
            "--rest-api-id",
            "abc",
            "--stage",
            "prod",
            "--variable",
            "environment=prod",
            "--variable",
            "environment=live",
        ])
        .expect("parse");

        let Commands::Deploy { api, deployment } = cli.command else {
            panic!("expected deploy");
        };
        assert_eq!(api.stage.as_deref(), Some("prod"));
        assert_eq!(
            deployment.variables().get("environment").map(String::as_str),
            Some("live")
        );
    }

    #[test]
    fn test_bad_pairs_are_rejected() {
        assert!(key_value("novalue").is_err());
        assert!(key_flag("a=maybe").is_err());
        assert_eq!(key_flag("a=true"), Ok((String::from("a"), true)));
    }
}

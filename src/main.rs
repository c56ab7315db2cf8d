//! apigw-sync CLI entrypoint.
//!
//! This is the main entrypoint for the apigw-sync command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use apigw_sync::cli::{ApiArgs, Cli, Commands, DeploymentArgs, LogFormat, OutputFormatter, SyncArgs};
use apigw_sync::config::{CredentialSet, Definition, DefinitionParser};
use apigw_sync::error::{Result, SyncError};
use apigw_sync::gateway::connect;
use apigw_sync::reconciler::Reconciler;

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose, cli.log_format);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);
    match runtime.block_on(run(cli, formatter)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{}", formatter.format_error(&e.to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system. `RUST_LOG` takes precedence over
/// `--verbose`.
fn init_logging(verbose: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Main async entry point.
async fn run(cli: Cli, formatter: OutputFormatter) -> Result<()> {
    match cli.command {
        Commands::Validate { sync } => cmd_validate(&sync, cli.verbose, formatter).await,
        Commands::Plan { sync } => cmd_plan(&sync, cli.verbose, formatter).await,
        Commands::Apply {
            sync,
            deploy,
            deployment,
        } => cmd_apply(&sync, deploy.then_some(&deployment), cli.verbose, formatter).await,
        Commands::Deploy { api, deployment } => cmd_deploy(&api, &deployment, formatter).await,
        Commands::Render { files, bindings } => cmd_render(&files, bindings),
    }
}

/// Validate definitions locally and against the remote services.
async fn cmd_validate(sync: &SyncArgs, verbose: bool, formatter: OutputFormatter) -> Result<()> {
    let definition = load_definition(&sync.files, sync.bindings.clone())?;
    let credentials = CredentialSet::from_env()?;
    let options = sync.options(&credentials, true, verbose);
    let backends = connect(&credentials).await?;

    let warnings = Reconciler::new(&options, &backends)
        .validate(&definition)
        .await?;
    println!("{}", formatter.format_validation(&warnings));
    Ok(())
}

/// Show what a run would change.
async fn cmd_plan(sync: &SyncArgs, verbose: bool, formatter: OutputFormatter) -> Result<()> {
    let definition = load_definition(&sync.files, sync.bindings.clone())?;
    let credentials = CredentialSet::from_env()?;
    let options = sync.options(&credentials, true, verbose);
    let backends = connect(&credentials).await?;

    let changes = Reconciler::new(&options, &backends).run(&definition).await?;
    println!("{}", formatter.format_changes(&changes));
    Ok(())
}

/// Synchronize, then optionally deploy.
async fn cmd_apply(
    sync: &SyncArgs,
    deployment: Option<&DeploymentArgs>,
    verbose: bool,
    formatter: OutputFormatter,
) -> Result<()> {
    let definition = load_definition(&sync.files, sync.bindings.clone())?;
    let credentials = CredentialSet::from_env()?;
    let options = sync.options(&credentials, false, verbose);
    let backends = connect(&credentials).await?;
    let reconciler = Reconciler::new(&options, &backends);

    let changes = reconciler.run(&definition).await?;
    println!("{}", formatter.format_changes(&changes));

    if let Some(deployment) = deployment {
        let deployed = reconciler
            .deploy(deployment.variables(), deployment.revision.as_deref())
            .await?;
        println!("{}", formatter.format_changes(&deployed));
    }
    Ok(())
}

/// Deploy without synchronizing.
async fn cmd_deploy(api: &ApiArgs, deployment: &DeploymentArgs, formatter: OutputFormatter) -> Result<()> {
    DefinitionParser::new().load_dotenv()?;
    let credentials = CredentialSet::from_env()?;
    let options = api.options(&credentials, false);
    let backends = connect(&credentials).await?;

    let deployed = Reconciler::new(&options, &backends)
        .deploy(deployment.variables(), deployment.revision.as_deref())
        .await?;
    println!("{}", formatter.format_changes(&deployed));
    Ok(())
}

/// Print the rendered definition.
fn cmd_render(files: &[PathBuf], bindings: Vec<(String, String)>) -> Result<()> {
    let definition = load_definition(files, bindings)?;
    let yaml = serde_yaml::to_string(&definition)
        .map_err(|e| SyncError::internal(format!("Failed to serialize definition: {e}")))?;
    println!("{yaml}");
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Loads `.env` next to the first file, then renders and parses the files.
fn load_definition(files: &[PathBuf], bindings: Vec<(String, String)>) -> Result<Definition> {
    let base = files
        .first()
        .and_then(|f| f.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    debug!("Resolving .env from: {}", base.display());

    let parser = DefinitionParser::new()
        .with_base_path(base)
        .with_bindings(bindings);
    parser.load_dotenv()?;

    let definition = parser.load_files(files)?;
    info!(
        "Loaded {} resource(s), {} authorizer(s), {} alarm(s)",
        definition.resources.len(),
        definition.authorizers.len(),
        definition.alarms.len()
    );
    Ok(definition)
}

//! zktreeutil CLI entrypoint.
//!
//! This is the main entrypoint for the zktreeutil command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use zktree::cli::{depth_limit, Cli, Commands, ExportFormat, OutputFormatter};
use zktree::client::{
    CoordinationClient, LocalClient, MemoryClient, NamespacedClient, RetryingClient,
};
use zktree::config::{Settings, SettingsParser, SettingsValidator, StoreBackend};
use zktree::error::{Result, ZkTreeError};
use zktree::live::LiveTree;
use zktree::planner::{
    ActionHandler, ExecutionMode, InteractiveHandler, ReportingHandler, SilentHandler,
};
use zktree::reconciler::Reconciler;
use zktree::tree::{Node, TreeParser, TreeValidator};

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Client stack used by every command.
type Client = NamespacedClient<RetryingClient<Box<dyn CoordinationClient>>>;

/// Exit code reported when `drift` finds differences.
const DRIFT_EXIT_CODE: u8 = 2;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);
    match runtime.block_on(run(cli, &formatter)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e.to_string()));
            if let Some(applied) = e.applied_actions() {
                eprintln!("Applied before the failure ({}):", applied.len());
                for action in applied {
                    eprintln!("  {action}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system. Logs go to stderr so reports on stdout
/// stay machine-readable.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<ExitCode> {
    if let Commands::Validate { file } = &cli.command {
        return cmd_validate(file, formatter);
    }
    if let Commands::Dump { depth, file: Some(file) } = &cli.command {
        let desired = load_desired(file)?;
        print!("{}", desired.outline(depth_limit(*depth)));
        return Ok(ExitCode::SUCCESS);
    }

    let settings = load_settings(&cli)?;
    let live = LiveTree::new(build_client(&settings)?);
    let cancel = install_ctrl_c();

    match cli.command {
        Commands::Diff { file } => cmd_diff(&live, &file, formatter).await,
        Commands::Plan { file } => cmd_plan(&live, &file, formatter).await,
        Commands::Apply { file, yes } => cmd_apply(&live, &file, yes, cancel, formatter).await,
        Commands::Drift { file } => cmd_drift(&live, &file, formatter).await,
        Commands::Export { out, format } => cmd_export(&live, out.as_deref(), format).await,
        Commands::Dump { depth, .. } => {
            let root = live.fetch_root().await?;
            print!("{}", root.outline(depth_limit(depth)));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { .. } => Ok(ExitCode::SUCCESS),
    }
}

/// Validate a desired tree file.
fn cmd_validate(file: &Path, formatter: &OutputFormatter) -> Result<ExitCode> {
    let desired = load_desired(file)?;
    let problems = TreeValidator::new().check(&desired);

    if let Some(first) = problems.first() {
        for problem in &problems {
            eprintln!("  - {problem}");
        }
        return Err(ZkTreeError::Tree(first.clone()));
    }

    println!(
        "{}",
        formatter.format_valid(&file.display().to_string(), desired.node_count())
    );
    Ok(ExitCode::SUCCESS)
}

/// Report the actions needed to converge, one line each.
async fn cmd_diff(
    live: &LiveTree<Client>,
    file: &Path,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let desired = load_desired(file)?;
    let reconciler = Reconciler::new(live);

    if formatter.is_json() {
        let result = reconciler
            .reconcile(&desired, &mut SilentHandler, ExecutionMode::ReportOnly)
            .await?;
        println!("{}", formatter.format_reconciliation(&result));
    } else {
        reconciler
            .reconcile(&desired, &mut ReportingHandler::stdout(), ExecutionMode::ReportOnly)
            .await?;
    }

    Ok(ExitCode::SUCCESS)
}

/// Show the reconciliation plan.
async fn cmd_plan(
    live: &LiveTree<Client>,
    file: &Path,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let desired = load_desired(file)?;
    let plan = Reconciler::new(live).plan(&desired).await?;

    println!("{}", formatter.format_plan(&plan));
    Ok(ExitCode::SUCCESS)
}

/// Apply the desired tree.
async fn cmd_apply(
    live: &LiveTree<Client>,
    file: &Path,
    auto_approve: bool,
    cancel: CancellationToken,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let desired = load_desired(file)?;

    let mut handler: Box<dyn ActionHandler> = if !auto_approve {
        Box::new(InteractiveHandler::stdio())
    } else if formatter.is_json() {
        Box::new(SilentHandler)
    } else {
        Box::new(ReportingHandler::stdout())
    };

    let result = Reconciler::new(live)
        .with_cancellation(cancel)
        .reconcile(&desired, handler.as_mut(), ExecutionMode::Apply)
        .await?;

    println!("{}", formatter.format_reconciliation(&result));
    Ok(ExitCode::SUCCESS)
}

/// Check for drift; exits with a distinct code when the trees differ.
async fn cmd_drift(
    live: &LiveTree<Client>,
    file: &Path,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let desired = load_desired(file)?;
    let report = Reconciler::new(live).check_drift(&desired).await?;

    println!("{}", formatter.format_drift(&report));
    if report.has_drift {
        Ok(ExitCode::from(DRIFT_EXIT_CODE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Write the live tree out.
async fn cmd_export(
    live: &LiveTree<Client>,
    out: Option<&Path>,
    format: ExportFormat,
) -> Result<ExitCode> {
    let root = live.fetch_root().await?;
    let document = TreeParser::new().serialize(&root, format.into())?;

    match out {
        Some(path) => {
            std::fs::write(path, document)?;
            info!("Exported {} nodes to {}", root.node_count(), path.display());
        }
        None => print!("{document}"),
    }

    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Loads a desired tree file.
fn load_desired(file: &Path) -> Result<Node> {
    debug!("Loading desired tree from: {}", file.display());
    TreeParser::new().load_file(file)
}

/// Resolves settings from file, environment and command-line flags.
fn load_settings(cli: &Cli) -> Result<Settings> {
    let base_dir = cli
        .config
        .as_deref()
        .and_then(Path::parent)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let parser = SettingsParser::new().with_base_path(base_dir);
    parser.load_dotenv()?;

    let mut settings = parser.resolve(cli.config.as_deref(), ".")?;
    if let Some(store) = &cli.store {
        settings.store.path.clone_from(store);
    }
    if let Some(namespace) = &cli.namespace {
        settings.store.namespace = Some(namespace.clone());
    }

    SettingsValidator::new().validate(&settings)?;
    Ok(settings)
}

/// Builds the client stack for the configured backend.
fn build_client(settings: &Settings) -> Result<Client> {
    let backend: Box<dyn CoordinationClient> = match settings.store.backend {
        StoreBackend::Local => Box::new(LocalClient::new(settings.store.path.clone())),
        StoreBackend::Memory => Box::new(MemoryClient::new()),
    };
    info!("Using {} store", settings.store.backend);

    let retrying = RetryingClient::new(backend, settings.retry.policy());
    let namespace = settings.store.namespace.as_deref().unwrap_or("/");

    NamespacedClient::new(retrying, namespace).map_err(|e| {
        ZkTreeError::internal(format!("Invalid namespace '{namespace}': {e}"))
    })
}

/// Cancels the returned token on Ctrl-C.
fn install_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current action");
            trigger.cancel();
        }
    });

    token
}

//! handoff - hand control of an application to its external updater
//!
//! Wires together:
//! - Settings loading (product identity, working directory)
//! - Platform resolution for the host OS
//! - The system process launcher
//! - The update orchestrator and version negotiator
//!
//! Query commands print a single value on stdout; logs go to stderr.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use handoff_api::HandoffOutcome;
use handoff_config::load_settings;
use handoff_core::{
    Orchestrator, OrchestratorOptions, RemoteClient, StartupContext, decode_startup_args,
};
use handoff_host::SystemLauncher;
use handoff_host_api::{PlatformResolver, ProcessLauncher};
use handoff_util::{ProcessIds, default_settings_path, default_working_dir};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// handoff - Self-update handoff for desktop applications
#[derive(Parser, Debug)]
#[command(name = "handoff")]
#[command(about = "Hand control of an application to its external updater", long_about = None)]
struct Args {
    /// Settings file path (default: ~/.config/handoff/handoff.toml)
    #[arg(short, long, env = "HANDOFF_SETTINGS", default_value_os_t = default_settings_path())]
    settings: PathBuf,

    /// Directory holding the updater and UpdaterConfig.json (overrides settings)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask the updater whether an update is available
    Check,
    /// Print the installed updater version
    Version,
    /// Print the target application version (-1 when there is no update source)
    TargetVersion,
    /// Print the updater version required by the target release
    TargetUpdaterVersion,
    /// Print the release notes for the target version
    Changelog,
    /// Print the updater download URL for the target release
    UpdaterUrl,
    /// Print the current UpdaterConfig.json as seen by the orchestrator
    Config,
    /// Hand off to the updater to install an update
    Update {
        /// Processes the updater waits for (default: this process)
        #[arg(long, value_delimiter = ',')]
        pid: Vec<u32>,
    },
    /// Let the updater upgrade itself
    UpdateSelf,
    /// Relaunch through the updater without updating
    RebootTest {
        /// Processes the updater waits for (default: this process)
        #[arg(long, value_delimiter = ',')]
        pid: Vec<u32>,

        /// Arguments to forward to the relaunched application
        #[arg(long, default_value = "")]
        startup_args: String,
    },
    /// Decode a forwarded -executable_args value
    DecodeArgs { value: String },
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn process_ids(pids: Vec<u32>) -> ProcessIds {
    if pids.is_empty() {
        ProcessIds::current()
    } else {
        ProcessIds::from(pids)
    }
}

fn build_orchestrator(args: &Args, startup: StartupContext) -> Result<Orchestrator> {
    let settings = load_settings(&args.settings)
        .with_context(|| format!("Failed to load settings from {:?}", args.settings))?;

    let base_dir = args
        .dir
        .clone()
        .or_else(|| settings.working_dir.clone())
        .unwrap_or_else(default_working_dir);

    info!(
        settings = %args.settings.display(),
        app = %settings.product.app_name,
        app_version = settings.product.app_version,
        dir = %base_dir.display(),
        "Settings loaded"
    );

    let resolver = PlatformResolver::for_current_os(settings.product, &base_dir)
        .context("Cannot resolve platform")?;
    let launcher: Arc<dyn ProcessLauncher> = Arc::new(SystemLauncher::new());

    Ok(Orchestrator::new(
        resolver,
        launcher,
        RemoteClient::new(),
        startup,
        OrchestratorOptions {
            settle_interval: settings.settle_interval,
        },
    ))
}

/// Target release as `(server, version)`, if there is one
async fn target_release(orchestrator: &Orchestrator) -> Option<(String, u32)> {
    let negotiator = orchestrator.negotiator();
    let server = negotiator.updater_config()?.valid_server()?.to_string();
    let version = negotiator.target_version().await?;
    Some((server, version))
}

fn report_handoff(outcome: HandoffOutcome) -> Result<()> {
    match outcome {
        HandoffOutcome::HandedOff { pid } => {
            println!("{pid}");
            Ok(())
        }
        HandoffOutcome::NoTerminal => bail!("No terminal emulator found, updater was not started"),
    }
}

async fn run(args: Args) -> Result<()> {
    if let Command::DecodeArgs { value } = &args.command {
        let decoded = decode_startup_args(value).context("Failed to decode startup arguments")?;
        println!("{decoded}");
        return Ok(());
    }

    let startup = match &args.command {
        Command::RebootTest { startup_args, .. } => StartupContext::new(startup_args.clone()),
        _ => StartupContext::default(),
    };
    let mut orchestrator = build_orchestrator(&args, startup)?;

    match args.command {
        Command::Check => {
            let check = orchestrator.check().await?;
            match check.updater_version {
                Some(v) => println!("{} (updater v{v})", check.update_available()),
                None => println!("{}", check.update_available()),
            }
        }
        Command::Version => {
            println!("{}", orchestrator.negotiator().installed_updater_version().await);
        }
        Command::TargetVersion => match orchestrator.negotiator().target_version().await {
            Some(version) => println!("{version}"),
            None => println!("-1"),
        },
        Command::TargetUpdaterVersion => {
            let version = match target_release(&orchestrator).await {
                Some((server, version)) => {
                    let dist = orchestrator.resolver().platform_dist();
                    orchestrator
                        .negotiator()
                        .target_updater_version(&server, version, &dist)
                        .await
                }
                None => i64::from(handoff_api::OLDEST_UPDATER_VERSION),
            };
            println!("{version}");
        }
        Command::Changelog => match orchestrator.negotiator().target_changelog().await {
            Some(changelog) => print!("{}", changelog.text),
            None => bail!("No changelog available"),
        },
        Command::UpdaterUrl => {
            let Some((server, version)) = target_release(&orchestrator).await else {
                bail!("No update source configured");
            };
            match orchestrator.negotiator().updater_url(&server, version) {
                Some(url) => println!("{url}"),
                None => bail!("No updater download for this platform"),
            }
        }
        Command::Config => {
            let config = orchestrator.negotiator().updater_config();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Update { pid } => {
            let outcome = orchestrator.update(&process_ids(pid)).await?;
            report_handoff(outcome)?;
        }
        Command::UpdateSelf => {
            let status = orchestrator.update_self().await?;
            info!(code = ?status.code, "Self-update complete");
        }
        Command::RebootTest { pid, .. } => {
            let outcome = orchestrator.reboot_test(&process_ids(pid)).await?;
            report_handoff(outcome)?;
        }
        // Decoded above, needs no settings
        Command::DecodeArgs { .. } => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_json);

    info!(version = env!("CARGO_PKG_VERSION"), "handoff starting");

    let result = run(args).await;
    if let Err(e) = &result {
        error!(error = %e, "handoff failed");
    }
    result
}

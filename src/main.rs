//! winedock - Run and discover Windows programs in Wine workspaces

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use winedock::discovery::{installer_name, Classifier};
use winedock::runtime::{windows_path_to_host, FileCommand, SystemProcesses};
use winedock::{DiscoveredProgram, Program, RunOutcome, Workspace, APP_NAME, APP_VERSION};

#[derive(Debug, Parser)]
#[command(version, about = "Run, track and discover Windows programs in Wine workspaces")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a program, or focus it if it is already running
    Run {
        #[arg(value_name = "workspace")]
        workspace: PathBuf,

        /// Host path, path inside the workspace, or Windows path like C:\Games\Game.exe
        #[arg(value_name = "program")]
        program: String,

        #[arg(value_name = "args", num_args = 0.., trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List programs installed into a workspace
    Discover {
        #[arg(value_name = "workspace")]
        workspace: PathBuf,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Re-run discovery whenever new shortcuts appear, until Ctrl-C
    Watch {
        #[arg(value_name = "workspace")]
        workspace: PathBuf,
    },
    /// Show how a file is classified
    Classify {
        #[arg(value_name = "file")]
        file: PathBuf,
    },
    /// List the runtime processes of a workspace
    Status {
        #[arg(value_name = "workspace")]
        workspace: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    info!("{} v{} starting", APP_NAME, APP_VERSION);

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            workspace,
            program,
            args,
        } => run(&workspace, &program, args).await,
        Command::Discover { workspace, json } => discover(&workspace, json).await,
        Command::Watch { workspace } => watch(&workspace).await,
        Command::Classify { file } => classify(&file).await,
        Command::Status { workspace } => status(&workspace),
    }
}

/// Initialize the logging system
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("winedock=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_workspace(root: &Path) -> Result<Workspace> {
    Workspace::open(root).with_context(|| format!("Failed to open workspace {}", root.display()))
}

/// Interpret a program argument as a host path, a Windows path or a path inside the workspace
fn program_path(workspace: &Workspace, program: &str) -> PathBuf {
    let as_given = PathBuf::from(program);
    if as_given.is_absolute() && as_given.exists() {
        return as_given;
    }
    windows_path_to_host(workspace.root(), program).unwrap_or_else(|| workspace.root().join(program))
}

async fn run(root: &Path, program: &str, args: Vec<String>) -> Result<()> {
    let workspace = open_workspace(root)?;
    let path = program_path(&workspace, program);
    let launcher = workspace.launcher_for(Program::from_path(path).with_arguments(args));

    match launcher.run(&workspace).await {
        Ok(RunOutcome::Exited) => info!("{} finished", launcher.program().display_name()),
        Ok(RunOutcome::Focused) => println!("{} is already running, focused it", launcher.program().display_name()),
        Ok(RunOutcome::AlreadyRunning) | Ok(RunOutcome::Busy) => {
            println!("{} is already running", launcher.program().display_name())
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
    Ok(())
}

fn print_programs(programs: &[DiscoveredProgram], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(programs)?);
        return Ok(());
    }

    if programs.is_empty() {
        println!("No programs found");
    }
    for program in programs {
        let source = if program.from_shortcut { "shortcut" } else { "scan" };
        println!("{:<32} {:<8} {}", program.name, source, program.path.display());
    }
    Ok(())
}

async fn discover(root: &Path, json: bool) -> Result<()> {
    let workspace = open_workspace(root)?;
    let programs = workspace.discover_programs().await;
    print_programs(&programs, json)
}

async fn watch(root: &Path) -> Result<()> {
    let workspace = open_workspace(root)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    workspace.start_watching(Arc::new(move || {
        let _ = tx.send(());
    }))?;
    println!("Watching {} for new shortcuts, press Ctrl-C to stop", workspace.root().display());

    loop {
        tokio::select! {
            Some(()) = rx.recv() => {
                let programs = workspace.discover_programs().await;
                print_programs(&programs, false)?;
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    workspace.stop_watching();
    Ok(())
}

async fn classify(file: &Path) -> Result<()> {
    let classifier = Classifier::new(Arc::new(FileCommand::new()));
    let installer = classifier.is_installer(file).await;

    println!("installer:   {}", installer);
    println!("uninstaller: {}", classifier.is_uninstaller(file));
    println!("stub:        {}", classifier.is_stub(file).await);
    if installer {
        println!("name:        {}", installer_name(file));
    }
    Ok(())
}

fn status(root: &Path) -> Result<()> {
    let workspace = open_workspace(root)?;
    let processes = SystemProcesses::new(&workspace.settings().runtime_process_names);
    let pids = processes.find_runtime_processes();

    if pids.is_empty() {
        println!("Runtime is not running");
    } else {
        let pids: Vec<String> = pids.iter().map(|pid| pid.to_string()).collect();
        println!("Runtime processes: {}", pids.join(", "));
    }
    Ok(())
}

//! prism-guard Entry Point
//!
//! Command line front end of the permission engine. It initializes logging,
//! loads configuration and runs one check, filter, show, validate or cleanup
//! command.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use prism_guard::core::{
    Config, FilteredLog, LocalWorkspace, PathPermissionEnforcer, SourceDirectoryFilter, Workspace,
};
use prism_guard::domains::approval::{ApprovedDirectories, SourceDirectoryValidation};
use prism_guard::domains::retention::{LocalBuild, SourceCodeRetention};
use prism_guard::domains::viewer::SourceViewer;

/// prism-guard - decides which source files a build result viewer may show
#[derive(Parser, Debug)]
#[command(name = "prism-guard")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error), overrides PRISM_LOG_LEVEL
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check whether a file may be shown for a workspace
    Check {
        /// Workspace of the build
        workspace: PathBuf,

        /// File to check
        file: String,

        /// Additional permitted directory (repeatable)
        #[arg(long = "permit")]
        permitted: Vec<String>,
    },

    /// Filter requested source directories down to the permitted ones
    Filter {
        /// Workspace of the build
        workspace: PathBuf,

        /// Requested directories: relative, absolute, glob:... or regex:...
        #[arg(allow_hyphen_values = true)]
        requested: Vec<String>,
    },

    /// Print a source file if it may be shown
    Show {
        /// Workspace of the build
        workspace: PathBuf,

        /// File to print, absolute or relative to the workspace
        file: String,

        /// Source directory requested by the build report (repeatable)
        #[arg(long = "source-dir")]
        source_directories: Vec<String>,
    },

    /// Validate source directories of a job configuration
    Validate {
        /// Workspace of the job, if known
        #[arg(long)]
        workspace: Option<String>,

        /// Directories to validate
        #[arg(allow_hyphen_values = true)]
        directories: Vec<String>,
    },

    /// Remove copied source files from builds older than the given one
    Cleanup {
        /// Directory of the current build, e.g. jobs/app/builds/42
        build: PathBuf,

        /// Source folder below each build directory
        #[arg(long)]
        folder: Option<String>,

        /// Retention strategy: never, last-build or every-build
        #[arg(long)]
        retention: Option<SourceCodeRetention>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration from environment
    let mut config = Config::from_env();
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // Initialize logging
    init_logging(&config.logging.level, config.logging.with_timestamps);

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let approved = load_approved(&config)?;
    let code = match cli.command {
        Commands::Check {
            workspace,
            file,
            permitted,
        } => check(&approved, workspace, &file, &permitted),
        Commands::Filter {
            workspace,
            requested,
        } => filter(&approved, workspace, &requested),
        Commands::Show {
            workspace,
            file,
            source_directories,
        } => show(approved, workspace, &file, &source_directories)?,
        Commands::Validate {
            workspace,
            directories,
        } => validate(&approved, workspace.as_deref(), &directories),
        Commands::Cleanup {
            build,
            folder,
            retention,
        } => {
            let folder = folder.unwrap_or(config.retention.source_folder);
            cleanup(build, &folder, retention.unwrap_or(config.retention.strategy))?
        }
    };

    Ok(code)
}

fn load_approved(config: &Config) -> prism_guard::Result<ApprovedDirectories> {
    Ok(ApprovedDirectories::from_config(&config.security)?)
}

fn check(approved: &ApprovedDirectories, workspace: PathBuf, file: &str, permitted: &[String]) -> ExitCode {
    let workspace = LocalWorkspace::new(workspace);
    let enforcer = PathPermissionEnforcer::with_case_sensitivity(approved.case_sensitivity());

    if enforcer.is_permitted(file, &workspace, approved.iter().chain(permitted)) {
        println!("permitted");
        ExitCode::SUCCESS
    } else {
        println!("denied");
        ExitCode::FAILURE
    }
}

fn filter(approved: &ApprovedDirectories, workspace: PathBuf, requested: &[String]) -> ExitCode {
    let mut log = FilteredLog::new("Source directories");
    let workspace = LocalWorkspace::new(workspace);
    let permitted = SourceDirectoryFilter::with_case_sensitivity(approved.case_sensitivity())
        .filter_permitted(workspace.remote_path(), approved, requested, &mut log);

    for directory in &permitted {
        println!("{directory}");
    }
    print_log(&log);
    ExitCode::SUCCESS
}

fn show(
    approved: ApprovedDirectories,
    workspace: PathBuf,
    file: &str,
    source_directories: &[String],
) -> prism_guard::Result<ExitCode> {
    let mut log = FilteredLog::new("Source directories");
    let viewer = SourceViewer::new(LocalWorkspace::new(workspace), approved)
        .with_source_directories(source_directories, &mut log);
    print_log(&log);

    match viewer.read(file) {
        Ok(content) => {
            print!("{content}");
            Ok(ExitCode::SUCCESS)
        }
        Err(prism_guard::domains::viewer::ViewerError::Denied(denied)) => {
            eprintln!("{denied}");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

fn validate(approved: &ApprovedDirectories, workspace: Option<&str>, directories: &[String]) -> ExitCode {
    let validation = SourceDirectoryValidation::new(approved);

    let mut failed = false;
    for directory in directories {
        let result = validation.validate_source_directory(workspace, directory);
        failed |= result.is_error();
        println!("{directory}: {result}");
    }
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn cleanup(build: PathBuf, folder: &str, retention: SourceCodeRetention) -> prism_guard::Result<ExitCode> {
    let build = LocalBuild::open(build)?;
    let mut log = FilteredLog::new("Retention");

    retention.cleanup(&build, folder, &mut log);

    print_log(&log);
    Ok(if log.has_errors() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn print_log(log: &FilteredLog) {
    for entry in log.entries() {
        eprintln!("[{}] {}: {}", log.title(), entry.severity, entry.message);
    }
    if log.skipped_errors() > 0 {
        eprintln!(
            "[{}] ... skipped logging of {} additional errors",
            log.title(),
            log.skipped_errors()
        );
    }
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format.
fn init_logging(level: &str, with_timestamps: bool) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if with_timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}

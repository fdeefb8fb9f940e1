//! spyker-build command-line interface
//!
//! Compiles the spyker native plugin with `CMake` and stages it for packaging

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

/// Display an error with optional backtrace information
fn display_error(err: &anyhow::Error, backtrace_enabled: bool) {
    eprintln!("error: {err}");

    // Show error chain
    let mut source = err.source();
    while let Some(err) = source {
        eprintln!("caused by: {err}");
        source = err.source();
    }

    if backtrace_enabled {
        let backtrace = err.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            eprintln!("\nBacktrace:");
            eprintln!("{backtrace}");
        }
    }
}

#[derive(Parser)]
#[command(name = "spyker-build")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build the spyker native plugin with CMake", long_about = None)]
pub(crate) struct Cli {
    /// Print debug logging (commands run, decisions taken) to stderr
    #[arg(long, global = true)]
    log: bool,

    /// Show a backtrace with errors (requires `RUST_BACKTRACE=1`)
    #[arg(long, global = true)]
    backtrace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure, compile and stage every extension
    Build {
        #[command(flatten)]
        settings: commands::BuildSettings,

        /// Stream CMake and compiler output as it happens
        #[arg(long)]
        verbose: bool,

        /// Suppress all output except errors
        #[arg(long, short, conflicts_with = "verbose")]
        quiet: bool,
    },

    /// Print the CMake commands a build would run, without running them
    Show {
        #[command(flatten)]
        settings: commands::BuildSettings,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that CMake is installed and new enough
    Probe {
        /// CMake program to check
        #[arg(long)]
        cmake: Option<PathBuf>,

        /// Config file to use instead of ./spyker-build.toml
        #[arg(long)]
        config: Option<PathBuf>,

        /// Ignore config files
        #[arg(long, conflicts_with = "config")]
        no_config: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    spyker_build::init_debug(cli.log);

    let result = match cli.command {
        Commands::Build {
            settings,
            verbose,
            quiet,
        } => commands::build::run(&settings, verbose, quiet),
        Commands::Show { settings, json } => commands::show::run(&settings, json),
        Commands::Probe {
            cmake,
            config,
            no_config,
        } => commands::probe::run(cmake.as_deref(), config.as_deref(), no_config),
        Commands::Completion { shell } => commands::completion::run(shell),
    };

    if let Err(e) = result {
        display_error(&e, cli.backtrace);
        process::exit(1);
    }
}

mod commands;

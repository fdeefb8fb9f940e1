//! Build command
//!
//! Probe `CMake`, then configure, compile and stage every extension

use super::{BuildSettings, Session};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use spyker_build::extensions::{
    BuildError, BuildEvent, BuildReport, BuildResult, ExtensionBuilder, SystemRunner,
};
use std::time::Duration;

/// Lines of tool output shown when a step fails without `--verbose`
const FAILURE_TAIL_LINES: usize = 40;

/// Build all configured extensions
pub(crate) fn run(settings: &BuildSettings, verbose: bool, quiet: bool) -> Result<()> {
    let session = Session::resolve(settings)?;

    // Streaming hands the terminal to CMake, so no spinner in that mode
    let runner = if verbose {
        SystemRunner::streaming()
    } else {
        SystemRunner::capturing()
    };
    let mut builder = ExtensionBuilder::new(runner, session.options, session.env, session.host);

    let spinner_style =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")?;
    let mut spinner: Option<ProgressBar> = None;

    let outcome = builder.run_with(&session.extensions, |event| match event {
        BuildEvent::Probed(toolchain) => {
            if !quiet {
                match &toolchain.version {
                    Some(version) => {
                        println!("Using CMake {version} ({})", toolchain.program.display());
                    }
                    None => println!("Using CMake ({})", toolchain.program.display()),
                }
            }
        }
        BuildEvent::Started(ext) => {
            if verbose {
                println!("Building {}", ext.name());
            } else if !quiet {
                let pb = ProgressBar::new_spinner();
                pb.set_style(spinner_style.clone());
                pb.set_message(format!("Building {}", ext.name()));
                pb.enable_steady_tick(Duration::from_millis(120));
                spinner = Some(pb);
            }
        }
        BuildEvent::Finished(result) => {
            if let Some(pb) = spinner.take() {
                pb.finish_and_clear();
            }
            if !quiet {
                print_result(result);
            }
        }
    });

    if let Some(pb) = spinner.take() {
        pb.finish_and_clear();
    }

    match outcome {
        Ok(report) => {
            if !quiet {
                print_summary(&report);
            }
            Ok(())
        }
        Err(e) => {
            if !verbose {
                print_tool_output(&e);
            }
            Err(e.into())
        }
    }
}

fn print_result(result: &BuildResult) {
    println!(
        "  OK {} ({:.1}s)",
        result.extension,
        result.duration.as_secs_f64()
    );
    match &result.artifact {
        Some(artifact) => println!("     {}", artifact.display()),
        None => println!("     {}", result.output_dir.display()),
    }
    for removed in &result.removed {
        spyker_build::debug!("removed {}", removed.display());
    }
}

fn print_summary(report: &BuildReport) {
    let count = report.results.len();
    println!();
    println!(
        "Built {count} extension{} in {:.1}s",
        if count == 1 { "" } else { "s" },
        report.total_duration().as_secs_f64()
    );
}

/// Show the end of the captured configure/build output for a failed step
fn print_tool_output(err: &BuildError) {
    let Some(output) = err.tool_output() else {
        return;
    };
    let lines: Vec<&str> = output.lines().collect();
    let skipped = lines.len().saturating_sub(FAILURE_TAIL_LINES);

    eprintln!();
    if skipped > 0 {
        eprintln!("... ({skipped} earlier lines omitted, rerun with --verbose for all output)");
    }
    for line in lines.iter().skip(skipped) {
        eprintln!("{line}");
    }
    eprintln!();
}

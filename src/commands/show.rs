//! Show command
//!
//! Print the commands a build would run without running anything

use super::{BuildSettings, Session};
use anyhow::Result;
use serde::Serialize;
use spyker_build::ToolCommand;
use spyker_build::extensions::{BuildInvocation, ExtensionDescriptor, translator};
use std::path::Path;

#[derive(Debug, Serialize)]
struct PlannedBuild<'a> {
    extension: &'a str,
    working_dir: &'a Path,
    output_dir: &'a Path,
    configure: Vec<String>,
    build: Vec<String>,
}

impl<'a> PlannedBuild<'a> {
    fn new(ext: &'a ExtensionDescriptor, invocation: &'a BuildInvocation) -> Self {
        Self {
            extension: ext.name(),
            working_dir: &invocation.working_dir,
            output_dir: &invocation.output_dir,
            configure: invocation.configure_command(),
            build: invocation.build_command(),
        }
    }
}

/// Print the configure and build steps for every extension
pub(crate) fn run(settings: &BuildSettings, json: bool) -> Result<()> {
    let session = Session::resolve(settings)?;
    let options = &session.options;

    let invocations: Vec<BuildInvocation> = session
        .extensions
        .iter()
        .map(|ext| {
            translator::plan(
                ext,
                &session.env,
                &options.lib_dir,
                &options.build_temp,
                options.build_type,
                &session.host,
            )
        })
        .collect();

    let planned: Vec<PlannedBuild<'_>> = session
        .extensions
        .iter()
        .zip(&invocations)
        .map(|(ext, invocation)| PlannedBuild::new(ext, invocation))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
        return Ok(());
    }

    for (i, plan) in planned.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", plan.extension);
        println!("  build dir: {}", plan.working_dir.display());
        println!("  output:    {}", plan.output_dir.display());
        println!(
            "  configure: {}",
            ToolCommand::new(&options.cmake).args(&plan.configure)
        );
        println!(
            "  build:     {}",
            ToolCommand::new(&options.cmake).args(&plan.build)
        );
    }

    Ok(())
}

//! Shared test helpers and utilities

use spyker_build::{HostFacts, Platform, ToolCommand, ToolOutput, ToolRunner};
use std::io;
use std::path::PathBuf;

/// Path to the compiled spyker-build binary
#[allow(dead_code)]
pub(crate) fn get_binary() -> String {
    env!("CARGO_BIN_EXE_spyker-build").to_string()
}

/// Host facts for a 64-bit interpreter with a fixed core count
#[allow(dead_code)]
pub(crate) fn host(platform: Platform, parallelism: usize) -> HostFacts {
    HostFacts {
        platform,
        interpreter: PathBuf::from("/usr/bin/python3"),
        interpreter_64bit: true,
        parallelism,
    }
}

/// `CMake` stand-in that records every call
///
/// `--version` answers with `banner`; configure and build answer with the
/// configured exit codes. With `missing` set every call fails to start.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub(crate) struct ScriptedCmake {
    pub(crate) banner: String,
    pub(crate) missing: bool,
    pub(crate) configure_exit: i32,
    pub(crate) build_exit: i32,
    pub(crate) calls: Vec<ToolCommand>,
}

impl Default for ScriptedCmake {
    fn default() -> Self {
        Self {
            banner: "cmake version 3.27.4\n\nCMake suite maintained and supported by Kitware.\n"
                .to_string(),
            missing: false,
            configure_exit: 0,
            build_exit: 0,
            calls: Vec::new(),
        }
    }
}

#[allow(dead_code)]
impl ScriptedCmake {
    pub(crate) fn with_banner(banner: &str) -> Self {
        Self {
            banner: banner.to_string(),
            ..Self::default()
        }
    }

    /// Calls other than the version probe
    pub(crate) fn configure_calls(&self) -> Vec<&ToolCommand> {
        self.calls
            .iter()
            .filter(|c| c.args.first().is_some_and(|a| a != "--version" && a != "--build"))
            .collect()
    }

    pub(crate) fn build_calls(&self) -> Vec<&ToolCommand> {
        self.calls
            .iter()
            .filter(|c| c.args.first().is_some_and(|a| a == "--build"))
            .collect()
    }

    pub(crate) fn probe_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| c.args.first().is_some_and(|a| a == "--version"))
            .count()
    }
}

impl ToolRunner for ScriptedCmake {
    fn run(&mut self, command: &ToolCommand) -> io::Result<ToolOutput> {
        if self.missing {
            return Err(io::Error::new(io::ErrorKind::NotFound, "cmake: not found"));
        }
        self.calls.push(command.clone());

        let (exit_code, output) = match command.args.first().map(String::as_str) {
            Some("--version") => (0, self.banner.clone()),
            Some("--build") => (self.build_exit, "[100%] Built target spyker_plugin\n".to_string()),
            _ => (self.configure_exit, "-- Configuring done\n".to_string()),
        };
        Ok(ToolOutput {
            exit_code: Some(exit_code),
            output,
        })
    }
}

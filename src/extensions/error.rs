//! Extension build errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an extension build
///
/// Every variant is fatal. A missing cleanup file is not an error and never
/// shows up here.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("CMake must be installed to build the following extensions: {}{}", .extensions.join(", "), detail_suffix(.detail))]
    ToolchainMissing {
        extensions: Vec<String>,
        detail: String,
    },

    #[error("CMake >= {required} is required on Windows (found {found})")]
    ToolchainTooOld {
        found: semver::Version,
        required: semver::Version,
    },

    #[error("Could not find a version number in CMake output: {banner}")]
    UnrecognizedVersion { banner: String },

    #[error("CMake configuration failed for {extension} ({})", exit_status(.code.as_ref()))]
    ConfigureFailed {
        extension: String,
        code: Option<i32>,
        output: String,
    },

    #[error("CMake build failed for {extension} ({})", exit_status(.code.as_ref()))]
    BuildFailed {
        extension: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Failed to execute {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create build directory {}: {source}", .path.display())]
    WorkingDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Captured tool output for configure/build failures
    #[must_use]
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::ConfigureFailed { output, .. } | Self::BuildFailed { output, .. } => {
                Some(output.as_str())
            }
            _ => None,
        }
    }
}

fn exit_status(code: Option<&i32>) -> String {
    code.map_or_else(
        || "terminated by signal".to_string(),
        |c| format!("exit code {c}"),
    )
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" ({detail})")
    }
}

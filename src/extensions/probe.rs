//! Toolchain probe
//!
//! Runs `cmake --version` once before any extension is touched, so a missing
//! or outdated `CMake` is one clear error instead of a failure halfway
//! through a build.

use super::error::BuildError;
use super::runner::{ToolCommand, ToolRunner};
use super::types::ExtensionDescriptor;
use crate::platform::Platform;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static VERSION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"version\s*([\d.]+)").ok());

/// What the probe learned about `CMake`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInfo {
    /// Program that answered the probe
    pub program: PathBuf,
    /// Parsed version, when the banner carried one
    pub version: Option<semver::Version>,
}

/// Extract the version from a `cmake --version` banner.
///
/// Missing components are padded with zeros (`3.1` is `3.1.0`). Anything
/// past the patch component is ignored.
#[must_use]
pub fn parse_version(banner: &str) -> Option<semver::Version> {
    let captures = VERSION_PATTERN.as_ref()?.captures(banner)?;
    let raw = captures.get(1)?.as_str();

    let mut parts = raw
        .split('.')
        .filter(|p| !p.is_empty())
        .map(str::parse::<u64>);

    let major = parts.next()?.ok()?;
    let minor = parts.next().transpose().ok()?.unwrap_or(0);
    let patch = parts.next().transpose().ok()?.unwrap_or(0);

    Some(semver::Version::new(major, minor, patch))
}

/// Verify `CMake` can be run and, where the platform demands it, is new
/// enough.
///
/// # Errors
///
/// - [`BuildError::ToolchainMissing`] if the program cannot be started or
///   exits nonzero; the message lists every extension in `extensions`.
/// - [`BuildError::ToolchainTooOld`] / [`BuildError::UnrecognizedVersion`]
///   on platforms with a minimum version.
pub fn probe_toolchain<R: ToolRunner + ?Sized>(
    runner: &mut R,
    cmake: &Path,
    platform: Platform,
    extensions: &[ExtensionDescriptor],
) -> Result<ToolchainInfo, BuildError> {
    let missing = |detail: String| BuildError::ToolchainMissing {
        extensions: extensions.iter().map(|e| e.name().to_string()).collect(),
        detail,
    };

    let output = runner
        .run(&ToolCommand::new(cmake).args(["--version"]))
        .map_err(|e| missing(format!("{}: {e}", cmake.display())))?;

    if !output.success() {
        return Err(missing(format!(
            "{} --version exited with {}",
            cmake.display(),
            output
                .exit_code
                .map_or_else(|| "a signal".to_string(), |c| format!("code {c}"))
        )));
    }

    let version = parse_version(&output.output);
    crate::debug!(
        "cmake at {} reports version {}",
        cmake.display(),
        version
            .as_ref()
            .map_or_else(|| "unknown".to_string(), ToString::to_string)
    );

    if let Some(required) = platform.minimum_cmake() {
        let Some(found) = version.clone() else {
            return Err(BuildError::UnrecognizedVersion {
                banner: output.output.trim().to_string(),
            });
        };
        if found < required {
            return Err(BuildError::ToolchainTooOld { found, required });
        }
    }

    Ok(ToolchainInfo {
        program: cmake.to_path_buf(),
        version,
    })
}

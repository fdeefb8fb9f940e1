//! Host platform facts
//!
//! The configure and build steps differ between Windows (multi-configuration
//! Visual Studio generator) and everything else (single-configuration
//! Makefile/Ninja generators). That difference lives in [`Platform`] so the
//! translator never branches on `cfg!(windows)` itself.

use crate::env_vars::EnvSnapshot;
use crate::extensions::types::{BuildConfiguration, BuildType};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

/// Minimum `CMake` version required on Windows
pub const MIN_WINDOWS_CMAKE: semver::Version = semver::Version::new(3, 1, 0);

/// Parallelism used when the processor count cannot be determined
const FALLBACK_PARALLELISM: usize = 4;

/// Target platform family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Windows with a multi-configuration generator
    Windows,
    /// Linux, macOS and other Unix-likes
    Posix,
}

impl Platform {
    /// Platform this binary was compiled for
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Posix }
    }

    /// Minimum `CMake` version this platform enforces, if any.
    #[must_use]
    pub const fn minimum_cmake(self) -> Option<semver::Version> {
        match self {
            Self::Windows => Some(MIN_WINDOWS_CMAKE),
            Self::Posix => None,
        }
    }

    /// Append the platform's build-type and architecture flags.
    ///
    /// `output_dir` is the already separator-terminated library directory.
    pub fn shape_configuration(
        self,
        config: &mut BuildConfiguration,
        build_type: BuildType,
        output_dir: &str,
        interpreter_64bit: bool,
    ) {
        match self {
            Self::Windows => {
                config.define(
                    format!("CMAKE_LIBRARY_OUTPUT_DIRECTORY_{}", build_type.upper()),
                    output_dir,
                );
                if interpreter_64bit {
                    config.architecture("x64");
                }
            }
            Self::Posix => {
                config.define("CMAKE_BUILD_TYPE", build_type.as_str());
            }
        }
    }

    /// Arguments for `cmake --build .`
    #[must_use]
    pub fn build_args(self, build_type: BuildType, jobs: usize) -> Vec<String> {
        let mut args = vec![
            "--config".to_string(),
            build_type.as_str().to_string(),
            "--".to_string(),
        ];
        match self {
            Self::Windows => args.push("/m".to_string()),
            Self::Posix => args.push(format!("-j{jobs}")),
        }
        args
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Posix => "posix",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts about the host that shape the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    /// Platform family
    pub platform: Platform,
    /// Python interpreter passed as `PYTHON_EXECUTABLE`
    pub interpreter: PathBuf,
    /// Whether the interpreter is a 64-bit build
    pub interpreter_64bit: bool,
    /// Number of parallel compile jobs for the build step
    pub parallelism: usize,
}

impl HostFacts {
    /// Detect host facts.
    ///
    /// Interpreter priority:
    /// 1. `interpreter` argument (CLI flag or config file)
    /// 2. `PYTHON` in the environment snapshot
    /// 3. `python3`, then `python`, on `PATH`
    ///
    /// Bitness is only asked of the interpreter on Windows, where it selects
    /// `-A x64`. Elsewhere it follows this binary's pointer width.
    pub fn detect(
        interpreter: Option<PathBuf>,
        env: &EnvSnapshot,
        jobs: Option<usize>,
    ) -> anyhow::Result<Self> {
        let platform = Platform::current();
        let interpreter = match interpreter.or_else(|| env.python().map(PathBuf::from)) {
            Some(path) => path,
            None => find_python_executable()?,
        };

        let interpreter_64bit = if platform == Platform::Windows {
            probe_interpreter_64bit(&interpreter).unwrap_or(cfg!(target_pointer_width = "64"))
        } else {
            cfg!(target_pointer_width = "64")
        };

        Ok(Self {
            platform,
            interpreter,
            interpreter_64bit,
            parallelism: jobs.filter(|n| *n > 0).unwrap_or_else(available_parallelism),
        })
    }
}

/// Number of processing units available to this process.
#[must_use]
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism().map_or(FALLBACK_PARALLELISM, std::num::NonZero::get)
}

fn find_python_executable() -> anyhow::Result<PathBuf> {
    let locator = if cfg!(windows) { "where" } else { "which" };

    for candidate in ["python3", "python"] {
        if let Ok(output) = Command::new(locator).arg(candidate).output()
            && output.status.success()
        {
            let stdout = String::from_utf8_lossy(&output.stdout);
            // `where` may list several matches, one per line
            if let Some(first) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
                let path = PathBuf::from(first);
                if path.exists() {
                    return Ok(path);
                }
            }
        }
    }

    anyhow::bail!(
        "Python interpreter not found. Set PYTHON, pass --python, or put python3 on PATH"
    )
}

fn probe_interpreter_64bit(interpreter: &std::path::Path) -> Option<bool> {
    let output = Command::new(interpreter)
        .args(["-c", "import sys; print(sys.maxsize > 2**32)"])
        .output()
        .ok()?;

    output.status.success().then_some(())?;

    match String::from_utf8_lossy(&output.stdout).trim() {
        "True" => Some(true),
        "False" => Some(false),
        _ => None,
    }
}

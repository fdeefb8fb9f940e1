//! Build environment variable handling.
//!
//! The process environment is captured once into an [`EnvSnapshot`] when
//! orchestration starts. Everything downstream reads from the snapshot and
//! never from `std::env`, so translation stays a pure function of its inputs.

use std::collections::BTreeMap;
use std::env;
use std::ffi::{OsStr, OsString};

// Generator and escape-hatch variables

/// Selects the Ninja generator when set to `1`, `on` or `true`.
pub const ENABLE_NINJA: &str = "ENABLE_NINJA";

/// Whitespace-separated extra arguments appended to the configure step.
pub const CMAKE_ARGS: &str = "CMAKE_ARGS";

// Feature variables, passed through to CMake as `-D<KEY>=<value>`

/// Link the vector-math library statically.
pub const BLA_STATIC: &str = "BLA_STATIC";
/// Vector-math library vendor (`OpenBLAS`, `Intel10_64lp`, ...).
pub const BLA_VENDOR: &str = "BLA_VENDOR";
/// Root directory of the cuDNN installation.
pub const CUDNN_ROOT_DIR: &str = "CUDNN_ROOT_DIR";
/// GPU architectures to compile kernels for.
pub const CUDA_ARCH_LIST: &str = "CUDA_ARCH_LIST";
/// Toggle the vector-math backend.
pub const ENABLE_BLAS: &str = "ENABLE_BLAS";
/// Toggle the deep-learning primitive library backend.
pub const ENABLE_DNNL: &str = "ENABLE_DNNL";
/// Toggle the GPU compute backend.
pub const ENABLE_CUDA: &str = "ENABLE_CUDA";
/// Toggle the GPU neural-primitives backend.
pub const ENABLE_CUDNN: &str = "ENABLE_CUDNN";
/// Toggle `-march=native` style CPU optimization.
pub const ENABLE_NATIVE: &str = "ENABLE_NATIVE";

/// Feature keys translated verbatim, in emission order.
pub const FEATURE_KEYS: [&str; 9] = [
    BLA_STATIC,
    BLA_VENDOR,
    CUDNN_ROOT_DIR,
    CUDA_ARCH_LIST,
    ENABLE_BLAS,
    ENABLE_DNNL,
    ENABLE_CUDA,
    ENABLE_CUDNN,
    ENABLE_NATIVE,
];

// Tool discovery

/// `CMake` program to run (defaults to `cmake` on `PATH`).
pub const CMAKE: &str = "CMAKE";

/// Python interpreter the plugin is built against.
pub const PYTHON: &str = "PYTHON";

/// Check whether a toggle value is affirmative: `1`, `on` or `true`.
///
/// Case-insensitive, surrounding whitespace ignored.
#[must_use]
pub fn is_affirmative(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("on") || value.eq_ignore_ascii_case("true")
}

/// Immutable copy of the environment taken at the start of orchestration
///
/// Names and values are kept as the OS gave them, so a child started with
/// this snapshot sees the same environment even where it is not Unicode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<OsString, OsString>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            vars: env::vars_os().collect(),
        }
    }

    /// Build a snapshot from explicit pairs.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Look up a variable as text.
    ///
    /// `None` when unset or when the value is not valid Unicode; such values
    /// still reach child processes through [`iter`](Self::iter).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(OsStr::new(key)).and_then(|value| value.to_str())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(OsStr::new(key))
    }

    /// Whether a toggle is present and affirmative.
    #[must_use]
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key).is_some_and(is_affirmative)
    }

    /// Whether the Ninja generator was requested.
    #[must_use]
    pub fn ninja_requested(&self) -> bool {
        self.is_enabled(ENABLE_NINJA)
    }

    /// Extra configure arguments from `CMAKE_ARGS`, split on whitespace.
    ///
    /// Empty when the variable is unset.
    #[must_use]
    pub fn extra_cmake_args(&self) -> Vec<String> {
        self.get(CMAKE_ARGS)
            .map(|args| args.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Feature variables that are set, as `(key, value)` in emission order.
    pub fn features(&self) -> impl Iterator<Item = (&'static str, &str)> {
        FEATURE_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
    }

    /// `CMake` program from `CMAKE`, ignoring empty values.
    #[must_use]
    pub fn cmake(&self) -> Option<&str> {
        self.get(CMAKE).filter(|s| !s.is_empty())
    }

    /// Python interpreter from `PYTHON`, ignoring empty values.
    #[must_use]
    pub fn python(&self) -> Option<&str> {
        self.get(PYTHON).filter(|s| !s.is_empty())
    }

    /// Iterate over every captured variable.
    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }
}

//! Configuration file management
//!
//! Reads the project's build configuration from TOML. Priority:
//! `--config <path>` -> `./spyker-build.toml` ->
//! `$XDG_CONFIG_HOME/spyker-build/config.toml` (or `~/.config/...`) ->
//! built-in defaults.

use crate::extensions::relocator::DEFAULT_BYPRODUCTS;
use crate::extensions::types::ExtensionDescriptor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Project config file name looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = "spyker-build.toml";

/// Module path of the plugin when no extensions are configured
pub const DEFAULT_EXTENSION: &str = "spyker/spyker_plugin";

/// One `[[extensions]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtensionEntry {
    /// Installable module path, `/`-separated
    pub name: String,
    /// Directory containing `CMakeLists.txt`
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
}

/// Build configuration loaded from TOML files
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `CMake` program
    pub cmake: Option<PathBuf>,

    /// Python interpreter the plugin is built for
    pub python: Option<PathBuf>,

    /// Root of per-extension build directories
    pub build_temp: PathBuf,

    /// Root the built package tree is staged under
    pub lib_dir: PathBuf,

    /// Package source root, used as `lib_dir` for in-place builds
    pub package_dir: PathBuf,

    /// Parallel compile jobs (defaults to the processor count)
    pub jobs: Option<usize>,

    /// By-product file names removed from the output directory
    pub cleanup: Vec<String>,

    /// Extensions to build
    pub extensions: Vec<ExtensionEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cmake: None,
            python: None,
            build_temp: PathBuf::from("build").join("temp"),
            lib_dir: PathBuf::from("build").join("lib"),
            package_dir: PathBuf::from("src").join("python"),
            jobs: None,
            cleanup: DEFAULT_BYPRODUCTS.iter().map(|s| (*s).to_string()).collect(),
            extensions: vec![ExtensionEntry {
                name: DEFAULT_EXTENSION.to_string(),
                source_dir: default_source_dir(),
            }],
        }
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Load configuration with custom options.
    ///
    /// # Arguments
    /// * `custom_path` - Config file to use instead of the default locations
    /// * `skip_files` - Ignore config files and return the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if `custom_path` cannot be read, or if any config
    /// file that exists fails to parse.
    pub fn load_with_options(custom_path: Option<&Path>, skip_files: bool) -> Result<Self> {
        if skip_files {
            return Ok(Self::default());
        }

        if let Some(path) = custom_path {
            return Self::load_from(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Self::load_from(&local);
        }

        if let Some(config_dir) = Self::user_config_dir() {
            let config_path = config_dir.join("config.toml");
            if config_path.is_file() {
                return Self::load_from(&config_path);
            }
        }

        Ok(Self::default())
    }

    /// Parse a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid config.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed TOML, unknown keys, or an extension
    /// with an empty name.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        if let Some(entry) = config.extensions.iter().find(|e| e.name.trim().is_empty()) {
            anyhow::bail!(
                "extension with source_dir {} has an empty name",
                entry.source_dir.display()
            );
        }
        Ok(config)
    }

    /// One descriptor per configured extension, source directories made
    /// absolute.
    ///
    /// # Errors
    ///
    /// Returns an error if a source directory cannot be made absolute.
    pub fn descriptors(&self) -> Result<Vec<ExtensionDescriptor>> {
        self.extensions
            .iter()
            .map(|entry| {
                ExtensionDescriptor::new(entry.name.clone(), &entry.source_dir).with_context(|| {
                    format!(
                        "Invalid source_dir {} for {}",
                        entry.source_dir.display(),
                        entry.name
                    )
                })
            })
            .collect()
    }

    fn user_config_dir() -> Option<PathBuf> {
        // Check XDG_CONFIG_HOME first
        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg_config).join("spyker-build"));
        }

        dirs::home_dir().map(|home| home.join(".config").join("spyker-build"))
    }
}

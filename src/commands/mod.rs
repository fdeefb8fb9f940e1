//! Command implementations and the settings they share

pub(crate) mod build;
pub(crate) mod completion;
pub(crate) mod probe;
pub(crate) mod show;

use anyhow::{Context, Result};
use clap::Args;
use spyker_build::extensions::{ArtifactRelocator, BuildOptions, BuildType, ExtensionDescriptor};
use spyker_build::{Config, EnvSnapshot, HostFacts};
use std::path::{Path, PathBuf};

/// Flags selecting what to build and how
#[derive(Debug, Args)]
pub(crate) struct BuildSettings {
    /// Build with debug information (Debug instead of Release)
    #[arg(short = 'g', long)]
    pub(crate) debug: bool,

    /// Place the plugin in the package source tree instead of the lib dir
    #[arg(long, short = 'i', conflicts_with = "lib_dir")]
    pub(crate) inplace: bool,

    /// Directory the built package tree is staged under
    #[arg(long)]
    pub(crate) lib_dir: Option<PathBuf>,

    /// Directory for per-extension CMake build trees
    #[arg(long, short = 't')]
    pub(crate) build_temp: Option<PathBuf>,

    /// CMake program
    #[arg(long)]
    pub(crate) cmake: Option<PathBuf>,

    /// Python interpreter the plugin is built for
    #[arg(long)]
    pub(crate) python: Option<PathBuf>,

    /// Number of parallel compile jobs (defaults to the processor count)
    #[arg(long, short = 'j')]
    pub(crate) jobs: Option<usize>,

    /// Config file to use instead of ./spyker-build.toml
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long, conflicts_with = "config")]
    pub(crate) no_config: bool,
}

/// Everything a build needs, resolved once per invocation
///
/// Priority for every setting: CLI flag > config file > environment > default.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) env: EnvSnapshot,
    pub(crate) host: HostFacts,
    pub(crate) options: BuildOptions,
    pub(crate) extensions: Vec<ExtensionDescriptor>,
}

impl Session {
    pub(crate) fn resolve(settings: &BuildSettings) -> Result<Self> {
        let config = Config::load_with_options(settings.config.as_deref(), settings.no_config)?;
        let env = EnvSnapshot::capture();

        let host = HostFacts::detect(
            settings.python.clone().or_else(|| config.python.clone()),
            &env,
            settings.jobs.or(config.jobs),
        )?;

        let lib_dir = if settings.inplace {
            config.package_dir.clone()
        } else {
            settings
                .lib_dir
                .clone()
                .unwrap_or_else(|| config.lib_dir.clone())
        };
        let build_temp = settings
            .build_temp
            .clone()
            .unwrap_or_else(|| config.build_temp.clone());

        let options = BuildOptions {
            cmake: resolve_cmake(settings.cmake.as_deref(), &config, &env),
            build_type: BuildType::from_debug(settings.debug),
            // CMake runs inside the build tree, so relative paths would land there
            lib_dir: absolute(&lib_dir)?,
            build_temp: absolute(&build_temp)?,
            relocator: ArtifactRelocator::new(config.cleanup.iter().cloned()),
        };

        spyker_build::debug!(
            "{} build on {}: lib_dir={} build_temp={} python={} jobs={}",
            options.build_type,
            host.platform,
            options.lib_dir.display(),
            options.build_temp.display(),
            host.interpreter.display(),
            host.parallelism
        );

        Ok(Self {
            env,
            host,
            options,
            extensions: config.descriptors()?,
        })
    }
}

/// `CMake` program: CLI flag, then config file, then `CMAKE`, then `cmake`.
pub(crate) fn resolve_cmake(flag: Option<&Path>, config: &Config, env: &EnvSnapshot) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| config.cmake.clone())
        .or_else(|| env.cmake().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("cmake"))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Invalid path {}", path.display()))
}

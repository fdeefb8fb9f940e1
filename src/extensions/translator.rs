//! Configuration translation
//!
//! Turns an extension, the environment snapshot and the host facts into the
//! exact arguments `CMake` gets. Nothing here touches the filesystem, the
//! process environment or any subprocess; the same inputs always give the
//! same arguments.
//!
//! Order of the configure arguments:
//! 1. baseline (Python bridge on, tests and examples off, output directory,
//!    interpreter)
//! 2. feature variables that are set, as `-D<KEY>=<value>`
//! 3. `-GNinja` when `ENABLE_NINJA` is affirmative
//! 4. `CMAKE_ARGS` tokens
//! 5. platform block (build type, per-configuration output, architecture)

use super::types::{
    BuildConfiguration, BuildInvocation, BuildType, ExtensionDescriptor, with_trailing_separator,
};
use crate::env_vars::EnvSnapshot;
use crate::platform::HostFacts;
use std::path::{Path, PathBuf};

/// Generator selected by `ENABLE_NINJA`
pub const NINJA_GENERATOR: &str = "Ninja";

/// Define naming the directory the plugin is written to
pub const LIBRARY_OUTPUT_DIRECTORY: &str = "CMAKE_LIBRARY_OUTPUT_DIRECTORY";

/// Configure-step arguments for one extension.
///
/// `output_dir` is where the plugin must land unless `CMAKE_ARGS` names
/// another one; either way it is rendered with a trailing separator.
#[must_use]
pub fn configure_args(
    ext: &ExtensionDescriptor,
    env: &EnvSnapshot,
    output_dir: &Path,
    build_type: BuildType,
    host: &HostFacts,
) -> BuildConfiguration {
    let output_dir = with_trailing_separator(output_dir);
    let mut config = BuildConfiguration::new();

    config
        .define("ENABLE_PYTHON", "ON")
        .define("ENABLE_TESTS", "OFF")
        .define("ENABLE_EXAMPLES", "OFF")
        .define(LIBRARY_OUTPUT_DIRECTORY, output_dir.as_str())
        .define("PYTHON_EXECUTABLE", host.interpreter.to_string_lossy());

    for (key, value) in env.features() {
        config.define(key, value);
    }

    if env.ninja_requested() {
        config.generator(NINJA_GENERATOR);
    }

    config.extend_tokens(env.extra_cmake_args());

    // A user override still has to end in a separator
    let output_dir = config
        .define_value(LIBRARY_OUTPUT_DIRECTORY)
        .map_or(output_dir, |dir| with_trailing_separator(Path::new(dir)));
    config.define(LIBRARY_OUTPUT_DIRECTORY, output_dir.as_str());

    host.platform.shape_configuration(
        &mut config,
        build_type,
        &output_dir,
        host.interpreter_64bit,
    );

    crate::debug!(
        "{}: {} configure arguments for {build_type} on {}",
        ext.name(),
        config.entries().len(),
        host.platform
    );

    config
}

/// Build-step arguments (`--config <type> -- <parallelism>`).
#[must_use]
pub fn build_args(build_type: BuildType, host: &HostFacts) -> Vec<String> {
    host.platform.build_args(build_type, host.parallelism)
}

/// Plan both steps for one extension.
#[must_use]
pub fn plan(
    ext: &ExtensionDescriptor,
    env: &EnvSnapshot,
    lib_dir: &Path,
    build_temp: &Path,
    build_type: BuildType,
    host: &HostFacts,
) -> BuildInvocation {
    let configure = configure_args(ext, env, &ext.module_dir(lib_dir), build_type, host);
    BuildInvocation {
        working_dir: build_temp.join(ext.build_dir_name()),
        source_dir: ext.source_dir().to_path_buf(),
        output_dir: configure
            .define_value(LIBRARY_OUTPUT_DIRECTORY)
            .map(PathBuf::from)
            .unwrap_or_default(),
        configure,
        build_args: build_args(build_type, host),
    }
}

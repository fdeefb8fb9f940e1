//! Probe command
//!
//! Check that `CMake` runs and meets this platform's minimum version

use super::resolve_cmake;
use anyhow::Result;
use spyker_build::extensions::probe_toolchain;
use spyker_build::{Config, EnvSnapshot, Platform, SystemRunner};
use std::path::Path;

/// Run `cmake --version` the way a build would
pub(crate) fn run(cmake: Option<&Path>, config_path: Option<&Path>, no_config: bool) -> Result<()> {
    let config = Config::load_with_options(config_path, no_config)?;
    let env = EnvSnapshot::capture();
    let cmake = resolve_cmake(cmake, &config, &env);
    let platform = Platform::current();
    let extensions = config.descriptors()?;

    let info = probe_toolchain(
        &mut SystemRunner::capturing(),
        &cmake,
        platform,
        &extensions,
    )?;

    println!("CMake:    {}", info.program.display());
    println!(
        "Version:  {}",
        info.version
            .as_ref()
            .map_or_else(|| "unknown".to_string(), ToString::to_string)
    );
    println!("Platform: {platform}");
    match platform.minimum_cmake() {
        Some(required) => println!("Minimum:  {required}"),
        None => println!("Minimum:  none"),
    }

    Ok(())
}

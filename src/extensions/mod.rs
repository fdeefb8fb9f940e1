//! Native extension building
//!
//! The plugin is compiled by `CMake`, not by the Python packaging tools. For
//! every extension this runs:
//!
//! ```bash
//! cmake --version                      # once, before anything else
//! mkdir -p build/temp/<extension>
//! cd build/temp/<extension>
//! cmake <source_dir> -DENABLE_PYTHON=ON ... -DCMAKE_BUILD_TYPE=Release
//! cmake --build . --config Release -- -j<cores>
//! rm -f <lib_dir>/<package>/libmkldnn.a
//! ```
//!
//! - [`probe`]: `CMake` presence and minimum version
//! - [`translator`]: environment and host facts to configure arguments
//! - [`invoker`]: configure and build steps
//! - [`relocator`]: output directory cleanup
//! - [`builder`]: runs the above in order for each extension

pub mod builder;
pub mod error;
pub mod invoker;
pub mod probe;
pub mod relocator;
pub mod runner;
pub mod translator;
pub mod types;

pub use builder::{BuildEvent, BuildOptions, ExtensionBuilder};
pub use error::BuildError;
pub use invoker::BuildInvoker;
pub use probe::{ToolchainInfo, parse_version, probe_toolchain};
pub use relocator::{ArtifactRelocator, DEFAULT_BYPRODUCTS, Relocation};
pub use runner::{SystemRunner, ToolCommand, ToolOutput, ToolRunner};
pub use types::{
    BuildConfiguration, BuildInvocation, BuildReport, BuildResult, BuildStage, BuildType,
    ConfigArg, ExtensionDescriptor,
};

//! spyker-build internal library code
//!
//! Builds the `spyker` native plugin through `CMake` and stages it where the
//! Python package expects it.

pub mod config;
pub mod debug;
pub mod env_vars;
pub mod extensions;
pub mod platform;

// Re-export common types for convenience
pub use config::{Config, ExtensionEntry};
pub use debug::{debug_command, init_debug, is_debug_enabled};
pub use env_vars::EnvSnapshot;
pub use extensions::{
    ArtifactRelocator, BuildError, BuildEvent, BuildInvocation, BuildOptions, BuildReport,
    BuildResult, BuildStage, BuildType, ExtensionBuilder, ExtensionDescriptor, SystemRunner,
    ToolCommand, ToolOutput, ToolRunner,
};
pub use platform::{HostFacts, Platform};

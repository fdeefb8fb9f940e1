//! Extension Builder Orchestration
//!
//! Coordinates building every native extension: probes `CMake` once, then for
//! each extension translates the configuration, runs configure and build,
//! and finalizes the output directory. The first failure stops the run;
//! there is no partial success.

use super::error::BuildError;
use super::invoker::BuildInvoker;
use super::probe::{ToolchainInfo, probe_toolchain};
use super::relocator::ArtifactRelocator;
use super::runner::ToolRunner;
use super::translator;
use super::types::{BuildInvocation, BuildReport, BuildResult, BuildStage, BuildType, ExtensionDescriptor};
use crate::env_vars::EnvSnapshot;
use crate::platform::HostFacts;
use std::path::PathBuf;
use std::time::Instant;

/// Progress of a [`ExtensionBuilder::run_with`] call
#[derive(Debug, Clone, Copy)]
pub enum BuildEvent<'a> {
    /// `CMake` answered the probe
    Probed(&'a ToolchainInfo),
    /// An extension is about to be configured
    Started(&'a ExtensionDescriptor),
    /// An extension was built and finalized
    Finished(&'a BuildResult),
}

/// Settings shared by every extension in a run
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// `CMake` program
    pub cmake: PathBuf,
    /// Debug or Release
    pub build_type: BuildType,
    /// Root the plugin's package directory lives under (`build/lib`)
    pub lib_dir: PathBuf,
    /// Root of the per-extension out-of-tree build directories
    pub build_temp: PathBuf,
    /// Post-build cleanup
    pub relocator: ArtifactRelocator,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            cmake: PathBuf::from("cmake"),
            build_type: BuildType::Release,
            lib_dir: PathBuf::from("build").join("lib"),
            build_temp: PathBuf::from("build").join("temp"),
            relocator: ArtifactRelocator::default(),
        }
    }
}

/// Extension builder coordinator
///
/// Owns the environment snapshot and host facts for the whole run, so every
/// extension is translated from the same inputs.
#[derive(Debug)]
pub struct ExtensionBuilder<R: ToolRunner> {
    runner: R,
    options: BuildOptions,
    env: EnvSnapshot,
    host: HostFacts,
    toolchain: Option<ToolchainInfo>,
    stages: Vec<(String, BuildStage)>,
}

impl<R: ToolRunner> ExtensionBuilder<R> {
    /// Create a new extension builder.
    #[must_use]
    pub fn new(runner: R, options: BuildOptions, env: EnvSnapshot, host: HostFacts) -> Self {
        Self {
            runner,
            options,
            env,
            host,
            toolchain: None,
            stages: Vec::new(),
        }
    }

    /// The runner, for inspecting what was executed
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Current stage of an extension, if the builder has seen it
    #[must_use]
    pub fn stage_of(&self, name: &str) -> Option<BuildStage> {
        self.stages
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, stage)| *stage)
    }

    /// Every extension seen so far with its stage, in first-seen order
    #[must_use]
    pub fn stages(&self) -> &[(String, BuildStage)] {
        &self.stages
    }

    /// Both steps for an extension, without running anything.
    #[must_use]
    pub fn plan(&self, ext: &ExtensionDescriptor) -> BuildInvocation {
        translator::plan(
            ext,
            &self.env,
            &self.options.lib_dir,
            &self.options.build_temp,
            self.options.build_type,
            &self.host,
        )
    }

    /// Probe `CMake`. Runs at most once per builder.
    ///
    /// On failure every extension passed in is marked `Failed`.
    pub fn probe(&mut self, extensions: &[ExtensionDescriptor]) -> Result<&ToolchainInfo, BuildError> {
        for ext in extensions {
            self.track(ext.name());
        }

        if self.toolchain.is_none() {
            match probe_toolchain(
                &mut self.runner,
                &self.options.cmake,
                self.host.platform,
                extensions,
            ) {
                Ok(info) => self.toolchain = Some(info),
                Err(e) => {
                    for ext in extensions {
                        self.set_stage(ext.name(), BuildStage::Failed);
                    }
                    return Err(e);
                }
            }
        }

        for ext in extensions {
            if self.stage_of(ext.name()) == Some(BuildStage::Unprobed) {
                self.set_stage(ext.name(), BuildStage::Probed);
            }
        }

        self.toolchain.as_ref().ok_or_else(|| BuildError::ToolchainMissing {
            extensions: extensions.iter().map(|e| e.name().to_string()).collect(),
            detail: String::new(),
        })
    }

    /// Configure, build and finalize one extension.
    ///
    /// Probes first if that has not happened yet.
    pub fn build_extension(&mut self, ext: &ExtensionDescriptor) -> Result<BuildResult, BuildError> {
        self.probe(std::slice::from_ref(ext))?;

        let start_time = Instant::now();
        let name = ext.name().to_string();
        let invocation = self.plan(ext);
        let output_dir = invocation.output_dir.clone();

        crate::debug!(
            "building {name} ({}) in {}",
            self.options.build_type,
            invocation.working_dir.display()
        );

        let mut reached = Vec::new();
        let invoked = BuildInvoker::new(&mut self.runner, &self.options.cmake, &self.env)
            .invoke(&name, &invocation, |stage| reached.push(stage));
        for stage in reached {
            self.set_stage(&name, stage);
        }
        let output = match invoked {
            Ok(output) => output,
            Err(e) => {
                self.set_stage(&name, BuildStage::Failed);
                return Err(e);
            }
        };

        let relocation = match self.options.relocator.finalize(&output_dir, ext.module_stem()) {
            Ok(relocation) => relocation,
            Err(e) => {
                self.set_stage(&name, BuildStage::Failed);
                return Err(e);
            }
        };
        self.set_stage(&name, BuildStage::Finalized);

        Ok(BuildResult {
            extension: name,
            stage: BuildStage::Finalized,
            duration: start_time.elapsed(),
            output_dir,
            artifact: relocation.artifact,
            removed: relocation.removed,
            output: output.combined(),
        })
    }

    /// Build every extension in order.
    ///
    /// The probe runs once up front; the first failing extension aborts the
    /// run.
    pub fn run(&mut self, extensions: &[ExtensionDescriptor]) -> Result<BuildReport, BuildError> {
        self.run_with(extensions, |_| {})
    }

    /// [`run`](Self::run), reporting progress to `on_event` as it goes.
    ///
    /// When any step fails, every extension that has not finished is marked
    /// `Failed`: the run as a whole has failed.
    pub fn run_with(
        &mut self,
        extensions: &[ExtensionDescriptor],
        mut on_event: impl FnMut(BuildEvent<'_>),
    ) -> Result<BuildReport, BuildError> {
        let toolchain = self.probe(extensions)?;
        on_event(BuildEvent::Probed(toolchain));
        let cmake_version = toolchain.version.as_ref().map(ToString::to_string);

        let mut results = Vec::with_capacity(extensions.len());
        for ext in extensions {
            on_event(BuildEvent::Started(ext));
            match self.build_extension(ext) {
                Ok(result) => {
                    on_event(BuildEvent::Finished(&result));
                    results.push(result);
                }
                Err(e) => {
                    self.fail_unfinished(extensions);
                    return Err(e);
                }
            }
        }

        Ok(BuildReport {
            cmake_version,
            results,
        })
    }

    fn fail_unfinished(&mut self, extensions: &[ExtensionDescriptor]) {
        for ext in extensions {
            if self.stage_of(ext.name()).is_none_or(|stage| !stage.is_terminal()) {
                self.track(ext.name());
                self.set_stage(ext.name(), BuildStage::Failed);
            }
        }
    }

    fn track(&mut self, name: &str) {
        if self.stage_of(name).is_none() {
            self.stages.push((name.to_string(), BuildStage::Unprobed));
        }
    }

    fn set_stage(&mut self, name: &str, stage: BuildStage) {
        if let Some((_, current)) = self.stages.iter_mut().find(|(n, _)| n == name) {
            // nothing leaves Failed
            if *current != BuildStage::Failed {
                *current = stage;
            }
        }
    }
}

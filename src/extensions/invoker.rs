//! Build invocation
//!
//! Runs the two `CMake` steps for one extension:
//! ```bash
//! mkdir -p <working_dir>
//! cd <working_dir>
//! cmake <source_dir> <configure args>
//! cmake --build . <build args>
//! ```

use super::error::BuildError;
use super::runner::{ToolCommand, ToolOutput, ToolRunner};
use super::types::{BuildInvocation, BuildStage};
use crate::env_vars::EnvSnapshot;
use std::path::{Path, PathBuf};

/// Output of a successful configure + build
#[derive(Debug, Clone, Default)]
pub struct InvocationOutput {
    /// Captured configure-step output
    pub configure: String,
    /// Captured build-step output
    pub build: String,
}

impl InvocationOutput {
    /// Both steps' output, configure first
    #[must_use]
    pub fn combined(&self) -> String {
        let mut out = String::with_capacity(self.configure.len() + self.build.len());
        out.push_str(&self.configure);
        out.push_str(&self.build);
        out
    }
}

/// Runs configure and build for extensions through one `CMake` program
#[derive(Debug)]
pub struct BuildInvoker<'a, R: ToolRunner + ?Sized> {
    runner: &'a mut R,
    cmake: PathBuf,
    env: &'a EnvSnapshot,
}

impl<'a, R: ToolRunner + ?Sized> BuildInvoker<'a, R> {
    #[must_use]
    pub fn new(runner: &'a mut R, cmake: impl Into<PathBuf>, env: &'a EnvSnapshot) -> Self {
        Self {
            runner,
            cmake: cmake.into(),
            env,
        }
    }

    /// Configure, then build.
    ///
    /// `on_stage` is told when each step finishes successfully
    /// (`Configured`, then `Built`). Returns on the first failure; nothing
    /// is retried.
    pub fn invoke(
        &mut self,
        extension: &str,
        invocation: &BuildInvocation,
        mut on_stage: impl FnMut(BuildStage),
    ) -> Result<InvocationOutput, BuildError> {
        ensure_working_dir(&invocation.working_dir)?;

        let configure = self.run_step(
            &ToolCommand::new(&self.cmake)
                .args(invocation.configure_command())
                .current_dir(&invocation.working_dir)
                .env(self.env.clone()),
        )?;
        if !configure.success() {
            return Err(BuildError::ConfigureFailed {
                extension: extension.to_string(),
                code: configure.exit_code,
                output: configure.output,
            });
        }
        on_stage(BuildStage::Configured);

        let build = self.run_step(
            &ToolCommand::new(&self.cmake)
                .args(invocation.build_command())
                .current_dir(&invocation.working_dir),
        )?;
        if !build.success() {
            return Err(BuildError::BuildFailed {
                extension: extension.to_string(),
                code: build.exit_code,
                output: build.output,
            });
        }
        on_stage(BuildStage::Built);

        Ok(InvocationOutput {
            configure: configure.output,
            build: build.output,
        })
    }

    fn run_step(&mut self, command: &ToolCommand) -> Result<ToolOutput, BuildError> {
        self.runner.run(command).map_err(|source| BuildError::Spawn {
            program: command.program.clone(),
            source,
        })
    }
}

/// Create the out-of-tree build directory; an existing one is fine.
pub fn ensure_working_dir(dir: &Path) -> Result<(), BuildError> {
    std::fs::create_dir_all(dir).map_err(|source| BuildError::WorkingDir {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::types::BuildConfiguration;
    use std::collections::VecDeque;
    use std::io;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Scripted {
        exits: VecDeque<Option<i32>>,
        seen: Vec<ToolCommand>,
    }

    impl ToolRunner for Scripted {
        fn run(&mut self, command: &ToolCommand) -> io::Result<ToolOutput> {
            self.seen.push(command.clone());
            let exit_code = self.exits.pop_front().unwrap_or(Some(0));
            Ok(ToolOutput {
                exit_code,
                output: format!("ran {}\n", command.args.join(" ")),
            })
        }
    }

    fn invocation(temp: &TempDir) -> BuildInvocation {
        let mut configure = BuildConfiguration::new();
        configure.define("ENABLE_PYTHON", "ON");
        BuildInvocation {
            working_dir: temp.path().join("build").join("pkg.ext"),
            source_dir: PathBuf::from("/proj/native"),
            output_dir: temp.path().join("lib").join("pkg"),
            configure,
            build_args: vec!["--config".to_string(), "Release".to_string()],
        }
    }

    #[test]
    fn runs_configure_then_build_in_working_dir() {
        let temp = TempDir::new().unwrap();
        let inv = invocation(&temp);
        let env = EnvSnapshot::from_pairs([("ENABLE_CUDA", "ON")]);
        let mut runner = Scripted::default();
        let mut stages = Vec::new();

        let out = BuildInvoker::new(&mut runner, "cmake", &env)
            .invoke("pkg/ext", &inv, |s| stages.push(s))
            .unwrap();

        assert!(inv.working_dir.is_dir());
        assert_eq!(stages, vec![BuildStage::Configured, BuildStage::Built]);
        assert_eq!(runner.seen.len(), 2);

        let configure = runner.seen.first().unwrap();
        assert_eq!(configure.args, vec!["/proj/native", "-DENABLE_PYTHON=ON"]);
        assert_eq!(configure.cwd.as_deref(), Some(inv.working_dir.as_path()));
        assert_eq!(configure.env.as_ref(), Some(&env));

        let build = runner.seen.get(1).unwrap();
        assert_eq!(build.args, vec!["--build", ".", "--config", "Release"]);
        assert_eq!(build.cwd.as_deref(), Some(inv.working_dir.as_path()));

        assert!(out.combined().starts_with("ran /proj/native"));
    }

    #[test]
    fn configure_failure_stops_before_build() {
        let temp = TempDir::new().unwrap();
        let env = EnvSnapshot::default();
        let mut runner = Scripted {
            exits: VecDeque::from([Some(1)]),
            ..Scripted::default()
        };
        let mut stages = Vec::new();

        let err = BuildInvoker::new(&mut runner, "cmake", &env)
            .invoke("pkg/ext", &invocation(&temp), |s| stages.push(s))
            .unwrap_err();

        assert!(matches!(err, BuildError::ConfigureFailed { code: Some(1), .. }));
        assert_eq!(runner.seen.len(), 1);
        assert!(stages.is_empty());
    }

    #[test]
    fn build_failure_after_configure() {
        let temp = TempDir::new().unwrap();
        let env = EnvSnapshot::default();
        let mut runner = Scripted {
            exits: VecDeque::from([Some(0), Some(2)]),
            ..Scripted::default()
        };
        let mut stages = Vec::new();

        let err = BuildInvoker::new(&mut runner, "cmake", &env)
            .invoke("pkg/ext", &invocation(&temp), |s| stages.push(s))
            .unwrap_err();

        assert!(matches!(err, BuildError::BuildFailed { code: Some(2), .. }));
        assert_eq!(err.tool_output(), Some("ran --build . --config Release\n"));
        assert_eq!(stages, vec![BuildStage::Configured]);
    }

    #[test]
    fn existing_working_dir_is_fine() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("work");
        ensure_working_dir(&dir).unwrap();
        ensure_working_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn working_dir_blocked_by_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("work");
        std::fs::write(&blocker, "").unwrap();

        let err = ensure_working_dir(&blocker.join("inner")).unwrap_err();
        assert!(matches!(err, BuildError::WorkingDir { .. }));
    }
}

//! Extension build type definitions
//!
//! The plugin is a `CMake` project. An [`ExtensionDescriptor`] names where it
//! lives and where it installs; a [`BuildConfiguration`] is what `CMake` is
//! told at configure time; a [`BuildInvocation`] is both steps together.

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::time::Duration;

/// A native extension to build
///
/// `name` is the installable module path (e.g. `spyker/spyker_plugin`) and
/// `source_dir` is the directory holding `CMakeLists.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionDescriptor {
    name: String,
    source_dir: PathBuf,
}

impl ExtensionDescriptor {
    /// Create a descriptor, making `source_dir` absolute.
    ///
    /// Relative paths resolve against the current directory. `name` must be
    /// one or more `/`-separated components, none of them empty or holding a
    /// `.` or a backslash.
    pub fn new(name: impl Into<String>, source_dir: impl AsRef<Path>) -> io::Result<Self> {
        let name = name.into();
        if let Some(problem) = module_path_problem(&name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid extension name {name:?}: {problem}"),
            ));
        }
        Ok(Self {
            name,
            source_dir: std::path::absolute(source_dir)?,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Last component of the module path (`spyker_plugin`)
    #[must_use]
    pub fn module_stem(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Directory the compiled plugin must land in under `lib_dir`.
    ///
    /// `spyker/spyker_plugin` with `build/lib` gives `build/lib/spyker`.
    #[must_use]
    pub fn module_dir(&self, lib_dir: &Path) -> PathBuf {
        let mut dir = lib_dir.to_path_buf();
        let mut parts: Vec<&str> = self.name.split('/').filter(|p| !p.is_empty()).collect();
        parts.pop();
        for part in parts {
            dir.push(part);
        }
        dir
    }

    /// Per-extension working directory name under the build temp directory
    ///
    /// The dotted module name (`spyker.spyker_plugin`). Components never
    /// contain `.`, so distinct names give distinct directories.
    #[must_use]
    pub fn build_dir_name(&self) -> String {
        self.name.replace('/', ".")
    }
}

fn module_path_problem(name: &str) -> Option<&'static str> {
    if name.split('/').any(str::is_empty) {
        return Some("empty path component");
    }
    if name.contains('.') || name.contains('\\') {
        return Some("components are separated by '/' only");
    }
    None
}

/// `CMake` build type, picked from the caller's debug flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildType {
    Debug,
    Release,
}

impl BuildType {
    #[must_use]
    pub const fn from_debug(debug: bool) -> Self {
        if debug { Self::Debug } else { Self::Release }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }

    /// Upper-case form used in per-configuration variable names
    #[must_use]
    pub const fn upper(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Release => "RELEASE",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a directory the way `CMake` wants it for library output:
/// always terminated by a path separator.
#[must_use]
pub fn with_trailing_separator(dir: &Path) -> String {
    let mut s = dir.to_string_lossy().into_owned();
    if !s.ends_with(MAIN_SEPARATOR) && !s.ends_with('/') {
        s.push(MAIN_SEPARATOR);
    }
    s
}

/// One configure-step argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConfigArg {
    /// `-D<key>=<value>`; `key` may carry a `:TYPE` suffix
    Define { key: String, value: String },
    /// `-G<generator>`
    Generator(String),
    /// `-A <arch>`
    Architecture(String),
    /// Passed through untouched
    Raw(String),
}

impl ConfigArg {
    /// Parse a user-supplied token. `-DKEY=VALUE` and `-G<name>` are keyed,
    /// anything else is raw.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        if let Some(define) = token.strip_prefix("-D")
            && let Some((key, value)) = define.split_once('=')
            && !key.is_empty()
        {
            return Self::Define {
                key: key.to_string(),
                value: value.to_string(),
            };
        }
        if let Some(generator) = token.strip_prefix("-G")
            && !generator.is_empty()
        {
            return Self::Generator(generator.to_string());
        }
        Self::Raw(token.to_string())
    }

    /// Define key without its `:TYPE` annotation
    fn define_name(&self) -> Option<&str> {
        match self {
            Self::Define { key, .. } => key.split(':').next(),
            _ => None,
        }
    }

    fn push_tokens(&self, out: &mut Vec<String>) {
        match self {
            Self::Define { key, value } => out.push(format!("-D{key}={value}")),
            Self::Generator(name) => out.push(format!("-G{name}")),
            Self::Architecture(arch) => {
                out.push("-A".to_string());
                out.push(arch.clone());
            }
            Self::Raw(token) => out.push(token.clone()),
        }
    }
}

/// Ordered arguments for the configure step
///
/// Defines, the generator and the architecture are keyed: setting one that
/// already exists replaces it in place, so the rendered list never carries
/// the same key twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildConfiguration {
    args: Vec<ConfigArg>,
}

impl BuildConfiguration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `-D<key>=<value>`.
    pub fn define(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(ConfigArg::Define {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Select the generator.
    pub fn generator(&mut self, name: impl Into<String>) -> &mut Self {
        self.push(ConfigArg::Generator(name.into()))
    }

    /// Select the target architecture (`-A`).
    pub fn architecture(&mut self, arch: impl Into<String>) -> &mut Self {
        self.push(ConfigArg::Architecture(arch.into()))
    }

    /// Add an argument, replacing an earlier one with the same key.
    pub fn push(&mut self, arg: ConfigArg) -> &mut Self {
        if let Some(existing) = self.args.iter_mut().find(|a| same_key(a, &arg)) {
            *existing = arg;
        } else {
            self.args.push(arg);
        }
        self
    }

    /// Append user tokens verbatim.
    ///
    /// `-G <name>` and `-D <key>=<value>` spelled as two tokens are folded
    /// into one argument, so they replace earlier ones like the joined forms.
    pub fn extend_tokens<I, S>(&mut self, tokens: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tokens = tokens.into_iter();
        while let Some(token) = tokens.next() {
            let token = token.as_ref();
            if token == "-G"
                && let Some(name) = tokens.next()
            {
                self.generator(name.as_ref());
                continue;
            }
            if token == "-D"
                && let Some(define) = tokens.next()
            {
                self.push(ConfigArg::parse(&format!("-D{}", define.as_ref())));
                continue;
            }
            self.push(ConfigArg::parse(token));
        }
        self
    }

    /// Value of a define, if set
    #[must_use]
    pub fn define_value(&self, key: &str) -> Option<&str> {
        self.args.iter().find_map(|arg| match arg {
            ConfigArg::Define { value, .. } if arg.define_name() == Some(key) => {
                Some(value.as_str())
            }
            _ => None,
        })
    }

    #[must_use]
    pub fn generator_name(&self) -> Option<&str> {
        self.args.iter().find_map(|arg| match arg {
            ConfigArg::Generator(name) => Some(name.as_str()),
            _ => None,
        })
    }

    #[must_use]
    pub fn entries(&self) -> &[ConfigArg] {
        &self.args
    }

    /// Render to command-line tokens.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            arg.push_tokens(&mut out);
        }
        out
    }
}

fn same_key(a: &ConfigArg, b: &ConfigArg) -> bool {
    match (a, b) {
        (ConfigArg::Define { .. }, ConfigArg::Define { .. }) => a.define_name() == b.define_name(),
        (ConfigArg::Generator(_), ConfigArg::Generator(_))
        | (ConfigArg::Architecture(_), ConfigArg::Architecture(_)) => true,
        _ => false,
    }
}

/// Everything needed to configure and build one extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInvocation {
    /// Out-of-tree build directory, created if absent
    pub working_dir: PathBuf,
    /// Directory holding `CMakeLists.txt`
    pub source_dir: PathBuf,
    /// Library output directory `CMake` is told to use, after any
    /// `CMAKE_ARGS` override
    pub output_dir: PathBuf,
    /// Configure-step arguments
    pub configure: BuildConfiguration,
    /// `cmake --build .` arguments
    pub build_args: Vec<String>,
}

impl BuildInvocation {
    /// Full configure argument list: source directory first.
    #[must_use]
    pub fn configure_command(&self) -> Vec<String> {
        let mut args = vec![self.source_dir.to_string_lossy().into_owned()];
        args.extend(self.configure.to_args());
        args
    }

    /// Full build argument list: `--build .` first.
    #[must_use]
    pub fn build_command(&self) -> Vec<String> {
        let mut args = vec!["--build".to_string(), ".".to_string()];
        args.extend(self.build_args.iter().cloned());
        args
    }
}

/// Where an extension is in the build
///
/// `Unprobed -> Probed -> Configured -> Built -> Finalized`. Any failure
/// moves to `Failed` and nothing leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildStage {
    Unprobed,
    Probed,
    Configured,
    Built,
    Finalized,
    Failed,
}

impl BuildStage {
    /// The stage a successful step leads to.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Unprobed => Self::Probed,
            Self::Probed => Self::Configured,
            Self::Configured => Self::Built,
            Self::Built | Self::Finalized => Self::Finalized,
            Self::Failed => Self::Failed,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized | Self::Failed)
    }
}

/// Result of building one extension
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    /// Extension name
    pub extension: String,

    /// Stage reached (always `Finalized` for results handed back)
    pub stage: BuildStage,

    /// Wall time for configure, build and cleanup
    pub duration: Duration,

    /// Directory the plugin was placed in
    pub output_dir: PathBuf,

    /// Compiled plugin, if one was found in `output_dir`
    pub artifact: Option<PathBuf>,

    /// By-products removed during cleanup
    pub removed: Vec<PathBuf>,

    /// Captured configure + build output
    pub output: String,
}

/// Outcome of a whole orchestration run
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// `CMake` version reported by the probe, when it could be parsed
    pub cmake_version: Option<String>,

    /// One entry per extension, in build order
    pub results: Vec<BuildResult>,
}

impl BuildReport {
    /// Total build time across all extensions
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> ExtensionDescriptor {
        ExtensionDescriptor::new(name, "/proj/native").unwrap()
    }

    #[test]
    fn relative_source_dir_becomes_absolute() {
        let ext = ExtensionDescriptor::new("pkg/ext", "native").unwrap();
        assert!(ext.source_dir().is_absolute());
        assert!(ext.source_dir().ends_with("native"));
    }

    #[test]
    fn module_dir_drops_last_component() {
        let ext = descriptor("spyker/spyker_plugin");
        assert_eq!(
            ext.module_dir(Path::new("build/lib")),
            PathBuf::from("build/lib/spyker")
        );
        assert_eq!(ext.module_stem(), "spyker_plugin");
    }

    #[test]
    fn top_level_module_dir_is_lib_dir() {
        let ext = descriptor("plugin");
        assert_eq!(ext.module_dir(Path::new("out")), PathBuf::from("out"));
        assert_eq!(ext.module_stem(), "plugin");
    }

    #[test]
    fn build_dir_name_is_dotted() {
        assert_eq!(descriptor("a/b/c").build_dir_name(), "a.b.c");
        assert_ne!(
            descriptor("a/b_c").build_dir_name(),
            descriptor("a_b/c").build_dir_name()
        );
    }

    #[test]
    fn malformed_names_rejected() {
        for name in ["", "pkg/ext/", "/pkg/ext", "pkg//ext", "pkg/ext.so", "pkg\\ext"] {
            let err = ExtensionDescriptor::new(name, "/proj/native").unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "{name:?}");
        }
    }

    #[test]
    fn build_type_from_debug_flag() {
        assert_eq!(BuildType::from_debug(true), BuildType::Debug);
        assert_eq!(BuildType::from_debug(false), BuildType::Release);
        assert_eq!(BuildType::Release.upper(), "RELEASE");
        assert_eq!(BuildType::Debug.to_string(), "Debug");
    }

    #[test]
    fn trailing_separator_added_once() {
        let once = with_trailing_separator(Path::new("build/lib/spyker"));
        assert!(once.ends_with(MAIN_SEPARATOR));
        assert_eq!(with_trailing_separator(Path::new(&once)), once);
    }

    #[test]
    fn parse_tokens() {
        assert_eq!(
            ConfigArg::parse("-DFOO:BOOL=ON"),
            ConfigArg::Define {
                key: "FOO:BOOL".to_string(),
                value: "ON".to_string()
            }
        );
        assert_eq!(
            ConfigArg::parse("-GNinja"),
            ConfigArg::Generator("Ninja".to_string())
        );
        assert_eq!(ConfigArg::parse("-D"), ConfigArg::Raw("-D".to_string()));
        assert_eq!(ConfigArg::parse("-DNOVALUE"), ConfigArg::Raw("-DNOVALUE".to_string()));
        assert_eq!(ConfigArg::parse("--foo"), ConfigArg::Raw("--foo".to_string()));
    }

    #[test]
    fn define_replaces_in_place() {
        let mut config = BuildConfiguration::new();
        config.define("A", "1").define("B", "2").define("A", "3");

        assert_eq!(config.to_args(), vec!["-DA=3", "-DB=2"]);
        assert_eq!(config.define_value("A"), Some("3"));
    }

    #[test]
    fn typed_define_replaces_untyped() {
        let mut config = BuildConfiguration::new();
        config.define("ENABLE_CUDA", "ON");
        config.extend_tokens(["-DENABLE_CUDA:BOOL=OFF"]);

        assert_eq!(config.to_args(), vec!["-DENABLE_CUDA:BOOL=OFF"]);
        assert_eq!(config.define_value("ENABLE_CUDA"), Some("OFF"));
    }

    #[test]
    fn split_define_tokens_fold() {
        let mut config = BuildConfiguration::new();
        config.define("ENABLE_CUDA", "ON");
        config.extend_tokens(["-D", "ENABLE_CUDA=OFF", "-D", "FOO=1"]);

        assert_eq!(config.to_args(), vec!["-DENABLE_CUDA=OFF", "-DFOO=1"]);
    }

    #[test]
    fn split_generator_tokens_fold() {
        let mut config = BuildConfiguration::new();
        config.generator("Ninja");
        config.extend_tokens(["-G", "Unix Makefiles", "--trace"]);

        assert_eq!(config.to_args(), vec!["-GUnix Makefiles", "--trace"]);
        assert_eq!(config.generator_name(), Some("Unix Makefiles"));
    }

    #[test]
    fn raw_tokens_may_repeat() {
        let mut config = BuildConfiguration::new();
        config.extend_tokens(["--warn-uninitialized", "--warn-uninitialized"]);
        assert_eq!(config.entries().len(), 2);
    }

    #[test]
    fn architecture_renders_two_tokens() {
        let mut config = BuildConfiguration::new();
        config.architecture("Win32").architecture("x64");
        assert_eq!(config.to_args(), vec!["-A", "x64"]);
    }

    #[test]
    fn invocation_commands() {
        let mut configure = BuildConfiguration::new();
        configure.define("X", "1");
        let invocation = BuildInvocation {
            working_dir: PathBuf::from("/tmp/build"),
            source_dir: PathBuf::from("/proj/native"),
            output_dir: PathBuf::from("/tmp/lib/pkg"),
            configure,
            build_args: vec!["--config".to_string(), "Release".to_string()],
        };

        assert_eq!(invocation.configure_command(), vec!["/proj/native", "-DX=1"]);
        assert_eq!(
            invocation.build_command(),
            vec!["--build", ".", "--config", "Release"]
        );
    }

    #[test]
    fn stage_progression() {
        let mut stage = BuildStage::Unprobed;
        let mut seen = vec![stage];
        while !stage.is_terminal() {
            stage = stage.next();
            seen.push(stage);
        }

        assert_eq!(
            seen,
            vec![
                BuildStage::Unprobed,
                BuildStage::Probed,
                BuildStage::Configured,
                BuildStage::Built,
                BuildStage::Finalized
            ]
        );
        assert_eq!(BuildStage::Failed.next(), BuildStage::Failed);
    }
}

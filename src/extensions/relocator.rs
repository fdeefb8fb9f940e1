//! Artifact relocation and cleanup
//!
//! `CMake` already writes the plugin into the library output directory it was
//! given. What is left after a build is making sure that directory exists,
//! dropping static-library by-products some backends leave next to the
//! plugin, and finding the plugin file for the report.

use super::error::BuildError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// By-product left in the output directory when the DNNL backend is built
/// from source
pub const DEFAULT_BYPRODUCTS: &[&str] = &["libmkldnn.a"];

/// Extensions a compiled Python plugin can have
const PLUGIN_EXTENSIONS: &[&str] = &["so", "pyd", "dylib", "dll"];

/// What finalization did to one output directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relocation {
    /// By-products that existed and were removed
    pub removed: Vec<PathBuf>,
    /// Plugin file found in the output directory
    pub artifact: Option<PathBuf>,
}

/// Cleans up the library output directory after a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRelocator {
    byproducts: Vec<String>,
}

impl Default for ArtifactRelocator {
    fn default() -> Self {
        Self::new(DEFAULT_BYPRODUCTS.iter().copied())
    }
}

impl ArtifactRelocator {
    /// Relocator removing the given file names. An empty list turns cleanup
    /// off.
    #[must_use]
    pub fn new<I, S>(byproducts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            byproducts: byproducts.into_iter().map(Into::into).collect(),
        }
    }

    /// Finalize `output_dir` for the module `stem`.
    ///
    /// Missing by-products are skipped. A missing plugin is reported as
    /// `artifact: None`, not as an error: the build said it succeeded, and
    /// the name `CMake` gives it depends on the project.
    pub fn finalize(&self, output_dir: &Path, stem: &str) -> Result<Relocation, BuildError> {
        fs::create_dir_all(output_dir).map_err(|source| BuildError::WorkingDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let mut removed = Vec::new();
        for name in &self.byproducts {
            let path = output_dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => {
                    crate::debug!("removed by-product {}", path.display());
                    removed.push(path);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(BuildError::Cleanup { path, source }),
            }
        }

        let artifact = find_artifact(output_dir, stem);
        if artifact.is_none() {
            crate::debug!(
                "no {stem} plugin found in {} after build",
                output_dir.display()
            );
        }

        Ok(Relocation { removed, artifact })
    }
}

/// Find the compiled plugin for `stem` in `dir`.
///
/// Matches `<stem>.<ext>`, `<stem>.<abi tag>.<ext>` and the `lib` prefixed
/// forms, for shared-library extensions only. The first match in name order
/// wins.
#[must_use]
pub fn find_artifact(dir: &Path, stem: &str) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_plugin_file(path, stem))
        .collect();

    candidates.sort();
    candidates.into_iter().next()
}

fn is_plugin_file(path: &Path, stem: &str) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let has_plugin_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PLUGIN_EXTENSIONS.contains(&e));

    let matches_stem = |candidate: &str| {
        candidate
            .strip_prefix(stem)
            .is_some_and(|rest| rest.starts_with('.'))
    };
    has_plugin_ext && (matches_stem(name) || name.strip_prefix("lib").is_some_and(matches_stem))
}

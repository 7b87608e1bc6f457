//! Filesystem helpers shared by the build stages.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::builder::BuildError;

/// Case-insensitive extension check.
pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| ext.eq_ignore_ascii_case(x)))
}

/// Collect files under `root` accepted by `filter`, sorted by path.
///
/// A missing `root` yields no files. `max_depth` of 1 lists direct children only.
pub(crate) fn collect_files(
    root: &Path,
    max_depth: Option<usize>,
    skip: Option<&Path>,
    filter: impl Fn(&Path) -> bool,
) -> Vec<PathBuf> {
    if !root.exists() {
        tracing::debug!("Skipping missing directory {}", root.display());
        return Vec::new();
    }

    let mut walker = WalkDir::new(root).follow_links(true);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|e| skip.is_none_or(|s| !e.path().starts_with(s)))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| filter(p))
        .collect();

    files.sort();
    files
}

/// Path of `path` relative to `base`, or `path` itself if it is not below `base`.
pub(crate) fn relative(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base).unwrap_or(path).to_path_buf()
}

/// Template name for a source-relative path (always `/`-separated).
pub(crate) fn template_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Write a whole output file, creating parent directories.
pub(crate) fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::write(path, e))?;
    }
    fs::write(path, contents).map_err(|e| BuildError::write(path, e))
}

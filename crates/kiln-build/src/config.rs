//! Build configuration and source/output layout.

use std::env;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use kiln_lint::{LintConfig, Linter};

use crate::builder::BuildError;
use crate::files::has_extension;

/// Raster formats picked up by the image converter.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Configuration for building a site.
///
/// Directory and file fields other than `source_dir` and `output_dir` are
/// relative to the source root; outputs mirror them under `output_dir`.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source tree root
    pub source_dir: PathBuf,

    /// Output root
    pub output_dir: PathBuf,

    /// Content record (JSON)
    pub data_file: PathBuf,

    /// Root page template
    pub index_file: PathBuf,

    /// Sub-page templates
    pub pages_dir: PathBuf,

    /// Sass sources
    pub styles_dir: PathBuf,

    /// JavaScript sources
    pub scripts_dir: PathBuf,

    /// Raster images
    pub images_dir: PathBuf,

    /// Fail on undefined template variables
    pub strict_templates: bool,

    /// Browserslist queries used for vendor prefixing
    pub browser_targets: Vec<String>,

    /// Add vendor prefixes for `browser_targets`
    pub autoprefix: bool,

    /// Minify CSS output
    pub minify_css: bool,

    /// Mangle local names in scripts
    pub mangle_js: bool,

    /// AVIF quality (1-100)
    pub image_quality: u8,

    /// AVIF encoder speed (1-10)
    pub image_speed: u8,

    /// HTML lint settings
    pub lint: LintConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("."),
            data_file: PathBuf::from("data.json"),
            index_file: PathBuf::from("index.html"),
            pages_dir: PathBuf::from("pages"),
            styles_dir: PathBuf::from("styles"),
            scripts_dir: PathBuf::from("scripts"),
            images_dir: PathBuf::from("img"),
            strict_templates: true,
            browser_targets: vec!["defaults".to_string()],
            autoprefix: true,
            minify_css: true,
            mangle_js: true,
            image_quality: 50,
            image_speed: 6,
            lint: LintConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Reject layouts that would write outputs over their own sources.
    pub fn validate(&self) -> Result<(), BuildError> {
        if resolve(&self.source_dir) == resolve(&self.output_dir) {
            return Err(BuildError::ConfigError(format!(
                "output directory must differ from source directory ({})",
                self.source_dir.display()
            )));
        }
        if !(1..=100).contains(&self.image_quality) {
            return Err(BuildError::ConfigError(format!(
                "image quality must be within 1-100, got {}",
                self.image_quality
            )));
        }
        if !(1..=10).contains(&self.image_speed) {
            return Err(BuildError::ConfigError(format!(
                "image speed must be within 1-10, got {}",
                self.image_speed
            )));
        }
        Linter::new(self.lint.clone())?;
        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        self.source_dir.join(&self.data_file)
    }

    pub fn index_source(&self) -> PathBuf {
        self.source_dir.join(&self.index_file)
    }

    pub fn index_output(&self) -> PathBuf {
        self.output_dir.join(&self.index_file)
    }

    pub fn pages_source(&self) -> PathBuf {
        self.source_dir.join(&self.pages_dir)
    }

    pub fn pages_output(&self) -> PathBuf {
        self.output_dir.join(&self.pages_dir)
    }

    pub fn styles_source(&self) -> PathBuf {
        self.source_dir.join(&self.styles_dir)
    }

    pub fn styles_output(&self) -> PathBuf {
        self.output_dir.join(&self.styles_dir)
    }

    pub fn scripts_source(&self) -> PathBuf {
        self.source_dir.join(&self.scripts_dir)
    }

    pub fn scripts_output(&self) -> PathBuf {
        self.output_dir.join(&self.scripts_dir)
    }

    pub fn images_source(&self) -> PathBuf {
        self.source_dir.join(&self.images_dir)
    }

    pub fn images_output(&self) -> PathBuf {
        self.output_dir.join(&self.images_dir)
    }

    /// The output directory, when it is nested inside the source tree.
    ///
    /// Such a subtree must never be read back as source. The returned path
    /// is spelled under `source_dir`, however `output_dir` was written.
    pub fn nested_output(&self) -> Option<PathBuf> {
        let source = resolve(&self.source_dir);
        let output = resolve(&self.output_dir);
        let inner = output.strip_prefix(&source).ok()?;

        (!inner.as_os_str().is_empty()).then(|| self.source_dir.join(inner))
    }

    /// Whether a source-relative path is handled by a dedicated stage
    /// rather than the asset copier.
    pub fn is_claimed(&self, relative: &Path) -> bool {
        relative == self.data_file
            || has_extension(relative, &["html"])
            || relative.starts_with(&self.styles_dir)
            || relative.starts_with(&self.scripts_dir)
            || (relative.starts_with(&self.images_dir) && has_extension(relative, IMAGE_EXTENSIONS))
    }
}

/// Absolute form of `path` with `.` and `..` resolved and symlinks in its
/// existing ancestors followed. The path itself need not exist.
fn resolve(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normal = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normal.pop();
            }
            other => normal.push(other),
        }
    }

    let mut existing = normal.as_path();
    let mut missing: Vec<OsString> = Vec::new();
    loop {
        if let Ok(mut canonical) = existing.canonicalize() {
            canonical.extend(missing.iter().rev());
            return canonical;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_mirrors_source_into_output() {
        let config = BuildConfig::default();

        assert_eq!(config.data_path(), PathBuf::from("src/data.json"));
        assert_eq!(config.index_output(), PathBuf::from("./index.html"));
        assert_eq!(config.pages_output(), PathBuf::from("./pages"));
        assert_eq!(config.images_output(), PathBuf::from("./img"));
        assert!(config.nested_output().is_none());
    }

    #[test]
    fn claims_files_owned_by_other_stages() {
        let config = BuildConfig::default();

        assert!(config.is_claimed(Path::new("data.json")));
        assert!(config.is_claimed(Path::new("index.html")));
        assert!(config.is_claimed(Path::new("layouts/base.html")));
        assert!(config.is_claimed(Path::new("styles/_vars.scss")));
        assert!(config.is_claimed(Path::new("styles/notes.txt")));
        assert!(config.is_claimed(Path::new("scripts/app.js")));
        assert!(config.is_claimed(Path::new("img/photo.JPG")));

        assert!(!config.is_claimed(Path::new("img/logo.svg")));
        assert!(!config.is_claimed(Path::new("fonts/inter.woff2")));
        assert!(!config.is_claimed(Path::new("favicon.ico")));
    }

    #[test]
    fn detects_nested_output() {
        let config = BuildConfig {
            source_dir: PathBuf::from("site"),
            output_dir: PathBuf::from("site/dist"),
            ..Default::default()
        };

        assert_eq!(config.nested_output(), Some(PathBuf::from("site/dist")));
    }

    #[test]
    fn detects_nested_output_spelled_differently() {
        let dotted = BuildConfig {
            source_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("./src/dist"),
            ..Default::default()
        };
        assert_eq!(dotted.nested_output(), Some(PathBuf::from("src/dist")));

        let absolute = BuildConfig {
            source_dir: PathBuf::from("src"),
            output_dir: env::current_dir().unwrap().join("src/dist"),
            ..Default::default()
        };
        assert_eq!(absolute.nested_output(), Some(PathBuf::from("src/dist")));

        let sibling = BuildConfig {
            source_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("src/../public"),
            ..Default::default()
        };
        assert!(sibling.nested_output().is_none());
    }

    #[test]
    fn rejects_output_equal_to_source_in_another_spelling() {
        let config = BuildConfig {
            output_dir: PathBuf::from("./src/"),
            ..Default::default()
        };

        assert!(matches!(config.validate(), Err(BuildError::ConfigError(_))));
    }

    #[test]
    fn rejects_unknown_disabled_lint_rule() {
        let config = BuildConfig {
            lint: LintConfig {
                disabled: vec!["no-such-rule".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(matches!(config.validate(), Err(BuildError::Lint(_))));
    }

    #[test]
    fn rejects_output_equal_to_source() {
        let config = BuildConfig {
            output_dir: PathBuf::from("src"),
            ..Default::default()
        };

        assert!(matches!(config.validate(), Err(BuildError::ConfigError(_))));
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let config = BuildConfig {
            image_quality: 0,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }
}

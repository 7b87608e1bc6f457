//! `kiln.toml` loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kiln_build::BuildConfig;
use kiln_lint::LintConfig;
use serde::Deserialize;

/// Configuration file structure (kiln.toml).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    paths: PathsConfig,
    #[serde(default)]
    templates: TemplatesConfig,
    #[serde(default)]
    styles: StylesConfig,
    #[serde(default)]
    scripts: ScriptsConfig,
    #[serde(default)]
    images: ImagesConfig,
    #[serde(default)]
    lint: LintConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PathsConfig {
    source: PathBuf,
    output: PathBuf,
    data: PathBuf,
    index: PathBuf,
    pages: PathBuf,
    styles: PathBuf,
    scripts: PathBuf,
    images: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let defaults = BuildConfig::default();
        Self {
            source: defaults.source_dir,
            output: defaults.output_dir,
            data: defaults.data_file,
            index: defaults.index_file,
            pages: defaults.pages_dir,
            styles: defaults.styles_dir,
            scripts: defaults.scripts_dir,
            images: defaults.images_dir,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TemplatesConfig {
    #[serde(default = "default_true")]
    strict: bool,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self { strict: true }
    }
}

#[derive(Debug, Deserialize)]
struct StylesConfig {
    #[serde(default = "default_targets")]
    targets: Vec<String>,
    #[serde(default = "default_true")]
    prefix: bool,
    #[serde(default = "default_true")]
    minify: bool,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            prefix: true,
            minify: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScriptsConfig {
    #[serde(default = "default_true")]
    mangle: bool,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self { mangle: true }
    }
}

#[derive(Debug, Deserialize)]
struct ImagesConfig {
    #[serde(default = "default_quality")]
    quality: u8,
    #[serde(default = "default_speed")]
    speed: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            speed: default_speed(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_targets() -> Vec<String> {
    vec!["defaults".to_string()]
}
fn default_quality() -> u8 {
    50
}
fn default_speed() -> u8 {
    6
}

impl ConfigFile {
    pub fn into_build_config(self) -> BuildConfig {
        BuildConfig {
            source_dir: self.paths.source,
            output_dir: self.paths.output,
            data_file: self.paths.data,
            index_file: self.paths.index,
            pages_dir: self.paths.pages,
            styles_dir: self.paths.styles,
            scripts_dir: self.paths.scripts,
            images_dir: self.paths.images,
            strict_templates: self.templates.strict,
            browser_targets: self.styles.targets,
            autoprefix: self.styles.prefix,
            minify_css: self.styles.minify,
            mangle_js: self.scripts.mangle,
            image_quality: self.images.quality,
            image_speed: self.images.speed,
            lint: self.lint,
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        tracing::debug!("No {} found, using defaults", path.display());
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load `path` and turn it into a build configuration.
pub fn build_config(path: &Path) -> Result<BuildConfig> {
    Ok(load_config(path)?.into_build_config())
}

//! Sass compilation, vendor prefixing and CSS minification.

use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::builder::BuildError;

/// Sass → CSS → prefixed, minified CSS.
#[derive(Debug, Clone)]
pub struct StyleCompiler {
    browsers: Option<Browsers>,
    minify: bool,
}

impl StyleCompiler {
    /// Create a compiler for the given browserslist queries.
    ///
    /// With `autoprefix` off no prefixes are added regardless of `targets`.
    pub fn new(targets: &[String], autoprefix: bool, minify: bool) -> Result<Self, BuildError> {
        let browsers = if autoprefix {
            Browsers::from_browserslist(targets.iter().map(String::as_str)).map_err(|e| {
                BuildError::ConfigError(format!("invalid browser targets {:?}: {}", targets, e))
            })?
        } else {
            None
        };

        Ok(Self { browsers, minify })
    }

    fn targets(&self) -> Targets {
        Targets {
            browsers: self.browsers,
            ..Targets::default()
        }
    }

    /// Compile one Sass entry file.
    pub fn compile_file(&self, path: &Path) -> Result<String, BuildError> {
        let options = match path.parent() {
            Some(dir) => grass::Options::default().load_path(dir),
            None => grass::Options::default(),
        };

        let css = grass::from_path(path, &options).map_err(|e| BuildError::StyleError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        self.process_css(&css, &path.display().to_string())
    }

    /// Prefix and minify plain CSS.
    pub fn process_css(&self, css: &str, filename: &str) -> Result<String, BuildError> {
        let style_error = |message: String| BuildError::StyleError {
            path: filename.to_string(),
            message,
        };

        let mut stylesheet = StyleSheet::parse(
            css,
            ParserOptions {
                filename: filename.to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| style_error(format!("CSS parse error: {}", e)))?;

        stylesheet
            .minify(MinifyOptions {
                targets: self.targets(),
                ..MinifyOptions::default()
            })
            .map_err(|e| style_error(format!("CSS minify error: {}", e)))?;

        let output = stylesheet
            .to_css(PrinterOptions {
                minify: self.minify,
                targets: self.targets(),
                ..PrinterOptions::default()
            })
            .map_err(|e| style_error(format!("CSS print error: {}", e)))?;

        Ok(output.code)
    }
}

/// Sass partials are only compiled through the files that import them.
pub(crate) fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

//! Copies source files no other stage handles.

use std::fs;
use std::path::{Path, PathBuf};

use crate::builder::BuildError;
use crate::config::BuildConfig;
use crate::files::{collect_files, relative};

/// Byte-identical copier for unclaimed source files.
pub struct AssetCopier<'a> {
    config: &'a BuildConfig,
}

impl<'a> AssetCopier<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self { config }
    }

    /// Source files the copier is responsible for.
    pub fn discover(&self) -> Vec<PathBuf> {
        let source = &self.config.source_dir;
        let skip = self.config.nested_output();
        collect_files(source, None, skip.as_deref(), |path| {
            !self.config.is_claimed(&relative(path, source))
        })
    }

    /// Output path for a source file.
    pub fn output_path(&self, source_file: &Path) -> PathBuf {
        self.config
            .output_dir
            .join(relative(source_file, &self.config.source_dir))
    }

    /// Copy one file to its mirrored output path.
    pub fn copy(&self, source_file: &Path) -> Result<(), BuildError> {
        let target = self.output_path(source_file);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::write(&target, e))?;
        }
        fs::copy(source_file, &target).map_err(|e| BuildError::write(&target, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn skips_claimed_files() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        for (name, body) in [
            ("data.json", "{}"),
            ("index.html", "<p></p>"),
            ("styles/main.scss", ""),
            ("scripts/app.js", ""),
            ("img/photo.png", ""),
            ("img/logo.svg", "<svg/>"),
            ("fonts/a.woff2", "font"),
            ("robots.txt", "User-agent: *"),
        ] {
            let path = src.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }

        let config = BuildConfig {
            source_dir: src.clone(),
            output_dir: temp.path().join("out"),
            ..Default::default()
        };
        let copier = AssetCopier::new(&config);

        let found: Vec<PathBuf> = copier
            .discover()
            .iter()
            .map(|p| relative(p, &src))
            .collect();

        assert_eq!(
            found,
            vec![
                PathBuf::from("fonts/a.woff2"),
                PathBuf::from("img/logo.svg"),
                PathBuf::from("robots.txt"),
            ]
        );
    }

    #[test]
    fn copies_bytes_unchanged() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("fonts")).unwrap();
        let bytes: Vec<u8> = (0..=255).collect();
        fs::write(src.join("fonts/a.woff2"), &bytes).unwrap();

        let config = BuildConfig {
            source_dir: src.clone(),
            output_dir: temp.path().join("out"),
            ..Default::default()
        };
        let copier = AssetCopier::new(&config);
        copier.copy(&src.join("fonts/a.woff2")).unwrap();

        assert_eq!(fs::read(temp.path().join("out/fonts/a.woff2")).unwrap(), bytes);
    }

    #[test]
    fn ignores_output_nested_in_source() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("site");
        fs::create_dir_all(src.join("dist")).unwrap();
        fs::write(src.join("dist/old.txt"), "built").unwrap();
        fs::write(src.join("keep.txt"), "source").unwrap();

        let config = BuildConfig {
            source_dir: src.clone(),
            output_dir: src.join("dist"),
            ..Default::default()
        };

        let found = AssetCopier::new(&config).discover();
        assert_eq!(found, vec![src.join("keep.txt")]);
    }

    #[test]
    fn ignores_nested_output_spelled_through_parent() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("site");
        fs::create_dir_all(src.join("dist")).unwrap();
        fs::write(src.join("dist/old.txt"), "built").unwrap();
        fs::write(src.join("keep.txt"), "source").unwrap();

        let config = BuildConfig {
            source_dir: src.clone(),
            output_dir: src.join("..").join("site").join("./dist"),
            ..Default::default()
        };

        let found = AssetCopier::new(&config).discover();
        assert_eq!(found, vec![src.join("keep.txt")]);
    }
}

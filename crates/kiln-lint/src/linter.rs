//! Lint driver: runs the rule set over files and directories.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::rules::{Checker, Issue, LintConfig, Rule};
use crate::scanner::mask;

/// Errors that can occur while linting.
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    #[error("Unknown lint rule: {0}")]
    UnknownRule(String),

    #[error("Failed to read {path}: {message}")]
    ReadError { path: String, message: String },
}

/// Issues found in one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Linted file
    pub path: PathBuf,

    /// Issues in source order
    pub issues: Vec<Issue>,

    /// Set when the file could not be read; it was not checked
    pub error: Option<String>,
}

impl FileReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.error.is_none()
    }
}

/// Result of a lint pass over many files.
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    /// One entry per linted file, in path order
    pub files: Vec<FileReport>,
}

impl LintReport {
    /// True when no file has an issue.
    pub fn is_clean(&self) -> bool {
        self.files.iter().all(FileReport::is_clean)
    }

    /// Total issues across all files.
    pub fn issue_count(&self) -> usize {
        self.files.iter().map(|f| f.issues.len()).sum()
    }

    /// Files that could not be read.
    pub fn unreadable_count(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
    }

    /// Files with at least one issue or a read error.
    pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.is_clean())
    }
}

/// HTML template linter.
#[derive(Debug, Clone)]
pub struct Linter {
    config: LintConfig,
    enabled: HashSet<Rule>,
}

impl Linter {
    /// Create a linter, rejecting unknown rule names in `disabled`.
    pub fn new(config: LintConfig) -> Result<Self, LintError> {
        let mut enabled: HashSet<Rule> = Rule::ALL.iter().copied().collect();
        for id in &config.disabled {
            let rule = Rule::from_id(id).ok_or_else(|| LintError::UnknownRule(id.clone()))?;
            enabled.remove(&rule);
        }

        Ok(Self { config, enabled })
    }

    /// Lint HTML source text.
    pub fn lint_source(&self, source: &str) -> Vec<Issue> {
        let masked = mask(source);
        Checker::new(&self.config, self.enabled.clone()).check(source, &masked)
    }

    /// Lint a single file.
    pub fn lint_file(&self, path: &Path) -> Result<FileReport, LintError> {
        let source = fs::read_to_string(path).map_err(|e| LintError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(FileReport {
            path: path.to_path_buf(),
            issues: self.lint_source(&source),
            error: None,
        })
    }

    /// Lint every `.html` file under `root`.
    ///
    /// Every file is checked even after failures. A file that cannot be read
    /// is recorded with its error and counts as failed. `skip` excludes a
    /// subtree (used when the output directory lives inside the source tree).
    pub fn lint_dir(&self, root: &Path, skip: Option<&Path>) -> LintReport {
        let mut paths: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| skip.is_none_or(|s| !e.path().starts_with(s)))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("html"))
            })
            .collect();
        paths.sort();

        let files = paths
            .iter()
            .map(|p| {
                self.lint_file(p).unwrap_or_else(|e| FileReport {
                    path: p.clone(),
                    issues: Vec::new(),
                    error: Some(e.to_string()),
                })
            })
            .collect();

        LintReport { files }
    }
}

impl Default for Linter {
    fn default() -> Self {
        Self {
            config: LintConfig::default(),
            enabled: Rule::ALL.iter().copied().collect(),
        }
    }
}

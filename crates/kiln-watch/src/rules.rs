//! Watch rules: which source paths re-run which build tasks.

use std::path::Path;

use glob::{MatchOptions, Pattern};
use kiln_build::{BuildConfig, Task};

use crate::WatchError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A binding from source path patterns to an ordered task list.
#[derive(Debug, Clone)]
pub struct WatchRule {
    name: String,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    tasks: Vec<Task>,
}

impl WatchRule {
    /// Build a rule from glob patterns relative to the source root.
    pub fn new(
        name: impl Into<String>,
        include: &[String],
        exclude: &[String],
        tasks: Vec<Task>,
    ) -> Result<Self, WatchError> {
        Ok(Self {
            name: name.into(),
            include: compile(include)?,
            exclude: compile(exclude)?,
            tasks,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Whether a source-relative path triggers this rule.
    pub fn matches(&self, relative: &Path) -> bool {
        let hit = |p: &Pattern| p.matches_path_with(relative, MATCH_OPTIONS);
        self.include.iter().any(hit) && !self.exclude.iter().any(hit)
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, WatchError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| WatchError::InvalidPattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}

/// Literal glob prefix for a configured source-relative path.
fn literal(path: &Path) -> String {
    Pattern::escape(&path.to_string_lossy().replace('\\', "/"))
}

/// The rule set for a site layout.
pub fn default_rules(config: &BuildConfig) -> Result<Vec<WatchRule>, WatchError> {
    let index = literal(&config.index_file);
    let pages = literal(&config.pages_dir);
    let data = literal(&config.data_file);
    let styles = literal(&config.styles_dir);
    let scripts = literal(&config.scripts_dir);
    let images = literal(&config.images_dir);

    let renders = vec![Task::RenderIndex, Task::RenderPages];

    Ok(vec![
        WatchRule::new("index", &[index.clone()], &[], vec![Task::RenderIndex])?,
        WatchRule::new(
            "pages",
            &[format!("{pages}/**/*.html")],
            &[],
            vec![Task::RenderPages],
        )?,
        WatchRule::new("data", &[data], &[], renders.clone())?,
        WatchRule::new(
            "templates",
            &["**/*.html".to_string()],
            &[index, format!("{pages}/**")],
            renders,
        )?,
        WatchRule::new(
            "styles",
            &[format!("{styles}/**/*.scss")],
            &[],
            vec![Task::Styles],
        )?,
        WatchRule::new(
            "scripts",
            &[format!("{scripts}/*.js")],
            &[],
            vec![Task::Scripts],
        )?,
        WatchRule::new("images", &[format!("{images}/**")], &[], vec![Task::Images])?,
        WatchRule::new("assets", &["**/*".to_string()], &[], vec![Task::CopyAssets])?,
    ])
}

/// Names of the rules a source-relative path triggers.
pub fn triggered<'a>(rules: &'a [WatchRule], relative: &Path) -> Vec<&'a str> {
    rules
        .iter()
        .filter(|r| r.matches(relative))
        .map(WatchRule::name)
        .collect()
}

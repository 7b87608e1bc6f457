//! Site builder: runs the build stages individually or as a full pass.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use kiln_lint::{LintError, Linter};

use crate::assets::AssetCopier;
use crate::config::{BuildConfig, IMAGE_EXTENSIONS};
use crate::data::load_content;
use crate::files::{collect_files, has_extension, relative, template_name, write_file};
use crate::images::ImageConverter;
use crate::lint::print_report;
use crate::scripts::ScriptMinifier;
use crate::styles::{is_partial, StyleCompiler};
use crate::templates::PageRenderer;

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to read {path}: {message}")]
    ReadError { path: String, message: String },

    #[error("Invalid content data in {path}: {message}")]
    DataError { path: String, message: String },

    #[error("Failed to render {path}: {message}")]
    TemplateError { path: String, message: String },

    #[error("Failed to compile {path}: {message}")]
    StyleError { path: String, message: String },

    #[error("Failed to minify {path}: {message}")]
    ScriptError { path: String, message: String },

    #[error("Failed to convert {path}: {message}")]
    ImageError { path: String, message: String },

    #[error("Failed to write {path}: {message}")]
    WriteError { path: String, message: String },

    #[error(transparent)]
    Lint(#[from] LintError),
}

impl BuildError {
    pub(crate) fn read(path: &Path, err: io::Error) -> Self {
        BuildError::ReadError {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn write(path: &Path, err: io::Error) -> Self {
        BuildError::WriteError {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// One build stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    RenderIndex,
    RenderPages,
    Styles,
    Scripts,
    Lint,
    Images,
    CopyAssets,
}

impl Task {
    /// Every stage, in full-pass order.
    pub const FULL_PASS: &'static [Task] = &[
        Task::RenderIndex,
        Task::RenderPages,
        Task::Styles,
        Task::Scripts,
        Task::Lint,
        Task::Images,
        Task::CopyAssets,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Task::RenderIndex => "render-index",
            Task::RenderPages => "render-pages",
            Task::Styles => "styles",
            Task::Scripts => "scripts",
            Task::Lint => "lint",
            Task::Images => "images",
            Task::CopyAssets => "copy-assets",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one task invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    /// Task that ran
    pub task: Task,

    /// Files handled successfully
    pub processed: usize,

    /// Files that failed (errors were logged)
    pub failed: usize,

    /// Lint issues found (lint task only)
    pub issues: usize,
}

impl TaskReport {
    fn new(task: Task) -> Self {
        Self {
            task,
            processed: 0,
            failed: 0,
            issues: 0,
        }
    }

    /// No failed files and no lint issues.
    pub fn is_ok(&self) -> bool {
        self.failed == 0 && self.issues == 0
    }
}

/// Outcome of a full pass.
#[derive(Debug)]
pub struct BuildSummary {
    /// Reports of the tasks that completed
    pub reports: Vec<TaskReport>,

    /// Tasks that aborted, with their error
    pub errors: Vec<(Task, BuildError)>,

    /// Total build time in milliseconds
    pub duration_ms: u64,
}

impl BuildSummary {
    /// The lint task found issues or could not read a template.
    pub fn lint_failed(&self) -> bool {
        self.reports
            .iter()
            .any(|r| r.task == Task::Lint && !r.is_ok())
    }

    /// Every task completed and the lint pass was clean.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && !self.lint_failed()
    }

    /// Files processed across all tasks.
    pub fn processed(&self) -> usize {
        self.reports.iter().map(|r| r.processed).sum()
    }

    /// Files that failed across all tasks.
    pub fn failed(&self) -> usize {
        self.reports.iter().map(|r| r.failed).sum()
    }
}

/// Static site builder.
#[derive(Debug, Clone)]
pub struct StaticBuilder {
    config: BuildConfig,
}

impl StaticBuilder {
    /// Create a builder after validating the configuration.
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Run every task once, in order.
    ///
    /// A task that aborts is logged and recorded; the remaining tasks still run.
    pub fn build(&self) -> BuildSummary {
        let start = Instant::now();
        let mut reports = Vec::new();
        let mut errors = Vec::new();

        for &task in Task::FULL_PASS {
            match self.run(task) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::error!("[{}] {}", task, e);
                    errors.push((task, e));
                }
            }
        }

        BuildSummary {
            reports,
            errors,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Run a single task.
    pub fn run(&self, task: Task) -> Result<TaskReport, BuildError> {
        let start = Instant::now();
        tracing::debug!("Starting {}", task);

        let report = match task {
            Task::RenderIndex => self.render_index(),
            Task::RenderPages => self.render_pages(),
            Task::Styles => self.compile_styles(),
            Task::Scripts => self.minify_scripts(),
            Task::Lint => self.lint(),
            Task::Images => self.convert_images(),
            Task::CopyAssets => self.copy_assets(),
        }?;

        tracing::info!(
            "Finished {} ({} files, {} failed) in {}ms",
            task,
            report.processed,
            report.failed,
            start.elapsed().as_millis()
        );

        Ok(report)
    }

    /// Render the root page into the output root.
    pub fn render_index(&self) -> Result<TaskReport, BuildError> {
        let source = self.config.index_source();
        if !source.is_file() {
            return Err(BuildError::ReadError {
                path: source.display().to_string(),
                message: "root page template not found".to_string(),
            });
        }

        let files = vec![source];
        self.render(Task::RenderIndex, &files, |_| self.config.index_output())
    }

    /// Render every sub-page into the output pages directory.
    pub fn render_pages(&self) -> Result<TaskReport, BuildError> {
        let pages_source = self.config.pages_source();
        let pages_output = self.config.pages_output();
        let skip = self.config.nested_output();
        let files = collect_files(&pages_source, None, skip.as_deref(), |p| {
            has_extension(p, &["html"])
        });

        self.render(Task::RenderPages, &files, |file| {
            pages_output.join(relative(file, &pages_source))
        })
    }

    /// Load the content record once, then render each template.
    ///
    /// A content error aborts before anything is written; a template error
    /// only fails its own file.
    fn render(
        &self,
        task: Task,
        files: &[PathBuf],
        output_for: impl Fn(&Path) -> PathBuf + Sync,
    ) -> Result<TaskReport, BuildError> {
        let content = load_content(&self.config.data_path())?;
        let renderer = PageRenderer::new(&self.config.source_dir, self.config.strict_templates);

        Ok(self.process_each(task, files, true, |file| {
            let name = template_name(&relative(file, &self.config.source_dir));
            let html = renderer
                .render(&name, &content)
                .map_err(|e| BuildError::TemplateError {
                    path: file.display().to_string(),
                    message: e.to_string(),
                })?;
            write_file(&output_for(file), html)
        }))
    }

    /// Compile every Sass entry file.
    pub fn compile_styles(&self) -> Result<TaskReport, BuildError> {
        let styles_source = self.config.styles_source();
        let styles_output = self.config.styles_output();
        let compiler = StyleCompiler::new(
            &self.config.browser_targets,
            self.config.autoprefix,
            self.config.minify_css,
        )?;
        let skip = self.config.nested_output();

        let files = collect_files(&styles_source, None, skip.as_deref(), |p| {
            has_extension(p, &["scss"]) && !is_partial(p)
        });

        Ok(self.process_each(Task::Styles, &files, false, |file| {
            let css = compiler.compile_file(file)?;
            let target = styles_output
                .join(relative(file, &styles_source))
                .with_extension("css");
            write_file(&target, css)
        }))
    }

    /// Minify the scripts directly inside the scripts directory.
    pub fn minify_scripts(&self) -> Result<TaskReport, BuildError> {
        let scripts_source = self.config.scripts_source();
        let scripts_output = self.config.scripts_output();
        let minifier = ScriptMinifier::new(self.config.mangle_js);

        let files = collect_files(&scripts_source, Some(1), None, |p| has_extension(p, &["js"]));

        Ok(self.process_each(Task::Scripts, &files, false, |file| {
            let source = std::fs::read_to_string(file).map_err(|e| BuildError::read(file, e))?;
            let code = minifier
                .minify(&source)
                .map_err(|message| BuildError::ScriptError {
                    path: file.display().to_string(),
                    message,
                })?;
            write_file(&scripts_output.join(relative(file, &scripts_source)), code)
        }))
    }

    /// Lint every HTML template; issues are printed, never fatal.
    pub fn lint(&self) -> Result<TaskReport, BuildError> {
        let linter = Linter::new(self.config.lint.clone())?;
        let skip = self.config.nested_output();
        let report = linter.lint_dir(&self.config.source_dir, skip.as_deref());

        print_report(&report);

        Ok(TaskReport {
            task: Task::Lint,
            processed: report.files.len(),
            failed: report.failed_files().count(),
            issues: report.issue_count(),
        })
    }

    /// Convert every JPEG/PNG under the images directory to AVIF.
    pub fn convert_images(&self) -> Result<TaskReport, BuildError> {
        let images_source = self.config.images_source();
        let images_output = self.config.images_output();
        let converter = ImageConverter::new(self.config.image_quality, self.config.image_speed);
        let skip = self.config.nested_output();

        let files = collect_files(&images_source, None, skip.as_deref(), |p| {
            has_extension(p, IMAGE_EXTENSIONS)
        });

        Ok(self.process_each(Task::Images, &files, true, |file| {
            let target = images_output
                .join(relative(file, &images_source))
                .with_extension("avif");
            converter.convert(file, &target)
        }))
    }

    /// Copy every file no other stage claims.
    pub fn copy_assets(&self) -> Result<TaskReport, BuildError> {
        let copier = AssetCopier::new(&self.config);
        let files = copier.discover();

        Ok(self.process_each(Task::CopyAssets, &files, false, |file| copier.copy(file)))
    }

    /// Apply `f` to each file, logging and counting failures.
    fn process_each<F>(&self, task: Task, files: &[PathBuf], parallel: bool, f: F) -> TaskReport
    where
        F: Fn(&Path) -> Result<(), BuildError> + Sync,
    {
        let handle = |file: &PathBuf| match f(file) {
            Ok(()) => {
                tracing::debug!("[{}] {}", task, file.display());
                true
            }
            Err(e) => {
                tracing::error!("[{}] {}", task, e);
                false
            }
        };

        let results: Vec<bool> = if parallel {
            files.par_iter().map(handle).collect()
        } else {
            files.iter().map(handle).collect()
        };

        let mut report = TaskReport::new(task);
        for ok in results {
            if ok {
                report.processed += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site() -> (TempDir, StaticBuilder) {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");

        write(&src, "data.json", r#"{"site": {"title": "Kiln"}, "pages": ["a", "b"]}"#);
        write(
            &src,
            "layouts/base.html",
            concat!(
                "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n",
                "<title>{{ site.title }}</title>\n</head>\n<body>\n",
                "{% block body %}{% endblock %}\n</body>\n</html>\n",
            ),
        );
        write(
            &src,
            "index.html",
            concat!(
                "{% extends \"layouts/base.html\" %}{% block body %}",
                "<ul>{% for p in pages %}<li>{{ p }}</li>{% endfor %}</ul>{% endblock %}\n",
            ),
        );
        write(
            &src,
            "pages/blog/post.html",
            "{% extends \"layouts/base.html\" %}{% block body %}<h1>Post</h1>{% endblock %}\n",
        );
        write(&src, "styles/_vars.scss", "$gap: 4px;\n");
        write(&src, "styles/main.scss", "@use 'vars';\n.nav { margin: vars.$gap; }\n");
        write(
            &src,
            "scripts/menu.js",
            "const zone = document.querySelector('.zone');\nconsole.log(zone);\n",
        );
        write(&src, "fonts/a.woff2", "font-bytes");

        let config = BuildConfig {
            source_dir: src,
            output_dir: temp.path().join("out"),
            ..Default::default()
        };

        (temp, StaticBuilder::new(config).unwrap())
    }

    #[test]
    fn full_pass_writes_every_output() {
        let (temp, builder) = site();
        let out = temp.path().join("out");

        let summary = builder.build();

        assert!(summary.errors.is_empty(), "{:?}", summary.errors);
        assert!(summary.is_success());
        assert!(out.join("index.html").exists());
        assert!(out.join("pages/blog/post.html").exists());
        assert!(out.join("styles/main.css").exists());
        assert!(!out.join("styles/_vars.css").exists());
        assert!(out.join("scripts/menu.js").exists());
        assert_eq!(fs::read(out.join("fonts/a.woff2")).unwrap(), b"font-bytes");
        assert!(!out.join("data.json").exists());
        assert!(!out.join("layouts").exists());

        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.contains("<title>Kiln</title>"));
        assert!(index.contains("<li>a</li><li>b</li>"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let (temp, builder) = site();
        let out = temp.path().join("out");

        builder.run(Task::RenderIndex).unwrap();
        builder.run(Task::RenderPages).unwrap();
        let first_index = fs::read(out.join("index.html")).unwrap();
        let first_page = fs::read(out.join("pages/blog/post.html")).unwrap();

        builder.run(Task::RenderIndex).unwrap();
        builder.run(Task::RenderPages).unwrap();

        assert_eq!(fs::read(out.join("index.html")).unwrap(), first_index);
        assert_eq!(fs::read(out.join("pages/blog/post.html")).unwrap(), first_page);
    }

    #[test]
    fn invalid_data_aborts_render_without_output() {
        let (temp, builder) = site();
        write(&builder.config().source_dir, "data.json", "{ not json");

        let index = builder.run(Task::RenderIndex);
        let pages = builder.run(Task::RenderPages);

        assert!(matches!(index, Err(BuildError::DataError { .. })));
        assert!(matches!(pages, Err(BuildError::DataError { .. })));
        assert!(!temp.path().join("out/index.html").exists());
        assert!(!temp.path().join("out/pages").exists());
    }

    #[test]
    fn template_error_fails_only_that_page() {
        let (temp, builder) = site();
        write(&builder.config().source_dir, "pages/broken.html", "{{ nope }}");

        let report = builder.run(Task::RenderPages).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert!(temp.path().join("out/pages/blog/post.html").exists());
        assert!(!temp.path().join("out/pages/broken.html").exists());
    }

    #[test]
    fn lint_issue_marks_pass_failed_but_build_continues() {
        let (temp, builder) = site();
        write(&builder.config().source_dir, "pages/photo.html", "<img src=\"a.png\">\n");

        let summary = builder.build();

        let lint = summary
            .reports
            .iter()
            .find(|r| r.task == Task::Lint)
            .unwrap();
        assert_eq!(lint.issues, 1);
        assert_eq!(lint.failed, 1);
        assert!(summary.lint_failed());
        assert!(!summary.is_success());
        assert!(temp.path().join("out/fonts/a.woff2").exists());
    }

    #[test]
    fn unreadable_template_fails_lint_without_aborting() {
        let (temp, builder) = site();
        let legacy = builder.config().source_dir.join("layouts/legacy.html");
        fs::write(legacy, b"<p>caf\xe9</p>\n").unwrap();

        let summary = builder.build();

        let lint = summary
            .reports
            .iter()
            .find(|r| r.task == Task::Lint)
            .unwrap();
        assert_eq!(lint.processed, 4);
        assert_eq!(lint.failed, 1);
        assert_eq!(lint.issues, 0);
        assert!(summary.errors.is_empty(), "{:?}", summary.errors);
        assert!(summary.lint_failed());
        assert!(temp.path().join("out/index.html").exists());
    }

    #[test]
    fn converts_exactly_the_raster_images() {
        let (temp, builder) = site();
        let img = builder.config().images_source();
        fs::create_dir_all(img.join("nested")).unwrap();
        RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])).save(img.join("a.jpg")).unwrap();
        RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])).save(img.join("b.jpeg")).unwrap();
        RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])).save(img.join("nested/c.png")).unwrap();
        fs::write(img.join("logo.svg"), "<svg/>").unwrap();

        let report = builder.run(Task::Images).unwrap();
        assert_eq!(report.processed, 3);

        let out = temp.path().join("out/img");
        let mut produced: Vec<PathBuf> = collect_files(&out, None, None, |_| true)
            .iter()
            .map(|p| relative(p, &out))
            .collect();
        produced.sort();

        assert_eq!(
            produced,
            vec![
                PathBuf::from("a.avif"),
                PathBuf::from("b.avif"),
                PathBuf::from("nested/c.avif"),
            ]
        );
    }

    #[test]
    fn style_error_is_isolated() {
        let (temp, builder) = site();
        write(&builder.config().source_dir, "styles/broken.scss", ".a { color: $nope; }");

        let report = builder.run(Task::Styles).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert!(temp.path().join("out/styles/main.css").exists());
    }

    #[test]
    fn nested_scripts_are_not_minified() {
        let (temp, builder) = site();
        write(&builder.config().source_dir, "scripts/vendor/lib.js", "var x = 1;");

        let report = builder.run(Task::Scripts).unwrap();

        assert_eq!(report.processed, 1);
        assert!(!temp.path().join("out/scripts/vendor/lib.js").exists());
    }

    #[test]
    fn missing_root_page_is_an_error() {
        let (_temp, builder) = site();
        fs::remove_file(builder.config().index_source()).unwrap();

        assert!(matches!(
            builder.run(Task::RenderIndex),
            Err(BuildError::ReadError { .. })
        ));
    }
}

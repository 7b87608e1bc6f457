//! Build pipeline for kiln static sites.
//!
//! Renders HTML templates against a JSON content record, compiles Sass,
//! minifies scripts, converts raster images to AVIF, lints templates and
//! copies every remaining source file into the output tree.

pub mod assets;
pub mod builder;
pub mod config;
pub mod data;
mod files;
pub mod images;
pub mod lint;
pub mod scripts;
pub mod styles;
pub mod templates;

pub use builder::{BuildError, BuildSummary, StaticBuilder, Task, TaskReport};
pub use config::BuildConfig;

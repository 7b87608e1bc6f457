//! Watches a kiln source tree and re-runs the matching build tasks.

pub mod dispatch;
pub mod rules;
pub mod watcher;

use std::path::PathBuf;

pub use dispatch::{watch, Dispatch, Dispatcher, TaskRunner};
pub use rules::{default_rules, triggered, WatchRule};
pub use watcher::{FileWatcher, WatchEvent};

/// Errors that can occur while setting up a watch.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Cannot watch source directory {}: {source}", path.display())]
    SourceDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid watch pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),
}

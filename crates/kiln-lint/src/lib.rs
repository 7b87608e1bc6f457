//! HTML template linter for kiln sites.
//!
//! Checks HTML templates against a fixed set of style rules. Template syntax,
//! comments and raw-text element bodies are masked before scanning so that
//! reported line and column numbers always point into the unmasked source.

pub mod linter;
pub mod rules;
pub mod scanner;

pub use linter::{FileReport, LintError, LintReport, Linter};
pub use rules::{Issue, LintConfig, Rule};
pub use scanner::{mask, scan_tags, Attr, Quote, Tag};

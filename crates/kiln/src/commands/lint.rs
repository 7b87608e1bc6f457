//! Lint-only command.

use anyhow::Result;
use kiln_build::{BuildConfig, StaticBuilder, Task};

/// Lint every template. Returns whether every template was read and clean.
pub async fn run(config: BuildConfig) -> Result<bool> {
    let builder = StaticBuilder::new(config)?;
    let report = builder.run(Task::Lint)?;
    Ok(report.is_ok())
}

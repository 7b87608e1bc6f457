//! One-shot build command.

use std::sync::Arc;

use anyhow::Result;
use kiln_build::{BuildConfig, BuildSummary, StaticBuilder};

/// Run the build command. Returns whether the pass succeeded.
pub async fn run(config: BuildConfig) -> Result<bool> {
    let builder = Arc::new(StaticBuilder::new(config)?);
    let summary = full_pass(&builder).await?;
    Ok(summary.is_success())
}

/// Run every task once on a blocking worker and log the outcome.
pub async fn full_pass(builder: &Arc<StaticBuilder>) -> Result<BuildSummary> {
    tracing::info!(
        "Building {} -> {}",
        builder.config().source_dir.display(),
        builder.config().output_dir.display()
    );

    let worker = builder.clone();
    let summary = tokio::task::spawn_blocking(move || worker.build()).await?;

    if summary.is_success() {
        tracing::info!(
            "Built {} files in {}ms",
            summary.processed(),
            summary.duration_ms
        );
    } else {
        tracing::error!(
            "Build finished with {} failed files, {} failed tasks{} in {}ms",
            summary.failed(),
            summary.errors.len(),
            if summary.lint_failed() { " and lint issues" } else { "" },
            summary.duration_ms
        );
    }

    Ok(summary)
}

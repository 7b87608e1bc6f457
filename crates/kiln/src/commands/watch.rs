//! Default command: full build, then watch.

use std::sync::Arc;

use anyhow::Result;
use kiln_build::{BuildConfig, StaticBuilder};

use super::build::full_pass;

/// Run the watch command until Ctrl-C.
///
/// Returns false when the initial pass reported lint issues.
pub async fn run(config: BuildConfig) -> Result<bool> {
    let builder = Arc::new(StaticBuilder::new(config)?);
    let summary = full_pass(&builder).await?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    kiln_watch::watch(builder.config(), builder.clone(), shutdown).await?;

    Ok(!summary.lint_failed())
}

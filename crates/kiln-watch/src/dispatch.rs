//! Routes source changes to per-rule task runners.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_build::{BuildConfig, BuildError, StaticBuilder, Task, TaskReport};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::rules::{default_rules, WatchRule};
use crate::watcher::FileWatcher;
use crate::WatchError;

/// Runs one build task to completion on the calling thread.
pub trait TaskRunner: Send + Sync + 'static {
    fn run_task(&self, task: Task) -> Result<TaskReport, BuildError>;
}

impl TaskRunner for StaticBuilder {
    fn run_task(&self, task: Task) -> Result<TaskReport, BuildError> {
        self.run(task)
    }
}

/// What happened to a change offered to one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The rule will run (now or after its current run)
    Queued,

    /// A re-run was already queued; this change is folded into it
    Coalesced,
}

struct RuleHandle {
    rule: Arc<WatchRule>,
    tx: mpsc::Sender<()>,
}

/// One serialized runner per watch rule.
///
/// Each rule owns a single-slot queue: a change arriving while the rule is
/// idle starts it, changes arriving while it runs collapse into at most one
/// follow-up run. Rules never wait on each other.
pub struct Dispatcher {
    handles: Vec<RuleHandle>,
}

impl Dispatcher {
    /// Spawn the rule runners on the current tokio runtime.
    pub fn spawn<R: TaskRunner>(rules: Vec<WatchRule>, runner: Arc<R>) -> Self {
        let handles = rules
            .into_iter()
            .map(|rule| {
                let rule = Arc::new(rule);
                let (tx, rx) = mpsc::channel(1);
                tokio::spawn(run_rule(rule.clone(), runner.clone(), rx));
                RuleHandle { rule, tx }
            })
            .collect();

        Self { handles }
    }

    /// Offer a source-relative path to every rule.
    ///
    /// Returns the rules it matched with the outcome for each.
    pub fn dispatch(&self, relative: &Path) -> Vec<(&str, Dispatch)> {
        let mut outcomes = Vec::new();

        for handle in &self.handles {
            if !handle.rule.matches(relative) {
                continue;
            }

            let outcome = match handle.tx.try_send(()) {
                Ok(()) => Dispatch::Queued,
                Err(TrySendError::Full(())) => Dispatch::Coalesced,
                Err(TrySendError::Closed(())) => {
                    tracing::warn!("Rule {} is no longer running", handle.rule.name());
                    continue;
                }
            };

            tracing::debug!(
                "{} -> {} ({:?})",
                relative.display(),
                handle.rule.name(),
                outcome
            );
            outcomes.push((handle.rule.name(), outcome));
        }

        outcomes
    }
}

async fn run_rule<R: TaskRunner>(rule: Arc<WatchRule>, runner: Arc<R>, mut rx: mpsc::Receiver<()>) {
    while rx.recv().await.is_some() {
        tracing::info!("[watch] {} changed, running {:?}", rule.name(), rule.tasks());

        let tasks = rule.tasks().to_vec();
        let runner = runner.clone();
        let result = tokio::task::spawn_blocking(move || {
            for task in tasks {
                runner.run_task(task)?;
            }
            Ok::<(), BuildError>(())
        })
        .await;

        match result {
            Ok(Ok(())) => tracing::debug!("[watch] {} idle", rule.name()),
            Ok(Err(e)) => tracing::error!("[watch] {} failed: {}", rule.name(), e),
            Err(e) => tracing::error!("[watch] {} panicked: {}", rule.name(), e),
        }
    }
}

/// Watch the source tree and re-run matching tasks until `shutdown` resolves.
pub async fn watch<R, F>(
    config: &BuildConfig,
    runner: Arc<R>,
    shutdown: F,
) -> Result<(), WatchError>
where
    R: TaskRunner,
    F: Future<Output = ()>,
{
    let root = config
        .source_dir
        .canonicalize()
        .map_err(|source| WatchError::SourceDir {
            path: config.source_dir.clone(),
            source,
        })?;

    // Output written inside the source tree must not retrigger the build.
    let ignored: Option<PathBuf> = config.nested_output().and_then(|out| {
        out.strip_prefix(&config.source_dir)
            .ok()
            .map(|rel| root.join(rel))
    });

    let dispatcher = Dispatcher::spawn(default_rules(config)?, runner);
    let (watcher, mut events) = FileWatcher::new(&root)?;

    tracing::info!("Watching {} for changes", config.source_dir.display());

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                let path = event.path();

                if ignored.as_deref().is_some_and(|dir| path.starts_with(dir)) {
                    continue;
                }
                if let Ok(relative) = path.strip_prefix(&root) {
                    dispatcher.dispatch(relative);
                }
            }
        }
    }

    drop(watcher);
    tracing::info!("Stopped watching");
    Ok(())
}

//! Stage tagging and the fail-fast join used between pipeline phases.
//!
//! Every concurrent branch of the pipeline is a [`StageTask`]: a future plus
//! the [`Stage`] kind and target it belongs to. [`join_stages`] drives them
//! together on the current task and returns on the first failure, dropping
//! whatever siblings are still in flight.

use std::fmt;
use std::future::Future;

use futures::future::{LocalBoxFuture, try_join_all};
use tracing::debug;

use crate::Result;

/// Kind of work a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Link,
    Bundle,
    Minify,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Link => "link",
            Stage::Bundle => "bundle",
            Stage::Minify => "minify",
            Stage::Write => "write",
        })
    }
}

/// A unit of concurrent pipeline work.
pub struct StageTask<'a, T> {
    stage: Stage,
    target: String,
    future: LocalBoxFuture<'a, Result<T>>,
}

impl<'a, T> StageTask<'a, T> {
    pub fn new<F>(stage: Stage, target: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = Result<T>> + 'a,
    {
        Self {
            stage,
            target: target.into(),
            future: Box::pin(future),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl<T> fmt::Debug for StageTask<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageTask")
            .field("stage", &self.stage)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Run tasks concurrently; results come back in task order.
///
/// The first error is tagged with its task's stage and target and returned
/// immediately. Outstanding tasks are dropped, not awaited.
pub async fn join_stages<T>(tasks: Vec<StageTask<'_, T>>) -> Result<Vec<T>> {
    let branches = tasks.into_iter().map(|task| {
        let StageTask {
            stage,
            target,
            future,
        } = task;
        async move {
            debug!(%stage, %target, "stage started");
            let value = future.await.map_err(|err| err.in_stage(stage, target.as_str()))?;
            debug!(%stage, %target, "stage finished");
            Ok(value)
        }
    });

    try_join_all(branches).await
}

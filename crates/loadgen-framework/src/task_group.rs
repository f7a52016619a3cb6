//! Join barrier for a fixed set of child tasks.

use loadgen_core::LoadError;
use std::future::Future;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Spawns child tasks, waits for all of them, and keeps the first real error.
///
/// The group owns a cancellation token. When any child fails, the token is cancelled so the
/// remaining children can stop early; the group still waits for every child to finish before
/// returning, so no child outlives the join. Errors caused by that cancellation
/// ([`LoadError::Cancelled`]) never hide the failure that triggered it.
pub struct TaskGroup<T> {
    label: String,
    cancel: CancellationToken,
    tasks: JoinSet<Result<T, LoadError>>,
}

impl<T: Send + 'static> TaskGroup<T> {
    pub fn new(label: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            label: label.into(),
            cancel,
            tasks: JoinSet::new(),
        }
    }

    /// Token children should watch. Cancelled on the first child failure.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<T, LoadError>> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every child. Results are in completion order.
    pub async fn join(mut self) -> Result<Vec<T>, LoadError> {
        let mut results = Vec::with_capacity(self.tasks.len());
        let mut first_error: Option<LoadError> = None;

        while let Some(joined) = self.tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_err) if join_err.is_panic() => {
                    Err(LoadError::TaskPanicked(join_err.to_string()))
                }
                Err(_) => Err(LoadError::Cancelled),
            };

            match outcome {
                Ok(value) => results.push(value),
                Err(err) => {
                    if !self.cancel.is_cancelled() {
                        if !err.is_cancelled() {
                            error!("{} failed: {}", self.label, err);
                        }
                        self.cancel.cancel();
                    }
                    let replace = match &first_error {
                        None => true,
                        Some(existing) => existing.is_cancelled() && !err.is_cancelled(),
                    };
                    if replace {
                        first_error = Some(err);
                    }
                }
            }
        }

        match first_error {
            Some(err) => {
                debug!("{} stopped: {}", self.label, err);
                Err(err)
            }
            None => Ok(results),
        }
    }
}

//! Execution policies: where a resolved invocation actually runs.
//!
//! The dispatcher hands the executor a fully-resolved closure and returns.
//! Inline execution reports handler failures straight back to the caller;
//! pooled execution reports them through the failure sink, so nothing is
//! ever dropped silently. Panics are caught in both modes.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, error};

use crate::definition::{ExecutionPolicy, Handler, Invocation};
use crate::dispatch::Failure;

/// Receives failures that cannot be returned to the dispatch caller
/// (pooled handler errors and panics).
pub type FailureSink = Arc<dyn Fn(Failure) + Send + Sync>;

/// What `dispatch` did with the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// The handler ran inline and finished.
    Completed,
    /// The invocation was submitted to the worker pool.
    Submitted,
}

#[derive(Clone)]
pub struct Executor {
    pool: Option<tokio::runtime::Handle>,
    sink: FailureSink,
}

impl Executor {
    /// Runs every command inline, regardless of policy.
    pub fn inline() -> Self {
        Self {
            pool: None,
            sink: default_sink(),
        }
    }

    /// Runs `Pooled` commands on the given runtime's blocking pool.
    pub fn pooled(handle: tokio::runtime::Handle) -> Self {
        Self {
            pool: Some(handle),
            sink: default_sink(),
        }
    }

    /// Replaces the failure sink, typically the platform's localized
    /// message layer.
    pub fn on_failure(mut self, sink: impl Fn(Failure) + Send + Sync + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub(crate) fn execute<S: Send + 'static>(
        &self,
        policy: ExecutionPolicy,
        command: String,
        handler: Handler<S>,
        invocation: Invocation<S>,
    ) -> Result<Dispatched, Failure> {
        match (policy, &self.pool) {
            (ExecutionPolicy::Pooled, Some(handle)) => {
                let sink = self.sink.clone();
                debug!(%command, "submitting invocation to worker pool");
                handle.spawn_blocking(move || {
                    if let Err(failure) = run_caught(&command, &handler, invocation) {
                        sink(failure);
                    }
                });
                Ok(Dispatched::Submitted)
            }
            // No pool configured: the policy degrades to inline.
            _ => {
                run_caught(&command, &handler, invocation)?;
                Ok(Dispatched::Completed)
            }
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("pooled", &self.pool.is_some())
            .finish_non_exhaustive()
    }
}

fn default_sink() -> FailureSink {
    Arc::new(|failure| error!(%failure, "command execution failed"))
}

fn run_caught<S>(
    command: &str,
    handler: &Handler<S>,
    invocation: Invocation<S>,
) -> Result<(), Failure> {
    match catch_unwind(AssertUnwindSafe(|| handler(invocation))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(Failure::Execution {
            command: command.to_string(),
            source,
        }),
        Err(panic) => Err(Failure::Execution {
            command: command.to_string(),
            source: anyhow::anyhow!("handler panicked: {}", panic_message(&*panic)),
        }),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

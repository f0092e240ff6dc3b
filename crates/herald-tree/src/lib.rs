//! Command tree and dispatcher for herald.
//!
//! Registration consumes data-only [`CommandDefinition`]s and builds an
//! immutable [`CommandTree`] once; the [`Dispatcher`] then walks it per
//! request to find the most specific handler, resolves arguments through
//! `herald-args`, and runs the handler under the command's execution
//! policy. Failures are structured values, never panics across the
//! dispatch boundary.

pub mod definition;
pub mod dispatch;
pub mod exec;
pub mod node;

pub use definition::{CommandDefinition, ExecutionPolicy, Handler, Invocation};
pub use dispatch::{Dispatcher, Failure};
pub use exec::{Dispatched, Executor, FailureSink};
pub use node::{CommandNode, CommandTree};

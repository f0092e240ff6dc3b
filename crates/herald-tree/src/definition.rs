//! Data-only command definitions.
//!
//! The registration layer (annotations, config files, builder code,
//! whatever the platform uses) produces these; the engine consumes them.
//! Nothing here is reflective: a definition is plain data plus closures.

use std::fmt;
use std::sync::Arc;

use herald_args::{ArgValue, ArgumentSpec, ResolvedArgs, SingleSpec};

/// A fully resolved command call, handed to the handler.
pub struct Invocation<S> {
    /// The opaque caller context, threaded through unchanged.
    pub sender: S,
    /// Names of the nodes walked to reach the handler.
    pub path: Vec<String>,
    /// Values consumed by argument-branch nodes along the path, in order.
    pub branch_values: Vec<ArgValue>,
    /// The resolved argument lookup.
    pub args: ResolvedArgs,
}

impl<S> fmt::Debug for Invocation<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("path", &self.path)
            .field("branch_values", &self.branch_values.len())
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// A command handler body. Errors are wrapped into the execution failure
/// channel with their cause chain intact.
pub type Handler<S> = Arc<dyn Fn(Invocation<S>) -> anyhow::Result<()> + Send + Sync>;

/// Where the handler body runs, chosen per command at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionPolicy {
    /// On the dispatching thread.
    #[default]
    Inline,
    /// Submitted to the worker pool; dispatch returns immediately.
    Pooled,
}

/// Declarative input to [`CommandTree::build`](crate::CommandTree::build).
///
/// Built with chained setters:
///
/// ```rust,ignore
/// CommandDefinition::new("warp")
///     .describe("Teleport to a warp point")
///     .child(
///         CommandDefinition::new("list")
///             .handler(|invocation| { /* ... */ Ok(()) }),
///     )
///     .child(
///         CommandDefinition::new("point")
///             .branch(SingleSpec::string("point"))
///             .child(/* ... */),
///     )
/// ```
pub struct CommandDefinition<S> {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: String,
    pub(crate) args: Vec<ArgumentSpec<S>>,
    pub(crate) children: Vec<CommandDefinition<S>>,
    pub(crate) is_default: bool,
    pub(crate) branch_value: Option<SingleSpec<S>>,
    pub(crate) policy: ExecutionPolicy,
    pub(crate) handler: Option<Handler<S>>,
}

impl<S> CommandDefinition<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: String::new(),
            args: Vec::new(),
            children: Vec::new(),
            is_default: false,
            branch_value: None,
            policy: ExecutionPolicy::Inline,
            handler: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append one declared argument. Order is significant.
    pub fn arg(mut self, spec: impl Into<ArgumentSpec<S>>) -> Self {
        self.args.push(spec.into());
        self
    }

    pub fn child(mut self, child: CommandDefinition<S>) -> Self {
        self.children.push(child);
        self
    }

    /// Mark this definition as its parent's default leaf: it runs when no
    /// child name matches (or no token is left).
    pub fn default_leaf(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Turn this definition into an argument-branch child: instead of
    /// matching its name, it consumes one token as the given argument's
    /// value and dispatch continues below it.
    pub fn branch(mut self, value: SingleSpec<S>) -> Self {
        self.branch_value = Some(value);
        self
    }

    pub fn policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn handler(
        mut self,
        handler: impl Fn(Invocation<S>) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }
}

impl<S> fmt::Debug for CommandDefinition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("args", &self.args.len())
            .field("children", &self.children.len())
            .field("default", &self.is_default)
            .field("branch", &self.branch_value.is_some())
            .finish_non_exhaustive()
    }
}

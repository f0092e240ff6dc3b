//! The dispatcher: walks the tree to the most specific handler and runs it.
//!
//! Dispatch is a small state machine over a token deque. Unmatched tokens
//! fall through to argument-branch children and default leaves before
//! becoming `UnknownCommand`. All runtime failures are structured values;
//! nothing throws across this boundary.

use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use herald_args::{ArgInput, ArgValue, ArgumentSpec, ResolveFailure, ValueTag, resolve_arguments};

use crate::definition::Invocation;
use crate::exec::{Dispatched, Executor};
use crate::node::{CommandNode, CommandTree};

/// The typed failure handed to the platform's message layer.
#[derive(Debug)]
pub enum Failure {
    UnknownCommand {
        token: String,
    },
    TooManyArguments {
        command: String,
    },
    NotEnoughArguments {
        command: String,
    },
    InvalidArgument {
        command: String,
        name: String,
        typed: String,
        expected: ValueTag,
    },
    MissingRequiredFlag {
        command: String,
        key: String,
    },
    MissingFlagArgument {
        command: String,
        key: String,
    },
    /// A handler body failed or panicked; the original cause is retained.
    Execution {
        command: String,
        source: anyhow::Error,
    },
}

impl Failure {
    fn from_resolve(command: &str, failure: ResolveFailure) -> Self {
        let command = command.to_string();
        match failure {
            ResolveFailure::Invalid {
                name,
                typed,
                expected,
            } => Failure::InvalidArgument {
                command,
                name,
                typed,
                expected,
            },
            // A required argument with no token is an arity problem from
            // the caller's point of view.
            ResolveFailure::Missing { .. } => Failure::NotEnoughArguments { command },
            ResolveFailure::MissingRequiredFlag { key } => {
                Failure::MissingRequiredFlag { command, key }
            }
            ResolveFailure::MissingFlagArgument { key } => {
                Failure::MissingFlagArgument { command, key }
            }
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand { token } if token.is_empty() => {
                write!(f, "unknown command")
            }
            Self::UnknownCommand { token } => write!(f, "unknown command: '{token}'"),
            Self::TooManyArguments { command } => {
                write!(f, "too many arguments for '{command}'")
            }
            Self::NotEnoughArguments { command } => {
                write!(f, "not enough arguments for '{command}'")
            }
            Self::InvalidArgument {
                command,
                name,
                typed,
                expected,
            } => write!(
                f,
                "invalid value '{typed}' for '{name}' of '{command}' (expected {expected})"
            ),
            Self::MissingRequiredFlag { command, key } => {
                write!(f, "missing required flag '{key}' for '{command}'")
            }
            Self::MissingFlagArgument { command, key } => {
                write!(f, "flag '{key}' of '{command}' requires a value")
            }
            Self::Execution { command, .. } => {
                write!(f, "execution of '{command}' failed")
            }
        }
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Execution { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Walks the immutable tree per request and drives execution.
pub struct Dispatcher<S> {
    tree: Arc<CommandTree<S>>,
    executor: Executor,
}

impl<S: Send + 'static> Dispatcher<S> {
    pub fn new(tree: CommandTree<S>) -> Self {
        Self {
            tree: Arc::new(tree),
            executor: Executor::inline(),
        }
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    pub fn tree(&self) -> &Arc<CommandTree<S>> {
        &self.tree
    }

    /// Maps a raw token list to a handler invocation.
    ///
    /// Pre-execution failures come back as `Err`. With the `Pooled` policy
    /// the call returns `Ok(Dispatched::Submitted)` immediately and any
    /// handler failure is routed to the executor's failure sink instead.
    pub fn dispatch(&self, sender: S, tokens: Vec<String>) -> Result<Dispatched, Failure> {
        let mut node = self.tree.root();
        let mut remaining: VecDeque<String> = tokens.into();
        let mut path: Vec<String> = Vec::new();
        // Branch tokens are resolved after the walk, against their specs.
        let mut branch_tokens: Vec<(&CommandNode<S>, String)> = Vec::new();

        let leaf = loop {
            if node.is_leaf() {
                break node;
            }

            let Some(token) = remaining.front().cloned() else {
                // Out of tokens: fall back to the default leaf.
                match default_target(node) {
                    Some(target) => break target,
                    None => {
                        return Err(Failure::UnknownCommand {
                            token: String::new(),
                        });
                    }
                }
            };

            if let Some(child) = node.child_exact(&token) {
                remaining.pop_front();
                path.push(child.name().to_string());
                node = child;
                continue;
            }

            if let Some(branch) = node.branch_child() {
                // The token is not popped as a name; the branch consumes it
                // as its own value.
                remaining.pop_front();
                branch_tokens.push((branch, token));
                path.push(branch.name().to_string());
                node = branch;
                continue;
            }

            match default_target(node) {
                Some(target) => break target,
                None => return Err(Failure::UnknownCommand { token }),
            }
        };

        let command = if path.is_empty() {
            leaf.name().to_string()
        } else {
            path.join(" ")
        };
        debug!(%command, tokens = remaining.len(), "dispatching");

        let mut branch_values: Vec<ArgValue> = Vec::with_capacity(branch_tokens.len());
        for (branch, token) in branch_tokens {
            let Some(spec) = branch.branch_value() else {
                continue;
            };
            let Some(value) = (spec.resolver())(&sender, &token) else {
                return Err(Failure::InvalidArgument {
                    command,
                    name: spec.name().to_string(),
                    typed: token,
                    expected: spec.tag(),
                });
            };
            branch_values.push(value);
        }

        let inputs = map_arguments(&command, leaf.args(), remaining)?;
        let args = resolve_arguments(&sender, leaf.args(), inputs)
            .map_err(|failure| Failure::from_resolve(&command, failure))?;

        let Some(handler) = leaf.handler() else {
            // Unreachable for a validated tree; treat as unknown.
            return Err(Failure::UnknownCommand { token: command });
        };

        let invocation = Invocation {
            sender,
            path,
            branch_values,
            args,
        };
        self.executor
            .execute(leaf.policy(), command, handler.clone(), invocation)
    }
}

/// Step 1/4 of the walk: where "no match" dispatches to. A default child
/// wins; a childless handler on the node itself acts as its own default.
fn default_target<S>(node: &CommandNode<S>) -> Option<&CommandNode<S>> {
    if let Some(default) = node.default_child() {
        return Some(default);
    }
    node.handler().is_some().then_some(node)
}

/// Maps remaining tokens left-to-right onto the leaf's specs.
fn map_arguments<S>(
    command: &str,
    specs: &[ArgumentSpec<S>],
    mut remaining: VecDeque<String>,
) -> Result<Vec<ArgInput>, Failure> {
    let mut inputs = Vec::with_capacity(specs.len());

    for (index, spec) in specs.iter().enumerate() {
        match spec {
            ArgumentSpec::Single(_) => {
                inputs.push(match remaining.pop_front() {
                    Some(token) => ArgInput::Present(token),
                    None => ArgInput::Absent,
                });
            }
            ArgumentSpec::Limitless(_) => {
                let keyed_follows = specs
                    .get(index + 1)
                    .is_some_and(|next| matches!(next, ArgumentSpec::Keyed(_)));
                if keyed_follows {
                    // The keyed spec tokenizes the tail; its leftovers come
                    // back to this limitless spec during resolution.
                    inputs.push(ArgInput::Absent);
                } else {
                    inputs.push(ArgInput::Tokens(remaining.drain(..).collect()));
                }
            }
            ArgumentSpec::Keyed(_) => {
                inputs.push(ArgInput::Raw(remaining.drain(..).collect()));
            }
        }
    }

    if !remaining.is_empty() {
        return Err(Failure::TooManyArguments {
            command: command.to_string(),
        });
    }

    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use herald_args::SingleSpec;

    use crate::definition::CommandDefinition;

    type Log = Arc<Mutex<Vec<String>>>;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    fn logging_leaf(name: &str, log: &Log) -> CommandDefinition<()> {
        let log = log.clone();
        let name_owned = name.to_string();
        CommandDefinition::new(name).handler(move |_invocation| {
            log.lock().unwrap().push(name_owned.clone());
            Ok(())
        })
    }

    fn warp_tree(log: &Log) -> CommandTree<()> {
        let branch_log = log.clone();
        CommandTree::build(vec![
            CommandDefinition::new("warp")
                .child(logging_leaf("list", log))
                .child(
                    CommandDefinition::new("point")
                        .branch(SingleSpec::string("point"))
                        .handler(move |invocation| {
                            let point = invocation.branch_values[0]
                                .clone()
                                .downcast::<String>()
                                .ok()
                                .map(|p| (*p).clone())
                                .unwrap_or_default();
                            branch_log.lock().unwrap().push(format!("point:{point}"));
                            Ok(())
                        }),
                ),
        ])
        .unwrap()
    }

    #[test]
    fn exact_child_wins_over_branch() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(warp_tree(&log));

        dispatcher.dispatch((), tokens(&["warp", "list"])).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["list"]);
    }

    #[test]
    fn unmatched_token_goes_to_argument_branch_as_value() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(warp_tree(&log));

        dispatcher.dispatch((), tokens(&["warp", "home"])).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["point:home"]);
    }

    #[test]
    fn unknown_root_command_names_the_token() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(warp_tree(&log));

        let err = dispatcher.dispatch((), tokens(&["teleport"])).unwrap_err();
        assert!(matches!(
            err,
            Failure::UnknownCommand { token } if token == "teleport"
        ));
    }

    #[test]
    fn no_tokens_without_default_is_unknown() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(warp_tree(&log));

        let err = dispatcher.dispatch((), tokens(&["warp"])).unwrap_err();
        assert!(matches!(
            err,
            Failure::UnknownCommand { token } if token.is_empty()
        ));
    }

    #[test]
    fn default_leaf_receives_remaining_tokens() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let seen = log.clone();
        let tree = CommandTree::build(vec![
            CommandDefinition::new("tell")
                .child(logging_leaf("help", &log))
                .child(
                    CommandDefinition::new("send")
                        .default_leaf()
                        .arg(SingleSpec::string("target"))
                        .arg(herald_args::LimitlessSpec::joined("message"))
                        .handler(move |invocation| {
                            let target = invocation.args.get::<String>("target").unwrap();
                            let message = invocation.args.get::<String>("message").unwrap();
                            seen.lock().unwrap().push(format!("{target}<{message}"));
                            Ok(())
                        }),
                ),
        ])
        .unwrap();
        let dispatcher = Dispatcher::new(tree);

        dispatcher
            .dispatch((), tokens(&["tell", "steve", "hello", "there"]))
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["steve<hello there"]);
    }

    #[test]
    fn trailing_optional_arity() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let seen = log.clone();
        let tree = CommandTree::build(vec![
            CommandDefinition::new("kick")
                .arg(SingleSpec::string("target"))
                .arg(SingleSpec::string("reason").optional())
                .handler(move |invocation| {
                    let present = invocation.args.is_present("reason");
                    seen.lock().unwrap().push(format!("reason:{present}"));
                    Ok(())
                }),
        ])
        .unwrap();
        let dispatcher = Dispatcher::new(tree);

        // N-1 tokens: the optional resolves to absent.
        dispatcher.dispatch((), tokens(&["kick", "steve"])).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["reason:false"]);

        // N+1 tokens: a dedicated arity failure.
        let err = dispatcher
            .dispatch((), tokens(&["kick", "steve", "afk", "extra"]))
            .unwrap_err();
        assert!(matches!(err, Failure::TooManyArguments { .. }));

        // Missing required token: the arity failure, not a per-argument one.
        let err = dispatcher.dispatch((), tokens(&["kick"])).unwrap_err();
        assert!(matches!(err, Failure::NotEnoughArguments { .. }));
    }

    #[test]
    fn invalid_branch_value_fails_dispatch() {
        let tree = CommandTree::build(vec![
            CommandDefinition::new("page").child(
                CommandDefinition::new("number")
                    .branch(SingleSpec::int("number"))
                    .handler(|_| Ok(())),
            ),
        ])
        .unwrap();
        let dispatcher = Dispatcher::new(tree);

        let err = dispatcher
            .dispatch((), tokens(&["page", "twelve"]))
            .unwrap_err();
        assert!(matches!(
            err,
            Failure::InvalidArgument { name, typed, .. }
                if name == "number" && typed == "twelve"
        ));
    }

    #[test]
    fn handler_error_is_wrapped_with_cause() {
        let tree = CommandTree::build(vec![
            CommandDefinition::new("explode")
                .handler(|_| Err(anyhow::anyhow!("the dynamite was wet"))),
        ])
        .unwrap();
        let dispatcher = Dispatcher::new(tree);

        let err = dispatcher.dispatch((), tokens(&["explode"])).unwrap_err();
        let Failure::Execution { command, source } = err else {
            panic!("expected Execution, got: {err:?}");
        };
        assert_eq!(command, "explode");
        assert_eq!(source.to_string(), "the dynamite was wet");
    }

    #[test]
    fn handler_panic_is_caught() {
        let tree = CommandTree::build(vec![
            CommandDefinition::new("panic").handler(|_| panic!("boom")),
        ])
        .unwrap();
        let dispatcher = Dispatcher::new(tree);

        let err = dispatcher.dispatch((), tokens(&["panic"])).unwrap_err();
        assert!(matches!(err, Failure::Execution { .. }));
    }
}

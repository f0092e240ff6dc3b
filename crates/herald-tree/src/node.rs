//! The immutable command tree.
//!
//! Built once from definitions at registration, validated against every
//! structural invariant, then only ever read. The tree is `Send + Sync`
//! and shared by reference into the dispatcher and suggestion engine; no
//! global registries.

use indexmap::IndexMap;
use tracing::debug;

use herald_args::{ArgumentSpec, RegistrationError, SingleSpec};

use crate::definition::{CommandDefinition, ExecutionPolicy, Handler};

pub struct CommandNode<S> {
    name: String,
    aliases: Vec<String>,
    description: String,
    args: Vec<ArgumentSpec<S>>,
    children: IndexMap<String, CommandNode<S>>,
    child_aliases: IndexMap<String, String>,
    default_child: Option<Box<CommandNode<S>>>,
    branch_child: Option<Box<CommandNode<S>>>,
    branch_value: Option<SingleSpec<S>>,
    policy: ExecutionPolicy,
    handler: Option<Handler<S>>,
}

impl<S> CommandNode<S> {
    fn from_definition(
        def: CommandDefinition<S>,
        parent: &str,
    ) -> Result<Self, RegistrationError> {
        validate_arguments(&def.args)?;

        let mut node = CommandNode {
            name: def.name,
            aliases: def.aliases,
            description: def.description,
            args: def.args,
            children: IndexMap::new(),
            child_aliases: IndexMap::new(),
            default_child: None,
            branch_child: None,
            branch_value: def.branch_value,
            policy: def.policy,
            handler: def.handler,
        };

        for child_def in def.children {
            node.attach(child_def)?;
        }

        // A node nothing can dispatch into must at least execute.
        if node.children.is_empty()
            && node.default_child.is_none()
            && node.branch_child.is_none()
            && node.handler.is_none()
        {
            return Err(RegistrationError::MissingHandler {
                command: if parent.is_empty() {
                    node.name.clone()
                } else {
                    format!("{parent} {}", node.name)
                },
            });
        }

        Ok(node)
    }

    fn attach(&mut self, def: CommandDefinition<S>) -> Result<(), RegistrationError> {
        let is_branch = def.branch_value.is_some();
        let is_default = def.is_default;
        let child = CommandNode::from_definition(def, &self.name)?;

        if is_branch {
            if self.branch_child.is_some() {
                return Err(RegistrationError::DuplicateArgumentBranch {
                    parent: self.name.clone(),
                });
            }
            self.branch_child = Some(Box::new(child));
            return Ok(());
        }

        if is_default {
            if self.default_child.is_some() {
                return Err(RegistrationError::DuplicateDefault {
                    parent: self.name.clone(),
                });
            }
            self.default_child = Some(Box::new(child));
            return Ok(());
        }

        if self.children.contains_key(&child.name) || self.child_aliases.contains_key(&child.name)
        {
            return Err(RegistrationError::DuplicateChild {
                parent: self.name.clone(),
                name: child.name.clone(),
            });
        }
        for alias in &child.aliases {
            if self.children.contains_key(alias) || self.child_aliases.contains_key(alias) {
                return Err(RegistrationError::DuplicateChild {
                    parent: self.name.clone(),
                    name: alias.clone(),
                });
            }
            self.child_aliases.insert(alias.clone(), child.name.clone());
        }
        self.children.insert(child.name.clone(), child);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn args(&self) -> &[ArgumentSpec<S>] {
        &self.args
    }

    pub fn children(&self) -> impl Iterator<Item = &CommandNode<S>> {
        self.children.values()
    }

    /// Exact child lookup by name or alias. Default and branch children are
    /// never matched by name.
    pub fn child_exact(&self, token: &str) -> Option<&CommandNode<S>> {
        if let Some(child) = self.children.get(token) {
            return Some(child);
        }
        let name = self.child_aliases.get(token)?;
        self.children.get(name)
    }

    pub fn default_child(&self) -> Option<&CommandNode<S>> {
        self.default_child.as_deref()
    }

    pub fn branch_child(&self) -> Option<&CommandNode<S>> {
        self.branch_child.as_deref()
    }

    /// The value spec an argument-branch node consumes its token with.
    pub fn branch_value(&self) -> Option<&SingleSpec<S>> {
        self.branch_value.as_ref()
    }

    pub fn policy(&self) -> ExecutionPolicy {
        self.policy
    }

    pub fn handler(&self) -> Option<&Handler<S>> {
        self.handler.as_ref()
    }

    /// A leaf holds a handler and no way further down.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
            && self.default_child.is_none()
            && self.branch_child.is_none()
            && self.handler.is_some()
    }
}

impl<S> std::fmt::Debug for CommandNode<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("default", &self.default_child.is_some())
            .field("branch", &self.branch_child.is_some())
            .finish_non_exhaustive()
    }
}

/// The registered command namespace: a synthetic unnamed root whose
/// children are the top-level commands.
pub struct CommandTree<S> {
    root: CommandNode<S>,
}

impl<S> CommandTree<S> {
    /// Builds and validates the tree. Any violated invariant aborts the
    /// whole registration; this is the single fatal failure point of the
    /// engine.
    pub fn build(commands: Vec<CommandDefinition<S>>) -> Result<Self, RegistrationError> {
        // The synthetic root is never executable itself; it only holds the
        // top-level commands.
        let mut root = CommandNode {
            name: String::new(),
            aliases: Vec::new(),
            description: String::new(),
            args: Vec::new(),
            children: IndexMap::new(),
            child_aliases: IndexMap::new(),
            default_child: None,
            branch_child: None,
            branch_value: None,
            policy: ExecutionPolicy::Inline,
            handler: None,
        };
        for def in commands {
            root.attach(def)?;
        }
        debug!(commands = root.children.len(), "command tree built");
        Ok(Self { root })
    }

    pub fn root(&self) -> &CommandNode<S> {
        &self.root
    }
}

impl<S> std::fmt::Debug for CommandTree<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTree")
            .field("roots", &self.root.children.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn validate_arguments<S>(args: &[ArgumentSpec<S>]) -> Result<(), RegistrationError> {
    let mut limitless: Option<&str> = None;
    let mut keyed: Option<&str> = None;
    let mut optional: Option<&str> = None;

    for spec in args {
        if let Some(keyed_name) = keyed {
            // Nothing may follow the keyed argument.
            return Err(match spec {
                ArgumentSpec::Keyed(other) => RegistrationError::DuplicateKeyed {
                    name: other.name().to_string(),
                },
                _ => RegistrationError::NonFinalKeyed {
                    name: keyed_name.to_string(),
                },
            });
        }

        match spec {
            ArgumentSpec::Single(single) => {
                if let Some(limitless_name) = limitless {
                    return Err(RegistrationError::NonFinalLimitless {
                        name: limitless_name.to_string(),
                    });
                }
                if single.is_optional() {
                    optional = Some(single.name());
                } else if optional.is_some() {
                    return Err(RegistrationError::NonTrailingOptional {
                        name: single.name().to_string(),
                    });
                }
            }
            ArgumentSpec::Limitless(spec) => {
                if limitless.is_some() {
                    return Err(RegistrationError::DuplicateLimitless {
                        name: spec.name().to_string(),
                    });
                }
                limitless = Some(spec.name());
            }
            ArgumentSpec::Keyed(spec) => {
                keyed = Some(spec.name());
            }
        }
    }

    Ok(())
}

//! Registration-time failures.
//!
//! These are raised once while the command tree is being built and are
//! fatal: a definition that trips one of them never becomes dispatchable.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Two flags in one group share a short or long key.
    DuplicateFlagKey { key: String },
    /// Two named arguments in one group share a name or alias.
    DuplicateNamedArg { name: String },
    /// An optional positional argument is followed by a required one.
    NonTrailingOptional { name: String },
    /// A limitless argument is followed by anything other than a single
    /// keyed argument.
    NonFinalLimitless { name: String },
    /// A keyed argument is not the final declared argument.
    NonFinalKeyed { name: String },
    /// More than one limitless argument on one command.
    DuplicateLimitless { name: String },
    /// More than one keyed argument on one command.
    DuplicateKeyed { name: String },
    /// A parent declares more than one argument-branch child.
    DuplicateArgumentBranch { parent: String },
    /// A parent declares more than one default child.
    DuplicateDefault { parent: String },
    /// Two children of one parent share a name or alias.
    DuplicateChild { parent: String, name: String },
    /// A leaf definition has no handler attached.
    MissingHandler { command: String },
    /// Two variants of an enum type collide after uppercasing.
    DuplicateEnumVariant {
        type_name: &'static str,
        variant: String,
    },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateFlagKey { key } => {
                write!(f, "flag key conflict: '{key}' is declared more than once")
            }
            Self::DuplicateNamedArg { name } => {
                write!(f, "named argument conflict: '{name}' is declared more than once")
            }
            Self::NonTrailingOptional { name } => {
                write!(f, "optional argument '{name}' must trail all required arguments")
            }
            Self::NonFinalLimitless { name } => write!(
                f,
                "limitless argument '{name}' must be last, or followed only by a keyed argument"
            ),
            Self::NonFinalKeyed { name } => {
                write!(f, "keyed argument '{name}' must be the final argument")
            }
            Self::DuplicateLimitless { name } => write!(
                f,
                "only one limitless argument is allowed per command, found another: '{name}'"
            ),
            Self::DuplicateKeyed { name } => write!(
                f,
                "only one keyed argument is allowed per command, found another: '{name}'"
            ),
            Self::DuplicateArgumentBranch { parent } => write!(
                f,
                "only one argument-branch child is allowed per command: '{parent}'"
            ),
            Self::DuplicateDefault { parent } => {
                write!(f, "only one default child is allowed per command: '{parent}'")
            }
            Self::DuplicateChild { parent, name } => write!(
                f,
                "child conflict in '{parent}': '{name}' is both a name and an alias or declared twice"
            ),
            Self::MissingHandler { command } => {
                write!(f, "leaf command '{command}' has no handler")
            }
            Self::DuplicateEnumVariant { type_name, variant } => write!(
                f,
                "enum '{type_name}' has multiple variants named '{variant}' after uppercasing"
            ),
        }
    }
}

impl Error for RegistrationError {}

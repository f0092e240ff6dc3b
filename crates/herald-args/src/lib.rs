//! Argument-resolution engine for herald commands.
//!
//! This crate is the foundation the dispatcher builds on:
//! - [`spec`]: typed descriptions of what a command accepts (positional,
//!   limitless and keyed arguments, flags, named arguments)
//! - [`group`]: registries that index flags and named arguments by key
//! - [`parser`]: the tokenizer that splits raw tokens into flags, named
//!   arguments and leftovers without ever failing outright
//! - [`resolve`]: turns raw text into typed values against the specs,
//!   classifying every miss
//! - [`lookup`]: the resolved-value view handed to command handlers
//!
//! Parsing is deliberately forgiving: anything the tokenizer cannot place
//! degrades to leftover text, and type validation happens only during
//! resolution.

pub mod enums;
pub mod error;
pub mod group;
pub mod lookup;
pub mod parser;
pub mod resolve;
pub mod resolvers;
pub mod spec;

pub use enums::{NamedVariants, enum_constants, enum_resolver, enum_suggestions};
pub use error::RegistrationError;
pub use group::{FlagGroup, FlagId, NamedArgGroup, NamedId};
pub use lookup::{KeyedValues, ResolvedArgs};
pub use parser::{FlagStyle, ParseState, Waiting, parse_tokens};
pub use resolve::{ArgInput, ResolveFailure, resolve_arguments};
pub use spec::{
    ArgValue, ArgumentSpec, FlagSpec, KeyedSpec, LimitlessMode, LimitlessSpec, NamedArgSpec,
    Resolver, SingleSpec, SuggestionProvider, ValueTag,
};

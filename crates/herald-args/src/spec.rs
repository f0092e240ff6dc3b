//! Typed argument descriptions.
//!
//! Everything a command accepts is declared up front as data: positional
//! arguments, a trailing limitless argument, or a final keyed argument that
//! owns flag and named-argument registries. The old class-hierarchy style of
//! argument kinds is a closed union here ([`ArgumentSpec`]), so the resolver
//! and the suggestion engine can match exhaustively.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::enums::NamedVariants;
use crate::error::RegistrationError;
use crate::group::{FlagGroup, NamedArgGroup};
use crate::{enums, resolvers};

/// A resolved argument value, type-erased for transport to the handler.
pub type ArgValue = Arc<dyn Any + Send + Sync>;

/// Turns raw typed text into a value, or rejects it with `None`.
///
/// The sender is threaded through unchanged so resolvers can be
/// context-sensitive (e.g. "online player" lookups).
pub type Resolver<S> = Arc<dyn Fn(&S, &str) -> Option<ArgValue> + Send + Sync>;

/// Supplies completion candidates for one argument position.
///
/// Providers never fail; an empty result signals free-text input.
pub type SuggestionProvider<S> = Arc<dyn Fn(&S) -> Vec<String> + Send + Sync>;

/// Coarse value type attached to specs, used in failures and manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTag {
    Str,
    Int,
    Float,
    Bool,
    Enum(&'static str),
    Custom(&'static str),
}

impl ValueTag {
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueTag::Str => "string",
            ValueTag::Int => "int",
            ValueTag::Float => "float",
            ValueTag::Bool => "bool",
            ValueTag::Enum(name) | ValueTag::Custom(name) => name,
        }
    }
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A single positional argument consuming exactly one token.
#[derive(Clone)]
pub struct SingleSpec<S> {
    name: String,
    tag: ValueTag,
    optional: bool,
    resolver: Resolver<S>,
    suggest: Option<SuggestionProvider<S>>,
}

impl<S> SingleSpec<S> {
    pub fn new(name: impl Into<String>, tag: ValueTag, resolver: Resolver<S>) -> Self {
        Self {
            name: name.into(),
            tag,
            optional: false,
            resolver,
            suggest: None,
        }
    }

    /// A plain string argument; the resolver accepts anything.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueTag::Str, resolvers::string())
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ValueTag::Int, resolvers::int())
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ValueTag::Float, resolvers::float())
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ValueTag::Bool, resolvers::bool())
    }

    /// An enum-typed argument resolved case-insensitively against the
    /// memoized variant table of `T`.
    ///
    /// Fails at registration time when two variants collide after
    /// uppercasing.
    pub fn enumeration<T: NamedVariants>(
        name: impl Into<String>,
    ) -> Result<Self, RegistrationError> {
        Ok(Self::new(
            name,
            ValueTag::Enum(T::NAME),
            enums::enum_resolver::<S, T>()?,
        )
        .suggests(enums::enum_suggestions::<S, T>()))
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn suggests(mut self, provider: SuggestionProvider<S>) -> Self {
        self.suggest = Some(provider);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> ValueTag {
        self.tag
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn resolver(&self) -> &Resolver<S> {
        &self.resolver
    }

    pub fn suggestion_provider(&self) -> Option<&SuggestionProvider<S>> {
        self.suggest.as_ref()
    }
}

impl<S> fmt::Debug for SingleSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleSpec")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

/// How a limitless argument materializes its tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitlessMode {
    /// Resolve every token individually into a `Vec` of values.
    List,
    /// Join the tokens with single spaces and resolve once.
    Joined,
}

/// A trailing argument absorbing all remaining tokens.
#[derive(Clone)]
pub struct LimitlessSpec<S> {
    name: String,
    tag: ValueTag,
    mode: LimitlessMode,
    resolver: Resolver<S>,
    suggest: Option<SuggestionProvider<S>>,
}

impl<S> LimitlessSpec<S> {
    pub fn new(
        name: impl Into<String>,
        tag: ValueTag,
        mode: LimitlessMode,
        resolver: Resolver<S>,
    ) -> Self {
        Self {
            name: name.into(),
            tag,
            mode,
            resolver,
            suggest: None,
        }
    }

    /// A list of strings, one value per token.
    pub fn strings(name: impl Into<String>) -> Self {
        Self::new(name, ValueTag::Str, LimitlessMode::List, resolvers::string())
    }

    /// All remaining tokens joined into one string.
    pub fn joined(name: impl Into<String>) -> Self {
        Self::new(
            name,
            ValueTag::Str,
            LimitlessMode::Joined,
            resolvers::string(),
        )
    }

    pub fn suggests(mut self, provider: SuggestionProvider<S>) -> Self {
        self.suggest = Some(provider);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> ValueTag {
        self.tag
    }

    pub fn mode(&self) -> LimitlessMode {
        self.mode
    }

    pub fn resolver(&self) -> &Resolver<S> {
        &self.resolver
    }

    pub fn suggestion_provider(&self) -> Option<&SuggestionProvider<S>> {
        self.suggest.as_ref()
    }
}

impl<S> fmt::Debug for LimitlessSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LimitlessSpec")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// The final "keyed" argument: receives the remaining raw tokens and parses
/// them against its flag and named-argument registries.
#[derive(Clone)]
pub struct KeyedSpec<S> {
    name: String,
    flags: FlagGroup<S>,
    named: NamedArgGroup<S>,
}

impl<S> KeyedSpec<S> {
    pub fn new(name: impl Into<String>, flags: FlagGroup<S>, named: NamedArgGroup<S>) -> Self {
        Self {
            name: name.into(),
            flags,
            named,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> &FlagGroup<S> {
        &self.flags
    }

    pub fn named(&self) -> &NamedArgGroup<S> {
        &self.named
    }
}

impl<S> fmt::Debug for KeyedSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedSpec")
            .field("name", &self.name)
            .field("flags", &self.flags.len())
            .field("named", &self.named.len())
            .finish()
    }
}

/// One declared argument of a command, as a closed union.
#[derive(Clone)]
pub enum ArgumentSpec<S> {
    Single(SingleSpec<S>),
    Limitless(LimitlessSpec<S>),
    Keyed(KeyedSpec<S>),
}

impl<S> ArgumentSpec<S> {
    pub fn name(&self) -> &str {
        match self {
            ArgumentSpec::Single(spec) => spec.name(),
            ArgumentSpec::Limitless(spec) => spec.name(),
            ArgumentSpec::Keyed(spec) => spec.name(),
        }
    }

    pub fn is_optional(&self) -> bool {
        match self {
            ArgumentSpec::Single(spec) => spec.is_optional(),
            // Limitless and keyed arguments accept zero tokens.
            ArgumentSpec::Limitless(_) | ArgumentSpec::Keyed(_) => true,
        }
    }

    pub fn as_single(&self) -> Option<&SingleSpec<S>> {
        match self {
            ArgumentSpec::Single(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_limitless(&self) -> Option<&LimitlessSpec<S>> {
        match self {
            ArgumentSpec::Limitless(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_keyed(&self) -> Option<&KeyedSpec<S>> {
        match self {
            ArgumentSpec::Keyed(spec) => Some(spec),
            _ => None,
        }
    }
}

impl<S> fmt::Debug for ArgumentSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentSpec::Single(spec) => fmt::Debug::fmt(spec, f),
            ArgumentSpec::Limitless(spec) => fmt::Debug::fmt(spec, f),
            ArgumentSpec::Keyed(spec) => fmt::Debug::fmt(spec, f),
        }
    }
}

impl<S> From<SingleSpec<S>> for ArgumentSpec<S> {
    fn from(spec: SingleSpec<S>) -> Self {
        ArgumentSpec::Single(spec)
    }
}

impl<S> From<LimitlessSpec<S>> for ArgumentSpec<S> {
    fn from(spec: LimitlessSpec<S>) -> Self {
        ArgumentSpec::Limitless(spec)
    }
}

impl<S> From<KeyedSpec<S>> for ArgumentSpec<S> {
    fn from(spec: KeyedSpec<S>) -> Self {
        ArgumentSpec::Keyed(spec)
    }
}

/// The typed payload a value-taking flag expects.
#[derive(Clone)]
pub struct FlagValueSpec<S> {
    pub(crate) tag: ValueTag,
    pub(crate) resolver: Resolver<S>,
}

/// A `-x` / `--xxxx` style flag, optionally taking a value.
#[derive(Clone)]
pub struct FlagSpec<S> {
    short: Option<char>,
    long: Option<String>,
    value: Option<FlagValueSpec<S>>,
    required: bool,
    suggest: Option<SuggestionProvider<S>>,
}

impl<S> FlagSpec<S> {
    pub fn short(key: char) -> Self {
        Self {
            short: Some(key),
            long: None,
            value: None,
            required: false,
            suggest: None,
        }
    }

    pub fn long(key: impl Into<String>) -> Self {
        Self {
            short: None,
            long: Some(key.into()),
            value: None,
            required: false,
            suggest: None,
        }
    }

    pub fn with_short(mut self, key: char) -> Self {
        self.short = Some(key);
        self
    }

    pub fn with_long(mut self, key: impl Into<String>) -> Self {
        self.long = Some(key.into());
        self
    }

    /// Declare that this flag takes a value of the given type.
    pub fn with_value(mut self, tag: ValueTag, resolver: Resolver<S>) -> Self {
        self.value = Some(FlagValueSpec { tag, resolver });
        self
    }

    /// Mark the flag itself as required on every invocation.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn suggests(mut self, provider: SuggestionProvider<S>) -> Self {
        self.suggest = Some(provider);
        self
    }

    pub fn short_key(&self) -> Option<char> {
        self.short
    }

    pub fn long_key(&self) -> Option<&str> {
        self.long.as_deref()
    }

    /// Canonical key used in parse state, failures and lookups: the long
    /// key when present, the short key otherwise.
    pub fn key(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => long.clone(),
            (None, Some(short)) => short.to_string(),
            (None, None) => String::new(),
        }
    }

    pub fn takes_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn value_tag(&self) -> Option<ValueTag> {
        self.value.as_ref().map(|v| v.tag)
    }

    pub fn value_resolver(&self) -> Option<&Resolver<S>> {
        self.value.as_ref().map(|v| &v.resolver)
    }

    pub fn suggestion_provider(&self) -> Option<&SuggestionProvider<S>> {
        self.suggest.as_ref()
    }
}

impl<S> fmt::Debug for FlagSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagSpec")
            .field("short", &self.short)
            .field("long", &self.long)
            .field("takes_value", &self.takes_value())
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// A `key:value` style argument, independent of positional order.
#[derive(Clone)]
pub struct NamedArgSpec<S> {
    name: String,
    alias: Option<String>,
    tag: ValueTag,
    resolver: Resolver<S>,
    suggest: Option<SuggestionProvider<S>>,
}

impl<S> NamedArgSpec<S> {
    pub fn new(name: impl Into<String>, tag: ValueTag, resolver: Resolver<S>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            tag,
            resolver,
            suggest: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueTag::Str, resolvers::string())
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ValueTag::Int, resolvers::int())
    }

    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn suggests(mut self, provider: SuggestionProvider<S>) -> Self {
        self.suggest = Some(provider);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn tag(&self) -> ValueTag {
        self.tag
    }

    pub fn resolver(&self) -> &Resolver<S> {
        &self.resolver
    }

    pub fn suggestion_provider(&self) -> Option<&SuggestionProvider<S>> {
        self.suggest.as_ref()
    }
}

impl<S> fmt::Debug for NamedArgSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedArgSpec")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_key_prefers_long() {
        let flag: FlagSpec<()> = FlagSpec::short('f').with_long("force");
        assert_eq!(flag.key(), "force");
        assert_eq!(flag.short_key(), Some('f'));

        let short_only: FlagSpec<()> = FlagSpec::short('l');
        assert_eq!(short_only.key(), "l");
    }

    #[test]
    fn limitless_and_keyed_are_optional() {
        let limitless: ArgumentSpec<()> = LimitlessSpec::strings("rest").into();
        assert!(limitless.is_optional());

        let single: ArgumentSpec<()> = SingleSpec::string("target").into();
        assert!(!single.is_optional());
        assert!(ArgumentSpec::from(SingleSpec::<()>::string("x").optional()).is_optional());
    }

    #[test]
    fn value_tag_names() {
        assert_eq!(ValueTag::Str.type_name(), "string");
        assert_eq!(ValueTag::Enum("GameMode").type_name(), "GameMode");
    }
}

//! Argument resolution: raw text → typed values.
//!
//! The dispatcher maps tokens onto specs and hands the pairing here. Every
//! spec resolves in declared order and the first non-success aborts the
//! whole resolution, naming the offending argument or flag and the typed
//! text. Success yields the ordered value list plus the lookup object.

use std::fmt;

use tracing::debug;

use crate::lookup::{KeyedValues, ResolvedArgs};
use crate::parser::parse_tokens;
use crate::spec::{ArgValue, ArgumentSpec, KeyedSpec, LimitlessMode, ValueTag};

/// The raw input located for one spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgInput {
    /// One positional token.
    Present(String),
    /// The remaining tokens, for a limitless spec.
    Tokens(Vec<String>),
    /// The remaining raw tokens, for a keyed spec to tokenize itself.
    Raw(Vec<String>),
    /// Nothing was supplied for this spec.
    Absent,
}

/// Why resolution stopped. Carried into the dispatcher's failure taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveFailure {
    /// The resolver rejected a present value.
    Invalid {
        name: String,
        typed: String,
        expected: ValueTag,
    },
    /// A required argument had no input.
    Missing { name: String },
    /// A required flag was absent from the input.
    MissingRequiredFlag { key: String },
    /// A flag requiring a value was typed as a bare toggle.
    MissingFlagArgument { key: String },
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid {
                name,
                typed,
                expected,
            } => write!(f, "invalid value '{typed}' for '{name}' (expected {expected})"),
            Self::Missing { name } => write!(f, "missing required argument '{name}'"),
            Self::MissingRequiredFlag { key } => write!(f, "missing required flag '{key}'"),
            Self::MissingFlagArgument { key } => {
                write!(f, "flag '{key}' requires a value")
            }
        }
    }
}

impl std::error::Error for ResolveFailure {}

/// Resolves `inputs` (one per spec, in order) against `specs`.
pub fn resolve_arguments<S>(
    sender: &S,
    specs: &[ArgumentSpec<S>],
    inputs: Vec<ArgInput>,
) -> Result<ResolvedArgs, ResolveFailure> {
    debug_assert_eq!(specs.len(), inputs.len());

    // The keyed spec parses first: its leftovers may feed a limitless spec
    // declared just before it.
    let mut keyed_values: Option<KeyedValues> = None;
    for (spec, input) in specs.iter().zip(&inputs) {
        if let ArgumentSpec::Keyed(keyed) = spec {
            let raw = match input {
                ArgInput::Raw(tokens) => tokens.as_slice(),
                _ => &[],
            };
            keyed_values = Some(resolve_keyed(sender, keyed, raw)?);
        }
    }

    let mut values: Vec<Option<ArgValue>> = Vec::with_capacity(specs.len());
    for (spec, input) in specs.iter().zip(inputs) {
        match spec {
            ArgumentSpec::Single(single) => match input {
                ArgInput::Present(raw) => {
                    let Some(value) = (single.resolver())(sender, &raw) else {
                        return Err(ResolveFailure::Invalid {
                            name: single.name().to_string(),
                            typed: raw,
                            expected: single.tag(),
                        });
                    };
                    values.push(Some(value));
                }
                _ if single.is_optional() => values.push(None),
                _ => {
                    return Err(ResolveFailure::Missing {
                        name: single.name().to_string(),
                    });
                }
            },
            ArgumentSpec::Limitless(limitless) => {
                let tokens = match input {
                    ArgInput::Tokens(tokens) => tokens,
                    // A keyed spec follows: the non-token leftovers are ours.
                    _ => keyed_values
                        .as_ref()
                        .map(|keyed| keyed.leftovers().to_vec())
                        .unwrap_or_default(),
                };

                match limitless.mode() {
                    LimitlessMode::List => {
                        let mut list: Vec<ArgValue> = Vec::with_capacity(tokens.len());
                        for token in &tokens {
                            let Some(value) = (limitless.resolver())(sender, token) else {
                                return Err(ResolveFailure::Invalid {
                                    name: limitless.name().to_string(),
                                    typed: token.clone(),
                                    expected: limitless.tag(),
                                });
                            };
                            list.push(value);
                        }
                        let value: ArgValue = std::sync::Arc::new(list);
                        values.push(Some(value));
                    }
                    LimitlessMode::Joined => {
                        let joined = tokens.join(" ");
                        let Some(value) = (limitless.resolver())(sender, &joined) else {
                            return Err(ResolveFailure::Invalid {
                                name: limitless.name().to_string(),
                                typed: joined,
                                expected: limitless.tag(),
                            });
                        };
                        values.push(Some(value));
                    }
                }
            }
            // Keyed results live in the lookup, not the positional list.
            ArgumentSpec::Keyed(_) => values.push(None),
        }
    }

    let by_name = specs
        .iter()
        .enumerate()
        .map(|(index, spec)| (spec.name().to_string(), index))
        .collect();

    debug!(values = values.len(), "arguments resolved");
    Ok(ResolvedArgs::new(values, by_name, keyed_values))
}

fn resolve_keyed<S>(
    sender: &S,
    keyed: &KeyedSpec<S>,
    raw: &[String],
) -> Result<KeyedValues, ResolveFailure> {
    let state = parse_tokens(keyed.flags(), keyed.named(), raw);

    // Required flags must be present before any value is looked at.
    for (id, flag) in keyed.flags().iter() {
        if flag.is_required() && !state.flags.contains_key(&id) {
            return Err(ResolveFailure::MissingRequiredFlag { key: flag.key() });
        }
    }

    let mut flags = indexmap::IndexMap::new();
    for (id, raw_value) in &state.flags {
        let flag = keyed.flags().get(*id);
        let key = flag.key();
        let Some(resolver) = flag.value_resolver() else {
            // Presence-only flag.
            flags.insert(key, None);
            continue;
        };

        if raw_value.is_empty() {
            return Err(ResolveFailure::MissingFlagArgument { key });
        }
        let Some(value) = resolver(sender, raw_value) else {
            return Err(ResolveFailure::Invalid {
                name: key,
                typed: raw_value.clone(),
                expected: flag.value_tag().unwrap_or(ValueTag::Str),
            });
        };
        flags.insert(key, Some(value));
    }

    let mut named = indexmap::IndexMap::new();
    for (id, raw_value) in &state.named {
        let arg = keyed.named().get(*id);
        let Some(value) = (arg.resolver())(sender, raw_value) else {
            return Err(ResolveFailure::Invalid {
                name: arg.name().to_string(),
                typed: raw_value.clone(),
                expected: arg.tag(),
            });
        };
        named.insert(arg.name().to_string(), value);
    }

    Ok(KeyedValues::new(flags, named, state.leftovers))
}

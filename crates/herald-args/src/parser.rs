//! The tokenizer: splits raw tokens into flags, named arguments and
//! leftover text.
//!
//! Parsing never fails. Anything that does not match a registered flag or
//! named argument degrades to a leftover token; type validation is the
//! resolver's job. The parser also tracks a "waiting" cursor (which spec
//! expects the next token) so the suggestion engine can continue an
//! unfinished `--flag=` or `name:` value.

use tracing::trace;

use indexmap::IndexMap;

use crate::group::{FlagGroup, FlagId, NamedArgGroup, NamedId};

const ESCAPE: char = '\\';
const NAMED_SEPARATOR: char = ':';
const FLAG_SEPARATOR: char = '=';

/// How a waiting flag key was typed, so suggestions can re-prefix values
/// the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagStyle {
    Short,
    Long,
    ShortEquals,
    LongEquals,
}

impl FlagStyle {
    pub fn is_long(self) -> bool {
        matches!(self, FlagStyle::Long | FlagStyle::LongEquals)
    }

    pub fn has_equals(self) -> bool {
        matches!(self, FlagStyle::ShortEquals | FlagStyle::LongEquals)
    }
}

/// The spec the parser expects the next (or current partial) token to
/// belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waiting {
    FlagValue { id: FlagId, style: FlagStyle },
    NamedValue { id: NamedId },
}

/// Transient outcome of one tokenizer run. Created per call, discarded
/// after resolution or suggestion generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseState {
    /// Recorded flags, keyed by group id; valueless flags map to `""`.
    pub flags: IndexMap<FlagId, String>,
    /// Recorded named arguments, keyed by group id.
    pub named: IndexMap<NamedId, String>,
    /// Tokens that matched nothing, in input order.
    pub leftovers: Vec<String>,
    /// The spec waiting for a value, if the input ended mid-argument.
    pub waiting: Option<Waiting>,
    /// The text being completed at the cursor (last value or token seen).
    pub current: String,
}

impl ParseState {
    fn record_flag_waiting(&mut self, id: FlagId, style: FlagStyle, force: bool) {
        // A flag that already has a value does not go back to waiting
        // unless it was just re-typed with `=`.
        if !force && self.flags.contains_key(&id) {
            return;
        }
        self.waiting = Some(Waiting::FlagValue { id, style });
    }
}

/// Runs the tokenizer over `tokens` against the given registries.
///
/// Per-token priority: escape marker, waiting flag value, `name:value`
/// named argument, `-`/`--` flag, leftover.
pub fn parse_tokens<S>(
    flags: &FlagGroup<S>,
    named: &NamedArgGroup<S>,
    tokens: &[String],
) -> ParseState {
    let mut state = ParseState::default();
    let mut pending_flag_reset = false;

    for token in tokens {
        // Every new token invalidates a named-value continuation.
        if let Some(Waiting::NamedValue { .. }) = state.waiting {
            state.waiting = None;
        }
        if pending_flag_reset {
            pending_flag_reset = false;
            if let Some(Waiting::FlagValue { .. }) = state.waiting {
                state.waiting = None;
            }
        }
        state.current = token.clone();

        // Escaped token: verbatim leftover, parser state resets.
        if token.starts_with(ESCAPE) {
            trace!(%token, "escaped token");
            state.leftovers.push(token.clone());
            state.waiting = None;
            continue;
        }

        // A flag is waiting for its value: consume the token verbatim,
        // even if it looks like a flag itself.
        if let Some(Waiting::FlagValue { id, .. }) = state.waiting {
            trace!(%token, "token consumed as waiting flag value");
            state.flags.insert(id, token.clone());
            // Keep the waiting cursor for suggestions until the next token.
            pending_flag_reset = true;
            continue;
        }

        if !is_flag_shaped(token) {
            match token.find(NAMED_SEPARATOR) {
                None => {
                    // Unique-prefix match drives suggestions only.
                    if let Some(id) = named.match_unique_prefix(token) {
                        state.waiting = Some(Waiting::NamedValue { id });
                    }
                    state.leftovers.push(token.clone());
                }
                Some(separator) => handle_named(named, &mut state, token, separator),
            }
            continue;
        }

        match token.find(FLAG_SEPARATOR) {
            None => handle_flag(flags, &mut state, token),
            Some(equals) => {
                handle_flag_with_equals(flags, &mut state, token, equals);
                pending_flag_reset = true;
            }
        }
    }

    // A flag still waiting at the end of input never got its value;
    // record it with an empty one so resolution can classify the miss.
    if let Some(Waiting::FlagValue { id, .. }) = state.waiting {
        state.flags.entry(id).or_default();
    }

    state
}

/// `-x` or `--xxxx`, but not the bare separators `-` / `--`.
fn is_flag_shaped(token: &str) -> bool {
    token.starts_with('-') && token.trim_start_matches('-') != ""
}

fn handle_named<S>(
    named: &NamedArgGroup<S>,
    state: &mut ParseState,
    token: &str,
    separator: usize,
) {
    let name = &token[..separator];
    let value = &token[separator + 1..];

    let Some(id) = named.match_exact(name) else {
        state.leftovers.push(token.to_string());
        return;
    };

    trace!(%name, %value, "named argument recorded");
    state.named.insert(id, value.to_string());
    state.current = value.to_string();
    state.waiting = Some(Waiting::NamedValue { id });
}

fn handle_flag<S>(flags: &FlagGroup<S>, state: &mut ParseState, token: &str) {
    let Some(id) = flags.match_exact(token) else {
        state.leftovers.push(token.to_string());
        return;
    };

    if flags.get(id).takes_value() {
        // The *next* token becomes the value.
        let style = if token.starts_with("--") {
            FlagStyle::Long
        } else {
            FlagStyle::Short
        };
        state.record_flag_waiting(id, style, false);
        return;
    }

    trace!(%token, "valueless flag recorded");
    state.flags.insert(id, String::new());
}

fn handle_flag_with_equals<S>(
    flags: &FlagGroup<S>,
    state: &mut ParseState,
    token: &str,
    equals: usize,
) {
    let key = &token[..equals];
    let value = &token[equals + 1..];

    let Some(id) = flags.match_exact(key) else {
        state.leftovers.push(token.to_string());
        return;
    };

    // `=` on a flag that takes no value is malformed and discarded.
    if !flags.get(id).takes_value() {
        trace!(%token, "discarding '=' on valueless flag");
        return;
    }

    trace!(%key, %value, "flag with value recorded");
    state.flags.insert(id, value.to_string());
    state.current = value.to_string();
    let style = if token.starts_with("--") {
        FlagStyle::LongEquals
    } else {
        FlagStyle::ShortEquals
    };
    state.record_flag_waiting(id, style, true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{FlagSpec, NamedArgSpec, ValueTag};
    use crate::resolvers;

    fn groups() -> (FlagGroup<()>, NamedArgGroup<()>) {
        let flags = FlagGroup::new(vec![
            FlagSpec::short('l'),
            FlagSpec::long("foo").with_value(ValueTag::Str, resolvers::string()),
            FlagSpec::long("mode")
                .with_short('m')
                .with_value(ValueTag::Str, resolvers::string()),
        ])
        .unwrap();
        let named = NamedArgGroup::new(vec![
            NamedArgSpec::string("name"),
            NamedArgSpec::int("page"),
        ])
        .unwrap();
        (flags, named)
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn plain_text_passes_through_unchanged() {
        let (flags, named) = groups();
        let input = tokens(&["just", "some", "words"]);
        let state = parse_tokens(&flags, &named, &input);
        assert_eq!(state.leftovers, input);
        assert!(state.flags.is_empty());
        assert!(state.named.is_empty());
        assert!(state.waiting.is_none());
    }

    #[test]
    fn valueless_and_equals_flags_parse_together() {
        let (flags, named) = groups();
        let state = parse_tokens(&flags, &named, &tokens(&["-l", "--foo=bar"]));

        let l = flags.match_exact("-l").unwrap();
        let foo = flags.match_exact("--foo").unwrap();
        assert_eq!(state.flags.get(&l).map(String::as_str), Some(""));
        assert_eq!(state.flags.get(&foo).map(String::as_str), Some("bar"));
        assert!(state.leftovers.is_empty());
    }

    #[test]
    fn named_argument_with_trailing_text() {
        let (flags, named) = groups();
        let state = parse_tokens(&flags, &named, &tokens(&["name:value1", "rest", "text"]));

        let name = named.match_exact("name").unwrap();
        assert_eq!(state.named.get(&name).map(String::as_str), Some("value1"));
        assert_eq!(state.leftovers, tokens(&["rest", "text"]));
    }

    #[test]
    fn waiting_flag_consumes_flag_shaped_token() {
        let (flags, named) = groups();
        let state = parse_tokens(&flags, &named, &tokens(&["--foo", "-l"]));

        let foo = flags.match_exact("--foo").unwrap();
        let l = flags.match_exact("-l").unwrap();
        assert_eq!(state.flags.get(&foo).map(String::as_str), Some("-l"));
        assert!(!state.flags.contains_key(&l));
    }

    #[test]
    fn waiting_flag_at_end_records_empty_value() {
        let (flags, named) = groups();
        let state = parse_tokens(&flags, &named, &tokens(&["--foo"]));

        let foo = flags.match_exact("--foo").unwrap();
        assert_eq!(state.flags.get(&foo).map(String::as_str), Some(""));
        assert_eq!(
            state.waiting,
            Some(Waiting::FlagValue {
                id: foo,
                style: FlagStyle::Long
            })
        );
    }

    #[test]
    fn escaped_token_is_verbatim_leftover() {
        let (flags, named) = groups();
        let state = parse_tokens(&flags, &named, &tokens(&["\\--foo", "plain"]));
        assert_eq!(state.leftovers, tokens(&["\\--foo", "plain"]));
        assert!(state.flags.is_empty());
    }

    #[test]
    fn unknown_flag_degrades_to_leftover() {
        let (flags, named) = groups();
        let state = parse_tokens(&flags, &named, &tokens(&["--nope", "--nope=x"]));
        assert_eq!(state.leftovers, tokens(&["--nope", "--nope=x"]));
    }

    #[test]
    fn equals_on_valueless_flag_is_discarded() {
        let (flags, named) = groups();
        let state = parse_tokens(&flags, &named, &tokens(&["-l=oops"]));
        assert!(state.leftovers.is_empty());
        assert!(state.flags.is_empty());
    }

    #[test]
    fn unknown_named_argument_is_leftover() {
        let (flags, named) = groups();
        let state = parse_tokens(&flags, &named, &tokens(&["nope:value"]));
        assert_eq!(state.leftovers, tokens(&["nope:value"]));
        assert!(state.named.is_empty());
    }

    #[test]
    fn unique_prefix_sets_waiting_for_suggestions_only() {
        let (flags, named) = groups();
        let state = parse_tokens(&flags, &named, &tokens(&["pa"]));

        let page = named.match_exact("page").unwrap();
        assert_eq!(state.waiting, Some(Waiting::NamedValue { id: page }));
        // The token still counts as leftover text.
        assert_eq!(state.leftovers, tokens(&["pa"]));
        assert!(state.named.is_empty());
    }

    #[test]
    fn equals_flag_keeps_waiting_for_value_continuation() {
        let (flags, named) = groups();
        let state = parse_tokens(&flags, &named, &tokens(&["--mode=o"]));

        let mode = flags.match_exact("--mode").unwrap();
        assert_eq!(state.flags.get(&mode).map(String::as_str), Some("o"));
        assert_eq!(
            state.waiting,
            Some(Waiting::FlagValue {
                id: mode,
                style: FlagStyle::LongEquals
            })
        );
        assert_eq!(state.current, "o");
    }

    #[test]
    fn bare_separators_are_leftovers() {
        let (flags, named) = groups();
        let state = parse_tokens(&flags, &named, &tokens(&["-", "--"]));
        assert_eq!(state.leftovers, tokens(&["-", "--"]));
    }
}

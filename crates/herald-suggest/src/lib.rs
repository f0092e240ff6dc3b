//! Context-aware suggestions over a herald command tree.
//!
//! The engine mirrors the dispatcher's walk (exact child names first, then
//! the argument-branch child, then the default leaf) without executing
//! anything, and completes the final partial token from whatever spec owns
//! that position: child names, branch values, positional providers, flag
//! keys and values, or named arguments.
//!
//! Output is ordered (registration order first, provider order within a
//! spec) and capped; the cap defaults to 25, a common platform list limit.

use std::sync::Arc;

use tracing::trace;

use herald_args::{
    ArgumentSpec, FlagGroup, KeyedSpec, NamedArgGroup, ParseState, SingleSpec, Waiting,
    parse_tokens,
};
use herald_tree::{CommandNode, CommandTree};

const DEFAULT_CAP: usize = 25;

pub struct SuggestionEngine<S> {
    tree: Arc<CommandTree<S>>,
    cap: usize,
}

impl<S> SuggestionEngine<S> {
    pub fn new(tree: Arc<CommandTree<S>>) -> Self {
        Self {
            tree,
            cap: DEFAULT_CAP,
        }
    }

    /// Override the maximum number of candidates returned.
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    /// Produces ordered candidates for the last token of `tokens`, which
    /// is the partial text being typed (use `""` after a trailing space).
    pub fn suggest(&self, sender: &S, tokens: &[String]) -> Vec<String> {
        let empty = [String::new()];
        let tokens = if tokens.is_empty() { &empty } else { tokens };

        let mut candidates = suggest_node(self.tree.root(), sender, tokens);
        candidates.truncate(self.cap);
        trace!(count = candidates.len(), "suggestions produced");
        candidates
    }
}

impl<S> std::fmt::Debug for SuggestionEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionEngine")
            .field("cap", &self.cap)
            .finish()
    }
}

fn suggest_node<S>(node: &CommandNode<S>, sender: &S, tokens: &[String]) -> Vec<String> {
    if node.is_leaf() {
        return leaf_suggestions(node, sender, tokens);
    }

    if tokens.len() <= 1 {
        let partial = tokens.first().map(String::as_str).unwrap_or("");
        let mut out: Vec<String> = node
            .children()
            .map(|child| child.name().to_string())
            .filter(|name| name.starts_with(partial))
            .collect();

        // An argument-branch child competes with names for this position.
        if let Some(branch) = node.branch_child()
            && let Some(spec) = branch.branch_value()
        {
            out.extend(provider_candidates(spec, sender, partial));
        }

        // A default leaf offers its own first-position suggestions.
        if let Some(default) = node.default_child() {
            out.extend(leaf_suggestions(default, sender, tokens));
        }

        return out;
    }

    let token = &tokens[0];
    if let Some(child) = node.child_exact(token) {
        return suggest_node(child, sender, &tokens[1..]);
    }
    if let Some(branch) = node.branch_child() {
        // The first token is the branch's value; continue below it.
        return suggest_node(branch, sender, &tokens[1..]);
    }
    if let Some(default) = node.default_child() {
        return leaf_suggestions(default, sender, tokens);
    }

    Vec::new()
}

fn provider_candidates<S>(spec: &SingleSpec<S>, sender: &S, partial: &str) -> Vec<String> {
    let Some(provider) = spec.suggestion_provider() else {
        return Vec::new();
    };
    provider(sender)
        .into_iter()
        .filter(|candidate| candidate.starts_with(partial))
        .collect()
}

fn leaf_suggestions<S>(leaf: &CommandNode<S>, sender: &S, tokens: &[String]) -> Vec<String> {
    let partial = tokens.last().map(String::as_str).unwrap_or("");
    let completed = &tokens[..tokens.len().saturating_sub(1)];

    let specs = leaf.args();
    let single_count = specs
        .iter()
        .take_while(|spec| matches!(spec, ArgumentSpec::Single(_)))
        .count();

    // Still inside the declared positional region.
    if completed.len() < single_count {
        if let Some(single) = specs[completed.len()].as_single() {
            return provider_candidates(single, sender, partial);
        }
    }

    let keyed = specs.iter().find_map(ArgumentSpec::as_keyed);
    let limitless = specs.iter().find_map(ArgumentSpec::as_limitless);

    if let Some(keyed) = keyed {
        let keyed_tokens: Vec<String> = completed
            .get(single_count..)
            .map(|tail| tail.to_vec())
            .unwrap_or_default();
        return keyed_suggestions(keyed, limitless, sender, &keyed_tokens, partial);
    }

    // Past the declared list, only a limitless spec keeps supplying.
    if let Some(limitless) = limitless {
        if let Some(provider) = limitless.suggestion_provider() {
            return provider(sender)
                .into_iter()
                .filter(|candidate| candidate.starts_with(partial))
                .collect();
        }
    }

    Vec::new()
}

/// The five priority rules for a position owned by the keyed argument.
fn keyed_suggestions<S>(
    keyed: &KeyedSpec<S>,
    limitless: Option<&herald_args::LimitlessSpec<S>>,
    sender: &S,
    completed: &[String],
    partial: &str,
) -> Vec<String> {
    let flags = keyed.flags();
    let named = keyed.named();

    // Parse what was typed so far, including the partial token; an empty
    // partial still advances the parser past a finished flag. The waiting
    // cursor tells us whether we're inside an unfinished value.
    let mut parsed: Vec<String> = completed.to_vec();
    parsed.push(partial.to_string());
    let state = parse_tokens(flags, named, &parsed);

    // Rule 1: unfinished flag value.
    if let Some(Waiting::FlagValue { id, style }) = state.waiting {
        let flag = flags.get(id);
        let Some(provider) = flag.suggestion_provider() else {
            return Vec::new();
        };
        return if style.has_equals() {
            let (typed_key, typed_value) = partial.split_once('=').unwrap_or((partial, ""));
            provider(sender)
                .into_iter()
                .filter(|candidate| candidate.starts_with(typed_value))
                .map(|candidate| format!("{typed_key}={candidate}"))
                .collect()
        } else {
            provider(sender)
                .into_iter()
                .filter(|candidate| candidate.starts_with(partial))
                .collect()
        };
    }

    // Rule 2: unfinished named-argument value.
    if let Some(Waiting::NamedValue { id }) = state.waiting
        && let Some((typed_name, typed_value)) = partial.split_once(':')
    {
        let Some(provider) = named.get(id).suggestion_provider() else {
            return Vec::new();
        };
        return provider(sender)
            .into_iter()
            .filter(|candidate| candidate.starts_with(typed_value))
            .map(|candidate| format!("{typed_name}:{candidate}"))
            .collect();
    }

    // Rule 3: a hyphen starts a flag key.
    if partial.starts_with('-') {
        return unused_flag_keys(flags, &state, partial);
    }

    // Rule 4: named-argument names, plus whatever positional spec feeds on
    // the keyed leftovers.
    let mut out = unused_named_names(named, &state, partial);
    if let Some(limitless) = limitless
        && let Some(provider) = limitless.suggestion_provider()
    {
        out.extend(
            provider(sender)
                .into_iter()
                .filter(|candidate| candidate.starts_with(partial)),
        );
    }
    out
}

fn unused_flag_keys<S>(flags: &FlagGroup<S>, state: &ParseState, partial: &str) -> Vec<String> {
    let mut out = Vec::new();
    for (id, flag) in flags.iter() {
        if state.flags.contains_key(&id) {
            continue;
        }
        if let Some(long) = flag.long_key() {
            let token = format!("--{long}");
            if token.starts_with(partial) {
                out.push(token);
            }
        }
        if let Some(short) = flag.short_key() {
            let token = format!("-{short}");
            if token.starts_with(partial) {
                out.push(token);
            }
        }
    }
    out
}

fn unused_named_names<S>(
    named: &NamedArgGroup<S>,
    state: &ParseState,
    partial: &str,
) -> Vec<String> {
    let mut out = Vec::new();
    for (id, arg) in named.iter() {
        if state.named.contains_key(&id) {
            continue;
        }
        let candidate = format!("{}:", arg.name());
        if candidate.starts_with(partial) || arg.name().starts_with(partial) {
            out.push(candidate);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use herald_args::{FlagSpec, LimitlessSpec, NamedArgSpec, SuggestionProvider, ValueTag};
    use herald_args::resolvers;
    use herald_tree::CommandDefinition;

    fn fixed(values: &[&str]) -> SuggestionProvider<()> {
        let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        Arc::new(move |_| values.clone())
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    fn engine() -> SuggestionEngine<()> {
        let keyed = KeyedSpec::new(
            "options",
            FlagGroup::new(vec![
                FlagSpec::long("mode")
                    .with_short('m')
                    .with_value(ValueTag::Str, resolvers::string())
                    .suggests(fixed(&["on", "off"])),
                FlagSpec::short('q'),
            ])
            .unwrap(),
            NamedArgGroup::new(vec![
                NamedArgSpec::string("world").suggests(fixed(&["overworld", "nether"])),
                NamedArgSpec::int("page"),
            ])
            .unwrap(),
        );

        let tree = CommandTree::build(vec![
            CommandDefinition::new("warp")
                .child(
                    CommandDefinition::new("list")
                        .arg(
                            SingleSpec::string("filter")
                                .optional()
                                .suggests(fixed(&["mine", "public"])),
                        )
                        .handler(|_| Ok(())),
                )
                .child(
                    CommandDefinition::new("point")
                        .branch(SingleSpec::string("point").suggests(fixed(&["home", "shop"])))
                        .handler(|_| Ok(())),
                ),
            CommandDefinition::new("search")
                .arg(LimitlessSpec::strings("terms").suggests(fixed(&["stone", "sand"])))
                .arg(keyed)
                .handler(|_| Ok(())),
        ])
        .unwrap();

        SuggestionEngine::new(Arc::new(tree))
    }

    #[test]
    fn completes_root_command_names() {
        let engine = engine();
        assert_eq!(engine.suggest(&(), &tokens(&["wa"])), vec!["warp"]);
        assert_eq!(
            engine.suggest(&(), &tokens(&[""])),
            vec!["warp", "search"]
        );
    }

    #[test]
    fn child_names_and_branch_values_share_the_slot() {
        let engine = engine();
        let got = engine.suggest(&(), &tokens(&["warp", ""]));
        assert_eq!(got, vec!["list", "home", "shop"]);

        // A partial filters both sources.
        assert_eq!(
            engine.suggest(&(), &tokens(&["warp", "h"])),
            vec!["home"]
        );
    }

    #[test]
    fn positional_provider_supplies_leaf_argument() {
        let engine = engine();
        assert_eq!(
            engine.suggest(&(), &tokens(&["warp", "list", ""])),
            vec!["mine", "public"]
        );
        assert_eq!(
            engine.suggest(&(), &tokens(&["warp", "list", "pu"])),
            vec!["public"]
        );
    }

    #[test]
    fn flag_value_typed_with_equals_is_reprefixed() {
        let engine = engine();
        assert_eq!(
            engine.suggest(&(), &tokens(&["search", "--mode=o"])),
            vec!["--mode=on", "--mode=off"]
        );
    }

    #[test]
    fn flag_value_as_next_token_is_bare() {
        let engine = engine();
        assert_eq!(
            engine.suggest(&(), &tokens(&["search", "--mode", ""])),
            vec!["on", "off"]
        );
        assert_eq!(
            engine.suggest(&(), &tokens(&["search", "--mode", "of"])),
            vec!["off"]
        );
    }

    #[test]
    fn hyphen_lists_unused_flag_keys() {
        let engine = engine();
        assert_eq!(
            engine.suggest(&(), &tokens(&["search", "-"])),
            vec!["--mode", "-m", "-q"]
        );
        assert_eq!(
            engine.suggest(&(), &tokens(&["search", "--m"])),
            vec!["--mode"]
        );
        // Already-used flags drop out.
        assert_eq!(
            engine.suggest(&(), &tokens(&["search", "--mode=on", "-"])),
            vec!["-q"]
        );
    }

    #[test]
    fn plain_partial_lists_named_names_and_positionals() {
        let engine = engine();
        let got = engine.suggest(&(), &tokens(&["search", ""]));
        assert_eq!(got, vec!["world:", "page:", "stone", "sand"]);

        assert_eq!(
            engine.suggest(&(), &tokens(&["search", "pa"])),
            vec!["page:"]
        );
    }

    #[test]
    fn named_value_is_reprefixed() {
        let engine = engine();
        assert_eq!(
            engine.suggest(&(), &tokens(&["search", "world:ne"])),
            vec!["world:nether"]
        );
        assert_eq!(
            engine.suggest(&(), &tokens(&["search", "world:"])),
            vec!["world:overworld", "world:nether"]
        );
    }

    #[test]
    fn limitless_keeps_supplying_past_declared_length() {
        let engine = engine();
        assert_eq!(
            engine.suggest(&(), &tokens(&["search", "stone", "sa"])),
            vec!["sand"]
        );
    }

    #[test]
    fn cap_truncates_candidates() {
        let engine = engine().with_cap(1);
        assert_eq!(
            engine.suggest(&(), &tokens(&["warp", ""])),
            vec!["list"]
        );
    }

    #[test]
    fn unknown_path_suggests_nothing() {
        let engine = engine();
        assert!(engine.suggest(&(), &tokens(&["nope", ""])).is_empty());
    }
}

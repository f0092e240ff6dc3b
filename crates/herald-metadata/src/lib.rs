//! Shared manifest model for herald command trees.
//!
//! This crate intentionally does **not** hold resolvers or handlers. It
//! mirrors the declarative shape of a built tree as plain serializable
//! data, used for:
//! - handing command shapes to platform registration layers (e.g.
//!   slash-command option lists)
//! - dumping a registered tree for inspection or documentation
//!
//! The payload wrapper is versioned so platforms can evolve independently
//! of the engine.

use serde::{Deserialize, Serialize};

use herald_args::{ArgumentSpec, FlagSpec, KeyedSpec, NamedArgSpec};
use herald_tree::{CommandNode, CommandTree};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ArgManifest {
    pub name: String,
    pub value_type: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub limitless: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct FlagManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct NamedArgManifest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub value_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CommandManifest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgManifest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagManifest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub named_args: Vec<NamedArgManifest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CommandManifest>,
    /// Set on a child that runs when no sibling name matches.
    #[serde(default)]
    pub default_leaf: bool,
    /// Present on a child that consumes one token as this argument instead
    /// of matching its name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_value: Option<ArgManifest>,
}

impl CommandManifest {
    pub fn from_node<S>(node: &CommandNode<S>) -> Self {
        let mut args = Vec::new();
        let mut flags = Vec::new();
        let mut named_args = Vec::new();

        for spec in node.args() {
            match spec {
                ArgumentSpec::Single(single) => args.push(ArgManifest {
                    name: single.name().to_string(),
                    value_type: single.tag().type_name().to_string(),
                    optional: single.is_optional(),
                    limitless: false,
                }),
                ArgumentSpec::Limitless(limitless) => args.push(ArgManifest {
                    name: limitless.name().to_string(),
                    value_type: limitless.tag().type_name().to_string(),
                    optional: true,
                    limitless: true,
                }),
                ArgumentSpec::Keyed(keyed) => {
                    collect_keyed(keyed, &mut flags, &mut named_args);
                }
            }
        }

        let mut children: Vec<CommandManifest> =
            node.children().map(CommandManifest::from_node).collect();
        if let Some(default) = node.default_child() {
            let mut manifest = CommandManifest::from_node(default);
            manifest.default_leaf = true;
            children.push(manifest);
        }
        if let Some(branch) = node.branch_child() {
            children.push(CommandManifest::from_node(branch));
        }

        CommandManifest {
            name: node.name().to_string(),
            aliases: node.aliases().to_vec(),
            description: node.description().to_string(),
            args,
            flags,
            named_args,
            children,
            default_leaf: false,
            branch_value: node.branch_value().map(|spec| ArgManifest {
                name: spec.name().to_string(),
                value_type: spec.tag().type_name().to_string(),
                optional: spec.is_optional(),
                limitless: false,
            }),
        }
    }
}

fn collect_keyed<S>(
    keyed: &KeyedSpec<S>,
    flags: &mut Vec<FlagManifest>,
    named_args: &mut Vec<NamedArgManifest>,
) {
    for (_, flag) in keyed.flags().iter() {
        flags.push(flag_manifest(flag));
    }
    for (_, arg) in keyed.named().iter() {
        named_args.push(named_manifest(arg));
    }
}

fn flag_manifest<S>(flag: &FlagSpec<S>) -> FlagManifest {
    FlagManifest {
        short: flag.short_key().map(|short| short.to_string()),
        long: flag.long_key().map(|long| long.to_string()),
        value_type: flag.value_tag().map(|tag| tag.type_name().to_string()),
        required: flag.is_required(),
    }
}

fn named_manifest<S>(arg: &NamedArgSpec<S>) -> NamedArgManifest {
    NamedArgManifest {
        name: arg.name().to_string(),
        alias: arg.alias().map(|alias| alias.to_string()),
        value_type: arg.tag().type_name().to_string(),
    }
}

/// JSON payload handed to platform registration layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CommandManifestV1 {
    pub format_version: u32,
    pub commands: Vec<CommandManifest>,
}

impl CommandManifestV1 {
    pub fn from_tree<S>(tree: &CommandTree<S>) -> Self {
        Self {
            format_version: 1,
            commands: tree.root().children().map(CommandManifest::from_node).collect(),
        }
    }

    /// Encode as JSON bytes for embedding or transport.
    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

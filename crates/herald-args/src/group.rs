//! Flag and named-argument registries.
//!
//! Groups are built once at registration, validate key uniqueness, and are
//! read-only afterwards. Iteration order is declaration order, which keeps
//! suggestions and failure messages deterministic.

use indexmap::IndexMap;

use crate::error::RegistrationError;
use crate::spec::{FlagSpec, NamedArgSpec};

/// Index of a flag inside its [`FlagGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagId(pub(crate) usize);

/// Index of a named argument inside its [`NamedArgGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedId(pub(crate) usize);

#[derive(Clone, Debug)]
pub struct FlagGroup<S> {
    flags: Vec<FlagSpec<S>>,
    by_short: IndexMap<char, FlagId>,
    by_long: IndexMap<String, FlagId>,
}

impl<S> FlagGroup<S> {
    pub fn empty() -> Self {
        Self {
            flags: Vec::new(),
            by_short: IndexMap::new(),
            by_long: IndexMap::new(),
        }
    }

    pub fn new(flags: Vec<FlagSpec<S>>) -> Result<Self, RegistrationError> {
        let mut group = Self::empty();
        for flag in flags {
            group.add(flag)?;
        }
        Ok(group)
    }

    fn add(&mut self, flag: FlagSpec<S>) -> Result<(), RegistrationError> {
        let id = FlagId(self.flags.len());
        if let Some(short) = flag.short_key() {
            if self.by_short.insert(short, id).is_some() {
                return Err(RegistrationError::DuplicateFlagKey {
                    key: short.to_string(),
                });
            }
        }
        if let Some(long) = flag.long_key() {
            let key = long.to_string();
            if self.by_long.insert(key.clone(), id).is_some() {
                return Err(RegistrationError::DuplicateFlagKey { key });
            }
        }
        self.flags.push(flag);
        Ok(())
    }

    /// Matches a full flag token against the registered keys: `--xxxx`
    /// looks up long keys, `-x` short keys (a multi-character single-dash
    /// token falls back to the long keys).
    pub fn match_exact(&self, token: &str) -> Option<FlagId> {
        if let Some(rest) = token.strip_prefix("--") {
            if rest.is_empty() {
                return None;
            }
            return self.by_long.get(rest).copied();
        }

        let rest = token.strip_prefix('-')?;
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(short), None) => self.by_short.get(&short).copied(),
            (Some(_), Some(_)) => self.by_long.get(rest).copied(),
            _ => None,
        }
    }

    pub fn get(&self, id: FlagId) -> &FlagSpec<S> {
        &self.flags[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlagId, &FlagSpec<S>)> {
        self.flags
            .iter()
            .enumerate()
            .map(|(index, flag)| (FlagId(index), flag))
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct NamedArgGroup<S> {
    args: Vec<NamedArgSpec<S>>,
    // Maps names and aliases.
    by_name: IndexMap<String, NamedId>,
}

impl<S> NamedArgGroup<S> {
    pub fn empty() -> Self {
        Self {
            args: Vec::new(),
            by_name: IndexMap::new(),
        }
    }

    pub fn new(args: Vec<NamedArgSpec<S>>) -> Result<Self, RegistrationError> {
        let mut group = Self::empty();
        for arg in args {
            group.add(arg)?;
        }
        Ok(group)
    }

    fn add(&mut self, arg: NamedArgSpec<S>) -> Result<(), RegistrationError> {
        let id = NamedId(self.args.len());
        let name = arg.name().to_string();
        if self.by_name.insert(name.clone(), id).is_some() {
            return Err(RegistrationError::DuplicateNamedArg { name });
        }
        if let Some(alias) = arg.alias() {
            let alias = alias.to_string();
            if self.by_name.insert(alias.clone(), id).is_some() {
                return Err(RegistrationError::DuplicateNamedArg { name: alias });
            }
        }
        self.args.push(arg);
        Ok(())
    }

    pub fn match_exact(&self, name: &str) -> Option<NamedId> {
        self.by_name.get(name).copied()
    }

    /// Matches a partial token against argument names, succeeding only when
    /// exactly one name has it as a prefix. Used purely to drive
    /// suggestions; it never records a value.
    pub fn match_unique_prefix(&self, partial: &str) -> Option<NamedId> {
        if partial.is_empty() {
            return None;
        }
        let mut found = None;
        for (name, id) in &self.by_name {
            if name.starts_with(partial) {
                match found {
                    None => found = Some(*id),
                    Some(existing) if existing == *id => {}
                    Some(_) => return None,
                }
            }
        }
        found
    }

    pub fn get(&self, id: NamedId) -> &NamedArgSpec<S> {
        &self.args[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (NamedId, &NamedArgSpec<S>)> {
        self.args
            .iter()
            .enumerate()
            .map(|(index, arg)| (NamedId(index), arg))
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

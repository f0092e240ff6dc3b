//! The resolved-value view handed to command handlers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::spec::ArgValue;

/// Flag, named-argument and free-text results of a keyed argument.
#[derive(Clone)]
pub struct KeyedValues {
    /// Canonical flag key → resolved value (`None` for presence-only flags).
    flags: IndexMap<String, Option<ArgValue>>,
    named: IndexMap<String, ArgValue>,
    leftovers: Vec<String>,
}

impl KeyedValues {
    pub(crate) fn new(
        flags: IndexMap<String, Option<ArgValue>>,
        named: IndexMap<String, ArgValue>,
        leftovers: Vec<String>,
    ) -> Self {
        Self {
            flags,
            named,
            leftovers,
        }
    }

    pub fn has_flag(&self, key: &str) -> bool {
        self.flags.contains_key(key)
    }

    pub fn flag_value(&self, key: &str) -> Option<&ArgValue> {
        self.flags.get(key).and_then(|value| value.as_ref())
    }

    pub fn named_value(&self, name: &str) -> Option<&ArgValue> {
        self.named.get(name)
    }

    pub fn leftovers(&self) -> &[String] {
        &self.leftovers
    }
}

impl fmt::Debug for KeyedValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedValues")
            .field("flags", &self.flags.keys().collect::<Vec<_>>())
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .field("leftovers", &self.leftovers)
            .finish()
    }
}

/// Ordered resolved values plus by-name and by-type access.
///
/// Positional values keep their declaration order; optional arguments that
/// were absent occupy their slot as `None`. Keyed results (flags, named
/// arguments, free text) are reachable through the accessor methods.
#[derive(Clone)]
pub struct ResolvedArgs {
    values: Vec<Option<ArgValue>>,
    by_name: IndexMap<String, usize>,
    keyed: Option<KeyedValues>,
}

impl ResolvedArgs {
    pub(crate) fn new(
        values: Vec<Option<ArgValue>>,
        by_name: IndexMap<String, usize>,
        keyed: Option<KeyedValues>,
    ) -> Self {
        Self {
            values,
            by_name,
            keyed,
        }
    }

    /// An empty lookup, for commands that declare no arguments.
    pub fn none() -> Self {
        Self {
            values: Vec::new(),
            by_name: IndexMap::new(),
            keyed: None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw ordered value list.
    pub fn values(&self) -> &[Option<ArgValue>] {
        &self.values
    }

    pub fn value_at(&self, index: usize) -> Option<&ArgValue> {
        self.values.get(index).and_then(|value| value.as_ref())
    }

    /// Whether the named argument resolved to a value (absent optionals
    /// report `false`).
    pub fn is_present(&self, name: &str) -> bool {
        self.by_name
            .get(name)
            .is_some_and(|index| self.values[*index].is_some())
    }

    /// Downcast the value of a positional argument by name.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let index = self.by_name.get(name)?;
        let value = self.values.get(*index)?.as_ref()?;
        value.clone().downcast::<T>().ok()
    }

    /// Downcast every element of a limitless list argument.
    pub fn get_list<T: Any + Send + Sync>(&self, name: &str) -> Option<Vec<Arc<T>>> {
        let list = self.get::<Vec<ArgValue>>(name)?;
        list.iter()
            .map(|value| value.clone().downcast::<T>().ok())
            .collect()
    }

    pub fn has_flag(&self, key: &str) -> bool {
        self.keyed.as_ref().is_some_and(|keyed| keyed.has_flag(key))
    }

    /// Downcast the value of a value-taking flag.
    pub fn flag<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.keyed.as_ref()?.flag_value(key)?;
        value.clone().downcast::<T>().ok()
    }

    /// Downcast the value of a named argument.
    pub fn named<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let value = self.keyed.as_ref()?.named_value(name)?;
        value.clone().downcast::<T>().ok()
    }

    /// Tokens of the keyed argument that matched nothing: free text.
    pub fn free_text(&self) -> &[String] {
        self.keyed
            .as_ref()
            .map(KeyedValues::leftovers)
            .unwrap_or(&[])
    }

    pub fn keyed(&self) -> Option<&KeyedValues> {
        self.keyed.as_ref()
    }
}

impl fmt::Debug for ResolvedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedArgs")
            .field("names", &self.by_name.keys().collect::<Vec<_>>())
            .field("keyed", &self.keyed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_by_name_and_type() {
        let mut by_name = IndexMap::new();
        by_name.insert("target".to_string(), 0);
        by_name.insert("amount".to_string(), 1);
        let values: Vec<Option<ArgValue>> = vec![
            Some(Arc::new("steve".to_string())),
            Some(Arc::new(42i64)),
        ];
        let resolved = ResolvedArgs::new(values, by_name, None);

        assert_eq!(*resolved.get::<String>("target").unwrap(), "steve");
        assert_eq!(*resolved.get::<i64>("amount").unwrap(), 42);
        // Wrong type downcasts to nothing rather than panicking.
        assert!(resolved.get::<i64>("target").is_none());
        assert!(resolved.get::<String>("missing").is_none());
    }
}

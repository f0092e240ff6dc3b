//! Case-insensitive enum resolution with a memoized variant table.
//!
//! Each distinct enum type gets one `{UPPERCASED_NAME -> value}` table,
//! built on first use and cached for the process lifetime behind a mutex:
//! registries are read-only after startup but the cache itself fills on
//! demand from potentially concurrent callers. Keys are stable type
//! identities, so nothing ever needs eviction.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use indexmap::IndexMap;

use crate::error::RegistrationError;
use crate::spec::{ArgValue, Resolver, SuggestionProvider};

/// An enum usable as a command argument type.
///
/// Implementors list every variant with its canonical name; resolution
/// matches typed text against the uppercased names.
pub trait NamedVariants: Any + Clone + Send + Sync {
    /// Type name used in failures and manifests.
    const NAME: &'static str;

    fn variants() -> Vec<(&'static str, Self)>;
}

type VariantTable = Arc<IndexMap<String, ArgValue>>;

static ENUM_CACHE: LazyLock<Mutex<HashMap<TypeId, VariantTable>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// The memoized `{UPPERCASED_NAME -> value}` table for `T`.
///
/// Built lazily once per distinct type. Colliding uppercased names are a
/// registration error.
pub fn enum_constants<T: NamedVariants>() -> Result<VariantTable, RegistrationError> {
    let mut cache = ENUM_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(table) = cache.get(&TypeId::of::<T>()) {
        return Ok(table.clone());
    }

    let mut table = IndexMap::new();
    for (name, value) in T::variants() {
        let upper = name.to_ascii_uppercase();
        if table
            .insert(upper.clone(), Arc::new(value) as ArgValue)
            .is_some()
        {
            return Err(RegistrationError::DuplicateEnumVariant {
                type_name: T::NAME,
                variant: upper,
            });
        }
    }

    let table = Arc::new(table);
    cache.insert(TypeId::of::<T>(), table.clone());
    Ok(table)
}

/// A resolver matching typed text case-insensitively against `T`'s
/// variants.
pub fn enum_resolver<S, T: NamedVariants>() -> Result<Resolver<S>, RegistrationError> {
    let table = enum_constants::<T>()?;
    Ok(Arc::new(move |_sender, raw| {
        table.get(&raw.to_ascii_uppercase()).cloned()
    }))
}

/// Suggests `T`'s variant names, lowercased, in declaration order.
pub fn enum_suggestions<S, T: NamedVariants>() -> SuggestionProvider<S> {
    let names: Vec<String> = T::variants()
        .iter()
        .map(|(name, _)| name.to_ascii_lowercase())
        .collect();
    Arc::new(move |_sender| names.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Color {
        Red,
        Green,
        Blue,
    }

    impl NamedVariants for Color {
        const NAME: &'static str = "Color";

        fn variants() -> Vec<(&'static str, Self)> {
            vec![
                ("RED", Color::Red),
                ("GREEN", Color::Green),
                ("BLUE", Color::Blue),
            ]
        }
    }

    #[derive(Clone, Debug)]
    enum Broken {
        A,
        AlsoA,
    }

    impl NamedVariants for Broken {
        const NAME: &'static str = "Broken";

        fn variants() -> Vec<(&'static str, Self)> {
            vec![("same", Broken::A), ("SAME", Broken::AlsoA)]
        }
    }

    #[test]
    fn resolution_is_case_insensitive() {
        let resolver = enum_resolver::<(), Color>().unwrap();
        let value = resolver(&(), "red").unwrap();
        assert_eq!(*value.downcast::<Color>().unwrap(), Color::Red);

        let value = resolver(&(), "BlUe").unwrap();
        assert_eq!(*value.downcast::<Color>().unwrap(), Color::Blue);

        assert!(resolver(&(), "magenta").is_none());
    }

    #[test]
    fn table_is_memoized_per_type() {
        let first = enum_constants::<Color>().unwrap();
        let second = enum_constants::<Color>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn colliding_variant_names_fail_registration() {
        let err = enum_constants::<Broken>().unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateEnumVariant {
                type_name: "Broken",
                variant: "SAME".to_string(),
            }
        );
    }

    #[test]
    fn suggestions_list_lowercased_variants() {
        let provider = enum_suggestions::<(), Color>();
        assert_eq!(provider(&()), vec!["red", "green", "blue"]);
    }
}

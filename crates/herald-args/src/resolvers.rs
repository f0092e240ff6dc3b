//! Built-in resolvers for the common value types.

use std::sync::Arc;

use crate::spec::{ArgValue, Resolver};

/// Accepts any text as a `String`.
pub fn string<S>() -> Resolver<S> {
    Arc::new(|_sender, raw| Some(Arc::new(raw.to_string()) as ArgValue))
}

/// Parses an `i64`.
pub fn int<S>() -> Resolver<S> {
    Arc::new(|_sender, raw| {
        raw.parse::<i64>()
            .ok()
            .map(|value| Arc::new(value) as ArgValue)
    })
}

/// Parses an `f64`.
pub fn float<S>() -> Resolver<S> {
    Arc::new(|_sender, raw| {
        raw.parse::<f64>()
            .ok()
            .map(|value| Arc::new(value) as ArgValue)
    })
}

/// Accepts `true`/`false`, case-insensitively.
pub fn bool<S>() -> Resolver<S> {
    Arc::new(|_sender, raw| match raw.to_ascii_lowercase().as_str() {
        "true" => Some(Arc::new(true) as ArgValue),
        "false" => Some(Arc::new(false) as ArgValue),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_rejects_garbage() {
        let resolver = int::<()>();
        assert!(resolver(&(), "17").is_some());
        assert!(resolver(&(), "seventeen").is_none());
    }

    #[test]
    fn bool_is_case_insensitive() {
        let resolver = bool::<()>();
        let value = resolver(&(), "TRUE").unwrap();
        assert_eq!(*value.downcast::<bool>().unwrap(), true);
        assert!(resolver(&(), "yes").is_none());
    }
}

//! Variable reference expansion for task environment overlays.
//!
//! Recognised references:
//!
//! - `$NAME` and `${NAME}`: replaced by the variable's value.
//! - `${NAME:-fallback}`: replaced by the value, or by `fallback` when the
//!   variable is not defined.
//!
//! A reference that cannot be resolved is left in the output verbatim and its
//! name is reported in [`Expansion::unresolved`]. Expansion never fails; the
//! caller decides whether unresolved names are fatal.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("variable reference pattern is valid")
});

/// The result of expanding one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub value: String,
    /// Names that could not be resolved, in order of first appearance.
    pub unresolved: Vec<String>,
}

/// Substitutes every reference in `input` using `lookup`.
pub fn expand<'a, F>(input: &str, lookup: F) -> Expansion
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut unresolved: Vec<String> = Vec::new();

    let value = REFERENCE
        .replace_all(input, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();

            if let Some(value) = lookup(name) {
                return value.to_string();
            }
            if let Some(fallback) = caps.get(2) {
                return fallback.as_str().to_string();
            }
            if !unresolved.iter().any(|n| n == name) {
                unresolved.push(name.to_string());
            }
            caps[0].to_string()
        })
        .into_owned();

    Expansion { value, unresolved }
}

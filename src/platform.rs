//! # Platform Validation
//!
//! Each feature may restrict the platforms it supports (`linux-64`,
//! `osx-arm64`, `win-64`, ...). An environment supports only the platforms
//! every one of its features supports, so its effective set is the
//! intersection of the restrictions. A feature without a restriction is the
//! identity element and does not narrow the result.
//!
//! When the intersection becomes empty, validation fails and names the first
//! feature in declared order whose restriction emptied it.

use indexmap::IndexSet;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// A set of platform identifiers, or the unrestricted universal set.
///
/// `Only` keeps insertion order: the order of the first restriction that
/// produced it, which is also the order target-specific dependencies are
/// applied in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlatformSet {
    #[default]
    Any,
    Only(IndexSet<String>),
}

impl PlatformSet {
    pub fn only<I, S>(platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PlatformSet::Only(platforms.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PlatformSet::Only(set) if set.is_empty())
    }

    pub fn contains(&self, platform: &str) -> bool {
        match self {
            PlatformSet::Any => true,
            PlatformSet::Only(set) => set.contains(platform),
        }
    }

    /// The explicit platforms of this set. `Any` has none to enumerate.
    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        let set = match self {
            PlatformSet::Any => None,
            PlatformSet::Only(set) => Some(set),
        };
        set.into_iter().flatten().map(String::as_str)
    }

    /// Intersects with one feature's restriction, keeping `self`'s order.
    pub fn intersect(&self, restriction: &IndexSet<String>) -> PlatformSet {
        match self {
            PlatformSet::Any => PlatformSet::Only(restriction.clone()),
            PlatformSet::Only(current) => PlatformSet::Only(
                current
                    .iter()
                    .filter(|p| restriction.contains(p.as_str()))
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// Every platform in either set, `self`'s platforms first.
    pub fn union(&self, other: &PlatformSet) -> PlatformSet {
        match (self, other) {
            (PlatformSet::Only(left), PlatformSet::Only(right)) => {
                PlatformSet::Only(left.iter().chain(right).cloned().collect())
            }
            _ => PlatformSet::Any,
        }
    }
}

impl Serialize for PlatformSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PlatformSet::Any => serializer.serialize_str("*"),
            PlatformSet::Only(set) => serializer.collect_seq(set),
        }
    }
}

/// Computes the effective platform set of `environment`.
///
/// `restrictions` lists each feature's name and optional restriction in
/// declared order. `universe` is where the fold starts: the workspace's
/// declared platforms, or `PlatformSet::Any` when it declares none.
pub fn validate<'a, I>(environment: &str, universe: &PlatformSet, restrictions: I) -> Result<PlatformSet>
where
    I: IntoIterator<Item = (&'a str, Option<&'a IndexSet<String>>)>,
{
    let mut effective = universe.clone();

    for (feature, restriction) in restrictions {
        let Some(restriction) = restriction else {
            continue;
        };
        let narrowed = effective.intersect(restriction);
        if narrowed.is_empty() {
            return Err(Error::UnsatisfiablePlatform {
                environment: environment.to_string(),
                feature: feature.to_string(),
                restriction: restriction.iter().cloned().collect(),
            });
        }
        effective = narrowed;
    }

    Ok(effective)
}

//! # Dependency Constraints
//!
//! A [`Constraint`] is the version-compatibility expression a feature attaches
//! to a dependency. It is one of:
//!
//! - `Any`: no restriction (`*`).
//! - `Range`: a lower and/or upper bound, each inclusive or exclusive.
//! - `Pin`: an exact build-string match, optionally narrowed by its own range.
//!
//! ## Syntax
//!
//! ```text
//! *                  any
//! >=1.26,<2          range
//! ==2.0.1  or 2.0.1  exact version (a closed single-point range)
//! 1.26.*             prefix, same as >=1.26,<1.27
//! @*openblas         build-string pin
//! >=3.10@*_cpython   build-string pin narrowed by a range
//! ```
//!
//! ## Merging
//!
//! [`ConstraintMerger::merge`] combines two constraints on the same dependency:
//! `Any` is the identity, ranges intersect, a pin survives a range only when
//! the two ranges still overlap, and two pins must name the same build. The
//! merge is commutative and associative; only the error it reports on a
//! conflict depends on argument order.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::version::{bump_prefix, SegmentedVersion, VersionComparator};

/// One end of a version range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bound {
    pub version: String,
    pub inclusive: bool,
}

impl Bound {
    pub fn inclusive(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            inclusive: true,
        }
    }

    pub fn exclusive(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            inclusive: false,
        }
    }
}

/// A possibly half-open interval of versions. `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl VersionRange {
    /// The range containing every version.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// The single-point range `[version, version]`.
    pub fn exact(version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            lower: Some(Bound::inclusive(version.clone())),
            upper: Some(Bound::inclusive(version)),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    /// True when no version can satisfy both bounds.
    pub fn is_empty(&self, cmp: &dyn VersionComparator) -> bool {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) => match cmp.compare(&lower.version, &upper.version) {
                Ordering::Greater => true,
                Ordering::Equal => !(lower.inclusive && upper.inclusive),
                Ordering::Less => false,
            },
            _ => false,
        }
    }

    pub fn contains(&self, version: &str, cmp: &dyn VersionComparator) -> bool {
        let above = self.lower.as_ref().is_none_or(|b| {
            match cmp.compare(version, &b.version) {
                Ordering::Greater => true,
                Ordering::Equal => b.inclusive,
                Ordering::Less => false,
            }
        });
        let below = self.upper.as_ref().is_none_or(|b| {
            match cmp.compare(version, &b.version) {
                Ordering::Less => true,
                Ordering::Equal => b.inclusive,
                Ordering::Greater => false,
            }
        });
        above && below
    }

    /// Intersects two ranges by keeping the tighter bound on each side.
    ///
    /// The result may be empty; callers check with [`VersionRange::is_empty`].
    pub fn intersect(&self, other: &Self, cmp: &dyn VersionComparator) -> Self {
        Self {
            lower: tighter(&self.lower, &other.lower, cmp, Ordering::Greater),
            upper: tighter(&self.upper, &other.upper, cmp, Ordering::Less),
        }
    }
}

/// Picks the bound that wins in the `wins` direction. Ties keep the
/// stricter inclusivity and the lexically smaller spelling so the choice
/// does not depend on argument order.
fn tighter(
    a: &Option<Bound>,
    b: &Option<Bound>,
    cmp: &dyn VersionComparator,
    wins: Ordering,
) -> Option<Bound> {
    match (a, b) {
        (None, None) => None,
        (Some(x), None) | (None, Some(x)) => Some(x.clone()),
        (Some(x), Some(y)) => {
            let ordering = cmp.compare(&x.version, &y.version);
            if ordering == wins {
                Some(x.clone())
            } else if ordering == Ordering::Equal {
                Some(Bound {
                    version: x.version.as_str().min(y.version.as_str()).to_string(),
                    inclusive: x.inclusive && y.inclusive,
                })
            } else {
                Some(y.clone())
            }
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.lower, &self.upper) {
            (None, None) => Ok(()),
            (Some(l), Some(u)) if l.inclusive && u.inclusive && l.version == u.version => {
                write!(f, "=={}", l.version)
            }
            (lower, upper) => {
                let mut parts = Vec::new();
                if let Some(l) = lower {
                    parts.push(format!("{}{}", if l.inclusive { ">=" } else { ">" }, l.version));
                }
                if let Some(u) = upper {
                    parts.push(format!("{}{}", if u.inclusive { "<=" } else { "<" }, u.version));
                }
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

/// A version-compatibility expression for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    Any,
    Range(VersionRange),
    Pin { build: String, range: VersionRange },
}

impl Constraint {
    /// Wraps a range, collapsing the unbounded range to `Any`.
    pub fn from_range(range: VersionRange) -> Self {
        if range.is_unbounded() {
            Constraint::Any
        } else {
            Constraint::Range(range)
        }
    }

    pub fn pin(build: impl Into<String>) -> Self {
        Constraint::Pin {
            build: build.into(),
            range: VersionRange::unbounded(),
        }
    }

    /// Parses a constraint, ordering versions with `cmp` when several
    /// comparators in one expression have to be intersected.
    pub fn parse_with(input: &str, cmp: &dyn VersionComparator) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidConstraint {
            input: input.to_string(),
            message: message.to_string(),
        };

        let trimmed = input.trim();
        let (range_part, build) = match trimmed.split_once('@') {
            Some((range, build)) => {
                let build = build.trim();
                if build.is_empty() {
                    return Err(invalid("empty build string after '@'"));
                }
                (range.trim(), Some(build.to_string()))
            }
            None => (trimmed, None),
        };

        let mut range = VersionRange::unbounded();
        if !(range_part.is_empty() || range_part == "*") {
            for clause in range_part.split(',') {
                let clause_range = parse_clause(clause.trim()).map_err(|m| invalid(&m))?;
                range = range.intersect(&clause_range, cmp);
            }
            if range.is_empty(cmp) {
                return Err(invalid("range admits no version"));
            }
        }

        Ok(match build {
            Some(build) => Constraint::Pin { build, range },
            None => Constraint::from_range(range),
        })
    }
}

fn parse_clause(clause: &str) -> std::result::Result<VersionRange, String> {
    let (op, version) = ["==", ">=", "<=", ">", "<"]
        .iter()
        .find_map(|op| clause.strip_prefix(*op).map(|rest| (*op, rest.trim())))
        .unwrap_or(("", clause));

    if version.is_empty() {
        return Err(format!("missing version in '{}'", clause));
    }
    if version
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '=' | '!' | '@' | ','))
    {
        return Err(format!("unsupported comparator in '{}'", clause));
    }

    let range = match op {
        ">=" => VersionRange {
            lower: Some(Bound::inclusive(version)),
            upper: None,
        },
        ">" => VersionRange {
            lower: Some(Bound::exclusive(version)),
            upper: None,
        },
        "<=" => VersionRange {
            lower: None,
            upper: Some(Bound::inclusive(version)),
        },
        "<" => VersionRange {
            lower: None,
            upper: Some(Bound::exclusive(version)),
        },
        "==" => VersionRange::exact(version),
        _ => match version.strip_suffix(".*") {
            Some(prefix) => {
                let upper = bump_prefix(prefix)
                    .ok_or_else(|| format!("cannot derive upper bound for '{}'", clause))?;
                VersionRange {
                    lower: Some(Bound::inclusive(prefix)),
                    upper: Some(Bound::exclusive(upper)),
                }
            }
            None if version == "*" => VersionRange::unbounded(),
            None => VersionRange::exact(version),
        },
    };
    Ok(range)
}

/// Parses with [`SegmentedVersion`] ordering. Workspace files are read
/// through this impl, so multi-clause ranges in a manifest are always
/// normalized with segmented ordering regardless of the comparator later used
/// for merging. Use [`Constraint::parse_with`] to pick another scheme.
impl FromStr for Constraint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Constraint::parse_with(s, &SegmentedVersion)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Any => write!(f, "*"),
            Constraint::Range(range) => write!(f, "{}", range),
            Constraint::Pin { build, range } => write!(f, "{}@{}", range, build),
        }
    }
}

impl Serialize for Constraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Merges constraints on the same dependency name.
pub struct ConstraintMerger<'a> {
    comparator: &'a dyn VersionComparator,
}

impl<'a> ConstraintMerger<'a> {
    pub fn new(comparator: &'a dyn VersionComparator) -> Self {
        Self { comparator }
    }

    /// Merges `a` (already accumulated) with `b` (incoming).
    ///
    /// Returns `Error::ConstraintConflict` naming `name` and both inputs when
    /// the constraints share no solution. The `feature` field is left empty
    /// for the caller to fill in.
    pub fn merge(&self, name: &str, a: &Constraint, b: &Constraint) -> Result<Constraint> {
        let cmp = self.comparator;
        let conflict = || Error::ConstraintConflict {
            dependency: name.to_string(),
            existing: a.to_string(),
            incoming: b.to_string(),
            feature: None,
        };

        match (a, b) {
            (Constraint::Any, other) | (other, Constraint::Any) => Ok(other.clone()),
            (Constraint::Range(x), Constraint::Range(y)) => {
                let merged = x.intersect(y, cmp);
                if merged.is_empty(cmp) {
                    return Err(conflict());
                }
                Ok(Constraint::from_range(merged))
            }
            (Constraint::Range(r), Constraint::Pin { build, range })
            | (Constraint::Pin { build, range }, Constraint::Range(r)) => {
                let merged = r.intersect(range, cmp);
                if merged.is_empty(cmp) {
                    return Err(conflict());
                }
                Ok(Constraint::Pin {
                    build: build.clone(),
                    range: merged,
                })
            }
            (
                Constraint::Pin {
                    build: left_build,
                    range: left_range,
                },
                Constraint::Pin {
                    build: right_build,
                    range: right_range,
                },
            ) => {
                if left_build != right_build {
                    return Err(conflict());
                }
                let merged = left_range.intersect(right_range, cmp);
                if merged.is_empty(cmp) {
                    return Err(conflict());
                }
                Ok(Constraint::Pin {
                    build: left_build.clone(),
                    range: merged,
                })
            }
        }
    }
}

//! # System Requirements
//!
//! System requirements are non-package preconditions a feature places on the
//! machine it runs on, such as a minimum CUDA driver or glibc version. When
//! several features of one environment declare the same requirement key, the
//! values are merged according to the key's [`MergePolicy`]:
//!
//! - `max`: keep the greater value. Used for "at least version X" keys, so
//!   composing two features yields the stricter minimum.
//! - `equal-or-fail`: both values must be identical. Used for discrete,
//!   non-orderable choices such as the libc family.
//! - `and`: boolean conjunction. Used for capability flags.
//!
//! Keys without a declared policy use `equal-or-fail`.

use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};
use crate::version::VersionComparator;

/// The value a feature declares for one requirement key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RequirementValue {
    Flag(bool),
    Version(String),
}

impl fmt::Display for RequirementValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementValue::Flag(flag) => write!(f, "{}", flag),
            RequirementValue::Version(version) => write!(f, "{}", version),
        }
    }
}

impl From<bool> for RequirementValue {
    fn from(flag: bool) -> Self {
        RequirementValue::Flag(flag)
    }
}

impl From<&str> for RequirementValue {
    fn from(version: &str) -> Self {
        RequirementValue::Version(version.to_string())
    }
}

impl<'de> Deserialize<'de> for RequirementValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Unquoted versions such as `cuda: 12` arrive as numbers. A bare
        // decimal has already lost its spelling (`4.10` parses as 4.1), so it
        // is rejected rather than guessed at.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Integer(u64),
            Float(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(flag) => Ok(RequirementValue::Flag(flag)),
            Raw::Integer(n) => Ok(RequirementValue::Version(n.to_string())),
            Raw::Float(x) => Err(de::Error::custom(format_args!(
                "requirement version {x} is an unquoted number and may have lost digits; \
                 quote it (for example \"4.10\" instead of 4.10)"
            ))),
            Raw::Text(text) => Ok(RequirementValue::Version(text)),
        }
    }
}

/// How two values for the same requirement key combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    Max,
    EqualOrFail,
    And,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MergePolicy::Max => "max",
            MergePolicy::EqualOrFail => "equal-or-fail",
            MergePolicy::And => "and",
        };
        write!(f, "{}", name)
    }
}

/// The merge policy declared for each requirement key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementPolicies {
    policies: IndexMap<String, MergePolicy>,
}

impl RequirementPolicies {
    /// A catalog with no declared keys; every key falls back to
    /// `equal-or-fail`.
    pub fn empty() -> Self {
        Self {
            policies: IndexMap::new(),
        }
    }

    /// Declares (or redeclares) the policy for `key`.
    pub fn declare(&mut self, key: impl Into<String>, policy: MergePolicy) -> &mut Self {
        self.policies.insert(key.into(), policy);
        self
    }

    pub fn policy_for(&self, key: &str) -> MergePolicy {
        self.policies
            .get(key)
            .copied()
            .unwrap_or(MergePolicy::EqualOrFail)
    }
}

impl Default for RequirementPolicies {
    /// Built-in policies for the well-known requirement keys.
    fn default() -> Self {
        let mut catalog = Self::empty();
        catalog
            .declare("cuda", MergePolicy::Max)
            .declare("linux", MergePolicy::Max)
            .declare("macos", MergePolicy::Max)
            .declare("libc", MergePolicy::Max)
            .declare("libc-family", MergePolicy::EqualOrFail)
            .declare("archspec", MergePolicy::EqualOrFail);
        catalog
    }
}

/// Merges requirement values per key under the declared policies.
pub struct RequirementMerger<'a> {
    policies: &'a RequirementPolicies,
    comparator: &'a dyn VersionComparator,
}

impl<'a> RequirementMerger<'a> {
    pub fn new(policies: &'a RequirementPolicies, comparator: &'a dyn VersionComparator) -> Self {
        Self {
            policies,
            comparator,
        }
    }

    /// Merges `a` (already accumulated) with `b` (incoming) for `key`.
    pub fn merge(
        &self,
        key: &str,
        a: &RequirementValue,
        b: &RequirementValue,
    ) -> Result<RequirementValue> {
        let policy = self.policies.policy_for(key);
        let conflict = || Error::RequirementConflict {
            key: key.to_string(),
            policy: policy.to_string(),
            existing: a.to_string(),
            incoming: b.to_string(),
            feature: None,
        };

        match (policy, a, b) {
            (MergePolicy::Max, RequirementValue::Version(x), RequirementValue::Version(y)) => {
                let winner = match self.comparator.compare(x, y) {
                    Ordering::Greater => x,
                    Ordering::Less => y,
                    Ordering::Equal => x.min(y),
                };
                Ok(RequirementValue::Version(winner.clone()))
            }
            (MergePolicy::Max, RequirementValue::Flag(x), RequirementValue::Flag(y)) => {
                Ok(RequirementValue::Flag(*x || *y))
            }
            (MergePolicy::And, RequirementValue::Flag(x), RequirementValue::Flag(y)) => {
                Ok(RequirementValue::Flag(*x && *y))
            }
            (MergePolicy::EqualOrFail, x, y) if x == y => Ok(x.clone()),
            _ => Err(conflict()),
        }
    }
}

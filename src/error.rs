//! # Error Handling
//!
//! This module defines the single error type used by every part of the
//! `envcompose` library. It uses `thiserror` to derive `Display` for each
//! variant from the structured data the variant carries.
//!
//! ## Key Components
//!
//! - **`Error`**: Every failure the engine can report. Resolution errors name
//!   the feature, dependency, requirement key or task involved and, for merge
//!   conflicts, both conflicting values. No variant is a bare message.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Errors fall into three groups:
//!
//! - Store and reference errors: `UnknownFeature`, `DuplicateFeature`,
//!   `StoreFrozen`, `DuplicateKey`.
//! - Merge errors raised while resolving one environment:
//!   `UnsatisfiablePlatform`, `ConstraintConflict`, `RequirementConflict`.
//! - Task errors: `UnknownTask`, `CycleDetected`.
//!
//! Loading the serialized data model adds `ConfigParse`, `InvalidConstraint`
//! and the wrapped `Io`, `Yaml` and `Toml` errors.

use thiserror::Error;

/// Main error type for envcompose operations
#[derive(Error, Debug)]
pub enum Error {
    /// A feature name was looked up (directly or through an environment
    /// declaration) but is not registered in the store.
    #[error("Unknown feature '{name}'{}", environment.as_ref().map(|e| format!(" referenced by environment '{}'", e)).unwrap_or_default())]
    UnknownFeature {
        name: String,
        /// The environment whose declaration referenced the feature, if any
        environment: Option<String>,
    },

    /// A feature with the same name is already registered.
    #[error("Feature '{name}' is already registered")]
    DuplicateFeature { name: String },

    /// The store was mutated after the first resolution froze it.
    #[error("Feature store is frozen; cannot register '{name}' after resolution has started")]
    StoreFrozen { name: String },

    /// The intersection of the environment's platform restrictions is empty.
    ///
    /// `feature` is the first feature, in declared order, whose restriction
    /// emptied the intersection.
    #[error("Environment '{environment}' supports no platform: feature '{feature}' restricts to [{}] which excludes every remaining platform", restriction.join(", "))]
    UnsatisfiablePlatform {
        environment: String,
        feature: String,
        restriction: Vec<String>,
    },

    /// Two constraints on the same dependency have no common solution.
    #[error("Conflicting constraints for dependency '{dependency}': '{existing}' vs '{incoming}'{}", feature.as_ref().map(|f| format!(" (from feature '{}')", f)).unwrap_or_default())]
    ConstraintConflict {
        dependency: String,
        existing: String,
        incoming: String,
        /// The feature contributing the incoming constraint, when known
        feature: Option<String>,
    },

    /// Two values for the same system requirement cannot be merged under the
    /// key's merge policy.
    #[error("Conflicting system requirement '{key}' ({policy}): '{existing}' vs '{incoming}'{}", feature.as_ref().map(|f| format!(" (from feature '{}')", f)).unwrap_or_default())]
    RequirementConflict {
        key: String,
        policy: String,
        existing: String,
        incoming: String,
        /// The feature contributing the incoming value, when known
        feature: Option<String>,
    },

    /// A task was requested that the resolved environment does not define.
    #[error("Unknown task '{task}' in environment '{environment}'")]
    UnknownTask { environment: String, task: String },

    /// Task dependencies form a cycle.
    #[error("Cycle detected in task dependencies: {cycle}")]
    CycleDetected { cycle: String },

    /// A mapping contained the same key twice.
    #[error("Duplicate key '{key}' in {context}")]
    DuplicateKey { key: String, context: String },

    /// A constraint expression could not be parsed.
    #[error("Invalid constraint '{input}': {message}")]
    InvalidConstraint { input: String, message: String },

    /// The serialized data model could not be loaded.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

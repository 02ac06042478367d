//! # Environment Resolution
//!
//! Turns a declared environment (a name plus an ordered feature list) into a
//! [`ResolvedEnvironment`] snapshot. Resolution is a pure function of the
//! declaration and the [`FeatureStore`]; it performs no I/O and mutates
//! nothing except freezing the store.
//!
//! ## Process
//!
//! The steps always run in this order, so both the result and the error
//! reported for a broken environment are deterministic:
//!
//! 1.  **Feature lookup**: every referenced feature is fetched from the store.
//!     The first missing name fails with `UnknownFeature`.
//! 2.  **Platforms**: the platform restrictions are intersected in declared
//!     order (see [`crate::platform`]).
//! 3.  **Dependencies**: folded left to right with the constraint merger. For
//!     each feature its base dependencies come first, then its
//!     target-specific dependencies for each effective platform.
//! 4.  **System requirements**: folded left to right with the requirement
//!     merger.
//! 5.  **Activation variables**: folded left to right, the later feature
//!     winning.
//! 6.  **Tasks**: folded left to right. A task defined by a later feature
//!     replaces an earlier definition of the same name ("last declared
//!     wins"), and the winning feature is recorded as provenance.
//!
//! Any error aborts the environment; no partial snapshot is returned.
//! [`Resolver::resolve_all`] resolves many environments in parallel and keeps
//! each environment's failure to itself.

use indexmap::IndexMap;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::constraint::{Constraint, ConstraintMerger};
use crate::error::{Error, Result};
use crate::model::{EnvironmentDecl, Feature, TaskDefinition};
use crate::platform::{self, PlatformSet};
use crate::requirement::{RequirementMerger, RequirementValue};
use crate::store::FeatureStore;
use crate::version::{SegmentedVersion, VersionComparator};

/// A merged value together with the feature that contributed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sourced<T> {
    pub value: T,
    pub feature: String,
}

/// The immutable result of resolving one environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEnvironment {
    pub name: String,
    /// The features that were composed, in precedence order.
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solve_group: Option<String>,
    pub platforms: PlatformSet,
    pub dependencies: IndexMap<String, Constraint>,
    pub system_requirements: IndexMap<String, RequirementValue>,
    pub activation_env: IndexMap<String, Sourced<String>>,
    pub tasks: IndexMap<String, Sourced<TaskDefinition>>,
}

impl ResolvedEnvironment {
    pub fn task(&self, name: &str) -> Result<&Sourced<TaskDefinition>> {
        self.tasks.get(name).ok_or_else(|| Error::UnknownTask {
            environment: self.name.clone(),
            task: name.to_string(),
        })
    }
}

/// Per-environment outcome of a batch resolution, in declaration order.
pub type BatchResolution = IndexMap<String, Result<ResolvedEnvironment>>;

/// Resolves environments against one store.
pub struct Resolver<'a> {
    store: &'a FeatureStore,
    comparator: Box<dyn VersionComparator>,
}

impl<'a> Resolver<'a> {
    /// A resolver using [`SegmentedVersion`] ordering.
    pub fn new(store: &'a FeatureStore) -> Self {
        Self {
            store,
            comparator: Box::new(SegmentedVersion),
        }
    }

    pub fn with_comparator(mut self, comparator: impl VersionComparator + 'static) -> Self {
        self.comparator = Box::new(comparator);
        self
    }

    pub fn comparator(&self) -> &dyn VersionComparator {
        self.comparator.as_ref()
    }

    /// Resolves a single environment declaration.
    pub fn resolve(&self, decl: &EnvironmentDecl) -> Result<ResolvedEnvironment> {
        self.store.freeze();

        let features = self.store.features_for(decl)?;
        debug!(
            "Resolving environment '{}' from features [{}]",
            decl.name,
            features
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let platforms = platform::validate(
            &decl.name,
            self.store.platforms(),
            features
                .iter()
                .map(|f| (f.name.as_str(), f.platforms.as_ref())),
        )?;

        let dependencies = self.fold_dependencies(&features, &platforms)?;
        let system_requirements = self.fold_requirements(&features)?;
        let activation_env = fold_last_wins(&features, |f| &f.activation_env);
        let tasks = fold_tasks(&decl.name, &features);

        info!(
            "Resolved environment '{}': {} dependencies, {} tasks",
            decl.name,
            dependencies.len(),
            tasks.len()
        );

        Ok(ResolvedEnvironment {
            name: decl.name.clone(),
            features: features.iter().map(|f| f.name.clone()).collect(),
            solve_group: decl.solve_group.clone(),
            platforms,
            dependencies,
            system_requirements,
            activation_env,
            tasks,
        })
    }

    /// Resolves every declaration in parallel.
    ///
    /// The result is keyed by environment name in declaration order. One
    /// environment failing does not affect the others.
    pub fn resolve_all(&self, decls: &[EnvironmentDecl]) -> BatchResolution {
        self.store.freeze();

        let results: Vec<(String, Result<ResolvedEnvironment>)> = decls
            .par_iter()
            .map(|decl| (decl.name.clone(), self.resolve(decl)))
            .collect();

        for (name, result) in &results {
            if let Err(e) = result {
                warn!("Environment '{}' failed to resolve: {}", name, e);
            }
        }

        results.into_iter().collect()
    }

    fn fold_dependencies(
        &self,
        features: &[&Feature],
        platforms: &PlatformSet,
    ) -> Result<IndexMap<String, Constraint>> {
        let merger = ConstraintMerger::new(self.comparator.as_ref());
        let mut merged: IndexMap<String, Constraint> = IndexMap::new();

        for feature in features {
            let targets = platforms
                .platforms()
                .filter_map(|p| feature.target_dependencies.get(p));

            for deps in std::iter::once(&feature.dependencies).chain(targets) {
                for (name, constraint) in deps {
                    let next = match merged.get(name) {
                        Some(existing) => merger
                            .merge(name, existing, constraint)
                            .map_err(|e| attribute(e, &feature.name))?,
                        None => constraint.clone(),
                    };
                    merged.insert(name.clone(), next);
                }
            }
        }
        Ok(merged)
    }

    fn fold_requirements(&self, features: &[&Feature]) -> Result<IndexMap<String, RequirementValue>> {
        let merger = RequirementMerger::new(self.store.requirement_policies(), self.comparator.as_ref());
        let mut merged: IndexMap<String, RequirementValue> = IndexMap::new();

        for feature in features {
            for (key, value) in &feature.system_requirements {
                let next = match merged.get(key) {
                    Some(existing) => merger
                        .merge(key, existing, value)
                        .map_err(|e| attribute(e, &feature.name))?,
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
        }
        Ok(merged)
    }
}

/// Resolves one declaration with default settings.
pub fn resolve(decl: &EnvironmentDecl, store: &FeatureStore) -> Result<ResolvedEnvironment> {
    Resolver::new(store).resolve(decl)
}

/// Resolves many declarations with default settings.
pub fn resolve_all(decls: &[EnvironmentDecl], store: &FeatureStore) -> BatchResolution {
    Resolver::new(store).resolve_all(decls)
}

/// Records which feature introduced the conflicting value.
fn attribute(error: Error, feature: &str) -> Error {
    match error {
        Error::ConstraintConflict {
            dependency,
            existing,
            incoming,
            ..
        } => Error::ConstraintConflict {
            dependency,
            existing,
            incoming,
            feature: Some(feature.to_string()),
        },
        Error::RequirementConflict {
            key,
            policy,
            existing,
            incoming,
            ..
        } => Error::RequirementConflict {
            key,
            policy,
            existing,
            incoming,
            feature: Some(feature.to_string()),
        },
        other => other,
    }
}

fn fold_last_wins<V, F>(features: &[&Feature], field: F) -> IndexMap<String, Sourced<V>>
where
    V: Clone,
    F: Fn(&Feature) -> &IndexMap<String, V>,
{
    let mut merged = IndexMap::new();
    for feature in features {
        for (key, value) in field(*feature) {
            merged.insert(
                key.clone(),
                Sourced {
                    value: value.clone(),
                    feature: feature.name.clone(),
                },
            );
        }
    }
    merged
}

/// Last declared wins: a later feature's task replaces an earlier one.
fn fold_tasks(environment: &str, features: &[&Feature]) -> IndexMap<String, Sourced<TaskDefinition>> {
    let mut tasks: IndexMap<String, Sourced<TaskDefinition>> = IndexMap::new();
    for feature in features {
        for (name, definition) in &feature.tasks {
            let winner = Sourced {
                value: definition.clone(),
                feature: feature.name.clone(),
            };
            if let Some(shadowed) = tasks.insert(name.clone(), winner) {
                debug!(
                    "Environment '{}': task '{}' from feature '{}' shadows the one from '{}'",
                    environment, name, feature.name, shadowed.feature
                );
            }
        }
    }
    tasks
}

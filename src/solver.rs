//! # Dependency Solver Interface
//!
//! Package solving is not done here. This module turns resolved environments
//! into [`SolveRequest`]s for an external [`DependencySolver`].
//!
//! Environments that share a solve group are combined into one request so
//! they end up with the same package versions: their constraints are merged
//! with the constraint merger and their platform sets are united. An
//! environment without a solve group forms a request of its own, named after
//! the environment.

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use crate::constraint::{Constraint, ConstraintMerger};
use crate::error::Result;
use crate::platform::PlatformSet;
use crate::resolver::ResolvedEnvironment;
use crate::version::VersionComparator;

/// What the solver is asked to satisfy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveRequest {
    /// The solve group, or the environment name for ungrouped environments.
    pub group: String,
    pub environments: Vec<String>,
    pub platforms: PlatformSet,
    pub dependencies: IndexMap<String, Constraint>,
}

/// An external package solver.
///
/// The solution and conflict report are opaque to this crate.
pub trait DependencySolver {
    type Solution;
    type Conflict;

    fn solve(&self, request: &SolveRequest) -> std::result::Result<Self::Solution, Self::Conflict>;
}

/// Builds one request per solve group, in order of each group's first
/// environment.
pub fn solve_requests(
    environments: &[ResolvedEnvironment],
    comparator: &dyn VersionComparator,
) -> Result<Vec<SolveRequest>> {
    let merger = ConstraintMerger::new(comparator);
    let mut requests: IndexMap<String, SolveRequest> = IndexMap::new();

    for environment in environments {
        let group = environment
            .solve_group
            .clone()
            .unwrap_or_else(|| environment.name.clone());

        let Some(request) = requests.get_mut(&group) else {
            requests.insert(
                group.clone(),
                SolveRequest {
                    group,
                    environments: vec![environment.name.clone()],
                    platforms: environment.platforms.clone(),
                    dependencies: environment.dependencies.clone(),
                },
            );
            continue;
        };

        debug!(
            "Adding environment '{}' to solve group '{}'",
            environment.name, request.group
        );
        request.environments.push(environment.name.clone());
        request.platforms = request.platforms.union(&environment.platforms);
        for (name, constraint) in &environment.dependencies {
            let next = match request.dependencies.get(name) {
                Some(existing) => merger.merge(name, existing, constraint)?,
                None => constraint.clone(),
            };
            request.dependencies.insert(name.clone(), next);
        }
    }

    Ok(requests.into_values().collect())
}

//! # envcompose
//!
//! A feature composition and environment resolution engine. A workspace
//! declares named **features** (dependency constraints, platform
//! restrictions, system requirements, activation variables and tasks) and
//! named **environments**, each an ordered list of features. This library
//! computes, for every environment, its effective platforms, merged
//! dependency constraints, merged system requirements and task table, and
//! materializes any task of it into an executable descriptor.
//!
//! ## Quick Example
//!
//! ```
//! use envcompose::model::{EnvironmentDecl, Feature, TaskDefinition};
//! use envcompose::resolver::resolve;
//! use envcompose::store::FeatureStore;
//!
//! let mut store = FeatureStore::new();
//! store
//!     .register(
//!         Feature::new("build")
//!             .with_dependency("numpy", ">=1.23")
//!             .unwrap()
//!             .with_task("build", TaskDefinition::new("meson compile"))
//!             .unwrap(),
//!     )
//!     .unwrap();
//! store
//!     .register(Feature::new("openblas").with_dependency("libblas", "@*openblas").unwrap())
//!     .unwrap();
//!
//! let env = resolve(&EnvironmentDecl::new("default", ["build", "openblas"]), &store).unwrap();
//! assert_eq!(env.dependencies.len(), 2);
//! assert_eq!(env.tasks["build"].feature, "build");
//! ```
//!
//! ## Core Concepts
//!
//! - **Constraints (`constraint`, `version`)**: version ranges and build
//!   pins, merged by intersection, with a pluggable version ordering.
//! - **Requirements (`requirement`)**: system requirements merged per key
//!   under `max`, `equal-or-fail` or `and` policies.
//! - **Platforms (`platform`)**: intersection of per-feature restrictions.
//! - **Store (`store`)**: the write-once registry of features.
//! - **Resolver (`resolver`)**: folds the features of one environment, in
//!   declared order, into an immutable snapshot.
//! - **Tasks (`task`, `expand`)**: turns a resolved task into a command,
//!   working directory and expanded environment map.
//! - **Solver interface (`solver`)**: requests for an external package
//!   solver, grouped by solve group.
//! - **Workspace loading (`config`)**: reads the serialized data model.
//!
//! Everything except `config` is pure computation: no I/O, no global state.

pub mod config;
pub mod constraint;
pub mod defaults;
pub mod error;
pub mod expand;
pub mod model;
pub mod output;
pub mod platform;
pub mod requirement;
pub mod resolver;
pub mod solver;
pub mod store;
pub mod suggestions;
pub mod task;
pub mod version;

#[cfg(test)]
mod merge_proptest;

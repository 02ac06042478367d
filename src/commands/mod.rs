//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `envcompose` command-line tool, one file per subcommand.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the shared
//!   [`Context`] and performs the command's logic by calling into the
//!   `envcompose` library.
//!
//! The helpers below are shared by every command that reads a workspace.

pub mod completions;
pub mod features;
pub mod plan;
pub mod resolve;
pub mod task;
pub mod tree;
pub mod validate;

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::path::PathBuf;

use envcompose::config::{self, Workspace};
use envcompose::model::EnvironmentDecl;
use envcompose::resolver::Resolver;
use envcompose::store::FeatureStore;
use envcompose::suggestions;
use envcompose::version::{SegmentedVersion, SemverComparator};

/// Values of the global flags every command may need.
#[derive(Debug, Clone)]
pub struct Context {
    pub manifest: PathBuf,
    pub color: String,
}

impl Context {
    /// Reads and checks the workspace file.
    pub fn load_workspace(&self) -> Result<Workspace> {
        if !self.manifest.exists() {
            return Err(suggestions::manifest_not_found(&self.manifest));
        }
        config::from_file(&self.manifest)
            .with_context(|| format!("Failed to load workspace {}", self.manifest.display()))
    }
}

/// Looks up an environment declaration by name.
pub fn select_environment<'w>(workspace: &'w Workspace, name: &str) -> Result<&'w EnvironmentDecl> {
    workspace
        .environment(name)
        .ok_or_else(|| suggestions::unknown_environment(name, workspace.environment_names()))
}

/// How version strings are ordered during merging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum VersionScheme {
    /// Dot-separated segments, numeric where possible
    #[default]
    Segmented,
    /// Semantic versioning, falling back to segmented
    Semver,
}

impl VersionScheme {
    pub fn resolver<'a>(&self, store: &'a FeatureStore) -> Resolver<'a> {
        match self {
            VersionScheme::Segmented => Resolver::new(store).with_comparator(SegmentedVersion),
            VersionScheme::Semver => Resolver::new(store).with_comparator(SemverComparator),
        }
    }
}

/// Serialization format for machine-readable output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(match self {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(value)?;
                json.push('\n');
                json
            }
        })
    }
}

//! # Workspace Model Loading
//!
//! This module loads the already-parsed data model the engine consumes: the
//! workspace's platforms, its features, its environment declarations and any
//! extra requirement merge policies. The model is a plain serialization of
//! those types, read from YAML or TOML depending on the file extension.
//!
//! ## Example
//!
//! ```yaml
//! platforms: [linux-64, osx-arm64, win-64]
//! requirement-policies:
//!   avx512: and
//! features:
//!   - name: build
//!     dependencies:
//!       numpy: ">=1.23"
//!     tasks:
//!       build:
//!         cmd: meson compile -C build
//!   - name: openblas
//!     dependencies:
//!       libblas: "@*openblas"
//! environments:
//!   - name: default
//!     features: [build, openblas]
//! ```
//!
//! Loading checks the structural invariants that do not depend on any one
//! environment: feature names are unique (`DuplicateFeature`), environment
//! names are unique (`DuplicateKey`), and no mapping repeats a key. Feature
//! references inside environments are checked later, per environment, so one
//! broken environment does not hide the others.

use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{EnvironmentDecl, Feature};
use crate::platform::PlatformSet;
use crate::requirement::{MergePolicy, RequirementPolicies};
use crate::store::{FeatureStore, DEFAULT_FEATURE};

/// The name of the environment implicitly declared when a `default`
/// feature exists but no `default` environment does.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// The serialized form of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct WorkspaceModel {
    /// Platforms the workspace targets. Unrestricted features support all
    /// of them. Omit to leave unrestricted environments unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<IndexSet<String>>,

    /// Policies declared on top of the built-in ones.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub requirement_policies: IndexMap<String, MergePolicy>,

    #[serde(default)]
    pub features: Vec<Feature>,

    #[serde(default)]
    pub environments: Vec<EnvironmentDecl>,
}

/// A loaded workspace: a populated store plus its environment declarations.
#[derive(Debug)]
pub struct Workspace {
    pub store: FeatureStore,
    pub environments: Vec<EnvironmentDecl>,
}

impl Workspace {
    /// Builds the store and checks the structural invariants.
    pub fn from_model(model: WorkspaceModel) -> Result<Self> {
        let mut policies = RequirementPolicies::default();
        for (key, policy) in model.requirement_policies {
            policies.declare(key, policy);
        }

        let platforms = match model.platforms {
            Some(platforms) => PlatformSet::Only(platforms),
            None => PlatformSet::Any,
        };

        let mut store = FeatureStore::new()
            .with_platforms(platforms)
            .with_requirement_policies(policies);
        for feature in model.features {
            store.register(feature)?;
        }

        let mut environments = model.environments;
        let mut seen = IndexSet::new();
        for decl in &environments {
            if !seen.insert(decl.name.as_str()) {
                return Err(Error::DuplicateKey {
                    key: decl.name.clone(),
                    context: "environments".to_string(),
                });
            }
        }

        if store.contains(DEFAULT_FEATURE) && !seen.contains(DEFAULT_ENVIRONMENT) {
            debug!("Adding implicit '{}' environment", DEFAULT_ENVIRONMENT);
            environments.insert(0, EnvironmentDecl::new(DEFAULT_ENVIRONMENT, Vec::<String>::new()));
        }

        Ok(Self {
            store,
            environments,
        })
    }

    pub fn environment(&self, name: &str) -> Option<&EnvironmentDecl> {
        self.environments.iter().find(|e| e.name == name)
    }

    pub fn environment_names(&self) -> impl Iterator<Item = &str> {
        self.environments.iter().map(|e| e.name.as_str())
    }
}

/// Parses a workspace model from YAML.
pub fn parse_yaml(content: &str) -> Result<WorkspaceModel> {
    Ok(serde_yaml::from_str(content)?)
}

/// Parses a workspace model from TOML.
pub fn parse_toml(content: &str) -> Result<WorkspaceModel> {
    Ok(toml::from_str(content)?)
}

/// Loads a workspace from a `.yaml`, `.yml` or `.toml` file.
pub fn from_file(path: &Path) -> Result<Workspace> {
    let content = std::fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let model = match extension.as_deref() {
        Some("yaml") | Some("yml") => parse_yaml(&content)?,
        Some("toml") => parse_toml(&content)?,
        _ => {
            return Err(Error::ConfigParse {
                message: format!("unsupported workspace file '{}'", path.display()),
                hint: Some("Use a .yaml, .yml or .toml file".to_string()),
            })
        }
    };

    debug!(
        "Loaded workspace model from {}: {} features, {} environments",
        path.display(),
        model.features.len(),
        model.environments.len()
    );
    Workspace::from_model(model)
}

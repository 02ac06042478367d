//! # Feature Store
//!
//! The in-memory registry of every declared feature, keyed by name, together
//! with the workspace-wide settings resolution needs: the declared platform
//! universe and the requirement merge policies.
//!
//! The store is write-once-then-read-many. All `register` calls happen while
//! the store is being built; the first resolution freezes it, after which
//! `register` fails with `Error::StoreFrozen`. A frozen store is never
//! mutated, so it can be shared by reference across resolver threads.
//!
//! The store is an explicit value handed to the resolver. Nothing here is
//! process-global, so several stores (for instance one per test fixture) can
//! coexist.

use indexmap::IndexMap;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};
use crate::model::{EnvironmentDecl, Feature};
use crate::platform::PlatformSet;
use crate::requirement::RequirementPolicies;

/// The name of the feature implicitly included in every environment.
pub const DEFAULT_FEATURE: &str = "default";

#[derive(Debug, Default)]
pub struct FeatureStore {
    features: IndexMap<String, Feature>,
    platforms: PlatformSet,
    policies: RequirementPolicies,
    frozen: AtomicBool,
}

impl FeatureStore {
    /// An empty store with no platform universe and the built-in
    /// requirement policies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the workspace's declared platforms. Unrestricted features
    /// contribute this set instead of the universal set.
    pub fn with_platforms(mut self, platforms: PlatformSet) -> Self {
        self.platforms = platforms;
        self
    }

    pub fn with_requirement_policies(mut self, policies: RequirementPolicies) -> Self {
        self.policies = policies;
        self
    }

    /// Adds a feature.
    ///
    /// Fails with `DuplicateFeature` if the name is taken and with
    /// `StoreFrozen` once any environment has been resolved against the store.
    pub fn register(&mut self, feature: Feature) -> Result<()> {
        if *self.frozen.get_mut() {
            return Err(Error::StoreFrozen { name: feature.name });
        }
        if self.features.contains_key(&feature.name) {
            return Err(Error::DuplicateFeature { name: feature.name });
        }
        debug!("Registering feature '{}'", feature.name);
        self.features.insert(feature.name.clone(), feature);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Feature> {
        self.features.get(name).ok_or_else(|| Error::UnknownFeature {
            name: name.to_string(),
            environment: None,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    /// All registered features in registration order.
    ///
    /// The iterator is `Clone`, so it can be restarted. It exists for
    /// diagnostics; merge order always comes from an environment's
    /// declared feature list.
    pub fn all(&self) -> impl Iterator<Item = &Feature> + Clone + '_ {
        self.features.values()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn platforms(&self) -> &PlatformSet {
        &self.platforms
    }

    pub fn requirement_policies(&self) -> &RequirementPolicies {
        &self.policies
    }

    /// Prevents any further registration.
    pub fn freeze(&self) {
        if !self.frozen.swap(true, Ordering::AcqRel) {
            debug!("Feature store frozen with {} features", self.features.len());
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// The feature names `decl` composes, in precedence order.
    ///
    /// The `default` feature, when registered, is prepended (lowest
    /// precedence) unless the declaration opts out or already lists it.
    /// Repeating a name in one declaration is rejected.
    pub fn effective_feature_names<'d>(&self, decl: &'d EnvironmentDecl) -> Result<Vec<&'d str>> {
        let mut names: Vec<&'d str> = Vec::with_capacity(decl.features.len() + 1);
        let lists_default = decl.features.iter().any(|f| f == DEFAULT_FEATURE);
        if !decl.no_default_feature && !lists_default && self.contains(DEFAULT_FEATURE) {
            names.push(DEFAULT_FEATURE);
        }

        for name in &decl.features {
            if names.contains(&name.as_str()) {
                return Err(Error::DuplicateKey {
                    key: name.clone(),
                    context: format!("feature list of environment '{}'", decl.name),
                });
            }
            names.push(name.as_str());
        }
        Ok(names)
    }

    /// Looks up every feature `decl` composes, in precedence order.
    ///
    /// Fails on the first name that is not registered, naming it and the
    /// environment.
    pub fn features_for(&self, decl: &EnvironmentDecl) -> Result<Vec<&Feature>> {
        self.effective_feature_names(decl)?
            .into_iter()
            .map(|name| {
                self.features.get(name).ok_or_else(|| Error::UnknownFeature {
                    name: name.to_string(),
                    environment: Some(decl.name.clone()),
                })
            })
            .collect()
    }
}

//! # Data Model
//!
//! The declared inputs of the engine: [`Feature`]s, their
//! [`TaskDefinition`]s, and [`EnvironmentDecl`]s composing features by name.
//!
//! Every mapping is an `IndexMap` so declaration order survives, and every
//! mapping rejects duplicate keys when it is built, whether through the
//! `with_*` builders (`Error::DuplicateKey`) or through deserialization.

use indexmap::{IndexMap, IndexSet};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::path::PathBuf;

use crate::constraint::Constraint;
use crate::error::{Error, Result};
use crate::requirement::RequirementValue;

/// Dependency name to constraint, in declaration order.
pub type DependencyMap = IndexMap<String, Constraint>;

/// A named, independently composable bundle of platform restriction,
/// dependency constraints, system requirements, activation variables and
/// tasks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Feature {
    pub name: String,

    /// `None` means the feature runs everywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<IndexSet<String>>,

    #[serde(default, deserialize_with = "unique_map")]
    pub dependencies: DependencyMap,

    /// Extra dependencies applied only when the platform is part of the
    /// environment's effective platform set.
    #[serde(default, deserialize_with = "unique_nested_map")]
    pub target_dependencies: IndexMap<String, DependencyMap>,

    #[serde(default, deserialize_with = "unique_map")]
    pub system_requirements: IndexMap<String, RequirementValue>,

    /// Variables exported by every task of an environment using this feature.
    #[serde(default, deserialize_with = "unique_map")]
    pub activation_env: IndexMap<String, String>,

    #[serde(default, deserialize_with = "unique_map")]
    pub tasks: IndexMap<String, TaskDefinition>,
}

impl Feature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = Some(platforms.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_dependency(mut self, name: &str, constraint: &str) -> Result<Self> {
        let context = format!("dependencies of feature '{}'", self.name);
        insert_unique(&mut self.dependencies, name, constraint.parse()?, &context)?;
        Ok(self)
    }

    pub fn with_target_dependency(
        mut self,
        platform: &str,
        name: &str,
        constraint: &str,
    ) -> Result<Self> {
        let context = format!(
            "target dependencies of feature '{}' for '{}'",
            self.name, platform
        );
        let target = self
            .target_dependencies
            .entry(platform.to_string())
            .or_default();
        insert_unique(target, name, constraint.parse()?, &context)?;
        Ok(self)
    }

    pub fn with_requirement(
        mut self,
        key: &str,
        value: impl Into<RequirementValue>,
    ) -> Result<Self> {
        let context = format!("system requirements of feature '{}'", self.name);
        insert_unique(&mut self.system_requirements, key, value.into(), &context)?;
        Ok(self)
    }

    pub fn with_activation_env(mut self, name: &str, value: &str) -> Result<Self> {
        let context = format!("activation env of feature '{}'", self.name);
        insert_unique(&mut self.activation_env, name, value.to_string(), &context)?;
        Ok(self)
    }

    pub fn with_task(mut self, name: &str, task: TaskDefinition) -> Result<Self> {
        let context = format!("tasks of feature '{}'", self.name);
        insert_unique(&mut self.tasks, name, task, &context)?;
        Ok(self)
    }
}

/// A runnable unit: an opaque command, an optional working directory
/// relative to the project root, and an ordered variable overlay.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TaskDefinition {
    pub cmd: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Values may reference outer variables with `$NAME`, `${NAME}` or
    /// `${NAME:-fallback}`.
    #[serde(default, deserialize_with = "unique_map", skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Tasks of the same environment that must run first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl TaskDefinition {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            ..Default::default()
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, name: &str, value: &str) -> Result<Self> {
        insert_unique(&mut self.env, name, value.to_string(), "task env")?;
        Ok(self)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn depends_on<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = tasks.into_iter().map(Into::into).collect();
        self
    }
}

/// The declared form of an environment: a name plus the ordered feature
/// names it composes. Later features take precedence for tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EnvironmentDecl {
    pub name: String,

    #[serde(default)]
    pub features: Vec<String>,

    /// Skip the implicit `default` feature.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_default_feature: bool,

    /// Environments sharing a solve group are handed to the solver together.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solve_group: Option<String>,
}

impl EnvironmentDecl {
    pub fn new<I, S>(name: impl Into<String>, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            features: features.into_iter().map(Into::into).collect(),
            no_default_feature: false,
            solve_group: None,
        }
    }

    pub fn without_default_feature(mut self) -> Self {
        self.no_default_feature = true;
        self
    }

    pub fn in_solve_group(mut self, group: impl Into<String>) -> Self {
        self.solve_group = Some(group.into());
        self
    }
}

fn insert_unique<V>(map: &mut IndexMap<String, V>, key: &str, value: V, context: &str) -> Result<()> {
    if map.contains_key(key) {
        return Err(Error::DuplicateKey {
            key: key.to_string(),
            context: context.to_string(),
        });
    }
    map.insert(key.to_string(), value);
    Ok(())
}

/// An `IndexMap` whose deserializer fails on a repeated key instead of
/// letting the last entry win.
struct UniqueMap<K, V>(IndexMap<K, V>);

impl<'de, K, V> Deserialize<'de> for UniqueMap<K, V>
where
    K: Deserialize<'de> + Hash + Eq + fmt::Display,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct UniqueVisitor<K, V>(PhantomData<(K, V)>);

        impl<'de, K, V> Visitor<'de> for UniqueVisitor<K, V>
        where
            K: Deserialize<'de> + Hash + Eq + fmt::Display,
            V: Deserialize<'de>,
        {
            type Value = UniqueMap<K, V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping with unique keys")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<K, V>()? {
                    if map.contains_key(&key) {
                        return Err(de::Error::custom(format_args!("duplicate key '{}'", key)));
                    }
                    map.insert(key, value);
                }
                Ok(UniqueMap(map))
            }
        }

        deserializer.deserialize_map(UniqueVisitor(PhantomData))
    }
}

fn unique_map<'de, D, V>(deserializer: D) -> std::result::Result<IndexMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    UniqueMap::<String, V>::deserialize(deserializer).map(|m| m.0)
}

fn unique_nested_map<'de, D, V>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, IndexMap<String, V>>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let outer = UniqueMap::<String, UniqueMap<String, V>>::deserialize(deserializer)?;
    Ok(outer.0.into_iter().map(|(k, inner)| (k, inner.0)).collect())
}

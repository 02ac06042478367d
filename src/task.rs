//! # Task Materialization
//!
//! Produces the final, executable description of a task inside a resolved
//! environment. Nothing is executed here: the [`TaskDescriptor`] is handed to
//! whatever runs processes.
//!
//! ## Variable layering
//!
//! The final environment map is built in three tiers, later tiers winning:
//!
//! 1.  the caller's outer variables,
//! 2.  the environment-wide activation variables,
//! 3.  the task's own overlay.
//!
//! Values of tiers 2 and 3 are expanded in declared order. A reference sees
//! the outer variables plus every variable already placed, so an overlay entry
//! may use one declared earlier in the same overlay. Unresolvable references
//! stay in the value verbatim and are listed in
//! [`TaskDescriptor::unresolved`]; deciding whether that is fatal is up to the
//! caller.
//!
//! The command string itself is opaque and never expanded.

use indexmap::{IndexMap, IndexSet};
use log::warn;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::expand::expand;
use crate::resolver::ResolvedEnvironment;

/// A fully materialized task invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDescriptor {
    pub environment: String,
    pub task: String,
    /// The feature the winning task definition came from.
    pub feature: String,
    pub command: String,
    pub cwd: PathBuf,
    pub env: IndexMap<String, String>,
    /// Variable names that could not be expanded, in order of first use.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
}

impl TaskDescriptor {
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Materializes `task_name` from `environment`.
///
/// Fails only with `UnknownTask`; unresolved variable references are
/// reported in the descriptor.
pub fn materialize(
    environment: &ResolvedEnvironment,
    task_name: &str,
    outer_env: &IndexMap<String, String>,
    project_root: &Path,
) -> Result<TaskDescriptor> {
    let task = environment.task(task_name)?;
    let definition = &task.value;

    let cwd = match &definition.cwd {
        Some(dir) => project_root.join(dir),
        None => project_root.to_path_buf(),
    };

    let mut env = outer_env.clone();
    let mut unresolved: IndexSet<String> = IndexSet::new();

    let activation = environment
        .activation_env
        .iter()
        .map(|(name, sourced)| (name, &sourced.value));
    for (name, raw) in activation.chain(definition.env.iter()) {
        let expansion = expand(raw, |reference| env.get(reference).map(String::as_str));
        unresolved.extend(expansion.unresolved);
        env.insert(name.clone(), expansion.value);
    }

    for name in &unresolved {
        warn!(
            "Task '{}' in environment '{}' references undefined variable '{}'",
            task_name, environment.name, name
        );
    }

    Ok(TaskDescriptor {
        environment: environment.name.clone(),
        task: task_name.to_string(),
        feature: task.feature.clone(),
        command: definition.cmd.clone(),
        cwd,
        env,
        unresolved: unresolved.into_iter().collect(),
    })
}

/// Returns the order in which `task_name` and its `depends-on` tasks run,
/// dependencies first.
///
/// Dependencies are visited depth-first in declared order; a task reached
/// twice runs once, at its first position. Fails with `UnknownTask` for a
/// dangling reference and `CycleDetected` for a dependency cycle.
pub fn plan(environment: &ResolvedEnvironment, task_name: &str) -> Result<Vec<String>> {
    let mut order = Vec::new();
    let mut done = IndexSet::new();
    let mut stack = Vec::new();
    visit(environment, task_name, &mut stack, &mut done, &mut order)?;
    Ok(order)
}

fn visit(
    environment: &ResolvedEnvironment,
    name: &str,
    stack: &mut Vec<String>,
    done: &mut IndexSet<String>,
    order: &mut Vec<String>,
) -> Result<()> {
    if done.contains(name) {
        return Ok(());
    }
    if let Some(start) = stack.iter().position(|n| n == name) {
        let mut cycle: Vec<&str> = stack[start..].iter().map(String::as_str).collect();
        cycle.push(name);
        return Err(Error::CycleDetected {
            cycle: cycle.join(" -> "),
        });
    }

    let task = environment.task(name)?;
    stack.push(name.to_string());
    for dependency in &task.value.depends_on {
        visit(environment, dependency, stack, done, order)?;
    }
    stack.pop();

    done.insert(name.to_string());
    order.push(name.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EnvironmentDecl, Feature, TaskDefinition};
    use crate::resolver::resolve;
    use crate::store::FeatureStore;

    fn environment(features: Vec<Feature>) -> ResolvedEnvironment {
        let names: Vec<String> = features.iter().map(|f| f.name.clone()).collect();
        let mut store = FeatureStore::new();
        for feature in features {
            store.register(feature).unwrap();
        }
        resolve(&EnvironmentDecl::new("env", names), &store).unwrap()
    }

    fn outer(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_materialize_unknown_task() {
        let env = environment(vec![Feature::new("build")]);
        let err = materialize(&env, "wheel", &IndexMap::new(), Path::new("/proj")).unwrap_err();
        match err {
            Error::UnknownTask { environment, task } => {
                assert_eq!(environment, "env");
                assert_eq!(task, "wheel");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cwd_defaults_to_project_root() {
        let env = environment(vec![Feature::new("build")
            .with_task("build", TaskDefinition::new("meson compile"))
            .unwrap()]);
        let task = materialize(&env, "build", &IndexMap::new(), Path::new("/proj")).unwrap();
        assert_eq!(task.cwd, PathBuf::from("/proj"));
        assert_eq!(task.command, "meson compile");
        assert_eq!(task.feature, "build");
    }

    #[test]
    fn test_cwd_is_relative_to_project_root() {
        let env = environment(vec![Feature::new("doc")
            .with_task("doc", TaskDefinition::new("make html").with_cwd("doc"))
            .unwrap()]);
        let task = materialize(&env, "doc", &IndexMap::new(), Path::new("/proj")).unwrap();
        assert_eq!(task.cwd, PathBuf::from("/proj/doc"));
    }

    #[test]
    fn test_overlay_references_outer_and_earlier_entries() {
        let env = environment(vec![Feature::new("build")
            .with_task(
                "build",
                TaskDefinition::new("make")
                    .with_env("PREFIX", "$HOME/.local")
                    .unwrap()
                    .with_env("PKG_CONFIG_PATH", "${PREFIX}/lib/pkgconfig")
                    .unwrap(),
            )
            .unwrap()]);
        let task = materialize(&env, "build", &outer(&[("HOME", "/home/u")]), Path::new("/p")).unwrap();

        assert_eq!(task.env["PREFIX"], "/home/u/.local");
        assert_eq!(task.env["PKG_CONFIG_PATH"], "/home/u/.local/lib/pkgconfig");
        assert!(task.is_fully_resolved());
    }

    #[test]
    fn test_overlay_cannot_see_later_entries() {
        let env = environment(vec![Feature::new("build")
            .with_task(
                "build",
                TaskDefinition::new("make")
                    .with_env("A", "$B")
                    .unwrap()
                    .with_env("B", "late")
                    .unwrap(),
            )
            .unwrap()]);
        let task = materialize(&env, "build", &IndexMap::new(), Path::new("/p")).unwrap();

        assert_eq!(task.env["A"], "$B");
        assert_eq!(task.env["B"], "late");
        assert_eq!(task.unresolved, vec!["B".to_string()]);
    }

    #[test]
    fn test_three_tier_precedence() {
        let env = environment(vec![Feature::new("blas")
            .with_activation_env("BLAS", "openblas")
            .unwrap()
            .with_activation_env("THREADS", "4")
            .unwrap()
            .with_task(
                "bench",
                TaskDefinition::new("asv run").with_env("THREADS", "1").unwrap(),
            )
            .unwrap()]);
        let task = materialize(
            &env,
            "bench",
            &outer(&[("BLAS", "system"), ("THREADS", "64"), ("USER", "ci")]),
            Path::new("/p"),
        )
        .unwrap();

        assert_eq!(task.env["USER"], "ci");
        assert_eq!(task.env["BLAS"], "openblas");
        assert_eq!(task.env["THREADS"], "1");
    }

    #[test]
    fn test_self_reference_extends_outer_value() {
        let env = environment(vec![Feature::new("build")
            .with_task(
                "build",
                TaskDefinition::new("make").with_env("PATH", "/opt/bin:$PATH").unwrap(),
            )
            .unwrap()]);
        let task = materialize(&env, "build", &outer(&[("PATH", "/usr/bin")]), Path::new("/p")).unwrap();
        assert_eq!(task.env["PATH"], "/opt/bin:/usr/bin");
    }

    #[test]
    fn test_unresolved_reference_is_reported_not_fatal() {
        testing_logger::setup();
        let env = environment(vec![Feature::new("gpu")
            .with_task(
                "gpu-test",
                TaskDefinition::new("pytest")
                    .with_env("DEVICES", "$CUDA_VISIBLE_DEVICES")
                    .unwrap(),
            )
            .unwrap()]);
        let task = materialize(&env, "gpu-test", &IndexMap::new(), Path::new("/p")).unwrap();

        assert_eq!(task.env["DEVICES"], "$CUDA_VISIBLE_DEVICES");
        assert_eq!(task.unresolved, vec!["CUDA_VISIBLE_DEVICES".to_string()]);
        testing_logger::validate(|captured| {
            assert!(captured
                .iter()
                .any(|log| log.level == log::Level::Warn && log.body.contains("CUDA_VISIBLE_DEVICES")));
        });
    }

    #[test]
    fn test_command_is_not_expanded() {
        let env = environment(vec![Feature::new("build")
            .with_task("build", TaskDefinition::new("echo $HOME"))
            .unwrap()]);
        let task = materialize(&env, "build", &outer(&[("HOME", "/h")]), Path::new("/p")).unwrap();
        assert_eq!(task.command, "echo $HOME");
    }

    #[test]
    fn test_plan_orders_dependencies_first() {
        let env = environment(vec![Feature::new("build")
            .with_task("configure", TaskDefinition::new("meson setup build"))
            .unwrap()
            .with_task(
                "build",
                TaskDefinition::new("meson compile").depends_on(["configure"]),
            )
            .unwrap()
            .with_task(
                "wheel",
                TaskDefinition::new("python -m build").depends_on(["build", "configure"]),
            )
            .unwrap()]);
        assert_eq!(plan(&env, "wheel").unwrap(), vec!["configure", "build", "wheel"]);
    }

    #[test]
    fn test_plan_detects_cycles() {
        let env = environment(vec![Feature::new("loop")
            .with_task("a", TaskDefinition::new("a").depends_on(["b"]))
            .unwrap()
            .with_task("b", TaskDefinition::new("b").depends_on(["a"]))
            .unwrap()]);
        let err = plan(&env, "a").unwrap_err();
        match err {
            Error::CycleDetected { cycle } => assert_eq!(cycle, "a -> b -> a"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_plan_reports_dangling_dependency() {
        let env = environment(vec![Feature::new("build")
            .with_task("build", TaskDefinition::new("make").depends_on(["configure"]))
            .unwrap()]);
        let err = plan(&env, "build").unwrap_err();
        assert!(matches!(err, Error::UnknownTask { ref task, .. } if task == "configure"));
    }
}

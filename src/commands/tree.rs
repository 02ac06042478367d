//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays how each
//! environment is composed: its features in precedence order and, under each
//! feature, the tasks it defines. A task that a later feature redefines is
//! marked as shadowed.
//!
//! The tree is built from the declarations alone, so it is also useful for
//! environments that fail to resolve: unknown features are shown, not
//! reported as errors.

use anyhow::Result;
use clap::Args;
use indexmap::IndexMap;
use ptree::{print_tree, TreeItem};

use envcompose::model::EnvironmentDecl;
use envcompose::store::FeatureStore;

use super::{select_environment, Context};

/// Show environments, their features and the tasks each feature provides
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Only show this environment.
    #[arg(value_name = "ENV")]
    pub environment: Option<String>,

    /// Maximum depth to display in the tree.
    ///
    /// Use 0 to show only environments, 1 to add their features.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs, ctx: &Context) -> Result<()> {
    let workspace = ctx.load_workspace()?;
    let decls: Vec<&EnvironmentDecl> = match &args.environment {
        Some(name) => vec![select_environment(&workspace, name)?],
        None => workspace.environments.iter().collect(),
    };

    let root = TreeNode {
        label: ctx.manifest.display().to_string(),
        children: decls
            .into_iter()
            .map(|decl| build_environment_node(decl, &workspace.store, args.depth.unwrap_or(usize::MAX)))
            .collect(),
    };
    print_tree(&root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;

    Ok(())
}

fn build_environment_node(decl: &EnvironmentDecl, store: &FeatureStore, max_depth: usize) -> TreeNode {
    let mut label = decl.name.clone();
    if let Some(group) = &decl.solve_group {
        label.push_str(&format!(" (solve group: {group})"));
    }
    if max_depth == 0 {
        return TreeNode::leaf(label);
    }

    let names = match store.effective_feature_names(decl) {
        Ok(names) => names,
        Err(e) => {
            return TreeNode {
                label,
                children: vec![TreeNode::leaf(format!("error: {e}"))],
            }
        }
    };

    // Last definer of each task name.
    let mut winners: IndexMap<&str, &str> = IndexMap::new();
    for name in &names {
        if let Ok(feature) = store.get(name) {
            for task in feature.tasks.keys() {
                winners.insert(task.as_str(), *name);
            }
        }
    }

    let children = names
        .iter()
        .map(|name| {
            let Ok(feature) = store.get(name) else {
                return TreeNode::leaf(format!("{name} (unknown feature)"));
            };
            if max_depth == 1 {
                return TreeNode::leaf(name.to_string());
            }
            let tasks = feature
                .tasks
                .keys()
                .map(|task| match winners.get(task.as_str()) {
                    Some(winner) if winner != name => {
                        TreeNode::leaf(format!("{task} (shadowed by {winner})"))
                    }
                    _ => TreeNode::leaf(task.clone()),
                })
                .collect();
            TreeNode {
                label: name.to_string(),
                children: tasks,
            }
        })
        .collect();

    TreeNode { label, children }
}

/// Tree node structure for ptree visualization
#[derive(Clone, Debug)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(label: String) -> Self {
        Self {
            label,
            children: vec![],
        }
    }
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}

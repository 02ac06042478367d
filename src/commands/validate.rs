//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which resolves every
//! declared environment of a workspace and reports, per environment, either
//! a short summary or the error that stopped it.
//!
//! ## Functionality
//!
//! - **Structural checks**: loading the workspace rejects duplicate feature,
//!   environment and mapping keys.
//! - **Batch resolution**: environments are resolved in parallel; one failing
//!   environment does not hide the others.
//! - **Solve groups**: with `--solve-groups`, the constraints of environments
//!   sharing a solve group are merged as well, surfacing conflicts between
//!   environments that must agree on package versions.
//!
//! This command is read-only. It exits with an error when any environment
//! fails.

use anyhow::Result;
use clap::Args;
use indexmap::IndexMap;

use envcompose::model::EnvironmentDecl;
use envcompose::output::OutputConfig;
use envcompose::resolver::ResolvedEnvironment;
use envcompose::solver;

use super::{select_environment, Context, VersionScheme};

/// Resolve every environment and report the ones that fail
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Only validate these environments (default: all of them).
    #[arg(value_name = "ENV")]
    pub environments: Vec<String>,

    /// Version ordering used when merging constraints.
    #[arg(long, value_enum, default_value = "segmented")]
    pub scheme: VersionScheme,

    /// Also merge the constraints of environments sharing a solve group.
    #[arg(long)]
    pub solve_groups: bool,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, ctx: &Context) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&ctx.color);
    let workspace = ctx.load_workspace()?;

    let decls = if args.environments.is_empty() {
        workspace.environments.clone()
    } else {
        args.environments
            .iter()
            .map(|name| select_environment(&workspace, name).cloned())
            .collect::<Result<Vec<_>>>()?
    };

    println!(
        "Validating {} environment(s) in {}",
        decls.len(),
        ctx.manifest.display()
    );

    let resolver = args.scheme.resolver(&workspace.store);
    let results = resolver.resolve_all(&decls);

    let mut resolved: Vec<ResolvedEnvironment> = Vec::new();
    let mut failed: Vec<String> = Vec::new();
    for (name, result) in results {
        match result {
            Ok(env) => {
                println!("{} {} {}", out.ok(), out.name(&name), out.dim(&summary(&env)));
                resolved.push(env);
            }
            Err(e) => {
                println!("{} {}: {}", out.err(), out.name(&name), e);
                failed.push(name);
            }
        }
    }
    let mut failures = failed.len();

    if args.solve_groups {
        let mut incomplete = incomplete_groups(&decls, &failed);
        match solver::solve_requests(&resolved, resolver.comparator()) {
            Ok(requests) => {
                for request in requests {
                    match incomplete.shift_remove(&request.group) {
                        Some(missing) => println!(
                            "{} solve group {} [{}]: incomplete, {} failed to resolve",
                            out.warn(),
                            out.name(&request.group),
                            request.environments.join(", "),
                            missing.join(", ")
                        ),
                        None => println!(
                            "{} solve group {} [{}]: {} dependencies",
                            out.ok(),
                            out.name(&request.group),
                            request.environments.join(", "),
                            request.dependencies.len()
                        ),
                    }
                }
                // Groups none of whose members resolved
                for (group, missing) in incomplete {
                    println!(
                        "{} solve group {} []: incomplete, {} failed to resolve",
                        out.warn(),
                        out.name(&group),
                        missing.join(", ")
                    );
                }
            }
            Err(e) => {
                failures += 1;
                println!("{} solve groups: {}", out.err(), e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} check(s) failed", failures, decls.len().max(failures));
    }

    println!("{} Workspace is valid", out.ok());
    Ok(())
}

/// Solve groups with at least one member that failed to resolve, mapped to
/// those members.
fn incomplete_groups(decls: &[EnvironmentDecl], failed: &[String]) -> IndexMap<String, Vec<String>> {
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    for decl in decls.iter().filter(|d| failed.contains(&d.name)) {
        if let Some(group) = &decl.solve_group {
            groups.entry(group.clone()).or_default().push(decl.name.clone());
        }
    }
    groups
}

fn summary(env: &ResolvedEnvironment) -> String {
    let platforms: Vec<&str> = env.platforms.platforms().collect();
    let platforms = if platforms.is_empty() {
        "all platforms".to_string()
    } else {
        platforms.join(", ")
    };
    format!(
        "({} features, {} dependencies, {} tasks; {})",
        env.features.len(),
        env.dependencies.len(),
        env.tasks.len(),
        platforms
    )
}

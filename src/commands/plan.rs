//! # Plan Command Implementation
//!
//! Prints the order in which a task and the tasks it `depends-on` would
//! run, dependencies first, with the feature that provides each one.
//! Dangling references and dependency cycles are reported as errors.

use anyhow::Result;
use clap::Args;
use std::fmt::Write as _;
use std::io::Write;

use envcompose::output::OutputConfig;
use envcompose::resolver::ResolvedEnvironment;
use envcompose::task;

use super::{select_environment, Context};

/// Show the order a task and its dependencies run in
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Name of the environment.
    #[arg(value_name = "ENV")]
    pub environment: String,

    /// Name of the task to plan.
    #[arg(value_name = "TASK")]
    pub task: String,
}

/// Execute the `plan` command.
pub fn execute(args: PlanArgs, ctx: &Context) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&ctx.color);
    let workspace = ctx.load_workspace()?;
    let decl = select_environment(&workspace, &args.environment)?;
    let resolved = envcompose::resolver::resolve(decl, &workspace.store)?;

    let order = task::plan(&resolved, &args.task)?;
    std::io::stdout().write_all(render(&resolved, &order, &out).as_bytes())?;
    Ok(())
}

fn render(env: &ResolvedEnvironment, order: &[String], out: &OutputConfig) -> String {
    let mut text = String::new();
    for (step, name) in order.iter().enumerate() {
        let Some(sourced) = env.tasks.get(name) else {
            continue;
        };
        let _ = write!(
            text,
            "{}. {} {}",
            step + 1,
            out.name(name),
            out.dim(&format!("[{}]", sourced.feature))
        );
        match &sourced.value.description {
            Some(description) => {
                let _ = writeln!(text, " {description}");
            }
            None => text.push('\n'),
        }
    }
    text
}

//! # Task Command Implementation
//!
//! Materializes one task of one environment: the command string, the working
//! directory resolved against the project root, and the environment map the
//! command would run with. Nothing is executed.
//!
//! The outer layer of the environment map is the current process
//! environment, unless `--clean-env` is given. The text format prints only
//! the variables the environment and task set on top of it; `yaml` and
//! `json` print the whole descriptor.

use anyhow::Result;
use clap::{Args, ValueEnum};
use indexmap::IndexMap;
use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use envcompose::output::OutputConfig;
use envcompose::suggestions;
use envcompose::task::{materialize, TaskDescriptor};

use super::{select_environment, Context, OutputFormat, VersionScheme};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TaskFormat {
    #[default]
    Text,
    Yaml,
    Json,
}

/// Materialize a task into its command, working directory and environment
#[derive(Args, Debug)]
pub struct TaskArgs {
    /// Name of the environment.
    #[arg(value_name = "ENV")]
    pub environment: String,

    /// Name of the task.
    #[arg(value_name = "TASK")]
    pub task: String,

    /// Directory task working directories are relative to.
    ///
    /// Defaults to the directory containing the workspace file.
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    /// Start from an empty environment instead of the process environment.
    #[arg(long)]
    pub clean_env: bool,

    /// Fail when a variable reference cannot be resolved.
    #[arg(long)]
    pub strict: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: TaskFormat,

    /// Version ordering used when merging constraints.
    #[arg(long, value_enum, default_value = "segmented")]
    pub scheme: VersionScheme,
}

/// Execute the `task` command.
pub fn execute(args: TaskArgs, ctx: &Context) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&ctx.color);
    let outer: IndexMap<String, String> = if args.clean_env {
        IndexMap::new()
    } else {
        std::env::vars().collect()
    };

    let descriptor = describe(&args, ctx, &outer)?;
    let rendered = match args.format {
        TaskFormat::Text => render_text(&descriptor, &outer, &out),
        TaskFormat::Yaml => OutputFormat::Yaml.render(&descriptor)?,
        TaskFormat::Json => OutputFormat::Json.render(&descriptor)?,
    };
    std::io::stdout().write_all(rendered.as_bytes())?;
    Ok(())
}

fn describe(args: &TaskArgs, ctx: &Context, outer: &IndexMap<String, String>) -> Result<TaskDescriptor> {
    let workspace = ctx.load_workspace()?;
    let decl = select_environment(&workspace, &args.environment)?;
    let resolved = args.scheme.resolver(&workspace.store).resolve(decl)?;

    let project_root = match &args.project_root {
        Some(root) => root.clone(),
        None => ctx
            .manifest
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default(),
    };

    let descriptor = materialize(&resolved, &args.task, outer, &project_root)?;
    if args.strict && !descriptor.is_fully_resolved() {
        return Err(suggestions::unresolved_variables(
            &descriptor.environment,
            &descriptor.task,
            &descriptor.unresolved,
        ));
    }
    Ok(descriptor)
}

fn render_text(descriptor: &TaskDescriptor, outer: &IndexMap<String, String>, out: &OutputConfig) -> String {
    let mut text = String::new();
    let _ = writeln!(
        text,
        "{} {} {}",
        out.name(&descriptor.task),
        out.dim("from feature"),
        out.name(&descriptor.feature)
    );
    let _ = writeln!(text, "command: {}", descriptor.command);
    let _ = writeln!(text, "cwd: {}", descriptor.cwd.display());

    let overlay: Vec<(&String, &String)> = descriptor
        .env
        .iter()
        .filter(|(name, value)| outer.get(*name) != Some(*value))
        .collect();
    if !overlay.is_empty() {
        let _ = writeln!(text, "env:");
        for (name, value) in overlay {
            let _ = writeln!(text, "  {name}={value}");
        }
    }

    for name in &descriptor.unresolved {
        let _ = writeln!(text, "{} undefined variable {}", out.warn(), name);
    }
    text
}

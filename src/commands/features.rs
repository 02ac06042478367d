//! # Features Command Implementation
//!
//! Lists the features a workspace declares, in declaration order, with the
//! platforms each supports and what it contributes. `--format yaml|json`
//! dumps the features themselves.

use anyhow::Result;
use clap::Args;
use std::fmt::Write as _;
use std::io::Write;

use envcompose::model::Feature;
use envcompose::output::OutputConfig;

use super::{Context, OutputFormat};

/// List the features the workspace declares
#[derive(Args, Debug)]
pub struct FeaturesArgs {
    /// Dump the feature definitions instead of a summary.
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Execute the `features` command.
pub fn execute(args: FeaturesArgs, ctx: &Context) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&ctx.color);
    let workspace = ctx.load_workspace()?;
    let features: Vec<&Feature> = workspace.store.all().collect();

    let rendered = match args.format {
        Some(format) => format.render(&features)?,
        None => summarize(&features, &out),
    };
    std::io::stdout().write_all(rendered.as_bytes())?;
    Ok(())
}

fn summarize(features: &[&Feature], out: &OutputConfig) -> String {
    let mut text = String::new();
    for feature in features {
        let platforms = match &feature.platforms {
            Some(set) => set.iter().map(String::as_str).collect::<Vec<_>>().join(", "),
            None => "*".to_string(),
        };
        let _ = writeln!(text, "{} {}", out.name(&feature.name), out.dim(&format!("[{platforms}]")));

        let mut parts = Vec::new();
        let dependencies = feature.dependencies.len()
            + feature.target_dependencies.values().map(|d| d.len()).sum::<usize>();
        if dependencies > 0 {
            parts.push(format!("{dependencies} dependencies"));
        }
        if !feature.system_requirements.is_empty() {
            let keys: Vec<&str> = feature.system_requirements.keys().map(String::as_str).collect();
            parts.push(format!("requires {}", keys.join(", ")));
        }
        if !feature.tasks.is_empty() {
            let names: Vec<&str> = feature.tasks.keys().map(String::as_str).collect();
            parts.push(format!("tasks: {}", names.join(", ")));
        }
        if !parts.is_empty() {
            let _ = writeln!(text, "  {}", parts.join("; "));
        }
    }
    text
}

//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use envcompose::defaults::{DEFAULT_MANIFEST_FILENAME, LOG_ENV_VAR, MANIFEST_ENV_VAR};

use crate::commands;

/// envcompose - Compose features into resolved environments
#[derive(Parser, Debug)]
#[command(name = "envcompose")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Path to the workspace file (.yaml, .yml or .toml)
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        env = MANIFEST_ENV_VAR,
        default_value = DEFAULT_MANIFEST_FILENAME
    )]
    manifest: PathBuf,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve every environment and report the ones that fail
    Validate(commands::validate::ValidateArgs),

    /// Print the resolved snapshot of one environment
    Resolve(commands::resolve::ResolveArgs),

    /// Materialize a task into its command, working directory and environment
    Task(commands::task::TaskArgs),

    /// Show the order a task and its dependencies run in
    Plan(commands::plan::PlanArgs),

    /// List the features the workspace declares
    Features(commands::features::FeaturesArgs),

    /// Show environments, their features and the tasks each feature provides
    Tree(commands::tree::TreeArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let ctx = commands::Context {
            manifest: self.manifest,
            color: self.color,
        };

        match self.command {
            Commands::Validate(args) => commands::validate::execute(args, &ctx),
            Commands::Resolve(args) => commands::resolve::execute(args, &ctx),
            Commands::Task(args) => commands::task::execute(args, &ctx),
            Commands::Plan(args) => commands::plan::execute(args, &ctx),
            Commands::Features(args) => commands::features::execute(args, &ctx),
            Commands::Tree(args) => commands::tree::execute(args, &ctx),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Logs go to stderr. `RUST_LOG`, when set, overrides `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::new().filter_or(LOG_ENV_VAR, level);
    // A second initialization (in tests) is not an error worth reporting.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

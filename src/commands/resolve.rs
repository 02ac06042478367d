//! # Resolve Command Implementation
//!
//! Prints the resolved snapshot of one environment as YAML or JSON: its
//! features in precedence order, effective platforms, merged dependency
//! constraints and system requirements, and the task table with the feature
//! each task came from.

use anyhow::Result;
use clap::Args;
use std::io::Write;

use super::{select_environment, Context, OutputFormat, VersionScheme};

/// Print the resolved snapshot of one environment
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Name of the environment to resolve.
    #[arg(value_name = "ENV")]
    pub environment: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: OutputFormat,

    /// Version ordering used when merging constraints.
    #[arg(long, value_enum, default_value = "segmented")]
    pub scheme: VersionScheme,
}

/// Execute the `resolve` command.
pub fn execute(args: ResolveArgs, ctx: &Context) -> Result<()> {
    let rendered = render(&args, ctx)?;
    std::io::stdout().write_all(rendered.as_bytes())?;
    Ok(())
}

fn render(args: &ResolveArgs, ctx: &Context) -> Result<String> {
    let workspace = ctx.load_workspace()?;
    let decl = select_environment(&workspace, &args.environment)?;
    let resolved = args.scheme.resolver(&workspace.store).resolve(decl)?;
    args.format.render(&resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WORKSPACE: &str = r#"
features:
  - name: build
    dependencies:
      numpy: ">=1.23"
    tasks:
      build:
        cmd: meson compile
  - name: test
    dependencies:
      numpy: "<2.3"
environments:
  - name: dev
    features: [build, test]
"#;

    fn context(dir: &TempDir) -> Context {
        let manifest = dir.path().join("envcompose.yaml");
        std::fs::write(&manifest, WORKSPACE).unwrap();
        Context {
            manifest,
            color: "never".to_string(),
        }
    }

    #[test]
    fn test_render_yaml() {
        let dir = TempDir::new().unwrap();
        let args = ResolveArgs {
            environment: "dev".to_string(),
            format: OutputFormat::Yaml,
            scheme: VersionScheme::Segmented,
        };
        let rendered = render(&args, &context(&dir)).unwrap();
        assert!(rendered.contains("name: dev"));
        assert!(rendered.contains(">=1.23,<2.3"));
        assert!(rendered.contains("feature: build"));
    }

    #[test]
    fn test_render_json() {
        let dir = TempDir::new().unwrap();
        let args = ResolveArgs {
            environment: "dev".to_string(),
            format: OutputFormat::Json,
            scheme: VersionScheme::Semver,
        };
        let rendered = render(&args, &context(&dir)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["platforms"], "*");
        assert_eq!(value["tasks"]["build"]["value"]["cmd"], "meson compile");
    }

    #[test]
    fn test_unknown_environment() {
        let dir = TempDir::new().unwrap();
        let args = ResolveArgs {
            environment: "prod".to_string(),
            format: OutputFormat::Yaml,
            scheme: VersionScheme::Segmented,
        };
        let err = render(&args, &context(&dir)).unwrap_err();
        assert!(err.to_string().contains("Unknown environment 'prod'"));
    }
}

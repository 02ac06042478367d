//! # Error Suggestions
//!
//! Helpers that build command errors carrying `hint:` lines, so a failure
//! says what went wrong and how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use envcompose::suggestions;
//!
//! let decl = workspace
//!     .environment(name)
//!     .ok_or_else(|| suggestions::unknown_environment(name, workspace.environment_names()))?;
//! ```

use std::path::Path;

use crate::defaults::MANIFEST_ENV_VAR;

/// The workspace file does not exist.
pub fn manifest_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Workspace file not found: {path}\n\n\
         hint: Use --manifest to point at a .yaml or .toml workspace file\n\
         hint: Set the {MANIFEST_ENV_VAR} environment variable",
        path = path.display()
    )
}

/// No environment of this name is declared.
pub fn unknown_environment<'a, I>(name: &str, available: I) -> anyhow::Error
where
    I: IntoIterator<Item = &'a str>,
{
    let available: Vec<&str> = available.into_iter().collect();
    let did_you_mean = find_similar(name, &available)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    let listing = if available.is_empty() {
        "The workspace declares no environments".to_string()
    } else {
        format!("Declared environments: {}", available.join(", "))
    };

    anyhow::anyhow!("Unknown environment '{name}'{did_you_mean}\n\n{listing}")
}

/// Strict materialization found variable references nothing defines.
pub fn unresolved_variables(environment: &str, task: &str, names: &[String]) -> anyhow::Error {
    anyhow::anyhow!(
        "Task '{task}' in environment '{environment}' references undefined variables: {names}\n\n\
         hint: Define them under activation-env or the task's env\n\
         hint: Use ${{NAME:-fallback}} to give a reference a default\n\
         hint: Drop --strict to keep unresolved references verbatim",
        names = names.join(", ")
    )
}

/// Picks the candidate closest to `input`, if any is within two edits.
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&candidate| (candidate, edit_distance(input, candidate)))
        .filter(|&(_, distance)| distance <= 2 && distance < input.len())
        .min_by_key(|&(_, distance)| distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance over chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        previous = current;
    }

    previous[b.len()]
}

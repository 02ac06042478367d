//! Default values shared by the `envcompose` commands.

/// The workspace file looked up when `--manifest` is not given.
pub const DEFAULT_MANIFEST_FILENAME: &str = "envcompose.yaml";

/// Environment variable that overrides the workspace file path.
pub const MANIFEST_ENV_VAR: &str = "ENVCOMPOSE_MANIFEST";

/// Environment variable that sets the log filter, as understood by
/// `env_logger`. Takes precedence over `--log-level`.
pub const LOG_ENV_VAR: &str = "RUST_LOG";

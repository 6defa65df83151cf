//! Config path resolution

use std::path::PathBuf;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "PROTOSCHEMA_CONFIG";

/// Config file used when the environment variable is unset
pub const DEFAULT_CONFIG_FILE: &str = "protoschema.toml";

/// Returns the config file path.
///
/// `$PROTOSCHEMA_CONFIG` if set and non-empty, otherwise `protoschema.toml`
/// in the working directory.
pub fn config_path() -> PathBuf {
    resolve(std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

fn resolve(configured: Option<PathBuf>) -> PathBuf {
    configured
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

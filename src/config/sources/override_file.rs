//! Explicit config file named by the environment.

use std::path::PathBuf;

/// Environment variable naming a config file to use instead of the per-user one.
pub const CONFIG_ENV: &str = "CDRIP_CONFIG";

pub fn override_config_path() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

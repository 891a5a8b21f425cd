//! Per-user config file: $XDG_CONFIG_HOME/cdrip/config.toml (or the platform equivalent).

use directories::ProjectDirs;
use std::path::PathBuf;

/// Path to the per-user config file, if a home directory can be determined.
pub fn global_config_path() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join("cdrip").join("config.toml"));
    }
    ProjectDirs::from("", "", "cdrip").map(|dirs| dirs.config_dir().join("config.toml"))
}

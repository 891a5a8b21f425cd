//! CD-DA device enumeration and path resolution.

use crate::error::CommandError;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Kernel table listing CD-ROM capable drives.
pub const PROC_CDROM_INFO: &str = "/proc/sys/dev/cdrom/info";

/// Source of candidate device paths, in preference order.
pub trait DeviceEnumerator {
    fn device_paths(&self) -> Vec<String>;
}

/// Enumerates drives from the kernel's CD-ROM info table.
#[derive(Debug, Clone)]
pub struct ProcCdromEnumerator {
    info_path: PathBuf,
}

impl Default for ProcCdromEnumerator {
    fn default() -> Self {
        Self {
            info_path: PathBuf::from(PROC_CDROM_INFO),
        }
    }
}

impl ProcCdromEnumerator {
    pub fn with_info_path(info_path: impl Into<PathBuf>) -> Self {
        Self {
            info_path: info_path.into(),
        }
    }
}

impl DeviceEnumerator for ProcCdromEnumerator {
    fn device_paths(&self) -> Vec<String> {
        match std::fs::read_to_string(&self.info_path) {
            Ok(info) => parse_drive_names(&info)
                .into_iter()
                .map(|name| format!("/dev/{}", name))
                .collect(),
            Err(e) => {
                debug!(path = %self.info_path.display(), error = %e, "cdrom info unavailable");
                Vec::new()
            }
        }
    }
}

/// Fixed device list.
#[derive(Debug, Clone, Default)]
pub struct StaticDevices(pub Vec<String>);

impl DeviceEnumerator for StaticDevices {
    fn device_paths(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// Drive names from the `drive name:` row of the cdrom info table.
fn parse_drive_names(info: &str) -> Vec<String> {
    info.lines()
        .find_map(|line| line.strip_prefix("drive name:"))
        .map(|names| names.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Resolve `device` through symlinks. A path that does not exist is fatal.
pub fn resolve_device(device: &str) -> Result<PathBuf, CommandError> {
    let path = Path::new(device);
    dunce::canonicalize(path).map_err(|e| {
        error!(severity = "critical", device, error = %e, "CD-DA device {} not found!", device);
        CommandError::DeviceNotFound(path.to_path_buf())
    })
}

//! The cdrip command tree.

mod checksum;
mod drive;
mod encode;
mod root;

pub use checksum::Checksum;
pub use drive::{Drive, DriveInfo, DriveList};
pub use encode::Encode;
pub use root::Cdrip;

use crate::options::ResolvedOptions;

/// Destination of the root's verbosity switch, read by every leaf.
pub const VERBOSE_DEST: &str = "verbose";

fn verbose(options: &ResolvedOptions) -> bool {
    options.get_bool(VERBOSE_DEST).unwrap_or(false)
}

//! Configuration file sources: location discovery and format selection.

pub mod global_file;
pub mod override_file;

use config::builder::DefaultState;
use config::{ConfigBuilder, File, FileFormat};
use std::path::Path;

/// Add `path` to the builder, choosing the file format from its extension.
/// `.conf` and `.ini` files are read as INI, everything unrecognized as TOML.
pub fn add_file(builder: ConfigBuilder<DefaultState>, path: &Path) -> ConfigBuilder<DefaultState> {
    let format = match path.extension().and_then(|ext| ext.to_str()) {
        Some("conf") | Some("ini") => FileFormat::Ini,
        Some("json") => FileFormat::Json,
        _ => FileFormat::Toml,
    };
    builder.add_source(File::from(path).format(format).required(false))
}

//! Configuration Store
//!
//! Section/key lookups that supply typed defaults to option registration. The
//! store is an injected dependency: the root command receives one through its
//! dispatch context and every child reads from the same instance.
//!
//! Files are loaded through the `config` crate. Each top-level table is a
//! section, each entry in it a key:
//!
//! ```toml
//! [main]
//! verbose = true
//!
//! [encode]
//! bitrate = 192
//! ```

use crate::error::ConfigError;
use crate::options::{OptionValue, ValueKind};
use config::Source;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

mod sources;

pub use sources::global_file::global_config_path;
pub use sources::override_file::{override_config_path, CONFIG_ENV};

/// Section used when neither the option nor its command names one.
pub const DEFAULT_SECTION: &str = "main";

/// Typed key/section lookup producing option defaults.
pub trait ConfigStore {
    /// Raw stored value for `key` in `section`, if any.
    fn lookup(&self, section: &str, key: &str) -> Option<config::Value>;

    /// Typed getter. Converts the stored value with the getter selected by
    /// `kind`'s type suffix, or returns `default` unmodified when nothing is
    /// stored for (`section`, `key`).
    fn get(
        &self,
        kind: ValueKind,
        section: &str,
        key: &str,
        default: Option<OptionValue>,
    ) -> Result<Option<OptionValue>, ConfigError> {
        let Some(value) = self.lookup(section, key) else {
            return Ok(default);
        };

        let invalid = |source: config::ConfigError| ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            expected: kind.name(),
            source,
        };

        let resolved = match kind.type_suffix() {
            "int" => OptionValue::Int(value.into_int().map_err(invalid)?),
            "float" => OptionValue::Float(value.into_float().map_err(invalid)?),
            "boolean" => OptionValue::Bool(value.into_bool().map_err(invalid)?),
            _ => OptionValue::Str(value.into_string().map_err(invalid)?),
        };
        debug!(section, key, value = %resolved, "default taken from configuration");
        Ok(Some(resolved))
    }
}

/// Store backed by configuration files.
#[derive(Debug, Clone, Default)]
pub struct FileConfigStore {
    sections: HashMap<String, HashMap<String, config::Value>>,
    origin: Option<PathBuf>,
}

impl FileConfigStore {
    /// An empty store; every lookup yields the code default.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from the default location: `$CDRIP_CONFIG` when set, otherwise the
    /// per-user config file. A missing file yields an empty store.
    pub fn load_default() -> Result<Self, ConfigError> {
        match override_config_path().or_else(global_config_path) {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::empty()),
        }
    }

    /// Load a single file. A missing file yields an empty store.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(config_path = %path.display(), "no configuration file");
            return Ok(Self::empty());
        }

        let load_err = |source: config::ConfigError| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        };
        let builder = sources::add_file(config::Config::builder(), path);
        let loaded = builder.build().map_err(load_err)?;
        let tables = loaded.collect().map_err(load_err)?;

        let mut sections = HashMap::new();
        for (section, value) in tables {
            let table = value
                .into_table()
                .map_err(|source| ConfigError::MalformedSection {
                    section: section.clone(),
                    source,
                })?;
            sections.insert(section, table.into_iter().collect());
        }

        debug!(config_path = %path.display(), sections = sections.len(), "configuration loaded");
        Ok(Self {
            sections,
            origin: Some(path.to_path_buf()),
        })
    }

    /// File this store was loaded from, if any.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }
}

impl ConfigStore for FileConfigStore {
    fn lookup(&self, section: &str, key: &str) -> Option<config::Value> {
        self.sections.get(section)?.get(key).cloned()
    }
}

/// In-memory store for tests and embedders.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    values: HashMap<(String, String), config::Value>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<V>(&mut self, section: &str, key: &str, value: V) -> &mut Self
    where
        V: Into<config::ValueKind>,
    {
        self.values.insert(
            (section.to_string(), key.to_string()),
            config::Value::new(None, value),
        );
        self
    }

    pub fn with<V>(mut self, section: &str, key: &str, value: V) -> Self
    where
        V: Into<config::ValueKind>,
    {
        self.set(section, key, value);
        self
    }
}

impl ConfigStore for MemoryConfigStore {
    fn lookup(&self, section: &str, key: &str) -> Option<config::Value> {
        self.values
            .get(&(section.to_string(), key.to_string()))
            .cloned()
    }
}

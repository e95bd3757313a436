//! Startup configuration read from TOML
//!
//! ```toml
//! default_group = "CYRILLIC"
//!
//! [default_encodings]
//! LATIN = "ISO-8859-15"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::GroupId;
use crate::registry::EncodingGroupRegistry;
use crate::{Encoding, Error, Result};

/// Registry settings applied once at startup
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Group used when callers do not name one, `LATIN` if unset
    pub default_group: Option<String>,
    /// Per-group default encoding overrides, keyed by group name
    pub default_encodings: BTreeMap<String, String>,
}

impl ConverterConfig {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|err| Error::Config(err.to_string()))
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("failed to read {}: {err}", path.display())))?;
        debug!(path = %path.display(), "loaded converter config");
        Self::from_toml_str(&source)
    }

    /// Build a registry with these settings applied
    ///
    /// Unknown group or encoding names and rejected overrides are all
    /// reported as [`Error::Config`].
    pub fn build_registry(&self) -> Result<EncodingGroupRegistry> {
        let default_group = match &self.default_group {
            Some(name) => parse_group(name)?,
            None => GroupId::Latin,
        };
        let mut registry = EncodingGroupRegistry::new(default_group)?;

        for (group, encoding) in &self.default_encodings {
            let group = parse_group(group)?;
            let encoding: Encoding = encoding
                .parse()
                .map_err(|err: Error| Error::Config(err.to_string()))?;
            if !registry.set_default_encoding(group, encoding) {
                return Err(Error::Config(format!(
                    "cannot use {encoding} as default encoding of {group}"
                )));
            }
        }

        Ok(registry)
    }
}

fn parse_group(name: &str) -> Result<GroupId> {
    name.parse().map_err(|err: Error| Error::Config(err.to_string()))
}

//! Codec configuration.
//!
//! [`CodecConfig`] is plain serde data, read from TOML text or a file.
//! Abbreviations are validated later, when a [`Codec`](crate::Codec) is
//! built from the config.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Configuration for a [`Codec`](crate::Codec).
///
/// Every field has a default, so a TOML document only needs the keys it
/// changes:
///
/// ```toml
/// separator = "."
/// by_reference = ["Node", "sequence"]
/// ignore_fields = ["path_cache"]
///
/// [abbreviations]
/// hitpoints = "hp"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Inserted between a parent key and each child segment. Empty by
    /// default: keys are plain concatenations, and keeping them unambiguous
    /// is up to whoever chooses field names and abbreviations.
    pub separator: String,
    /// Discriminators whose instances are stored out-of-line behind a
    /// pointer and deduplicated by identity. Types registered with
    /// `by_reference` are added to this set implicitly.
    pub by_reference: BTreeSet<String>,
    /// Field names the default encoder never writes, for any type.
    pub ignore_fields: BTreeSet<String>,
    /// Seed for pointer suffixes. `None` draws from OS entropy.
    pub pointer_seed: Option<u64>,
    // Tables must follow plain values in TOML output.
    /// Full field name to short code.
    pub abbreviations: BTreeMap<String, String>,
}

impl CodecConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> CodecResult<Self> {
        toml::from_str(text).map_err(|e| CodecError::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> CodecResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CodecError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML text.
    pub fn to_toml_string(&self) -> CodecResult<String> {
        toml::to_string(self).map_err(|e| CodecError::Config(e.to_string()))
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn store_by_reference(mut self, discriminator: impl Into<String>) -> Self {
        self.by_reference.insert(discriminator.into());
        self
    }

    pub fn ignore_field(mut self, field: impl Into<String>) -> Self {
        self.ignore_fields.insert(field.into());
        self
    }

    pub fn abbreviate(mut self, full: impl Into<String>, short: impl Into<String>) -> Self {
        self.abbreviations.insert(full.into(), short.into());
        self
    }

    pub fn with_pointer_seed(mut self, seed: u64) -> Self {
        self.pointer_seed = Some(seed);
        self
    }
}

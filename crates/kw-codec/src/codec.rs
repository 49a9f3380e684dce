//! The codec facade.
//!
//! [`Codec`] bundles a validated configuration, the type registry and the
//! abbreviation table, and opens save and load sessions over a store. It is
//! the usual entry point: `save` and `load` each run one fresh session.

use std::sync::Arc;

use kw_store::KvStore;
use kw_types::Value;
use tracing::{debug, warn};

use crate::abbrev::AbbreviationTable;
use crate::config::CodecConfig;
use crate::error::CodecResult;
use crate::keys::KeyScheme;
use crate::load::LoadSession;
use crate::registry::{TypeRegistry, TypeSpec};
use crate::save::{SaveReport, SaveSession};

/// Saves object graphs into a [`KvStore`] and loads them back.
///
/// A `Codec` is immutable once built and can be shared across threads; all
/// per-pass state lives in the sessions it hands out.
#[derive(Debug)]
pub struct Codec {
    config: CodecConfig,
    registry: Arc<TypeRegistry>,
    abbreviations: AbbreviationTable,
}

impl Codec {
    /// Build a codec, validating the configured abbreviations.
    pub fn new(config: CodecConfig, registry: impl Into<Arc<TypeRegistry>>) -> CodecResult<Self> {
        let abbreviations = AbbreviationTable::from_pairs(&config.abbreviations)?;
        let registry = registry.into();
        debug!(
            types = registry.len(),
            abbreviations = abbreviations.len(),
            separator = %config.separator,
            "codec ready"
        );
        Ok(Self {
            config,
            registry,
            abbreviations,
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn abbreviations(&self) -> &AbbreviationTable {
        &self.abbreviations
    }

    /// Key builder for this codec's separator and abbreviations.
    pub fn keys(&self) -> KeyScheme<'_> {
        KeyScheme::new(&self.config.separator, &self.abbreviations)
    }

    /// Returns `true` if instances with `discriminator` are stored
    /// out-of-line behind a pointer.
    pub fn stores_by_reference(&self, discriminator: &str) -> bool {
        self.config.by_reference.contains(discriminator)
            || self
                .registry
                .get(discriminator)
                .is_some_and(TypeSpec::is_by_reference)
    }

    /// Save `value` under `root` in a fresh session.
    ///
    /// Never fails as a whole: slots that could not be written are listed in
    /// the returned report and reload as absent.
    pub fn save(&self, root: &str, value: &Value, store: &dyn KvStore) -> SaveReport {
        let mut session = self.save_session(store);
        session.save(root, value);
        let report = session.finish();
        if report.is_complete() {
            debug!(
                root,
                entries = report.entries_written,
                pointers = report.pointers_minted,
                "saved"
            );
        } else {
            warn!(
                root,
                entries = report.entries_written,
                failures = report.failures.len(),
                "saved with failures"
            );
        }
        report
    }

    /// Load the value under `root` in a fresh session.
    ///
    /// A root that was never written loads as [`Value::Null`].
    pub fn load(&self, root: &str, store: &dyn KvStore) -> CodecResult<Value> {
        let value = self.load_session(store).load(root)?;
        debug!(root, kind = ?value.kind(), "loaded");
        Ok(value)
    }

    /// A save session whose reference table spans every root saved through
    /// it.
    pub fn save_session<'a>(&'a self, store: &'a dyn KvStore) -> SaveSession<'a> {
        SaveSession::new(self, store)
    }

    /// A load session whose pointer table spans every root loaded through
    /// it.
    pub fn load_session<'a>(&'a self, store: &'a dyn KvStore) -> LoadSession<'a> {
        LoadSession::new(self, store)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            config: CodecConfig::default(),
            registry: Arc::new(TypeRegistry::new()),
            abbreviations: AbbreviationTable::new(),
        }
    }
}

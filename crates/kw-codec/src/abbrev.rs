//! Bidirectional field-name abbreviation.
//!
//! Stored keys embed field names, so long names cost space in every key
//! beneath them. The table swaps a full name for a short code on save and
//! back on load. Names without an entry pass through unchanged both ways.
//!
//! The table stays a bijection: a full name maps to one code, a code to one
//! full name. It cannot protect against an *unregistered* name that happens
//! to equal a registered code; choosing codes that no real field uses is the
//! caller's responsibility.

use std::collections::HashMap;

use kw_types::record::{FIELD_SEPARATOR, TYPE_FIELD};

use crate::error::{CodecError, CodecResult};
use crate::keys::KEYS_SUFFIX;

/// Short code of the discriminator slot. Every record's tag lives at
/// `root + "t"`.
pub const TYPE_CODE: &str = "t";

/// A bijective map between full field names and short codes.
#[derive(Clone, Debug)]
pub struct AbbreviationTable {
    short_by_full: HashMap<String, String>,
    full_by_short: HashMap<String, String>,
}

impl AbbreviationTable {
    /// A table holding only the built-in `type -> t` entry.
    pub fn new() -> Self {
        let mut table = Self {
            short_by_full: HashMap::new(),
            full_by_short: HashMap::new(),
        };
        table
            .short_by_full
            .insert(TYPE_FIELD.to_string(), TYPE_CODE.to_string());
        table
            .full_by_short
            .insert(TYPE_CODE.to_string(), TYPE_FIELD.to_string());
        table
    }

    /// Build a table from `(full, short)` pairs on top of the built-ins.
    pub fn from_pairs<I, F, S>(pairs: I) -> CodecResult<Self>
    where
        I: IntoIterator<Item = (F, S)>,
        F: Into<String>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (full, short) in pairs {
            table.insert(full, short)?;
        }
        Ok(table)
    }

    /// Register `full <-> short`. Re-registering an identical pair is a
    /// no-op; anything that would break invertibility is rejected.
    pub fn insert(&mut self, full: impl Into<String>, short: impl Into<String>) -> CodecResult<()> {
        let full = full.into();
        let short = short.into();
        let reject = |reason: &str| CodecError::Abbreviation {
            full: full.clone(),
            short: short.clone(),
            reason: reason.into(),
        };

        if full.is_empty() || short.is_empty() {
            return Err(reject("names and codes must be non-empty"));
        }
        if full.contains(FIELD_SEPARATOR) || short.contains(FIELD_SEPARATOR) {
            return Err(reject("names and codes must not contain ','"));
        }
        if short == KEYS_SUFFIX {
            return Err(reject("code collides with the keys-list suffix"));
        }
        if let Some(existing) = self.short_by_full.get(&full) {
            if *existing == short {
                return Ok(());
            }
            return Err(reject(&format!("{full:?} is already abbreviated as {existing:?}")));
        }
        if let Some(existing) = self.full_by_short.get(&short) {
            return Err(reject(&format!("{short:?} already stands for {existing:?}")));
        }

        self.full_by_short.insert(short.clone(), full.clone());
        self.short_by_full.insert(full, short);
        Ok(())
    }

    /// The short code for `name`, or `name` itself if it has none.
    pub fn abbreviate<'a>(&'a self, name: &'a str) -> &'a str {
        self.short_by_full.get(name).map_or(name, String::as_str)
    }

    /// The full name for `code`, or `code` itself if it is not a code.
    pub fn expand<'a>(&'a self, code: &'a str) -> &'a str {
        self.full_by_short.get(code).map_or(code, String::as_str)
    }

    /// Number of entries, built-ins included.
    pub fn len(&self) -> usize {
        self.short_by_full.len()
    }

    pub fn is_empty(&self) -> bool {
        self.short_by_full.is_empty()
    }
}

impl Default for AbbreviationTable {
    fn default() -> Self {
        Self::new()
    }
}

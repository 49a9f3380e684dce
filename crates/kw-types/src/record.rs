//! Typed records: a field table with an optional type discriminator.
//!
//! Field names become storage key segments and are listed in a
//! comma-joined keys list, so they are validated on insertion:
//!
//! - must be non-empty
//! - must not contain `,`
//! - must not be `type`, which is the slot holding the discriminator

use std::collections::BTreeMap;

use crate::error::TypeError;
use crate::value::Value;

/// Name of the slot that carries a record's discriminator.
pub const TYPE_FIELD: &str = "type";

/// Separator used when field names are joined into a keys list.
pub const FIELD_SEPARATOR: char = ',';

/// A mapping from field name to value, optionally tagged with a type
/// discriminator.
///
/// Records without a tag are "untyped": they carry data but no registered
/// behavior.
#[derive(Clone, Debug, Default)]
pub struct Record {
    tag: Option<String>,
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record tagged with `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Create an empty untyped record.
    pub fn untyped() -> Self {
        Self::default()
    }

    /// The type discriminator, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn set_tag(&mut self, tag: Option<String>) {
        self.tag = tag;
    }

    /// Insert a field, returning the previous value if one existed.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, TypeError> {
        let name = name.into();
        validate_field_name(&name)?;
        Ok(self.fields.insert(name, value.into()))
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<Self, TypeError> {
        self.insert(name, value)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.fields.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Check that `name` can be stored as a record field.
pub fn validate_field_name(name: &str) -> Result<(), TypeError> {
    let reason = if name.is_empty() {
        "field name must not be empty"
    } else if name.contains(FIELD_SEPARATOR) {
        "field name must not contain ','"
    } else if name == TYPE_FIELD {
        "'type' is reserved for the record discriminator"
    } else {
        return Ok(());
    };
    Err(TypeError::InvalidFieldName {
        name: name.to_string(),
        reason: reason.into(),
    })
}

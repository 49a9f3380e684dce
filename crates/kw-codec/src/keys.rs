//! Storage key construction.
//!
//! A child key is its parent key, the configured separator, and the child's
//! abbreviated segment, concatenated. With the default empty separator this
//! is plain `parent ++ abbreviate(field)`.
//!
//! Reserved slots under a root:
//!
//! | slot          | key                          |
//! |---------------|------------------------------|
//! | type tag      | `root s t`                   |
//! | keys list     | `root s keys`                |
//! | record field  | `root s abbreviate(field)`   |
//! | sequence item | `root s [<index>]`           |
//! | set item      | `root s item[<index>]`       |
//! | map entry     | `root s key[<index>]` / `root s value[<index>]` |
//!
//! Ordinals are bracketed so that generated segments stay unambiguous under
//! the empty separator: element 1 of element 1 is `s[1][1]`, never the
//! `s11` that element 11 would also produce.

use kw_types::record::{FIELD_SEPARATOR, TYPE_FIELD};

use crate::abbrev::AbbreviationTable;

/// Suffix of the slot holding a record's comma-joined field list.
pub const KEYS_SUFFIX: &str = "keys";
/// Field holding a sequence's element count.
pub const LENGTH_FIELD: &str = "length";
/// Field holding a set's or map's cardinality.
pub const SIZE_FIELD: &str = "size";
/// Field of a reference placeholder naming its pointer.
pub const POINTER_FIELD: &str = "pointer";

const ITEM_PREFIX: &str = "item";
const ENTRY_KEY_PREFIX: &str = "key";
const ENTRY_VALUE_PREFIX: &str = "value";

/// Builds storage keys for one codec configuration.
#[derive(Clone, Copy, Debug)]
pub struct KeyScheme<'a> {
    separator: &'a str,
    abbreviations: &'a AbbreviationTable,
}

impl<'a> KeyScheme<'a> {
    pub fn new(separator: &'a str, abbreviations: &'a AbbreviationTable) -> Self {
        Self {
            separator,
            abbreviations,
        }
    }

    /// `parent ++ separator ++ segment`, with no abbreviation applied.
    pub fn raw(&self, parent: &str, segment: &str) -> String {
        let mut key = String::with_capacity(parent.len() + self.separator.len() + segment.len());
        key.push_str(parent);
        key.push_str(self.separator);
        key.push_str(segment);
        key
    }

    /// Key of a named field: the parent key extended by the field's
    /// abbreviated name.
    pub fn field(&self, parent: &str, name: &str) -> String {
        self.raw(parent, self.abbreviations.abbreviate(name))
    }

    pub fn type_key(&self, root: &str) -> String {
        self.field(root, TYPE_FIELD)
    }

    pub fn keys_key(&self, root: &str) -> String {
        self.raw(root, KEYS_SUFFIX)
    }

    pub fn index(&self, root: &str, index: usize) -> String {
        self.raw(root, &ordinal("", index))
    }

    pub fn item(&self, root: &str, index: usize) -> String {
        self.raw(root, &ordinal(ITEM_PREFIX, index))
    }

    pub fn entry_key(&self, root: &str, index: usize) -> String {
        self.raw(root, &ordinal(ENTRY_KEY_PREFIX, index))
    }

    pub fn entry_value(&self, root: &str, index: usize) -> String {
        self.raw(root, &ordinal(ENTRY_VALUE_PREFIX, index))
    }

    pub fn abbreviate(&self, name: &'a str) -> &'a str {
        self.abbreviations.abbreviate(name)
    }

    pub fn expand(&self, code: &'a str) -> &'a str {
        self.abbreviations.expand(code)
    }

    /// Returns `true` if a field stored under `segment` would overwrite the
    /// keys list or the type tag.
    pub fn is_reserved_segment(&self, segment: &str) -> bool {
        segment == KEYS_SUFFIX || segment == self.abbreviations.abbreviate(TYPE_FIELD)
    }

    /// Abbreviate and comma-join field names into a keys list.
    pub fn join_fields<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> String {
        let mut list = String::new();
        for (i, name) in names.into_iter().enumerate() {
            if i > 0 {
                list.push(FIELD_SEPARATOR);
            }
            list.push_str(self.abbreviations.abbreviate(name));
        }
        list
    }
}

fn ordinal(prefix: &str, index: usize) -> String {
    format!("{prefix}[{index}]")
}

/// Split a stored keys list into its (still abbreviated) codes.
pub fn split_fields(list: &str) -> impl Iterator<Item = &str> {
    list.split(FIELD_SEPARATOR).filter(|code| !code.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AbbreviationTable {
        AbbreviationTable::from_pairs([("hitpoints", "hp")]).unwrap()
    }

    #[test]
    fn field_concatenates_abbreviated_name() {
        let t = table();
        let keys = KeyScheme::new("", &t);
        assert_eq!(keys.field("creep", "hitpoints"), "creephp");
        assert_eq!(keys.field("creep", "owner"), "creepowner");
    }

    #[test]
    fn separator_is_inserted() {
        let t = table();
        let keys = KeyScheme::new(".", &t);
        assert_eq!(keys.field("creep", "hitpoints"), "creep.hp");
        assert_eq!(keys.keys_key("creep"), "creep.keys");
    }

    #[test]
    fn reserved_slots() {
        let t = table();
        let keys = KeyScheme::new("", &t);
        assert_eq!(keys.type_key("r"), "rt");
        assert_eq!(keys.keys_key("r"), "rkeys");
        assert_eq!(keys.index("r", 3), "r[3]");
        assert_eq!(keys.item("r", 0), "ritem[0]");
        assert_eq!(keys.entry_key("r", 1), "rkey[1]");
        assert_eq!(keys.entry_value("r", 1), "rvalue[1]");
    }

    #[test]
    fn nested_ordinals_do_not_collide() {
        let t = table();
        let keys = KeyScheme::new("", &t);
        assert_ne!(keys.index(&keys.index("s", 1), 1), keys.index("s", 11));
        assert_ne!(keys.item(&keys.item("s", 1), 1), keys.item("s", 11));
        assert_ne!(
            keys.entry_value(&keys.entry_key("s", 1), 1),
            keys.entry_key("s", 11)
        );
    }

    #[test]
    fn keys_are_deterministic() {
        let t = table();
        let keys = KeyScheme::new("", &t);
        assert_eq!(keys.field("a", "hitpoints"), keys.field("a", "hitpoints"));
    }

    #[test]
    fn reserved_segments() {
        let t = table();
        let keys = KeyScheme::new("", &t);
        assert!(keys.is_reserved_segment("keys"));
        assert!(keys.is_reserved_segment("t"));
        assert!(!keys.is_reserved_segment("hp"));
    }

    #[test]
    fn join_and_split_fields() {
        let t = table();
        let keys = KeyScheme::new("", &t);
        let list = keys.join_fields(["hitpoints", "owner"]);
        assert_eq!(list, "hp,owner");
        let codes: Vec<&str> = split_fields(&list).collect();
        assert_eq!(codes, vec!["hp", "owner"]);
        assert_eq!(keys.join_fields(std::iter::empty()), "");
        assert_eq!(split_fields("").count(), 0);
    }
}

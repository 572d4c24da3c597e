//! Mapping table data model.
//!
//! The table is an ordered list of entries associating a canonical control
//! string with one or more target keys. Insertion order is significant: it
//! defines the tie-break order when several entries share one control
//! (fan-out). The table is owned by the store side and hot-swapped into the
//! engine between ticks; the engine only ever reads it.

pub mod store;

pub use store::{StoreError, TomlMappingStore};

use serde::{Deserialize, Serialize};

/// Target key of a mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    /// Human-readable key value, e.g. `"ArrowUp"` or `"a"`.
    pub display_key: String,
    /// Legacy numeric key code.
    pub key_code: u32,
    /// Physical key code, e.g. `"KeyA"`.
    pub physical_code: String,
}

/// One control→keys association.
///
/// `control` is the canonical text form of a [`LogicalControlId`]
/// (`"3"`, `"1+"`, `"1-"`); duplicate control strings across entries are
/// allowed and all of them fire.
///
/// [`LogicalControlId`]: crate::engine::LogicalControlId
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub control: String,
    pub keys: Vec<KeyDescriptor>,
}

/// Ordered collection of mapping entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingTable {
    #[serde(default)]
    pub entries: Vec<MappingEntry>,
}

impl MappingTable {
    /// All entries whose control string equals `control`, in table order.
    pub fn matches<'a>(&'a self, control: &'a str) -> impl Iterator<Item = &'a MappingEntry> {
        self.entries.iter().filter(move |e| e.control == control)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

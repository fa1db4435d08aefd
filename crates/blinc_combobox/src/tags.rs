//! Ad hoc tag registry
//!
//! Options typed by the user (rather than supplied by the caller) are kept
//! here for the lifetime of the widget. Entries are deduplicated by their
//! `(label, value)` pair; the most recently created tag comes first.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::option::{ComboOption, OptionTag, OptionValue};

/// Structural identity of an ad hoc tag
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TagKey {
    pub label: String,
    pub value: OptionValue,
}

impl TagKey {
    pub fn of(option: &ComboOption) -> Self {
        Self {
            label: option.label.clone(),
            value: option.value.clone(),
        }
    }
}

/// Set of ad hoc options created through tagging
#[derive(Clone, Debug, Default)]
pub struct AddedOptions {
    entries: IndexMap<TagKey, ComboOption, FxBuildHasher>,
}

impl AddedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tag, returning `false` if an equal tag already exists
    ///
    /// The stored option is normalized to an enabled appended option.
    pub fn insert(&mut self, option: &ComboOption) -> bool {
        let key = TagKey::of(option);
        if self.entries.contains_key(&key) {
            return false;
        }
        let stored = ComboOption {
            value: option.value.clone(),
            label: option.label.clone(),
            extra: Some(OptionTag::Appended),
            disabled: false,
        };
        self.entries.shift_insert(0, key, stored);
        true
    }

    pub fn contains(&self, key: &TagKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComboOption> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

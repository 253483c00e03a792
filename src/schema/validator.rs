//! Item validation against a collection definition
//!
//! An item is valid when every key it carries is declared and every
//! value matches its declared type. Missing fields are not checked, so
//! partial items and the empty item are valid.

use super::types::{CollectionDefinition, Item};

/// Checks a candidate item against the definition.
///
/// One unknown field or one mistyped value rejects the whole item.
pub fn is_data_valid(definition: &CollectionDefinition, item: &Item) -> bool {
    item.iter().all(|(key, value)| {
        definition
            .field_type(key)
            .is_some_and(|field_type| field_type.accepts(value))
    })
}

impl CollectionDefinition {
    /// Method form of [`is_data_valid`]
    pub fn is_data_valid(&self, item: &Item) -> bool {
        is_data_valid(self, item)
    }
}

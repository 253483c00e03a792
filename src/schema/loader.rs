//! Manifest loader
//!
//! The manifest is a JSON array of `{ "name": ..., "fields": { field: tag } }`
//! objects. Any problem found here aborts startup.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use super::errors::{SchemaError, SchemaResult};
use super::types::{CollectionDefinition, FieldType, RawCollection};

/// Collection names that would shadow built-in API routes
const RESERVED_NAMES: &[&str] = &["routes"];

/// Reads and parses the manifest file at `path`.
pub fn load_manifest(path: &Path) -> SchemaResult<Vec<CollectionDefinition>> {
    let content = fs::read_to_string(path).map_err(|e| SchemaError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    parse_manifest(&content)
}

/// Parses manifest JSON into collection definitions, keeping manifest order.
pub fn parse_manifest(manifest: &str) -> SchemaResult<Vec<CollectionDefinition>> {
    let raw: Vec<RawCollection> =
        serde_json::from_str(manifest).map_err(|e| SchemaError::Malformed(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut definitions = Vec::with_capacity(raw.len());

    for collection in raw {
        if !is_valid_name(&collection.name) {
            return Err(SchemaError::InvalidName(collection.name));
        }
        if !seen.insert(collection.name.clone()) {
            return Err(SchemaError::DuplicateCollection(collection.name));
        }

        let mut fields = HashMap::with_capacity(collection.fields.len());
        for (field, tag) in collection.fields {
            let field_type = FieldType::from_tag(&tag).ok_or_else(|| SchemaError::UnknownType {
                collection: collection.name.clone(),
                field: field.clone(),
                tag: tag.clone(),
            })?;
            fields.insert(field, field_type);
        }

        definitions.push(CollectionDefinition::new(collection.name, fields));
    }

    Ok(definitions)
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !RESERVED_NAMES.contains(&name)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

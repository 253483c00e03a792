//! Collection schemas for apio
//!
//! A manifest declares every collection served by the API. Each
//! collection is a name plus a flat map of field name to type tag.
//!
//! # Validation rules
//!
//! - Every field present in an item must be declared
//! - Every present value must match its declared type
//! - Absent fields are never checked (partial items are valid)

mod errors;
mod loader;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaResult};
pub use loader::{load_manifest, parse_manifest};
pub use types::{CollectionDefinition, FieldType, Item, ValueKind};
pub use validator::is_data_valid;

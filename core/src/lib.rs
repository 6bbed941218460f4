//! Core definition types and the definition registry for castiron.
//!
//! This crate defines the backend-neutral vocabulary for declaring mapped
//! classes at runtime:
//!
//! - [`ClassDef`] — one named class definition: its physical table name plus
//!   an ordered mapping of attribute name to column descriptor, relationship
//!   descriptor, or literal value.
//! - [`ColumnDef`] / [`SqlType`] / [`DefaultValue`] — schema-column
//!   descriptors with constraints, defaults, and foreign keys.
//! - [`RelationshipDef`] — a lazily-resolved, by-name reference to a sibling
//!   mapped class.
//! - [`Registry`] — the accumulator of reusable definitions and recorded
//!   [`Modifier`]s, producing independent copies on every
//!   [`snapshot`](Registry::snapshot).
//!
//! Validation ([`validate_definition`], [`validate_identifier`]) catches
//! structural errors — a missing table name, unsafe identifiers, duplicate
//! attributes — before a backend turns definitions into live mapped classes.
//!
//! # Example
//!
//! ```
//! use castiron_core::*;
//!
//! let mut registry = Registry::new();
//! registry.add_class(
//!     "User",
//!     ClassDef::for_table("user")
//!         .column("id", ColumnDef::new(SqlType::Integer).primary_key().autoincrement())
//!         .column("username", ColumnDef::new(SqlType::Text).not_null().indexed()),
//! );
//!
//! let def = registry.get("User").unwrap();
//! assert!(validate_definition("User", def).is_empty());
//! assert_eq!(def.table_name(), Some("user"));
//! ```

mod registry;
mod types;
mod validate;

pub use registry::{Registry, RegistryError};
pub use types::*;
pub use validate::{DefinitionError, validate_definition, validate_identifier};

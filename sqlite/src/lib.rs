//! SQLite backend for castiron: turn class definitions into live,
//! queryable data-access models.
//!
//! A [`Casting`] takes a set of class definitions (usually collected in a
//! [`Registry`](castiron_core::Registry)), synthesizes one [`MappedClass`]
//! per definition into a process-uniquely named [`Namespace`], connects an
//! [`Engine`] to a SQLite database, optionally provisions the schema, and
//! hands out [`Session`]s for inserting and querying rows.
//!
//! # Quick start
//!
//! ```
//! use castiron_core::{ClassDef, ColumnDef, Registry, RelationshipDef, SqlType};
//! use castiron_sqlite::{Casting, CastingOptions};
//! use rusqlite::types::Value;
//!
//! let mut registry = Registry::new();
//! registry
//!     .add_class(
//!         "User",
//!         ClassDef::for_table("user")
//!             .column(
//!                 "id",
//!                 ColumnDef::new(SqlType::Integer).primary_key().autoincrement(),
//!             )
//!             .column("username", ColumnDef::new(SqlType::Text).not_null()),
//!     )
//!     .add_class(
//!         "Address",
//!         ClassDef::for_table("address")
//!             .column("id", ColumnDef::new(SqlType::Integer).primary_key())
//!             .column("street_address", ColumnDef::new(SqlType::Text))
//!             .column(
//!                 "user_id",
//!                 ColumnDef::new(SqlType::Integer)
//!                     .not_null()
//!                     .references("user", "id"),
//!             )
//!             .relationship("user", RelationshipDef::new("User").join_on("user_id", "id")),
//!     );
//!
//! let casting = Casting::materialize(
//!     &registry,
//!     "quick_start",
//!     "sqlite://",
//!     CastingOptions::new().create_schema(),
//! )
//! .unwrap();
//!
//! let session = casting.get_session().unwrap();
//! session
//!     .insert("User", &[("username", Value::Text("tom".into()))])
//!     .unwrap();
//!
//! let rows = session
//!     .query("Address")
//!     .unwrap()
//!     .join("User")
//!     .unwrap()
//!     .filter_eq("User", "username", Value::Text("tom".into()))
//!     .unwrap()
//!     .all()
//!     .unwrap();
//! assert!(rows.is_empty());
//! ```
//!
//! # Namespaces
//!
//! Namespace names are process-wide. Building a second casting under a taken
//! name fails with [`CastError::NamespaceCollision`] unless
//! [`CastingOptions::replace_namespace`] is set, in which case the name
//! resolves to the newest casting while older ones keep their own handle.

mod casting;
mod ddl;
mod engine;
mod error;
mod namespace;
mod session;

pub use casting::{Casting, CastingOptions};
pub use ddl::{create_index_sql, create_schema_sql, create_table_sql, drop_schema_sql};
pub use engine::{ConnectTarget, Engine};
pub use error::{CastError, Result};
pub use namespace::{MappedClass, Namespace, is_registered, lookup};
pub use session::{Query, Record, Session, SessionFactory};

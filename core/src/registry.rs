//! The definition registry.
//!
//! A [`Registry`] accumulates named [`ClassDef`]s and recorded [`Modifier`]s,
//! then hands out independent copies of the whole definition set on demand.
//! One registry can seed any number of independent models: every snapshot
//! clones the schema descriptors, so no mutable descriptor state is ever
//! shared between models or with the registry itself.
//!
//! # Example
//!
//! ```
//! use castiron_core::{ClassDef, ColumnDef, Registry, SqlType};
//!
//! let mut registry = Registry::new();
//! registry
//!     .add_class(
//!         "User",
//!         ClassDef::for_table("user")
//!             .column("id", ColumnDef::new(SqlType::Integer).primary_key()),
//!     )
//!     .add_class(
//!         "Address",
//!         ClassDef::for_table("address")
//!             .column("id", ColumnDef::new(SqlType::Integer).primary_key()),
//!     );
//!
//! let snapshot = registry.snapshot();
//! assert_eq!(snapshot.len(), 2);
//! assert_eq!(snapshot[0].0, "User");
//! ```

use std::path::Path;

use thiserror::Error;

use crate::{ClassDef, Modifier};

/// Errors raised while loading registry contents from external documents.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document parsed but did not have the expected shape.
    #[error("invalid definition document: {0}")]
    InvalidDocument(String),
}

/// Accumulator of reusable class definitions and deferred modifiers.
///
/// Definitions keep their insertion order, which later becomes the synthesis
/// order of the materialized model. Re-adding a name silently overwrites the
/// stored definition in place. [`snapshot`](Registry::snapshot) never mutates
/// the registry — it produces fresh copies every time, so one registry can be
/// materialized repeatedly.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    defs: Vec<(String, ClassDef)>,
    modifiers: Vec<Modifier>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a class definition under the given name.
    ///
    /// Silently overwrites an existing definition with the same name, keeping
    /// its original position. Returns the registry for fluent chaining.
    pub fn add_class(&mut self, name: &str, def: ClassDef) -> &mut Self {
        match self.defs.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = def,
            None => self.defs.push((name.to_string(), def)),
        }
        self
    }

    /// Records a deferred modifier invocation.
    ///
    /// Modifiers are carried into every materialized model unapplied; see
    /// [`Modifier`] for the contract. Returns the registry for fluent
    /// chaining.
    pub fn add_modifier(&mut self, modifier: Modifier) -> &mut Self {
        self.modifiers.push(modifier);
        self
    }

    /// Returns the stored definitions in insertion order.
    pub fn classes(&self) -> impl Iterator<Item = (&str, &ClassDef)> {
        self.defs.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Looks up a stored definition by name.
    pub fn get(&self, name: &str) -> Option<&ClassDef> {
        self.defs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, def)| def)
    }

    /// Returns the recorded modifiers in recording order.
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Number of stored definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the registry holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Produces an independent copy of every stored definition.
    ///
    /// Schema descriptors are freshly cloned via [`ClassDef::duplicate`];
    /// the registry's own definitions are never touched. Two snapshots share
    /// no mutable state with each other or with the registry.
    pub fn snapshot(&self) -> Vec<(String, ClassDef)> {
        self.defs
            .iter()
            .map(|(name, def)| (name.clone(), def.duplicate()))
            .collect()
    }

    /// Builds a registry from a JSON document.
    ///
    /// The document must be a top-level object mapping class names to
    /// definitions. Entry order in the document becomes definition order.
    ///
    /// # Examples
    ///
    /// ```
    /// use castiron_core::Registry;
    ///
    /// let registry = Registry::from_json_str(
    ///     r#"{
    ///         "User": {
    ///             "table": "user",
    ///             "attrs": [["id", {"Column": {"sql_type": "Integer", "primary_key": true}}]]
    ///         }
    ///     }"#,
    /// )
    /// .unwrap();
    /// assert_eq!(registry.len(), 1);
    /// assert!(registry.get("User").is_some());
    /// ```
    pub fn from_json_str(document: &str) -> Result<Self, RegistryError> {
        let value: serde_json::Value = serde_json::from_str(document)?;
        let serde_json::Value::Object(entries) = value else {
            return Err(RegistryError::InvalidDocument(
                "expected a top-level object mapping class names to definitions".to_string(),
            ));
        };

        let mut registry = Registry::new();
        for (name, def_value) in entries {
            let def: ClassDef = serde_json::from_value(def_value)?;
            registry.add_class(&name, def);
        }
        Ok(registry)
    }

    /// Builds a registry from a JSON file.
    ///
    /// See [`from_json_str`](Registry::from_json_str) for the document shape.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let document = std::fs::read_to_string(path)?;
        Self::from_json_str(&document)
    }
}

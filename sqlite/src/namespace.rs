//! Mapped-class synthesis and the process-wide namespace table.
//!
//! A [`Namespace`] is a uniquely named container of [`MappedClass`]es — the
//! runtime types synthesized from class definitions. Namespaces live in a
//! process-wide table with explicit create-or-fail / create-or-replace
//! registration: a second casting may only take over an existing name when
//! replacement is explicitly requested.
//!
//! Synthesis happens *before* registration, so a failed construction never
//! leaks a partially built namespace into the process table.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use castiron_core::{
    Attr, ClassDef, ColumnDef, DefinitionError, ForeignKeyRef, Literal, RelationshipDef,
    validate_definition,
};

use crate::error::{CastError, Result};

/// A mapped class: one synthesized runtime type bound to a physical table.
///
/// Attributes are taken verbatim from the (cloned) class definition, split by
/// kind and kept in definition order. The class knows how to resolve an
/// attribute name to its physical column and how to find the relationship or
/// foreign key leading to a sibling class.
///
/// # Examples
///
/// ```
/// use castiron_core::{ClassDef, ColumnDef, SqlType};
/// use castiron_sqlite::MappedClass;
///
/// let def = ClassDef::for_table("user")
///     .column("id", ColumnDef::new(SqlType::Integer).primary_key())
///     .column("username", ColumnDef::new(SqlType::Text).named("user"));
///
/// let class = MappedClass::synthesize("User", &def).unwrap();
/// assert_eq!(class.table_name, "user");
/// assert_eq!(class.physical_column("username"), Some("user"));
/// assert_eq!(class.physical_column("id"), Some("id"));
/// ```
#[derive(Debug, Clone)]
pub struct MappedClass {
    /// Name the class is registered under in its namespace.
    pub class_name: String,
    /// Physical table the class maps to.
    pub table_name: String,
    /// Column attributes in definition order.
    pub columns: Vec<(String, ColumnDef)>,
    /// Relationship attributes in definition order.
    pub relationships: Vec<(String, RelationshipDef)>,
    /// Literal attributes in definition order.
    pub literals: Vec<(String, Literal)>,
}

impl MappedClass {
    /// Synthesizes a mapped class from a named definition.
    ///
    /// # Errors
    ///
    /// Returns [`CastError::MissingTableName`] when the definition does not
    /// name a table, or [`CastError::Definition`] for any other structural
    /// problem (unsafe identifiers, duplicate attributes).
    pub fn synthesize(class_name: &str, def: &ClassDef) -> Result<Self> {
        if let Some(error) = validate_definition(class_name, def).into_iter().next() {
            return Err(match error {
                DefinitionError::MissingTableName(name) => CastError::MissingTableName(name),
                other => CastError::Definition(other),
            });
        }

        // validate_definition guarantees the table name is present.
        let table_name = def.table_name().unwrap_or_default().to_string();

        let mut columns = Vec::new();
        let mut relationships = Vec::new();
        let mut literals = Vec::new();
        for (name, attr) in &def.attrs {
            match attr {
                Attr::Column(col) => columns.push((name.clone(), col.clone())),
                Attr::Relationship(rel) => relationships.push((name.clone(), rel.clone())),
                Attr::Literal(lit) => literals.push((name.clone(), lit.clone())),
            }
        }

        Ok(Self {
            class_name: class_name.to_string(),
            table_name,
            columns,
            relationships,
            literals,
        })
    }

    /// Looks up a column descriptor by attribute name.
    pub fn column(&self, attr: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|(name, _)| name == attr)
            .map(|(_, col)| col)
    }

    /// Resolves an attribute name to its physical column name.
    ///
    /// Returns the column's explicit name override when present, otherwise
    /// the attribute name itself; `None` for non-column attributes.
    pub fn physical_column(&self, attr: &str) -> Option<&str> {
        self.columns.iter().find(|(name, _)| name == attr).map(
            |(name, col)| match &col.column_name {
                Some(physical) => physical.as_str(),
                None => name.as_str(),
            },
        )
    }

    /// Returns the attribute name of the first primary-key column.
    pub fn primary_key_attr(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|(_, col)| col.primary_key)
            .map(|(name, _)| name.as_str())
    }

    /// Finds the relationship attribute targeting the named class.
    pub fn relationship_to(&self, target_class: &str) -> Option<&RelationshipDef> {
        self.relationships
            .iter()
            .find(|(_, rel)| rel.target == target_class)
            .map(|(_, rel)| rel)
    }

    /// Finds the first column carrying a foreign key into the given table.
    ///
    /// Returns the attribute name and the reference.
    pub fn foreign_key_to(&self, table: &str) -> Option<(&str, &ForeignKeyRef)> {
        self.columns.iter().find_map(|(name, col)| {
            col.foreign_key
                .as_ref()
                .filter(|fk| fk.table == table)
                .map(|fk| (name.as_str(), fk))
        })
    }
}

/// A uniquely named container of mapped classes.
///
/// Created by synthesizing every definition of a casting in definition order;
/// immutable afterwards. Shared through an [`Arc`] between the owning casting,
/// its sessions, and the process-wide table.
#[derive(Debug)]
pub struct Namespace {
    /// The process-unique namespace name.
    pub name: String,
    classes: Vec<MappedClass>,
}

impl Namespace {
    /// Synthesizes a namespace from a set of named definitions.
    ///
    /// Classes are synthesized in the iteration order of `defs`; the first
    /// failing definition aborts the whole synthesis. Cross-references
    /// between definitions are not resolved here — a relationship target is
    /// a name resolved lazily once all classes exist.
    pub fn synthesize(name: &str, defs: &[(String, ClassDef)]) -> Result<Self> {
        let mut classes = Vec::with_capacity(defs.len());
        for (class_name, def) in defs {
            classes.push(MappedClass::synthesize(class_name, def)?);
        }
        Ok(Self {
            name: name.to_string(),
            classes,
        })
    }

    /// Looks up a mapped class by name.
    pub fn class(&self, name: &str) -> Option<&MappedClass> {
        self.classes.iter().find(|c| c.class_name == name)
    }

    /// Returns the mapped classes in synthesis order.
    pub fn classes(&self) -> &[MappedClass] {
        &self.classes
    }

    /// Returns the class names in synthesis order.
    pub fn class_names(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.class_name.as_str()).collect()
    }
}

static NAMESPACES: LazyLock<Mutex<HashMap<String, Arc<Namespace>>>> =
    LazyLock::new(Mutex::default);

fn table() -> MutexGuard<'static, HashMap<String, Arc<Namespace>>> {
    NAMESPACES.lock().unwrap_or_else(|e| e.into_inner())
}

/// Returns `true` if a namespace with the given name is registered.
pub fn is_registered(name: &str) -> bool {
    table().contains_key(name)
}

/// Looks up a registered namespace by name.
pub fn lookup(name: &str) -> Option<Arc<Namespace>> {
    table().get(name).cloned()
}

/// Registers a namespace in the process-wide table.
///
/// With `replace` unset this is create-or-fail: an existing entry under the
/// same name raises [`CastError::NamespaceCollision`]. With `replace` set the
/// prior entry is overwritten; castings already holding the old namespace
/// keep their own handle.
pub(crate) fn register(namespace: Arc<Namespace>, replace: bool) -> Result<()> {
    let mut entries = table();
    if !replace && entries.contains_key(&namespace.name) {
        return Err(CastError::NamespaceCollision(namespace.name.clone()));
    }
    let replaced = entries
        .insert(namespace.name.clone(), namespace.clone())
        .is_some();
    tracing::debug!(
        namespace = %namespace.name,
        classes = namespace.classes.len(),
        replaced,
        "namespace registered"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use castiron_core::SqlType;

    use super::*;

    fn user_def() -> ClassDef {
        ClassDef::for_table("user")
            .column("id", ColumnDef::new(SqlType::Integer).primary_key())
            .column("username", ColumnDef::new(SqlType::Text).named("user"))
    }

    #[test]
    fn test_synthesize_missing_table_name() {
        let def = ClassDef::new().column("id", ColumnDef::new(SqlType::Integer));
        let err = MappedClass::synthesize("User", &def).unwrap_err();
        assert!(matches!(err, CastError::MissingTableName(name) if name == "User"));
    }

    #[test]
    fn test_physical_column_resolution() {
        let class = MappedClass::synthesize("User", &user_def()).unwrap();
        assert_eq!(class.physical_column("username"), Some("user"));
        assert_eq!(class.physical_column("id"), Some("id"));
        assert_eq!(class.physical_column("missing"), None);
    }

    #[test]
    fn test_primary_key_attr() {
        let class = MappedClass::synthesize("User", &user_def()).unwrap();
        assert_eq!(class.primary_key_attr(), Some("id"));
    }

    #[test]
    fn test_foreign_key_to() {
        let def = ClassDef::for_table("address")
            .column("id", ColumnDef::new(SqlType::Integer).primary_key())
            .column(
                "user_id",
                ColumnDef::new(SqlType::Integer).references("user", "id"),
            );
        let class = MappedClass::synthesize("Address", &def).unwrap();
        let (attr, fk) = class.foreign_key_to("user").unwrap();
        assert_eq!(attr, "user_id");
        assert_eq!(fk.column, "id");
        assert!(class.foreign_key_to("order").is_none());
    }

    #[test]
    fn test_namespace_synthesis_order_and_lookup() {
        let defs = vec![
            ("User".to_string(), user_def()),
            ("Address".to_string(), ClassDef::for_table("address")),
        ];
        let ns = Namespace::synthesize("ns_unit_order", &defs).unwrap();
        assert_eq!(ns.class_names(), vec!["User", "Address"]);
        assert!(ns.class("User").is_some());
        assert!(ns.class("Order").is_none());
    }

    #[test]
    fn test_register_create_or_fail() {
        let ns = Arc::new(Namespace::synthesize("ns_unit_collision", &[]).unwrap());
        register(ns.clone(), false).unwrap();

        let dup = Arc::new(Namespace::synthesize("ns_unit_collision", &[]).unwrap());
        let err = register(dup, false).unwrap_err();
        assert!(matches!(err, CastError::NamespaceCollision(_)));
        assert!(err.to_string().contains("replace_namespace"));
    }

    #[test]
    fn test_register_replace_overwrites() {
        let defs = vec![("User".to_string(), user_def())];
        let first = Arc::new(Namespace::synthesize("ns_unit_replace", &[]).unwrap());
        register(first, false).unwrap();

        let second = Arc::new(Namespace::synthesize("ns_unit_replace", &defs).unwrap());
        register(second, true).unwrap();

        let resolved = lookup("ns_unit_replace").unwrap();
        assert!(resolved.class("User").is_some());
    }
}

//! Definition types for runtime-declared mapped classes.
//!
//! This module defines the descriptor vocabulary used to declare tables and
//! their columns at runtime. A [`ClassDef`] is a named mapping from attribute
//! name to a column descriptor, a relationship descriptor, or a literal value,
//! plus the name of the physical table it maps to. Definitions are plain data:
//! they serialize with [`serde`] and can round-trip through JSON files.
//!
//! Nothing in this crate touches a database. A backend crate consumes cloned
//! definitions and synthesizes mapped classes from them.

use serde::{Deserialize, Serialize};

/// SQL type tag for a column.
///
/// The backend maps each tag to a concrete column type when generating DDL.
///
/// # Examples
///
/// ```
/// use castiron_core::SqlType;
///
/// let ty = SqlType::Integer;
/// assert_ne!(ty, SqlType::Text);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    /// Integer value.
    Integer,
    /// 64-bit integer value.
    BigInt,
    /// Floating-point value.
    Real,
    /// Text value.
    Text,
    /// Binary blob.
    Blob,
    /// Boolean value (stored as an integer by most backends).
    Boolean,
    /// Date-and-time value.
    DateTime,
}

/// Default value for a column.
///
/// Rendered into the column's `DEFAULT` clause by the backend.
/// [`CurrentTimestamp`](DefaultValue::CurrentTimestamp) becomes a
/// database-side "now" expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// Literal integer default.
    Integer(i64),
    /// Literal floating-point default.
    Real(f64),
    /// Literal text default.
    Text(String),
    /// Literal boolean default.
    Boolean(bool),
    /// Database-evaluated current timestamp.
    CurrentTimestamp,
}

/// Foreign-key reference to a column of another table.
///
/// The target is named by *physical* table and column name, and is resolved
/// by the database when the schema is created — the referenced table does not
/// need to be defined before the referencing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Physical name of the referenced table.
    pub table: String,
    /// Physical name of the referenced column.
    pub column: String,
}

impl ForeignKeyRef {
    /// Creates a reference to `table.column`.
    pub fn new(table: &str, column: &str) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

fn nullable_default() -> bool {
    true
}

/// Schema-column descriptor.
///
/// Describes one column of a mapped class: its SQL type, constraints, default,
/// and an optional physical column name when it differs from the attribute
/// name the class exposes.
///
/// Use [`new`](ColumnDef::new) and chain builder methods.
///
/// # Examples
///
/// ```
/// use castiron_core::{ColumnDef, DefaultValue, SqlType};
///
/// let id = ColumnDef::new(SqlType::Integer).primary_key().autoincrement();
/// assert!(id.primary_key);
///
/// // Attribute `username` stored in physical column `user`
/// let username = ColumnDef::new(SqlType::Text)
///     .named("user")
///     .not_null()
///     .indexed();
/// assert_eq!(username.column_name.as_deref(), Some("user"));
///
/// let balance = ColumnDef::new(SqlType::Real)
///     .not_null()
///     .default_value(DefaultValue::Real(0.0));
/// assert!(!balance.nullable);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// SQL type of the column.
    pub sql_type: SqlType,
    /// Physical column name, when it differs from the attribute name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    /// Part of the primary key?
    #[serde(default)]
    pub primary_key: bool,
    /// Auto-incrementing? Only meaningful on an integer primary key.
    #[serde(default)]
    pub autoincrement: bool,
    /// Accepts NULL? Defaults to `true`.
    #[serde(default = "nullable_default")]
    pub nullable: bool,
    /// Carries a UNIQUE constraint?
    #[serde(default)]
    pub unique: bool,
    /// Covered by a secondary index?
    #[serde(default)]
    pub indexed: bool,
    /// Default value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Foreign-key reference, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
}

impl ColumnDef {
    /// Creates a nullable column of the given type with no constraints.
    pub fn new(sql_type: SqlType) -> Self {
        Self {
            sql_type,
            column_name: None,
            primary_key: false,
            autoincrement: false,
            nullable: true,
            unique: false,
            indexed: false,
            default: None,
            foreign_key: None,
        }
    }

    /// Sets the physical column name.
    pub fn named(mut self, name: &str) -> Self {
        self.column_name = Some(name.to_string());
        self
    }

    /// Marks the column as part of the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Marks the column as auto-incrementing.
    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    /// Forbids NULL values.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Adds a UNIQUE constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Requests a secondary index on the column.
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Sets the default value.
    pub fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Adds a foreign-key reference to `table.column`.
    ///
    /// # Examples
    ///
    /// ```
    /// use castiron_core::{ColumnDef, SqlType};
    ///
    /// let user_id = ColumnDef::new(SqlType::Integer)
    ///     .not_null()
    ///     .references("user", "id");
    /// assert_eq!(user_id.foreign_key.as_ref().unwrap().table, "user");
    /// ```
    pub fn references(mut self, table: &str, column: &str) -> Self {
        self.foreign_key = Some(ForeignKeyRef::new(table, column));
        self
    }
}

/// Relationship descriptor pointing at a sibling mapped class.
///
/// The target is a *class name string*, resolved lazily after all classes of
/// a namespace exist — so two definitions may reference each other regardless
/// of the order in which they are synthesized. The join condition is either
/// given explicitly with [`join_on`](RelationshipDef::join_on) or derived at
/// query time from a foreign key pointing at the target's table.
///
/// # Examples
///
/// ```
/// use castiron_core::RelationshipDef;
///
/// let user = RelationshipDef::new("User").join_on("user_id", "id");
/// assert_eq!(user.target, "User");
/// assert_eq!(user.local.as_deref(), Some("user_id"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDef {
    /// Name of the target mapped class.
    pub target: String,
    /// Local attribute joined against the target, when explicit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    /// Target attribute joined against, when explicit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

impl RelationshipDef {
    /// Creates a relationship targeting the named class.
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            local: None,
            remote: None,
        }
    }

    /// Sets an explicit join condition: `self.local == target.remote`.
    pub fn join_on(mut self, local: &str, remote: &str) -> Self {
        self.local = Some(local.to_string());
        self.remote = Some(remote.to_string());
        self
    }
}

/// Literal attribute value carried on a mapped class verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Integer literal.
    Integer(i64),
    /// Floating-point literal.
    Real(f64),
    /// Text literal.
    Text(String),
    /// Boolean literal.
    Boolean(bool),
}

/// One entry of a class definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Attr {
    /// A schema-column descriptor.
    Column(ColumnDef),
    /// A relationship descriptor.
    Relationship(RelationshipDef),
    /// A literal value.
    Literal(Literal),
}

impl Attr {
    /// Produces an independent copy of the entry.
    ///
    /// Schema descriptors (columns, relationships) are freshly cloned so a
    /// definition can seed many independent models without shared mutable
    /// descriptor state; literal values pass through unchanged.
    pub fn duplicate(&self) -> Self {
        match self {
            Attr::Column(col) => Attr::Column(col.clone()),
            Attr::Relationship(rel) => Attr::Relationship(rel.clone()),
            Attr::Literal(lit) => Attr::Literal(lit.clone()),
        }
    }
}

/// A named class definition: the table it maps to plus its attributes.
///
/// Attributes keep their insertion order; that order is also the synthesis
/// order of the resulting mapped class. The table name is the one required
/// key of every definition — a backend refuses to synthesize a class whose
/// definition does not name a table.
///
/// # Examples
///
/// ```
/// use castiron_core::{ClassDef, ColumnDef, RelationshipDef, SqlType};
///
/// let address = ClassDef::for_table("address")
///     .column("id", ColumnDef::new(SqlType::Integer).primary_key())
///     .column(
///         "user_id",
///         ColumnDef::new(SqlType::Integer).not_null().references("user", "id"),
///     )
///     .relationship("user", RelationshipDef::new("User").join_on("user_id", "id"));
///
/// assert_eq!(address.table_name(), Some("address"));
/// assert_eq!(address.attr_names(), vec!["id", "user_id", "user"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    /// Physical table name. `None` makes the definition unsynthesizable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Attributes in insertion order.
    #[serde(default)]
    pub attrs: Vec<(String, Attr)>,
}

impl ClassDef {
    /// Creates an empty definition with no table name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty definition mapped to the given table.
    pub fn for_table(table: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            attrs: Vec::new(),
        }
    }

    /// Sets the table name.
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// Adds a column attribute.
    pub fn column(mut self, name: &str, column: ColumnDef) -> Self {
        self.attrs.push((name.to_string(), Attr::Column(column)));
        self
    }

    /// Adds a relationship attribute.
    pub fn relationship(mut self, name: &str, rel: RelationshipDef) -> Self {
        self.attrs.push((name.to_string(), Attr::Relationship(rel)));
        self
    }

    /// Adds a literal attribute.
    pub fn literal(mut self, name: &str, value: Literal) -> Self {
        self.attrs.push((name.to_string(), Attr::Literal(value)));
        self
    }

    /// Returns the table name, if set.
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Looks up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&Attr> {
        self.attrs
            .iter()
            .find(|(attr_name, _)| attr_name == name)
            .map(|(_, attr)| attr)
    }

    /// Returns attribute names in insertion order.
    pub fn attr_names(&self) -> Vec<&str> {
        self.attrs.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Iterates over the column attributes in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnDef)> {
        self.attrs.iter().filter_map(|(name, attr)| match attr {
            Attr::Column(col) => Some((name.as_str(), col)),
            _ => None,
        })
    }

    /// Produces an independent copy of the definition.
    ///
    /// Every schema descriptor is freshly cloned via [`Attr::duplicate`], so
    /// mutating one copy's descriptors never affects another copy or the
    /// original.
    pub fn duplicate(&self) -> Self {
        Self {
            table: self.table.clone(),
            attrs: self
                .attrs
                .iter()
                .map(|(name, attr)| (name.clone(), attr.duplicate()))
                .collect(),
        }
    }
}

/// A recorded deferred customization of a materialized model.
///
/// A modifier captures a named invocation with positional and keyword literal
/// arguments. Modifiers are accumulated on a [`Registry`](crate::Registry),
/// snapshot into every materialized casting, and exposed there for
/// inspection. They are **not applied** to the model: carrying the recorded
/// calls through unchanged is the whole contract.
///
/// # Examples
///
/// ```
/// use castiron_core::{Literal, Modifier};
///
/// let m = Modifier::new("attach_audit_columns")
///     .arg(Literal::Text("created_by".into()))
///     .kwarg("nullable", Literal::Boolean(true));
/// assert_eq!(m.name, "attach_audit_columns");
/// assert_eq!(m.args.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    /// Name of the deferred invocation.
    pub name: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Literal>,
    /// Keyword arguments.
    #[serde(default)]
    pub kwargs: Vec<(String, Literal)>,
}

impl Modifier {
    /// Creates a modifier with the given invocation name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            args: Vec::new(),
            kwargs: Vec::new(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: Literal) -> Self {
        self.args.push(value);
        self
    }

    /// Appends a keyword argument.
    pub fn kwarg(mut self, key: &str, value: Literal) -> Self {
        self.kwargs.push((key.to_string(), value));
        self
    }
}

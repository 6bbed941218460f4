//! Sessions and the query surface of a casting.
//!
//! A [`SessionFactory`] is configured at the end of a successful casting
//! construction; every [`Session`] it hands out shares the casting's engine
//! and namespace. Sessions resolve *attribute* names to *physical* column
//! names before any SQL is generated, so a class whose attribute `username`
//! maps to column `user` is queried by attribute throughout.
//!
//! Joins are resolved lazily by class name: a relationship descriptor wins
//! when present, otherwise a foreign key pointing at the target's table is
//! used — in either direction. This is what lets two definitions reference
//! each other regardless of synthesis order.
//!
//! # Example
//!
//! ```no_run
//! use castiron_sqlite::Casting;
//! use rusqlite::types::Value;
//!
//! # fn demo(casting: &Casting) -> castiron_sqlite::Result<()> {
//! let session = casting.get_session()?;
//! session.insert("User", &[("username", Value::Text("tom".into()))])?;
//! let rows = session
//!     .query("Address")?
//!     .join("User")?
//!     .filter_eq("User", "username", Value::Text("tom".into()))?
//!     .all()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use rusqlite::types::Value;

use crate::engine::Engine;
use crate::error::{CastError, Result};
use crate::namespace::{MappedClass, Namespace};

/// Hands out sessions bound to one casting's engine and namespace.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    engine: Engine,
    namespace: Arc<Namespace>,
}

impl SessionFactory {
    pub(crate) fn new(engine: Engine, namespace: Arc<Namespace>) -> Self {
        Self { engine, namespace }
    }

    /// Creates a new session.
    pub fn session(&self) -> Session {
        Session {
            engine: self.engine.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// A live data-access handle over a casting's mapped classes.
#[derive(Debug, Clone)]
pub struct Session {
    engine: Engine,
    namespace: Arc<Namespace>,
}

impl Session {
    fn mapped_class(&self, name: &str) -> Result<&MappedClass> {
        self.namespace
            .class(name)
            .ok_or_else(|| CastError::UnknownMappedClass {
                namespace: self.namespace.name.clone(),
                class: name.to_string(),
            })
    }

    /// Inserts one row into the class's table.
    ///
    /// Attribute names are resolved to physical columns; values are bound as
    /// parameters. Returns the number of inserted rows.
    ///
    /// # Errors
    ///
    /// [`CastError::UnknownMappedClass`] for an unknown class,
    /// [`CastError::UnknownAttribute`] for an attribute without a column, or
    /// [`CastError::Database`] when the statement fails.
    pub fn insert(&self, class: &str, values: &[(&str, Value)]) -> Result<usize> {
        let mapped = self.mapped_class(class)?;

        let mut columns = Vec::with_capacity(values.len());
        let mut params = Vec::with_capacity(values.len());
        for (attr, value) in values {
            let column =
                mapped
                    .physical_column(attr)
                    .ok_or_else(|| CastError::UnknownAttribute {
                        class: class.to_string(),
                        attr: attr.to_string(),
                    })?;
            columns.push(column);
            params.push(value.clone());
        }

        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            mapped.table_name,
            columns.join(", "),
            placeholders.join(", ")
        );
        self.engine.execute(&sql, &params)
    }

    /// Starts a query rooted at the given class.
    pub fn query(&self, class: &str) -> Result<Query<'_>> {
        let root = self.mapped_class(class)?;
        Ok(Query {
            session: self,
            root,
            joins: Vec::new(),
            filters: Vec::new(),
        })
    }

    /// Executes a raw parameterized statement. Escape hatch for anything the
    /// query builder does not cover.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        self.engine.execute(sql, params)
    }
}

#[derive(Debug)]
struct JoinClause {
    table: String,
    left: String,
    right: String,
}

/// One row of a query result, keyed by the root class's attribute names.
#[derive(Debug, Clone)]
pub struct Record {
    values: Vec<(String, Value)>,
}

impl Record {
    /// Returns the value of an attribute.
    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == attr)
            .map(|(_, value)| value)
    }

    /// Returns the attribute names in selection order.
    pub fn attrs(&self) -> Vec<&str> {
        self.values.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// A query over one mapped class, optionally joined to siblings.
///
/// The result rows carry the root class's columns only.
#[derive(Debug)]
pub struct Query<'a> {
    session: &'a Session,
    root: &'a MappedClass,
    joins: Vec<JoinClause>,
    filters: Vec<(String, Value)>,
}

impl<'a> Query<'a> {
    /// Joins the named class into the query.
    ///
    /// The join condition comes from a relationship descriptor on either
    /// side when one exists, otherwise from a foreign key between the two
    /// tables — again checked in both directions.
    ///
    /// # Errors
    ///
    /// [`CastError::UnknownMappedClass`] when the class does not exist, or
    /// [`CastError::UnknownRelationship`] when nothing connects the two.
    pub fn join(mut self, class: &str) -> Result<Self> {
        let target = self.session.mapped_class(class)?;

        let condition = resolve_join(self.root, target)
            .or_else(|| resolve_join(target, self.root).map(|(right, left)| (left, right)));
        let Some((left, right)) = condition else {
            return Err(CastError::UnknownRelationship {
                from: self.root.class_name.clone(),
                to: target.class_name.clone(),
            });
        };

        self.joins.push(JoinClause {
            table: target.table_name.clone(),
            left,
            right,
        });
        Ok(self)
    }

    /// Adds an equality filter on an attribute of the root or a joined class.
    pub fn filter_eq(mut self, class: &str, attr: &str, value: Value) -> Result<Self> {
        let mapped = self.session.mapped_class(class)?;

        let involved = mapped.table_name == self.root.table_name
            || self.joins.iter().any(|j| j.table == mapped.table_name);
        if !involved {
            return Err(CastError::UnknownRelationship {
                from: self.root.class_name.clone(),
                to: mapped.class_name.clone(),
            });
        }

        let column = mapped
            .physical_column(attr)
            .ok_or_else(|| CastError::UnknownAttribute {
                class: class.to_string(),
                attr: attr.to_string(),
            })?;
        self.filters
            .push((format!("{}.{}", mapped.table_name, column), value));
        Ok(self)
    }

    fn build_select(&self, projection: &str) -> String {
        let mut sql = format!("SELECT {} FROM {}", projection, self.root.table_name);
        for join in &self.joins {
            sql.push_str(&format!(
                " JOIN {} ON {} = {}",
                join.table, join.left, join.right
            ));
        }
        if !self.filters.is_empty() {
            let clauses: Vec<String> = self
                .filters
                .iter()
                .enumerate()
                .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql
    }

    fn params(&self) -> Vec<Value> {
        self.filters.iter().map(|(_, value)| value.clone()).collect()
    }

    /// Runs the query, returning the root class's rows.
    ///
    /// An empty result is a normal outcome, not an error.
    pub fn all(self) -> Result<Vec<Record>> {
        let attrs: Vec<String> = self
            .root
            .columns
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        let projection: Vec<String> = attrs
            .iter()
            .map(|attr| {
                // physical_column is total over the class's column attrs
                let column = self.root.physical_column(attr).unwrap_or(attr);
                format!("{}.{}", self.root.table_name, column)
            })
            .collect();

        let sql = self.build_select(&projection.join(", "));
        let params = self.params();
        self.session.engine.log_sql(&sql);

        let conn = self.session.engine.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
            let mut values = Vec::with_capacity(attrs.len());
            for (i, attr) in attrs.iter().enumerate() {
                values.push((attr.clone(), row.get::<_, Value>(i)?));
            }
            Ok(Record { values })
        })?;
        let records = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Runs the query, returning only the matching row count.
    pub fn count(self) -> Result<usize> {
        let sql = self.build_select("COUNT(*)");
        let params = self.params();
        self.session.engine.log_sql(&sql);

        let conn = self.session.engine.lock();
        let count: i64 = conn.query_row(
            &sql,
            rusqlite::params_from_iter(params.iter()),
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Resolves the join condition from `from` toward `to`, if `from` declares
/// one. Returns qualified `(from_column, to_column)` expressions.
fn resolve_join(from: &MappedClass, to: &MappedClass) -> Option<(String, String)> {
    if let Some(rel) = from.relationship_to(&to.class_name) {
        if let Some(local) = &rel.local {
            let local_col = from.physical_column(local)?;
            let remote_attr = rel.remote.as_deref().or_else(|| to.primary_key_attr())?;
            let remote_col = to.physical_column(remote_attr)?;
            return Some((
                format!("{}.{}", from.table_name, local_col),
                format!("{}.{}", to.table_name, remote_col),
            ));
        }
        // Relationship without an explicit join falls back to the foreign key.
    }

    let (attr, fk) = from.foreign_key_to(&to.table_name)?;
    let local_col = from.physical_column(attr)?;
    Some((
        format!("{}.{}", from.table_name, local_col),
        format!("{}.{}", to.table_name, fk.column),
    ))
}

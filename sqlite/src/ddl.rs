//! SQL schema generation for synthesized namespaces.
//!
//! Generates `CREATE TABLE` / `CREATE INDEX` scripts for every mapped class
//! of a namespace, and the matching `DROP TABLE` script. Creation follows
//! synthesis order and dropping reverses it, so foreign-key dependencies
//! between earlier and later tables resolve cleanly. Every identifier is
//! re-validated before being interpolated into SQL.

use castiron_core::{ColumnDef, DefaultValue, SqlType, validate_identifier};

use crate::error::Result;
use crate::namespace::{MappedClass, Namespace};

/// Maps a type tag to its SQLite column type.
fn sql_type_ddl(sql_type: SqlType) -> &'static str {
    match sql_type {
        SqlType::Integer => "INTEGER",
        SqlType::BigInt => "BIGINT",
        SqlType::Real => "REAL",
        SqlType::Text => "TEXT",
        SqlType::Blob => "BLOB",
        SqlType::Boolean => "BOOLEAN",
        SqlType::DateTime => "DATETIME",
    }
}

/// Renders a default value as a SQL expression.
fn default_ddl(default: &DefaultValue) -> String {
    match default {
        DefaultValue::Integer(v) => v.to_string(),
        DefaultValue::Real(v) => v.to_string(),
        DefaultValue::Text(v) => format!("'{}'", v.replace('\'', "''")),
        DefaultValue::Boolean(v) => if *v { "1" } else { "0" }.to_string(),
        DefaultValue::CurrentTimestamp => "(datetime('now'))".to_string(),
    }
}

fn physical_name<'a>(attr: &'a str, col: &'a ColumnDef) -> &'a str {
    col.column_name.as_deref().unwrap_or(attr)
}

/// Generates the `CREATE TABLE IF NOT EXISTS` statement for one mapped class.
///
/// A single integer primary-key column is declared inline (the only form
/// SQLite accepts `AUTOINCREMENT` on); composite primary keys become a
/// table-level clause. Foreign keys are emitted as table-level clauses after
/// the columns.
pub fn create_table_sql(class: &MappedClass) -> Result<String> {
    validate_identifier(&class.table_name)?;

    let pk_columns: Vec<&(String, ColumnDef)> = class
        .columns
        .iter()
        .filter(|(_, col)| col.primary_key)
        .collect();
    let inline_pk = pk_columns.len() == 1
        && matches!(
            pk_columns[0].1.sql_type,
            SqlType::Integer | SqlType::BigInt
        );

    let mut clauses: Vec<String> = Vec::new();
    for (attr, col) in &class.columns {
        let name = physical_name(attr, col);
        validate_identifier(name)?;

        let mut clause = format!("    {} {}", name, sql_type_ddl(col.sql_type));
        if col.primary_key && inline_pk {
            clause.push_str(" PRIMARY KEY");
            if col.autoincrement {
                clause.push_str(" AUTOINCREMENT");
            }
        } else {
            if !col.nullable {
                clause.push_str(" NOT NULL");
            }
            if col.unique {
                clause.push_str(" UNIQUE");
            }
        }
        if let Some(default) = &col.default {
            clause.push_str(" DEFAULT ");
            clause.push_str(&default_ddl(default));
        }
        clauses.push(clause);
    }

    if !inline_pk && !pk_columns.is_empty() {
        let names: Vec<&str> = pk_columns
            .iter()
            .map(|(attr, col)| physical_name(attr, col))
            .collect();
        clauses.push(format!("    PRIMARY KEY ({})", names.join(", ")));
    }

    for (attr, col) in &class.columns {
        if let Some(fk) = &col.foreign_key {
            validate_identifier(&fk.table)?;
            validate_identifier(&fk.column)?;
            clauses.push(format!(
                "    FOREIGN KEY ({}) REFERENCES {}({})",
                physical_name(attr, col),
                fk.table,
                fk.column
            ));
        }
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        class.table_name,
        clauses.join(",\n")
    ))
}

/// Generates `CREATE INDEX IF NOT EXISTS` statements for the class's indexed
/// columns.
pub fn create_index_sql(class: &MappedClass) -> Result<Vec<String>> {
    let mut statements = Vec::new();
    for (attr, col) in &class.columns {
        if !col.indexed {
            continue;
        }
        let name = physical_name(attr, col);
        validate_identifier(name)?;
        statements.push(format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_{name} ON {table}({name});",
            table = class.table_name,
            name = name
        ));
    }
    Ok(statements)
}

/// Generates the complete creation script for a namespace.
///
/// Tables appear in synthesis order, each followed by its indexes.
pub fn create_schema_sql(namespace: &Namespace) -> Result<String> {
    let mut script = String::new();
    for class in namespace.classes() {
        script.push_str(&create_table_sql(class)?);
        script.push('\n');
        for index in create_index_sql(class)? {
            script.push_str(&index);
            script.push('\n');
        }
    }
    Ok(script)
}

/// Generates the drop script for a namespace.
///
/// Uses `DROP TABLE IF EXISTS` in reverse synthesis order, so dropping a
/// schema that never existed is harmless.
pub fn drop_schema_sql(namespace: &Namespace) -> Result<String> {
    let mut script = String::new();
    for class in namespace.classes().iter().rev() {
        validate_identifier(&class.table_name)?;
        script.push_str(&format!("DROP TABLE IF EXISTS {};\n", class.table_name));
    }
    Ok(script)
}

//! Definition validation.
//!
//! Validates structural invariants of class definitions before a backend
//! synthesizes mapped classes from them: the required table name, identifier
//! hygiene for every name that ends up inside generated SQL, and duplicate
//! attribute names.
//!
//! # Examples
//!
//! ```
//! use castiron_core::*;
//!
//! let def = ClassDef::for_table("user")
//!     .column("id", ColumnDef::new(SqlType::Integer).primary_key());
//! assert!(validate_definition("User", &def).is_empty());
//!
//! // Missing the required table name
//! let bad = ClassDef::new().column("id", ColumnDef::new(SqlType::Integer));
//! let errors = validate_definition("User", &bad);
//! assert!(matches!(errors[0], DefinitionError::MissingTableName(_)));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Attr, ClassDef};

/// Class-definition validation errors.
///
/// Each variant describes a specific structural problem found during
/// validation. The `Display` impl provides a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Definition name is empty or whitespace-only.
    #[error("class definition name cannot be empty")]
    EmptyClassName,
    /// Definition does not name its physical table.
    #[error("class definition '{0}' does not name a table")]
    MissingTableName(String),
    /// A table, column, or attribute name is unusable inside SQL.
    #[error(
        "invalid identifier '{0}': identifiers must start with a letter or \
         underscore and contain only alphanumerics and underscores"
    )]
    InvalidIdentifier(String),
    /// Two attributes of one definition share a name.
    #[error("class definition '{class}' defines attribute '{attr}' twice")]
    DuplicateAttribute {
        /// Definition the duplicate occurs in.
        class: String,
        /// The duplicated attribute name.
        attr: String,
    },
}

/// Checks that a name is safe to interpolate into generated SQL.
///
/// Identifiers must start with an ASCII letter or underscore and contain
/// only ASCII alphanumerics and underscores.
///
/// # Examples
///
/// ```
/// use castiron_core::validate_identifier;
///
/// assert!(validate_identifier("user_id").is_ok());
/// assert!(validate_identifier("_hidden").is_ok());
/// assert!(validate_identifier("drop;--").is_err());
/// assert!(validate_identifier("1st").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), DefinitionError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DefinitionError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Validates one named class definition.
///
/// Checks the definition name, the required table name, every attribute and
/// physical column identifier, foreign-key target identifiers, and duplicate
/// attribute names. Returns the first error found, in a vector for
/// consistency with multi-error collectors.
pub fn validate_definition(name: &str, def: &ClassDef) -> Vec<DefinitionError> {
    let mut errors = Vec::new();

    if name.trim().is_empty() {
        errors.push(DefinitionError::EmptyClassName);
        return errors;
    }

    let Some(table) = def.table_name() else {
        errors.push(DefinitionError::MissingTableName(name.to_string()));
        return errors;
    };
    if let Err(e) = validate_identifier(table) {
        errors.push(e);
        return errors;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for (attr_name, attr) in &def.attrs {
        if let Err(e) = validate_identifier(attr_name) {
            errors.push(e);
            return errors;
        }
        if !seen.insert(attr_name.as_str()) {
            errors.push(DefinitionError::DuplicateAttribute {
                class: name.to_string(),
                attr: attr_name.clone(),
            });
            return errors;
        }

        if let Attr::Column(col) = attr {
            if let Some(column_name) = &col.column_name {
                if let Err(e) = validate_identifier(column_name) {
                    errors.push(e);
                    return errors;
                }
            }
            if let Some(fk) = &col.foreign_key {
                for ident in [fk.table.as_str(), fk.column.as_str()] {
                    if let Err(e) = validate_identifier(ident) {
                        errors.push(e);
                        return errors;
                    }
                }
            }
        }
    }

    errors
}

//! Error types for casting operations.
//!
//! Provides a unified error type covering namespace registration, class
//! synthesis, schema lifecycle, and session access failures.

use castiron_core::DefinitionError;
use thiserror::Error;

/// Errors that can occur while building or using a casting.
#[derive(Debug, Error)]
pub enum CastError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Target namespace name is already registered in this process.
    #[error(
        "there is already a namespace named '{0}'; a new casting cannot take \
         the name unless it is built with replace_namespace enabled"
    )]
    NamespaceCollision(String),

    /// A class definition lacks the required table name.
    #[error("class definition '{0}' does not have a table name")]
    MissingTableName(String),

    /// Lookup by class name found nothing in the namespace.
    #[error("namespace '{namespace}' does not contain a mapped class named '{class}'")]
    UnknownMappedClass {
        /// Namespace the lookup ran against.
        namespace: String,
        /// Requested class name.
        class: String,
    },

    /// Session requested before the session factory was configured.
    #[error("the casting's model is not active")]
    ModelInactive,

    /// Connection string is not one this backend understands.
    #[error("unsupported connection string: {0}")]
    InvalidConnectionString(String),

    /// No relationship or foreign key connects the two classes.
    #[error("no relationship or foreign key leads from '{from}' to '{to}'")]
    UnknownRelationship {
        /// Class the join starts from.
        from: String,
        /// Class the join targets.
        to: String,
    },

    /// A class has no attribute with the given name.
    #[error("mapped class '{class}' has no column attribute named '{attr}'")]
    UnknownAttribute {
        /// Class the lookup ran against.
        class: String,
        /// Requested attribute name.
        attr: String,
    },

    /// Structural problem in a class definition.
    #[error("definition error: {0}")]
    Definition(#[from] DefinitionError),
}

/// Convenience alias for results with [`CastError`].
pub type Result<T> = std::result::Result<T, CastError>;

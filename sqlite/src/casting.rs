//! Casting construction and lifecycle.
//!
//! A [`Casting`] binds a set of class definitions to a live, queryable
//! data-access surface: it registers a namespace, synthesizes one mapped
//! class per definition, optionally provisions the schema, and configures a
//! session factory. Construction either completes fully or fails without
//! leaving a usable partial model behind — in particular, a failed synthesis
//! never leaks a namespace into the process table.
//!
//! # Example
//!
//! ```
//! use castiron_core::{ClassDef, ColumnDef, Registry, SqlType};
//! use castiron_sqlite::{Casting, CastingOptions};
//!
//! let mut registry = Registry::new();
//! registry.add_class(
//!     "User",
//!     ClassDef::for_table("user")
//!         .column("id", ColumnDef::new(SqlType::Integer).primary_key().autoincrement())
//!         .column("username", ColumnDef::new(SqlType::Text).not_null()),
//! );
//!
//! let casting = Casting::materialize(
//!     &registry,
//!     "casting_doc_example",
//!     "sqlite://",
//!     CastingOptions::new().create_schema(),
//! )
//! .unwrap();
//!
//! let user = casting.get_mapped_class("User").unwrap();
//! assert_eq!(user.table_name, "user");
//! ```

use std::sync::Arc;

use castiron_core::{ClassDef, Modifier, Registry};
use serde::{Deserialize, Serialize};

use crate::ddl;
use crate::engine::Engine;
use crate::error::{CastError, Result};
use crate::namespace::{self, MappedClass, Namespace};
use crate::session::{Session, SessionFactory};

/// Configuration flags for constructing a casting.
///
/// All flags default to off. `pragmas` are free-form engine options applied
/// as SQLite `PRAGMA`s at connect time.
///
/// # Examples
///
/// ```
/// use castiron_sqlite::CastingOptions;
///
/// let options = CastingOptions::new()
///     .create_schema()
///     .drop_first()
///     .echo()
///     .pragma("cache_size", "-2000");
/// assert!(options.create_schema);
/// assert!(!options.replace_namespace);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CastingOptions {
    /// Create the schema during construction.
    #[serde(default)]
    pub create_schema: bool,
    /// Log every statement the engine executes.
    #[serde(default)]
    pub echo: bool,
    /// Drop existing schema objects before creating (only with
    /// `create_schema`; failures here are swallowed).
    #[serde(default)]
    pub drop_first: bool,
    /// Allow taking over an already-registered namespace name.
    #[serde(default)]
    pub replace_namespace: bool,
    /// Free-form `(key, value)` engine options, applied as `PRAGMA`s.
    #[serde(default)]
    pub pragmas: Vec<(String, String)>,
}

impl CastingOptions {
    /// Creates the default options (everything off).
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests schema creation during construction.
    pub fn create_schema(mut self) -> Self {
        self.create_schema = true;
        self
    }

    /// Enables statement echoing on the engine.
    pub fn echo(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Drops existing schema objects before creating.
    pub fn drop_first(mut self) -> Self {
        self.drop_first = true;
        self
    }

    /// Permits overwriting an existing namespace of the same name.
    pub fn replace_namespace(mut self) -> Self {
        self.replace_namespace = true;
        self
    }

    /// Adds a passthrough engine option.
    pub fn pragma(mut self, key: &str, value: &str) -> Self {
        self.pragmas.push((key.to_string(), value.to_string()));
        self
    }
}

/// The live, queryable unit: one namespace, one engine, one session factory.
///
/// Constructed with [`new`](Casting::new) from explicit definitions or with
/// [`materialize`](Casting::materialize) from a
/// [`Registry`](castiron_core::Registry). A `Casting` value only ever exists
/// fully constructed; every accessor is safe to call on it.
#[derive(Debug)]
pub struct Casting {
    namespace: Arc<Namespace>,
    engine: Engine,
    session_factory: Option<SessionFactory>,
    modifiers: Vec<Modifier>,
}

impl Casting {
    /// Builds a casting from named class definitions.
    ///
    /// Construction steps, in order:
    ///
    /// 1. Fail with [`CastError::NamespaceCollision`] if the namespace name
    ///    is taken and `replace_namespace` is off — before any connection is
    ///    attempted.
    /// 2. Synthesize every definition into a mapped class; a definition
    ///    without a table name aborts with [`CastError::MissingTableName`]
    ///    and nothing is registered.
    /// 3. Register the namespace (overwriting only under
    ///    `replace_namespace`).
    /// 4. Connect the engine.
    /// 5. If `create_schema`: run the drop script first when `drop_first`
    ///    (ignoring its failure), then the create script, whose failure is
    ///    fatal.
    /// 6. Configure the session factory — always, regardless of the schema
    ///    flags.
    ///
    /// `modifiers` are carried on the casting unapplied; see
    /// [`Modifier`](castiron_core::Modifier).
    pub fn new(
        namespace_name: &str,
        connect_str: &str,
        defs: Vec<(String, ClassDef)>,
        modifiers: Vec<Modifier>,
        options: CastingOptions,
    ) -> Result<Self> {
        if !options.replace_namespace && namespace::is_registered(namespace_name) {
            return Err(CastError::NamespaceCollision(namespace_name.to_string()));
        }

        let ns = Arc::new(Namespace::synthesize(namespace_name, &defs)?);
        namespace::register(ns.clone(), options.replace_namespace)?;

        let engine = Engine::connect(connect_str, options.echo, &options.pragmas)?;

        if options.create_schema {
            if options.drop_first {
                // The schema may not exist yet.
                if let Err(e) = ddl::drop_schema_sql(&ns)
                    .and_then(|script| engine.execute_batch(&script))
                {
                    tracing::debug!(namespace = %ns.name, error = %e, "drop-first failed, ignoring");
                }
            }
            let script = ddl::create_schema_sql(&ns)?;
            engine.execute_batch(&script)?;
            tracing::debug!(namespace = %ns.name, tables = ns.classes().len(), "schema created");
        }

        let session_factory = Some(SessionFactory::new(engine.clone(), ns.clone()));
        if options.echo {
            engine.set_echo(true);
        }

        Ok(Self {
            namespace: ns,
            engine,
            session_factory,
            modifiers,
        })
    }

    /// Materializes a casting from a registry.
    ///
    /// The registry's definitions are snapshot — independently copied — so
    /// the same registry can seed any number of castings, and the recorded
    /// modifiers are carried over unapplied. The registry itself is never
    /// mutated.
    pub fn materialize(
        registry: &Registry,
        namespace_name: &str,
        connect_str: &str,
        options: CastingOptions,
    ) -> Result<Self> {
        Casting::new(
            namespace_name,
            connect_str,
            registry.snapshot(),
            registry.modifiers().to_vec(),
            options,
        )
    }

    /// Returns a new session bound through the casting's factory.
    ///
    /// # Errors
    ///
    /// [`CastError::ModelInactive`] if the factory was never configured.
    /// Normal construction always configures it, so this is unreachable for
    /// a casting obtained from [`new`](Casting::new) or
    /// [`materialize`](Casting::materialize).
    pub fn get_session(&self) -> Result<Session> {
        let factory = self
            .session_factory
            .as_ref()
            .ok_or(CastError::ModelInactive)?;
        Ok(factory.session())
    }

    /// Returns the underlying connection engine.
    pub fn get_engine(&self) -> Engine {
        self.engine.clone()
    }

    /// Returns the mapped class registered under `name`.
    ///
    /// # Errors
    ///
    /// [`CastError::UnknownMappedClass`] when the namespace has no class of
    /// that name.
    pub fn get_mapped_class(&self, name: &str) -> Result<&MappedClass> {
        self.namespace
            .class(name)
            .ok_or_else(|| CastError::UnknownMappedClass {
                namespace: self.namespace.name.clone(),
                class: name.to_string(),
            })
    }

    /// Returns the casting's namespace.
    pub fn namespace(&self) -> &Arc<Namespace> {
        &self.namespace
    }

    /// Returns the recorded modifiers, in recording order. Not applied to
    /// the model.
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }
}

use castiron_core::{
    ClassDef, ColumnDef, DefaultValue, Modifier, Registry, RelationshipDef, SqlType,
};
use castiron_sqlite::{CastError, Casting, CastingOptions, ConnectTarget};
use rusqlite::types::Value;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn user_def() -> ClassDef {
    ClassDef::for_table("user")
        .column(
            "id",
            ColumnDef::new(SqlType::Integer).primary_key().autoincrement(),
        )
        .column(
            "username",
            ColumnDef::new(SqlType::Text).named("user").not_null(),
        )
        .column(
            "balance",
            ColumnDef::new(SqlType::Real)
                .not_null()
                .default_value(DefaultValue::Real(0.0)),
        )
        .column(
            "join_date_time",
            ColumnDef::new(SqlType::DateTime)
                .not_null()
                .default_value(DefaultValue::CurrentTimestamp),
        )
}

fn address_def() -> ClassDef {
    ClassDef::for_table("address")
        .column("id", ColumnDef::new(SqlType::Integer).primary_key())
        .column("street_address", ColumnDef::new(SqlType::Text))
        .column(
            "user_id",
            ColumnDef::new(SqlType::Integer)
                .not_null()
                .references("user", "id"),
        )
        .relationship("user", RelationshipDef::new("User").join_on("user_id", "id"))
}

fn full_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .add_class("User", user_def())
        .add_class("Address", address_def());
    registry
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn test_direct_construction_with_schema() {
    let defs = vec![
        ("User".to_string(), user_def()),
        ("Address".to_string(), address_def()),
    ];
    let casting = Casting::new(
        "integ_direct",
        "sqlite://",
        defs,
        Vec::new(),
        CastingOptions::new().create_schema().echo(),
    )
    .unwrap();

    let engine = casting.get_engine();
    assert_eq!(engine.target(), &ConnectTarget::Memory);
    assert!(engine.echo());

    // Both tables exist and are insertable.
    let session = casting.get_session().unwrap();
    session
        .insert("User", &[("username", Value::Text("tom".into()))])
        .unwrap();
    session
        .insert(
            "Address",
            &[("id", Value::Integer(1)), ("user_id", Value::Integer(1))],
        )
        .unwrap();
}

#[test]
fn test_get_mapped_class() {
    let casting = Casting::materialize(
        &full_registry(),
        "integ_mapped_class",
        "sqlite://",
        CastingOptions::new(),
    )
    .unwrap();

    let user = casting.get_mapped_class("User").unwrap();
    assert_eq!(user.class_name, "User");
    assert_eq!(user.table_name, "user");
    assert_eq!(user.physical_column("username"), Some("user"));
    assert_eq!(user.primary_key_attr(), Some("id"));

    let address = casting.get_mapped_class("Address").unwrap();
    assert!(address.relationship_to("User").is_some());

    let err = casting.get_mapped_class("Order").unwrap_err();
    assert!(matches!(err, CastError::UnknownMappedClass { .. }));
    assert!(err.to_string().contains("integ_mapped_class"));
    assert!(err.to_string().contains("Order"));
}

#[test]
fn test_missing_table_name_leaks_nothing() {
    let defs = vec![
        ("User".to_string(), user_def()),
        (
            "Broken".to_string(),
            ClassDef::new().column("id", ColumnDef::new(SqlType::Integer)),
        ),
    ];
    let err = Casting::new(
        "integ_no_leak",
        "sqlite://",
        defs,
        Vec::new(),
        CastingOptions::new().create_schema(),
    )
    .unwrap_err();

    assert!(matches!(err, CastError::MissingTableName(name) if name == "Broken"));
    // The failed construction registered no namespace at all.
    assert!(!castiron_sqlite::is_registered("integ_no_leak"));
    assert!(castiron_sqlite::lookup("integ_no_leak").is_none());
}

// ---------------------------------------------------------------------------
// Namespace collisions and replacement
// ---------------------------------------------------------------------------

#[test]
fn test_duplicate_namespace_rejected() {
    let registry = full_registry();
    let _first = Casting::materialize(
        &registry,
        "integ_collision",
        "sqlite://",
        CastingOptions::new(),
    )
    .unwrap();

    let err = Casting::materialize(
        &registry,
        "integ_collision",
        "sqlite://",
        CastingOptions::new(),
    )
    .unwrap_err();
    assert!(matches!(err, CastError::NamespaceCollision(_)));
    // The message tells the caller which flag unblocks the retry.
    assert!(err.to_string().contains("replace_namespace"));
    assert!(err.to_string().contains("integ_collision"));
}

#[test]
fn test_replace_namespace_takes_over_the_name() {
    let _first = Casting::materialize(
        &full_registry(),
        "integ_replace",
        "sqlite://",
        CastingOptions::new(),
    )
    .unwrap();

    let mut other = Registry::new();
    other.add_class("Invoice", ClassDef::for_table("invoice"));
    let second = Casting::materialize(
        &other,
        "integ_replace",
        "sqlite://",
        CastingOptions::new().replace_namespace(),
    )
    .unwrap();

    // The name now resolves to the second casting's classes.
    let resolved = castiron_sqlite::lookup("integ_replace").unwrap();
    assert!(resolved.class("Invoice").is_some());
    assert!(resolved.class("User").is_none());
    assert!(second.get_mapped_class("Invoice").is_ok());
}

// ---------------------------------------------------------------------------
// Registry materialization
// ---------------------------------------------------------------------------

#[test]
fn test_registry_materializes_independent_castings() {
    let registry = full_registry();

    let first = Casting::materialize(
        &registry,
        "integ_indep_a",
        "sqlite://",
        CastingOptions::new().create_schema(),
    )
    .unwrap();
    let second = Casting::materialize(
        &registry,
        "integ_indep_b",
        "sqlite://",
        CastingOptions::new().create_schema(),
    )
    .unwrap();

    // Separate in-memory databases: a row in one never shows in the other.
    first
        .get_session()
        .unwrap()
        .insert("User", &[("username", Value::Text("tom".into()))])
        .unwrap();
    let count = second
        .get_session()
        .unwrap()
        .query("User")
        .unwrap()
        .count()
        .unwrap();
    assert_eq!(count, 0);

    assert_eq!(first.namespace().class_names(), vec!["User", "Address"]);
    assert_eq!(second.namespace().class_names(), vec!["User", "Address"]);
}

#[test]
fn test_registry_carries_modifiers_unapplied() {
    let mut registry = full_registry();
    registry.add_modifier(
        Modifier::new("soft_delete")
            .kwarg("column", castiron_core::Literal::Text("deleted_at".into())),
    );

    let casting = Casting::materialize(
        &registry,
        "integ_modifiers",
        "sqlite://",
        CastingOptions::new().create_schema(),
    )
    .unwrap();

    assert_eq!(casting.modifiers().len(), 1);
    assert_eq!(casting.modifiers()[0].name, "soft_delete");
    // The schema is untouched by the recorded modifier.
    let user = casting.get_mapped_class("User").unwrap();
    assert!(user.column("deleted_at").is_none());
}

#[test]
fn test_registry_loaded_from_json_materializes() {
    let document = serde_json::json!({
        "User": {
            "table": "user",
            "attrs": [
                ["id", {"Column": {"sql_type": "Integer", "primary_key": true, "autoincrement": true}}],
                ["username", {"Column": {"sql_type": "Text", "column_name": "user", "nullable": false}}]
            ]
        },
        "Address": {
            "table": "address",
            "attrs": [
                ["id", {"Column": {"sql_type": "Integer", "primary_key": true}}],
                ["user_id", {"Column": {"sql_type": "Integer", "nullable": false,
                             "foreign_key": {"table": "user", "column": "id"}}}],
                ["user", {"Relationship": {"target": "User", "local": "user_id", "remote": "id"}}]
            ]
        }
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("defs.json");
    std::fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();

    let registry = Registry::load_json(&path).unwrap();
    let casting = Casting::materialize(
        &registry,
        "integ_json",
        "sqlite://",
        CastingOptions::new().create_schema(),
    )
    .unwrap();

    // Document entry order became synthesis order.
    assert_eq!(casting.namespace().class_names(), vec!["User", "Address"]);
    let user = casting.get_mapped_class("User").unwrap();
    assert_eq!(user.physical_column("username"), Some("user"));

    let session = casting.get_session().unwrap();
    session
        .insert("User", &[("username", Value::Text("tom".into()))])
        .unwrap();
    session
        .insert(
            "Address",
            &[("id", Value::Integer(1)), ("user_id", Value::Integer(1))],
        )
        .unwrap();
    let count = session
        .query("Address")
        .unwrap()
        .join("User")
        .unwrap()
        .filter_eq("User", "username", Value::Text("tom".into()))
        .unwrap()
        .count()
        .unwrap();
    assert_eq!(count, 1);
}

// ---------------------------------------------------------------------------
// Schema lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_drop_first_on_fresh_database() {
    // Dropping a schema that never existed is swallowed; creation proceeds.
    let casting = Casting::materialize(
        &full_registry(),
        "integ_drop_first",
        "sqlite://",
        CastingOptions::new().create_schema().drop_first(),
    )
    .unwrap();

    casting
        .get_session()
        .unwrap()
        .insert("User", &[("username", Value::Text("tom".into()))])
        .unwrap();
}

#[test]
fn test_without_create_schema_the_session_still_works() {
    let casting = Casting::materialize(
        &full_registry(),
        "integ_no_schema",
        "sqlite://",
        CastingOptions::new(),
    )
    .unwrap();

    // The factory is configured regardless of the schema flags; the insert
    // fails only because the table does not exist.
    let session = casting.get_session().unwrap();
    let err = session
        .insert("User", &[("username", Value::Text("tom".into()))])
        .unwrap_err();
    assert!(matches!(err, CastError::Database(_)));
}

#[test]
fn test_file_backed_casting_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("castiron.db");
    let connect_str = format!("sqlite:///{}", path.display());

    {
        let casting = Casting::materialize(
            &full_registry(),
            "integ_file_a",
            &connect_str,
            CastingOptions::new().create_schema(),
        )
        .unwrap();
        casting
            .get_session()
            .unwrap()
            .insert("User", &[("username", Value::Text("tom".into()))])
            .unwrap();
    }

    // A second casting over the same file sees the earlier rows.
    let casting = Casting::materialize(
        &full_registry(),
        "integ_file_b",
        &connect_str,
        CastingOptions::new(),
    )
    .unwrap();
    let count = casting
        .get_session()
        .unwrap()
        .query("User")
        .unwrap()
        .count()
        .unwrap();
    assert_eq!(count, 1);
}

// ---------------------------------------------------------------------------
// Querying
// ---------------------------------------------------------------------------

#[test]
fn test_join_query_on_empty_schema_returns_empty() {
    let casting = Casting::materialize(
        &full_registry(),
        "integ_empty_join",
        "sqlite://",
        CastingOptions::new().create_schema(),
    )
    .unwrap();

    // No rows at all: the joined, filtered query is empty but not an error.
    let rows = casting
        .get_session()
        .unwrap()
        .query("Address")
        .unwrap()
        .join("User")
        .unwrap()
        .filter_eq("User", "username", Value::Text("tom".into()))
        .unwrap()
        .all()
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_join_query_returns_matching_rows() {
    let casting = Casting::materialize(
        &full_registry(),
        "integ_join_rows",
        "sqlite://",
        CastingOptions::new().create_schema(),
    )
    .unwrap();
    let session = casting.get_session().unwrap();

    session
        .insert("User", &[("username", Value::Text("tom".into()))])
        .unwrap();
    session
        .insert("User", &[("username", Value::Text("ann".into()))])
        .unwrap();
    session
        .insert(
            "Address",
            &[
                ("id", Value::Integer(1)),
                ("street_address", Value::Text("10 Main St".into())),
                ("user_id", Value::Integer(1)),
            ],
        )
        .unwrap();
    session
        .insert(
            "Address",
            &[
                ("id", Value::Integer(2)),
                ("street_address", Value::Text("5 Oak Ave".into())),
                ("user_id", Value::Integer(2)),
            ],
        )
        .unwrap();

    let rows = session
        .query("Address")
        .unwrap()
        .join("User")
        .unwrap()
        .filter_eq("User", "username", Value::Text("tom".into()))
        .unwrap()
        .all()
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("street_address"),
        Some(&Value::Text("10 Main St".into()))
    );
    assert_eq!(rows[0].get("user_id"), Some(&Value::Integer(1)));
}

#[test]
fn test_column_defaults_apply_on_insert() {
    let casting = Casting::materialize(
        &full_registry(),
        "integ_defaults",
        "sqlite://",
        CastingOptions::new().create_schema(),
    )
    .unwrap();
    let session = casting.get_session().unwrap();
    session
        .insert("User", &[("username", Value::Text("tom".into()))])
        .unwrap();

    let rows = session.query("User").unwrap().all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("balance"), Some(&Value::Real(0.0)));

    // The timestamp default produced a parseable datetime.
    let Some(Value::Text(joined)) = rows[0].get("join_date_time") else {
        panic!("expected a text datetime");
    };
    chrono::NaiveDateTime::parse_from_str(joined, "%Y-%m-%d %H:%M:%S").unwrap();
}

#[test]
fn test_pragma_options_reach_the_engine() {
    let casting = Casting::materialize(
        &full_registry(),
        "integ_pragmas",
        "sqlite://",
        CastingOptions::new()
            .create_schema()
            .pragma("cache_size", "-4000"),
    )
    .unwrap();

    let session = casting.get_session().unwrap();
    // Foreign keys are enforced: an address pointing at a missing user fails.
    let err = session
        .insert(
            "Address",
            &[("id", Value::Integer(1)), ("user_id", Value::Integer(99))],
        )
        .unwrap_err();
    assert!(matches!(err, CastError::Database(_)));
}

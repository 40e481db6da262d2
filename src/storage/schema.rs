//! Database schema definitions

/// SQL to create the objects table
///
/// Every persisted record is one row. Children persisted transitively with an
/// aggregate point at the aggregate's row through `owner_oid`.
pub const CREATE_OBJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS objects (
    oid INTEGER PRIMARY KEY AUTOINCREMENT,
    type_name TEXT NOT NULL,
    owner_oid INTEGER REFERENCES objects(oid),
    body TEXT NOT NULL,
    created_at TEXT NOT NULL
)
"#;

/// SQL to create the registered_types table
pub const CREATE_REGISTERED_TYPES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS registered_types (
    name TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    registered_at TEXT NOT NULL
)
"#;

/// SQL to create the store_meta table (sentinel and bookkeeping values)
pub const CREATE_STORE_META_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_objects_type ON objects(type_name)",
    "CREATE INDEX IF NOT EXISTS idx_objects_owner ON objects(owner_oid)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_OBJECTS_TABLE,
        CREATE_REGISTERED_TYPES_TABLE,
        CREATE_STORE_META_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every DB open (before checking the version),
/// using `IF NOT EXISTS` so it is safe to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the v1 schema.
///
/// Two tables:
/// - `kv_store`: the panel's logical keys (`repo`, `kind`, `localId`, `lastResult`,
///   `selected`, `threshold`, `maxThreshold`), each independently addressable.
///   Values are plain text for scalars and JSON for collections.
/// - `threshold_hints`: the last service hint per repository. A row here means
///   the hint request is skipped for that repository.
///
/// Both tables use `STRICT` mode for type enforcement.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS kv_store (
        key         TEXT    PRIMARY KEY,
        value       TEXT    NOT NULL,
        updated_at  INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS threshold_hints (
        repository  TEXT    PRIMARY KEY,
        hint        REAL    NOT NULL CHECK(hint >= 0.0 AND hint <= 1.0),
        received_at INTEGER NOT NULL
    ) STRICT;
";

/// Ordered migrations; entry `n` brings the schema to version `n + 1`.
const MIGRATIONS: &[&str] = &[SCHEMA_V1_SQL];

/// The version a fully migrated database reports.
pub const LATEST_VERSION: i64 = MIGRATIONS.len() as i64;

/// Runs forward-only schema migration up to `LATEST_VERSION`.
///
/// Idempotent: safe to call on every open. Each pending step runs in its own
/// `BEGIN IMMEDIATE` transaction together with the `schema_version` row that
/// records it, so a crash mid-migration leaves the previous version intact.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let current: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    for (index, ddl) in MIGRATIONS.iter().enumerate() {
        let version = index as i64 + 1;
        if version <= current {
            continue;
        }
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(ddl)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
        tx.commit()?;
    }

    Ok(())
}

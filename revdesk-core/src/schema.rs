/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every DB open (before checking the version),
/// using `IF NOT EXISTS` so it is safe to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the full v1 schema.
///
/// Contains three tables:
/// - `reviews`: one row per generated review (or failed-generation placeholder).
/// - `feedback`: the overall feedback submitted when a review was retired.
/// - `section_feedback`: one row per adjudicated section of a review.
///
/// Unset sections never get a `section_feedback` row.
/// Foreign keys use `ON DELETE CASCADE` so removing a review cleans up its feedback.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS reviews (
        id              TEXT    PRIMARY KEY,
        title           TEXT    NOT NULL DEFAULT '',
        filename        TEXT,
        submitted       TEXT    NOT NULL,
        generated       TEXT    NOT NULL,
        optimized_code  TEXT,
        explanation     TEXT,
        error           TEXT,
        created_at      INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS feedback (
        review_id               TEXT    PRIMARY KEY REFERENCES reviews(id) ON DELETE CASCADE,
        reviewer                TEXT    NOT NULL,
        disposition             TEXT    NOT NULL
                                        CHECK(disposition IN ('positive', 'negative')),
        rejection_reasons       TEXT    NOT NULL DEFAULT '[]',
        custom_rejection_reason TEXT,
        status                  TEXT    NOT NULL
                                        CHECK(status IN ('pending', 'reviewed', 'rejected')),
        submitted_at            INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS section_feedback (
        review_id   TEXT    NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
        section     TEXT    NOT NULL,
        position    INTEGER NOT NULL,
        verdict     TEXT    NOT NULL CHECK(verdict IN ('accepted', 'rejected')),
        PRIMARY KEY (review_id, section)
    ) STRICT;
";

/// Runs forward-only schema migration to migrate the DB to the latest version.
///
/// Idempotent: safe to call on every open.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}

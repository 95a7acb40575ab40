use std::time::Duration;

use indexmap::IndexMap;
use rusqlite::types::Type;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::payload::FeedbackPayload;
use crate::types::{
    now_secs, Disposition, Review, ReviewOutcome, ReviewStatus, ReviewSummary, SectionTally, Verdict,
};

/// Opens (or creates) the SQLite database at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// This function is the single entry point for all database connections.
/// It sets `busy_timeout` via the `Connection` method (not a PRAGMA string) to
/// ensure the setting takes effect regardless of pragma caching.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL configuration
/// fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    Ok(conn)
}

/// Inserts or replaces the stored copy of `review`.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the `BEGIN IMMEDIATE` transaction fails.
pub async fn save_review(conn: &Connection, review: &Review) -> Result<(), tokio_rusqlite::Error> {
    let review = review.clone();

    conn.call(move |db| {
        let error = match review.outcome() {
            ReviewOutcome::Failed { error } => Some(error.clone()),
            ReviewOutcome::Generated => None,
        };
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO reviews
                 (id, title, filename, submitted, generated, optimized_code, explanation, error, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 filename = excluded.filename,
                 submitted = excluded.submitted,
                 generated = excluded.generated,
                 optimized_code = excluded.optimized_code,
                 explanation = excluded.explanation,
                 error = excluded.error",
            rusqlite::params![
                review.id(),
                review.title(),
                review.filename(),
                review.submitted(),
                review.generated(),
                review.optimized_code(),
                review.explanation(),
                error,
                review.created_at(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await
}

/// Loads a saved review, including error placeholders. `None` if `id` was never saved.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn load_review(conn: &Connection, id: &str) -> Result<Option<Review>, tokio_rusqlite::Error> {
    let id = id.to_owned();

    conn.call(move |db| {
        db.query_row(
            "SELECT id, title, filename, submitted, generated, optimized_code, explanation,
                    error, created_at
             FROM reviews WHERE id = ?1",
            rusqlite::params![&id],
            |r| {
                let outcome = match r.get::<_, Option<String>>(7)? {
                    Some(error) => ReviewOutcome::Failed { error },
                    None => ReviewOutcome::Generated,
                };
                Ok(Review::restored(r.get(0)?, r.get(1)?, r.get(3)?, r.get(4)?, outcome)
                    .with_filename(r.get(2)?)
                    .with_optimized_code(r.get(5)?)
                    .with_explanation(r.get(6)?)
                    .with_created_at(r.get(8)?))
            },
        )
        .optional()
    })
    .await
}

/// Saved reviews, newest first, with a short preview and their current status.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails or a stored status is not
/// part of the wire vocabulary.
pub async fn list_reviews(conn: &Connection) -> Result<Vec<ReviewSummary>, tokio_rusqlite::Error> {
    conn.call(|db| {
        let mut stmt = db.prepare(
            "SELECT r.id, r.title, r.filename, substr(r.generated, 1, 200), f.status, r.created_at
             FROM reviews r
             LEFT JOIN feedback f ON f.review_id = r.id
             ORDER BY r.created_at DESC, r.rowid DESC",
        )?;
        let rows = stmt
            .query_map([], |r| {
                let status = match r.get::<_, Option<String>>(4)? {
                    None => ReviewStatus::Pending,
                    Some(s) => ReviewStatus::parse(&s).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            4,
                            Type::Text,
                            format!("unknown status {s:?}").into(),
                        )
                    })?,
                };
                Ok(ReviewSummary {
                    id: r.get(0)?,
                    title: r.get(1)?,
                    filename: r.get(2)?,
                    preview: r.get(3)?,
                    status,
                    created_at: r.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

/// Stores `payload` as the feedback for its review and returns the derived status.
///
/// Replaces any feedback already stored for the review, so re-sending the same
/// payload after a failed attempt is harmless. The review row must already exist.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the review is unknown (foreign key violation)
/// or the `BEGIN IMMEDIATE` transaction fails.
pub async fn record_feedback(
    conn: &Connection,
    reviewer: &str,
    payload: &FeedbackPayload,
) -> Result<ReviewStatus, tokio_rusqlite::Error> {
    let reviewer = reviewer.to_owned();
    let payload = payload.clone();

    conn.call(move |db| {
        let status = payload.status();
        let reasons = serde_json::to_string(&payload.rejection_reasons)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO feedback
                 (review_id, reviewer, disposition, rejection_reasons, custom_rejection_reason, status, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(review_id) DO UPDATE SET
                 reviewer = excluded.reviewer,
                 disposition = excluded.disposition,
                 rejection_reasons = excluded.rejection_reasons,
                 custom_rejection_reason = excluded.custom_rejection_reason,
                 status = excluded.status,
                 submitted_at = excluded.submitted_at",
            rusqlite::params![
                &payload.review_id,
                &reviewer,
                payload.feedback.as_str(),
                &reasons,
                &payload.custom_rejection_reason,
                status.as_str(),
                now_secs(),
            ],
        )?;
        tx.execute(
            "DELETE FROM section_feedback WHERE review_id = ?1",
            rusqlite::params![&payload.review_id],
        )?;
        for (position, (section, verdict)) in payload.section_feedback.iter().enumerate() {
            tx.execute(
                "INSERT INTO section_feedback (review_id, section, position, verdict)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![&payload.review_id, section, position as i64, verdict.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(status)
    })
    .await
}

/// Loads the stored feedback for `review_id`, or `None` if none was recorded.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails or a stored value is not
/// part of the wire vocabulary.
pub async fn load_feedback(
    conn: &Connection,
    review_id: &str,
) -> Result<Option<FeedbackPayload>, tokio_rusqlite::Error> {
    let review_id = review_id.to_owned();

    conn.call(move |db| {
        let row: Option<(String, String, Option<String>)> = db
            .query_row(
                "SELECT disposition, rejection_reasons, custom_rejection_reason
                 FROM feedback WHERE review_id = ?1",
                rusqlite::params![&review_id],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()?;
        let Some((disposition, reasons, custom_rejection_reason)) = row else {
            return Ok(None);
        };

        let feedback = Disposition::parse(&disposition).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                Type::Text,
                format!("unknown disposition {disposition:?}").into(),
            )
        })?;
        let rejection_reasons: Vec<String> = serde_json::from_str(&reasons)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

        let mut stmt = db.prepare(
            "SELECT section, verdict FROM section_feedback
             WHERE review_id = ?1 ORDER BY position",
        )?;
        let section_feedback = stmt
            .query_map(rusqlite::params![&review_id], |r| {
                let section: String = r.get(0)?;
                let verdict: String = r.get(1)?;
                let verdict = Verdict::parse(&verdict).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        Type::Text,
                        format!("unknown verdict {verdict:?}").into(),
                    )
                })?;
                Ok((section, verdict))
            })?
            .collect::<rusqlite::Result<IndexMap<_, _>>>()?;

        Ok(Some(FeedbackPayload {
            review_id,
            feedback,
            rejection_reasons,
            custom_rejection_reason,
            section_feedback,
        }))
    })
    .await
}

/// Returns the status of `review_id`: `Pending` until feedback is recorded.
///
/// Returns `None` if the review itself was never saved.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn load_status(
    conn: &Connection,
    review_id: &str,
) -> Result<Option<ReviewStatus>, tokio_rusqlite::Error> {
    let review_id = review_id.to_owned();

    conn.call(move |db| {
        let row: Option<Option<String>> = db
            .query_row(
                "SELECT f.status FROM reviews r
                 LEFT JOIN feedback f ON f.review_id = r.id
                 WHERE r.id = ?1",
                rusqlite::params![&review_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(row.map(|status| {
            status
                .as_deref()
                .and_then(ReviewStatus::parse)
                .unwrap_or(ReviewStatus::Pending)
        }))
    })
    .await
}

/// Accepted/rejected counts per section across all stored feedback, by section name.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn section_feedback_summary(
    conn: &Connection,
) -> Result<Vec<SectionTally>, tokio_rusqlite::Error> {
    conn.call(|db| {
        let mut stmt = db.prepare(
            "SELECT section,
                    SUM(CASE WHEN verdict = 'accepted' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN verdict = 'rejected' THEN 1 ELSE 0 END)
             FROM section_feedback
             GROUP BY section
             ORDER BY section",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(SectionTally {
                    section: r.get(0)?,
                    accepted: r.get(1)?,
                    rejected: r.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

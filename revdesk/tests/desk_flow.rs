//! End-to-end desk workflow: batch intake, adjudication, retirement, persistence
//! events and retry.

use revdesk::{
    launch, DeskConfig, DeskError, DeskEvent, Persistence, Progress, ReviewDesk, SessionContext,
};
use revdesk_core::ingest::GenerationResponse;
use revdesk_core::vocabulary::{KEY_FINDINGS, OPTIMIZED_CODE, SECURITY};
use revdesk_core::{
    db, AdjudicationState, BatchItem, Disposition, Review, ReviewError, ReviewStatus,
    SectionVocabulary, Verdict,
};
use tokio::sync::mpsc;

const GENERATED: &str = "###KEY_FINDINGS###\nString-built SQL.\n###SECURITY###\nSQL injection.\n";

fn temp_config() -> (tempfile::TempDir, DeskConfig) {
    let dir = tempfile::TempDir::new().unwrap();
    let config = DeskConfig {
        database: dir.path().join("nested").join("reviews.db"),
        ..DeskConfig::default()
    };
    (dir, config)
}

fn response(id: &str) -> GenerationResponse {
    GenerationResponse {
        id: Some(revdesk_core::ingest::RawId::Text(id.into())),
        ai_feedback: Some(GENERATED.into()),
        ..GenerationResponse::default()
    }
}

fn batch() -> Vec<BatchItem> {
    vec![
        BatchItem {
            filename: Some("a.py".into()),
            submitted: "q = 'SELECT ' + uid".into(),
            outcome: Ok(response("a")),
        },
        BatchItem {
            filename: Some("b.py".into()),
            submitted: "print(1)".into(),
            outcome: Err("HTTP 502".into()),
        },
        BatchItem {
            filename: Some("c.py".into()),
            submitted: "eval(x)".into(),
            outcome: Ok(GenerationResponse {
                optimized_code: Some("ast.literal_eval(x)".into()),
                ..response("c")
            }),
        },
    ]
}

#[tokio::test]
async fn batch_is_adjudicated_retired_and_stored() {
    let (_dir, config) = temp_config();
    let launched = launch(&config, SessionContext::new("alice")).await.unwrap();
    let mut desk = launched.desk;
    let mut events = launched.events;
    assert!(config.database.exists());

    let ids: Vec<String> = desk
        .enqueue_batch(batch())
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(ids.len(), 3, "a failed item still gets queued");
    assert_eq!(ids[0], "a");
    assert_eq!(ids[2], "c");
    assert_eq!(desk.queue().len(), 3);
    assert_eq!(desk.current().map(|r| r.id()), Some("a"));

    // Placeholder has nothing to adjudicate
    let placeholder = desk.active(&ids[1]).unwrap();
    assert_eq!(placeholder.registry.actionable().count(), 0);
    assert_eq!(desk.is_complete(&ids[1]), Some(true));

    // Focus the last review, then settle it; the cursor stays in bounds
    desk.next();
    desk.next();
    desk.next();
    assert_eq!(desk.current().map(|r| r.id()), Some("c"));
    assert_eq!(
        desk.adjudicate("c", KEY_FINDINGS, Verdict::Accepted).unwrap(),
        Progress::Pending { remaining: 2 }
    );
    desk.adjudicate("c", SECURITY, Verdict::Rejected).unwrap();
    let Progress::Retired(payload) = desk
        .adjudicate_current(OPTIMIZED_CODE, Verdict::Accepted)
        .unwrap()
    else {
        panic!("review c should retire once every section is settled");
    };
    assert_eq!(payload.feedback, Disposition::Positive);
    assert_eq!(payload.section_feedback.len(), 3);
    assert_eq!(desk.queue().len(), 2);
    assert_eq!(desk.current().map(|r| r.id()), Some(ids[1].as_str()));

    // Retired reviews are frozen
    let frozen = desk.retired_state("c").unwrap();
    assert_eq!(frozen.get(SECURITY), Some(AdjudicationState::Rejected));
    assert_eq!(frozen.remaining(), 0);
    assert!(matches!(
        desk.adjudicate("c", SECURITY, Verdict::Accepted),
        Err(DeskError::Review(ReviewError::ReviewRetired(_)))
    ));
    assert!(matches!(
        desk.adjudicate("nope", SECURITY, Verdict::Accepted),
        Err(DeskError::Review(ReviewError::ReviewNotFound(_)))
    ));
    assert!(matches!(
        desk.adjudicate("a", "CODE_QUALITY", Verdict::Accepted),
        Err(DeskError::Review(ReviewError::InvalidSection { .. }))
    ));

    let event = events.recv().await.unwrap();
    assert_eq!(
        event,
        DeskEvent::Persisted { review_id: "c".into(), status: ReviewStatus::Reviewed }
    );
    desk.apply_event(event);
    assert_eq!(
        desk.retired("c").unwrap().persistence,
        Persistence::Stored(ReviewStatus::Reviewed)
    );

    // A negative verdict needs a reason
    assert!(matches!(
        desk.submit_feedback("a", Disposition::Negative, &[] as &[&str], None),
        Err(DeskError::Review(ReviewError::MissingRejectionReason))
    ));
    assert!(desk.active("a").is_some(), "rejected submission leaves the review queued");
    desk.adjudicate("a", SECURITY, Verdict::Accepted).unwrap();
    let payload = desk
        .submit_feedback("a", Disposition::Negative, &["Incorrect output / results"], None)
        .unwrap();
    assert_eq!(payload.section_feedback.len(), 1, "unset sections are omitted");
    desk.apply_event(events.recv().await.unwrap());

    // The placeholder is retired explicitly
    desk.submit_feedback(&ids[1], Disposition::Positive, &[] as &[&str], None)
        .unwrap();
    desk.apply_event(events.recv().await.unwrap());
    assert!(desk.queue().is_empty());
    assert!(desk.current().is_none());

    // Stored reviews can be dropped from memory but stay retired
    assert_eq!(desk.prune_stored(), 3);
    assert!(desk.retired("c").is_none());
    assert_eq!(desk.prune_stored(), 0);
    assert!(matches!(
        desk.adjudicate("c", SECURITY, Verdict::Accepted),
        Err(DeskError::Review(ReviewError::ReviewRetired(_)))
    ));
    assert!(matches!(
        desk.enqueue(Review::new(Some("c".into()), "eval(x)", GENERATED)),
        Err(DeskError::Review(ReviewError::DuplicateReview(_)))
    ));

    let conn = db::open_db(&config.database.to_string_lossy()).await.unwrap();
    let stored = db::load_feedback(&conn, "a").await.unwrap().unwrap();
    assert_eq!(stored, payload);
    assert_eq!(db::load_status(&conn, "a").await.unwrap(), Some(ReviewStatus::Rejected));
    assert_eq!(db::load_status(&conn, &ids[1]).await.unwrap(), Some(ReviewStatus::Reviewed));

    drop(desk);
    launched.worker.await.unwrap();
}

#[tokio::test]
async fn failed_persistence_resends_the_same_payload() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut desk = ReviewDesk::new(SectionVocabulary::standard(), SessionContext::new("bob"), tx);
    desk.enqueue_batch(vec![BatchItem {
        filename: None,
        submitted: "x = 1".into(),
        outcome: Ok(response("r1")),
    }]);

    assert!(matches!(desk.retry("r1"), Err(DeskError::NothingToRetry(_))));
    desk.adjudicate("r1", KEY_FINDINGS, Verdict::Rejected).unwrap();
    desk.adjudicate("r1", SECURITY, Verdict::Rejected).unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(first.session.reviewer, "bob");
    assert_eq!(first.payload.feedback, Disposition::Negative);
    assert_eq!(desk.retired("r1").unwrap().persistence, Persistence::InFlight);
    assert!(matches!(desk.retry("r1"), Err(DeskError::NothingToRetry(_))));

    desk.apply_event(DeskEvent::PersistFailed { review_id: "r1".into(), error: "disk full".into() });
    assert_eq!(desk.failed_persistence().count(), 1);

    desk.retry("r1").unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(second.payload, first.payload);
    assert_eq!(desk.retired("r1").unwrap().persistence, Persistence::InFlight);

    // Unknown ids are ignored
    desk.apply_event(DeskEvent::PersistFailed { review_id: "zzz".into(), error: "x".into() });
    assert_eq!(desk.failed_persistence().count(), 0);
}

#[tokio::test]
async fn closed_worker_keeps_review_queued() {
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);
    let mut desk = ReviewDesk::new(SectionVocabulary::standard(), SessionContext::new("carol"), tx);
    desk.enqueue_batch(vec![BatchItem {
        filename: None,
        submitted: "x = 1".into(),
        outcome: Ok(response("r2")),
    }]);

    desk.adjudicate("r2", KEY_FINDINGS, Verdict::Accepted).unwrap();
    assert!(matches!(
        desk.adjudicate("r2", SECURITY, Verdict::Accepted),
        Err(DeskError::PersistenceClosed)
    ));
    assert!(desk.retired("r2").is_none());
    assert_eq!(desk.queue().len(), 1);
    assert_eq!(desk.is_complete("r2"), Some(true));
}

#[tokio::test]
async fn duplicate_ids_are_refused_per_item() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut desk = ReviewDesk::new(SectionVocabulary::standard(), SessionContext::new("dan"), tx);
    let results = desk.enqueue_batch(vec![
        BatchItem { filename: None, submitted: "a".into(), outcome: Ok(response("dup")) },
        BatchItem { filename: None, submitted: "b".into(), outcome: Ok(response("dup")) },
        BatchItem { filename: None, submitted: "c".into(), outcome: Ok(response("ok")) },
    ]);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(DeskError::Review(ReviewError::DuplicateReview(_)))
    ));
    assert!(results[2].is_ok());
    assert_eq!(desk.queue().len(), 2);
}

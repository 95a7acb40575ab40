//! revdesk: review desk workflow on top of `revdesk-core`.
//!
//! Wires the pieces together: the [`app::ReviewDesk`] controller, the `DeskEvent`
//! bus (`event`), the background persistence worker (`persist`), configuration
//! (`config`) and logging (`telemetry`).
//!
//! # Startup sequence
//!
//! 1. [`bootstrap`] loads the config and installs tracing. A bad config file is
//!    logged once the subscriber exists, then defaults are used.
//! 2. [`launch`] creates the database directory, opens the store, spawns the
//!    persistence worker and returns the desk plus the event receiver.
//! 3. The caller feeds every received `DeskEvent` to `ReviewDesk::apply_event`.

pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod persist;
pub mod telemetry;

pub use app::{ActiveReview, Persistence, Progress, RetiredReview, ReviewDesk};
pub use config::DeskConfig;
pub use error::{DeskError, DeskResult};
pub use event::{DeskEvent, EventHandler};
pub use persist::types::{PersistRequest, SessionContext};

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

/// A running desk and the handles that belong to it.
pub struct Launched {
    pub desk: ReviewDesk,
    /// Persistence outcomes, to be passed to [`ReviewDesk::apply_event`].
    pub events: UnboundedReceiver<DeskEvent>,
    /// Finishes once the desk (the last request sender) is dropped.
    pub worker: JoinHandle<()>,
}

/// Loads the config from the XDG path and installs the tracing subscriber.
///
/// Never fails: an unreadable or unparsable config is logged as a warning and
/// the defaults are used instead.
pub fn bootstrap() -> DeskConfig {
    let (config, deferred) = match DeskConfig::load() {
        Ok(c) => (c, None),
        Err(e) => (DeskConfig::default(), Some(e)),
    };
    telemetry::init_tracing(config.log_json, &config.log_level);
    if let Some(e) = deferred {
        tracing::warn!(error = %e, "using default config");
    }
    config
}

/// Opens the feedback store named by `config` and starts the persistence worker.
///
/// # Errors
///
/// - `DeskError::Io` if the database directory cannot be created.
/// - `DeskError::Store` if the database cannot be opened or migrated.
/// - `DeskError::Review` if the configured section vocabulary is invalid.
pub async fn launch(config: &DeskConfig, session: SessionContext) -> DeskResult<Launched> {
    let vocabulary = config.vocabulary()?;

    if let Some(parent) = config.database.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = revdesk_core::db::open_db(&config.database.to_string_lossy()).await?;
    tracing::info!(database = %config.database.display(), reviewer = %session.reviewer, "feedback store open");

    let (persist_tx, persist_rx) = mpsc::unbounded_channel();
    let events = EventHandler::new();
    let worker = persist::worker::spawn_persist_worker(conn, persist_rx, events.tx);

    Ok(Launched {
        desk: ReviewDesk::new(vocabulary, session, persist_tx),
        events: events.rx,
        worker,
    })
}

use sqlx::SqlitePool;

use crate::tracker::ApplicationTracker;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub tracker: ApplicationTracker,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            tracker: ApplicationTracker::new(db),
        }
    }
}

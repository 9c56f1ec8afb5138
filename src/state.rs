//! Process-wide shared state: the Session Manager, Broadcast Hub, and Event
//! Pipeline all outlive any single request and are reused by every query,
//! mutation, and daemon (§9 "Global mutable state: confined to Manager
//! registry, Hub client set..."). Each has an explicit lifecycle constructor
//! and a shutdown routine; the constructor runs once, in `main`, not lazily
//! on first use.

use crate::channel::manager::SessionManager;
use crate::hub::BroadcastHub;
use crate::pipeline::EventPipeline;
use std::sync::{Arc, OnceLock};

pub struct AppState {
    pub db: sqlx::PgPool,
    pub hub: Arc<BroadcastHub>,
    pub manager: Arc<SessionManager>,
    pub pipeline: Arc<EventPipeline>,
}

static APP_STATE: OnceLock<Arc<AppState>> = OnceLock::new();

/// Installs the process-wide state. Must be called exactly once, before any
/// query/mutation/daemon runs.
pub fn install(state: Arc<AppState>) {
    if APP_STATE.set(state).is_err() {
        panic!("app state installed twice");
    }
}

/// Panics if called before [`install`] — a programming error, not a runtime condition.
pub fn app_state() -> &'static Arc<AppState> {
    APP_STATE.get().expect("app state not installed")
}

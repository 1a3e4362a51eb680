//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::diagram::KrokiRenderer;
use crate::session::ExplorerSession;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application state shared across all handlers
pub struct AppState<R = KrokiRenderer> {
    /// The explorer session. Handlers hold the lock for the whole request so
    /// database work is never interleaved.
    pub session: Mutex<ExplorerSession>,

    /// Turns diagram text into PNG bytes
    pub renderer: R,
}

impl<R> AppState<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            session: Mutex::new(ExplorerSession::new()),
            renderer,
        }
    }
}

/// Type alias for shared state
pub type SharedState<R = KrokiRenderer> = Arc<AppState<R>>;

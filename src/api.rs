//! HTTP API for the chat widget
//!
//! The browser widget creates a session on mount, submits visitor text,
//! toggles visibility, and follows changes over Server-Sent Events.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub model_id: String,
}

impl AppState {
    pub fn new(sessions: Arc<SessionManager>, model_id: impl Into<String>) -> Self {
        Self {
            sessions,
            model_id: model_id.into(),
        }
    }
}

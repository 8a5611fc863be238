//! Events that can occur in a chat session

use crate::gateway::GatewayFailure;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Presentation events
    VisitorSubmit { text: String },
    ToggleWidget,

    // Gateway events
    GatewayReply { text: String },
    GatewayFailed { failure: GatewayFailure },
}

impl Event {
    pub fn submit(text: impl Into<String>) -> Self {
        Event::VisitorSubmit { text: text.into() }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::VisitorSubmit { .. } => "visitor_submit",
            Event::ToggleWidget => "toggle_widget",
            Event::GatewayReply { .. } => "gateway_reply",
            Event::GatewayFailed { .. } => "gateway_failed",
        }
    }
}

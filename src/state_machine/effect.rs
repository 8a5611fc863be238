//! Effects produced by state transitions

use super::state::Message;
use crate::gateway::GatewayRequest;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the request to the assistant gateway (spawns as background task)
    RequestReply { request: GatewayRequest },

    /// A message was appended at `index`
    PublishMessage { index: usize, message: Message },

    /// Bring the newest message into view
    ScrollToLatest { index: usize },

    /// The pending flag changed
    NotifyPending { pending: bool },

    /// The widget was opened or closed
    NotifyWidget { open: bool },
}

impl Effect {
    pub fn request_reply(request: GatewayRequest) -> Self {
        Effect::RequestReply { request }
    }

    /// Every append is published and scrolled into view
    pub fn appended(index: usize, message: Message) -> [Self; 2] {
        [
            Effect::PublishMessage { index, message },
            Effect::ScrollToLatest { index },
        ]
    }
}

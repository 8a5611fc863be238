//! Conversation state store
//!
//! The message log is append-only: entries are never edited or removed, and
//! their order is the conversational context sent to the gateway.

use super::transition::TransitionError;
use crate::gateway::GatewayRequest;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    Visitor,
    Assistant,
}

/// One entry in the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub author: Author,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn visitor(text: impl Into<String>) -> Self {
        Self {
            author: Author::Visitor,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            author: Author::Assistant,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Conversation state for one widget session
///
/// `widget_open` is independent of the log; toggling it never touches
/// messages or the pending flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    messages: Vec<Message>,
    pending_request: bool,
    widget_open: bool,
}

impl ConversationState {
    /// Fresh state seeded with the assistant greeting
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
            pending_request: false,
            widget_open: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn latest_index(&self) -> Option<usize> {
        self.messages.len().checked_sub(1)
    }

    pub fn is_pending(&self) -> bool {
        self.pending_request
    }

    pub fn is_widget_open(&self) -> bool {
        self.widget_open
    }

    /// Append a visitor message and enter the pending state.
    ///
    /// Returns the gateway request built from the log as it was before the
    /// append. Rejected without mutation when the text is blank or a reply
    /// is already pending.
    pub fn append_visitor_message(&mut self, text: &str) -> Result<GatewayRequest, TransitionError> {
        if self.pending_request {
            return Err(TransitionError::AssistantBusy);
        }
        if text.trim().is_empty() {
            return Err(TransitionError::EmptyMessage);
        }

        let request = GatewayRequest {
            prior_messages: self.messages.clone(),
            new_message_text: text.to_string(),
        };
        self.messages.push(Message::visitor(text));
        self.pending_request = true;
        Ok(request)
    }

    /// Append the assistant's reply, ending the send cycle
    pub fn append_assistant_message(&mut self, text: &str) -> Result<(), TransitionError> {
        if !self.pending_request {
            return Err(TransitionError::NoRequestInFlight);
        }
        self.messages.push(Message::assistant(text));
        self.pending_request = false;
        Ok(())
    }

    /// Append the failure notice, ending the send cycle
    pub fn mark_failed(&mut self, fallback_text: &str) -> Result<(), TransitionError> {
        self.append_assistant_message(fallback_text)
    }

    pub fn toggle_widget(&mut self) {
        self.widget_open = !self.widget_open;
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(crate::system_prompt::Profile::default().greeting())
    }
}

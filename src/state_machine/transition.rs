//! Pure state transition function
//!
//! Send cycle: Idle --submit--> Pending --reply|failure--> Idle.
//! Given the same state and event this always produces the same result;
//! all I/O is expressed as effects for the runtime to carry out.

use super::{ConversationState, Effect, Event};
use thiserror::Error;

/// Assistant message appended when a gateway call fails, whatever the cause
pub const FALLBACK_REPLY: &str = "Error: Neural link disrupted. Please try again.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConversationState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConversationState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Rejections. None of these change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Assistant is still replying, wait for the current answer")]
    AssistantBusy,
    #[error("No request in flight")]
    NoRequestInFlight,
}

/// Pure transition function
pub fn transition(
    state: &ConversationState,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let mut next = state.clone();

    match event {
        // Idle + VisitorSubmit -> Pending
        Event::VisitorSubmit { text } => {
            let request = next.append_visitor_message(&text)?;
            let appended = appended_effects(&next);
            Ok(TransitionResult::new(next)
                .with_effects(appended)
                .with_effect(Effect::NotifyPending { pending: true })
                .with_effect(Effect::request_reply(request)))
        }

        // Pending + GatewayReply -> Idle
        Event::GatewayReply { text } => {
            next.append_assistant_message(&text)?;
            let appended = appended_effects(&next);
            Ok(TransitionResult::new(next)
                .with_effects(appended)
                .with_effect(Effect::NotifyPending { pending: false }))
        }

        // Pending + GatewayFailed -> Idle, with the fixed notice
        Event::GatewayFailed { failure: _ } => {
            next.mark_failed(FALLBACK_REPLY)?;
            let appended = appended_effects(&next);
            Ok(TransitionResult::new(next)
                .with_effects(appended)
                .with_effect(Effect::NotifyPending { pending: false }))
        }

        Event::ToggleWidget => {
            next.toggle_widget();
            let open = next.is_widget_open();
            let mut result = TransitionResult::new(next).with_effect(Effect::NotifyWidget { open });
            // Opening the widget brings the newest message into view
            if open {
                if let Some(index) = result.new_state.latest_index() {
                    result = result.with_effect(Effect::ScrollToLatest { index });
                }
            }
            Ok(result)
        }
    }
}

fn appended_effects(state: &ConversationState) -> Vec<Effect> {
    match (state.latest_index(), state.messages().last()) {
        (Some(index), Some(message)) => Effect::appended(index, message.clone()).to_vec(),
        _ => vec![],
    }
}

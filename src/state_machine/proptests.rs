//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::*;
use crate::gateway::GatewayFailure;
use crate::llm::{LlmError, LlmErrorKind};
use proptest::prelude::*;

fn arb_failure() -> impl Strategy<Value = GatewayFailure> {
    (
        prop_oneof![
            Just(LlmErrorKind::Network),
            Just(LlmErrorKind::RateLimit),
            Just(LlmErrorKind::ServerError),
            Just(LlmErrorKind::Auth),
            Just(LlmErrorKind::InvalidRequest),
            Just(LlmErrorKind::Unknown),
        ],
        "[a-z ]{0,20}",
    )
        .prop_map(|(kind, message)| LlmError::new(kind, message).into())
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        // Blank and non-blank submissions
        "[a-zA-Z ]{0,12}".prop_map(Event::submit),
        Just(Event::submit("   ")),
        "[a-zA-Z .]{1,20}".prop_map(|text| Event::GatewayReply { text }),
        arb_failure().prop_map(|failure| Event::GatewayFailed { failure }),
        Just(Event::ToggleWidget),
    ]
}

proptest! {
    /// Log grows by exactly one per accepted submit and one per accepted
    /// outcome; events are rejected exactly when the state forbids them.
    #[test]
    fn events_are_rejected_only_when_forbidden(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut state = ConversationState::new("greeting");

        for event in events {
            let pending = state.is_pending();
            match transition(&state, event.clone()) {
                Ok(result) => {
                    let grew = result.new_state.messages().len() - state.messages().len();
                    match event {
                        Event::ToggleWidget => prop_assert_eq!(grew, 0),
                        _ => prop_assert_eq!(grew, 1),
                    }
                    state = result.new_state;
                }
                Err(err) => {
                    let expected = match &event {
                        Event::VisitorSubmit { .. } if pending => TransitionError::AssistantBusy,
                        Event::VisitorSubmit { text } if text.trim().is_empty() => {
                            TransitionError::EmptyMessage
                        }
                        Event::GatewayReply { .. } | Event::GatewayFailed { .. } if !pending => {
                            TransitionError::NoRequestInFlight
                        }
                        _ => {
                            return Err(TestCaseError::fail(format!(
                                "{} rejected with {err} (pending={pending})",
                                event.name()
                            )));
                        }
                    };
                    prop_assert_eq!(err, expected);
                }
            }
        }
    }

    /// Completed turns add exactly two messages each, whether they ended in
    /// a reply or the fallback notice.
    #[test]
    fn completed_turns_add_two_messages(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut state = ConversationState::new("greeting");
        let mut completed_turns = 0usize;

        for event in events {
            if let Ok(result) = transition(&state, event.clone()) {
                if matches!(event, Event::GatewayReply { .. } | Event::GatewayFailed { .. }) {
                    completed_turns += 1;
                }
                state = result.new_state;
            }
        }

        let in_flight = usize::from(state.is_pending());
        prop_assert_eq!(state.messages().len(), 1 + 2 * completed_turns + in_flight);
    }

    /// At most one request in flight: every accepted submit is followed by
    /// an outcome before the next accepted submit.
    #[test]
    fn requests_never_overlap(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut state = ConversationState::new("greeting");
        let mut in_flight = 0u32;

        for event in events {
            if let Ok(result) = transition(&state, event) {
                for effect in &result.effects {
                    if matches!(effect, Effect::RequestReply { .. }) {
                        in_flight += 1;
                    }
                }
                if !result.new_state.is_pending() {
                    in_flight = 0;
                }
                prop_assert!(in_flight <= 1);
                state = result.new_state;
            }
        }
    }

    /// Every append is followed by a scroll to the appended index
    #[test]
    fn appends_always_scroll_to_latest(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut state = ConversationState::new("greeting");

        for event in events {
            if let Ok(result) = transition(&state, event) {
                for (i, effect) in result.effects.iter().enumerate() {
                    if let Effect::PublishMessage { index, .. } = effect {
                        prop_assert_eq!(*index, result.new_state.messages().len() - 1);
                        let scrolls_to_appended = matches!(
                            result.effects.get(i + 1),
                            Some(Effect::ScrollToLatest { index: next }) if next == index
                        );
                        prop_assert!(scrolls_to_appended);
                    }
                }
                state = result.new_state;
            }
        }
    }

    /// Gateway requests carry the log exactly as it stood before the submit
    #[test]
    fn request_context_is_prior_log(texts in proptest::collection::vec("[a-z]{1,10}", 1..6)) {
        let mut state = ConversationState::new("greeting");

        for text in texts {
            let prior = state.messages().to_vec();
            let result = transition(&state, Event::submit(text.clone())).unwrap();
            let request = result.effects.iter().find_map(|e| match e {
                Effect::RequestReply { request } => Some(request.clone()),
                _ => None,
            });
            let request = request.unwrap();
            prop_assert_eq!(&request.prior_messages, &prior);
            prop_assert_eq!(&request.new_message_text, &text);

            state = transition(&result.new_state, Event::GatewayReply { text: "ok".into() })
                .unwrap()
                .new_state;
        }
    }
}

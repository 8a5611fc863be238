//! Property-based tests for the Gemini translation layer
//!
//! The wire request must mirror the provider-neutral history exactly:
//! - one content entry per turn, in order
//! - `user` for user turns, `model` for assistant turns
//! - text carried verbatim, including whitespace
//! - the system instruction never appears as a turn

use super::gemini::{GeminiResponse, GeminiService};
use super::types::{LlmMessage, LlmRequest, MessageRole};
use proptest::prelude::*;
use serde_json::json;

fn arb_role() -> impl Strategy<Value = MessageRole> {
    prop_oneof![Just(MessageRole::User), Just(MessageRole::Assistant)]
}

fn arb_message() -> impl Strategy<Value = LlmMessage> {
    (arb_role(), "[a-zA-Z0-9 _.!?,\n]{0,80}").prop_map(|(role, text)| LlmMessage { role, text })
}

fn arb_request() -> impl Strategy<Value = LlmRequest> {
    (
        proptest::collection::vec(arb_message(), 0..12),
        proptest::option::of("[a-zA-Z ]{1,40}"),
        proptest::option::of(1u32..4096),
    )
        .prop_map(|(messages, system, max_tokens)| LlmRequest {
            system,
            messages,
            max_tokens,
        })
}

proptest! {
    #[test]
    fn translation_preserves_turns(req in arb_request()) {
        let wire = GeminiService::translate_request(&req);

        prop_assert_eq!(wire.contents.len(), req.messages.len());
        for (content, msg) in wire.contents.iter().zip(&req.messages) {
            let expected_role = match msg.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };
            prop_assert_eq!(content.role.as_deref(), Some(expected_role));
            prop_assert_eq!(content.parts.len(), 1);
            prop_assert_eq!(&content.parts[0].text, &msg.text);
        }
    }

    #[test]
    fn system_instruction_is_separate(req in arb_request()) {
        let wire = GeminiService::translate_request(&req);

        match (&wire.system_instruction, &req.system) {
            (Some(si), Some(system)) => {
                prop_assert!(si.role.is_none());
                prop_assert_eq!(&si.parts[0].text, system);
            }
            (None, None) => {}
            _ => prop_assert!(false, "system instruction presence must match"),
        }
    }

    #[test]
    fn normalized_text_is_concatenation_of_parts(parts in proptest::collection::vec("[a-z ]{0,20}", 1..6)) {
        let joined: String = parts.concat();
        let resp: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": parts.iter().map(|t| json!({ "text": t })).collect::<Vec<_>>() },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        match GeminiService::normalize_response(resp) {
            Ok(normalized) => prop_assert_eq!(normalized.text, joined),
            Err(_) => prop_assert!(joined.trim().is_empty()),
        }
    }
}

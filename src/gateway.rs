//! Assistant gateway client
//!
//! Turns the conversation log plus one new visitor message into exactly one
//! call to the generative-language service. Failures never cross this
//! boundary as errors: they come back as `GatewayResponse::Failure`.

use crate::llm::{LlmError, LlmErrorKind, LlmMessage, LlmRequest, LlmService};
use crate::state_machine::{Author, Message};
use async_trait::async_trait;
use std::sync::Arc;

/// Input for one gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    /// The log before the new visitor message was appended
    pub prior_messages: Vec<Message>,
    pub new_message_text: String,
}

/// Why a gateway call failed. Carried for logging only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayFailure {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl From<LlmError> for GatewayFailure {
    fn from(err: LlmError) -> Self {
        Self {
            kind: err.kind,
            message: err.message,
        }
    }
}

/// Outcome of one gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayResponse {
    Reply { text: String },
    Failure(GatewayFailure),
}

/// The generative-language capability used by the send cycle
#[async_trait]
pub trait AssistantGateway: Send + Sync {
    async fn send(&self, request: &GatewayRequest) -> GatewayResponse;
}

#[async_trait]
impl<T: AssistantGateway + ?Sized> AssistantGateway for Arc<T> {
    async fn send(&self, request: &GatewayRequest) -> GatewayResponse {
        (**self).send(request).await
    }
}

/// Map the conversation onto a provider request.
///
/// Prior messages keep their order; visitor turns become user turns and
/// assistant turns become model turns. The new text is the final user turn,
/// verbatim.
pub fn build_llm_request(
    system_instruction: &str,
    request: &GatewayRequest,
    max_tokens: Option<u32>,
) -> LlmRequest {
    let mut messages: Vec<LlmMessage> = request
        .prior_messages
        .iter()
        .map(|m| match m.author {
            Author::Visitor => LlmMessage::user(m.text.as_str()),
            Author::Assistant => LlmMessage::assistant(m.text.as_str()),
        })
        .collect();
    messages.push(LlmMessage::user(request.new_message_text.as_str()));

    LlmRequest {
        system: Some(system_instruction.to_string()),
        messages,
        max_tokens,
    }
}

/// Production gateway backed by an LLM service
pub struct LlmGateway {
    llm: Arc<dyn LlmService>,
    system_instruction: String,
    max_tokens: Option<u32>,
}

impl LlmGateway {
    pub fn new(llm: Arc<dyn LlmService>, system_instruction: impl Into<String>) -> Self {
        Self {
            llm,
            system_instruction: system_instruction.into(),
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl AssistantGateway for LlmGateway {
    async fn send(&self, request: &GatewayRequest) -> GatewayResponse {
        let llm_request = build_llm_request(&self.system_instruction, request, self.max_tokens);

        match self.llm.complete(&llm_request).await {
            Ok(response) => GatewayResponse::Reply {
                text: response.text,
            },
            Err(e) => GatewayResponse::Failure(e.into()),
        }
    }
}

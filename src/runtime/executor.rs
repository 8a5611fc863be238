//! Chat session runtime executor

use super::{ChatEvent, ChatSnapshot, SessionRequest};
use crate::gateway::{AssistantGateway, GatewayFailure, GatewayResponse};
use crate::llm::LlmError;
use crate::state_machine::{transition, ConversationState, Effect, Event, TransitionError};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Owns one session's conversation state and applies events in order
pub struct ChatRuntime<G>
where
    G: AssistantGateway + ?Sized + 'static,
{
    session_id: String,
    state: ConversationState,
    gateway: Arc<G>,
    request_rx: mpsc::Receiver<SessionRequest>,
    /// Gateway outcomes come back through here
    completion_tx: mpsc::Sender<Event>,
    completion_rx: mpsc::Receiver<Event>,
    broadcast_tx: broadcast::Sender<ChatEvent>,
}

impl<G> ChatRuntime<G>
where
    G: AssistantGateway + ?Sized + 'static,
{
    pub fn new(
        session_id: String,
        state: ConversationState,
        gateway: Arc<G>,
        request_rx: mpsc::Receiver<SessionRequest>,
        broadcast_tx: broadcast::Sender<ChatEvent>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(4);
        Self {
            session_id,
            state,
            gateway,
            request_rx,
            completion_tx,
            completion_rx,
            broadcast_tx,
        }
    }

    /// Process requests until every handle to this session is dropped
    pub async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "Starting chat session");

        loop {
            tokio::select! {
                request = self.request_rx.recv() => match request {
                    Some(request) => self.handle_request(request),
                    None => break,
                },
                Some(event) = self.completion_rx.recv() => {
                    // Outcomes have no waiter; a rejection here is a stale reply
                    let _ = self.dispatch(event);
                }
            }
        }

        tracing::info!(session_id = %self.session_id, "Chat session ended");
    }

    fn handle_request(&mut self, request: SessionRequest) {
        match request {
            SessionRequest::Dispatch { event, ack } => {
                let outcome = self.dispatch(event);
                if let Some(ack) = ack {
                    let _ = ack.send(outcome);
                }
            }
            SessionRequest::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot::of(&self.session_id, &self.state)
    }

    fn dispatch(&mut self, event: Event) -> Result<ChatSnapshot, TransitionError> {
        let event_name = event.name();
        let result = transition(&self.state, event).map_err(|e| {
            tracing::debug!(
                session_id = %self.session_id,
                event = event_name,
                reason = %e,
                "Event rejected"
            );
            e
        })?;

        self.state = result.new_state;
        for effect in result.effects {
            self.execute_effect(effect);
        }

        Ok(self.snapshot())
    }

    fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::RequestReply { request } => {
                let gateway = self.gateway.clone();
                let completion_tx = self.completion_tx.clone();
                let session_id = self.session_id.clone();

                tokio::spawn(async move {
                    tracing::info!(
                        session_id = %session_id,
                        history_len = request.prior_messages.len(),
                        "Requesting assistant reply"
                    );

                    // A panicking gateway still has to end the turn
                    let outcome = AssertUnwindSafe(gateway.send(&request))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| {
                            GatewayResponse::Failure(GatewayFailure::from(LlmError::unknown(
                                "Gateway call panicked",
                            )))
                        });

                    let event = match outcome {
                        GatewayResponse::Reply { text } => Event::GatewayReply { text },
                        GatewayResponse::Failure(failure) => {
                            tracing::warn!(
                                session_id = %session_id,
                                kind = failure.kind.as_str(),
                                error = %failure.message,
                                "Gateway call failed, replying with fallback"
                            );
                            Event::GatewayFailed { failure }
                        }
                    };

                    // The session may be gone by now; its outcome is dropped
                    let _ = completion_tx.send(event).await;
                });
            }
            Effect::PublishMessage { index, message } => {
                let _ = self.broadcast_tx.send(ChatEvent::Message { index, message });
            }
            Effect::ScrollToLatest { index } => {
                let _ = self.broadcast_tx.send(ChatEvent::ScrollToLatest { index });
            }
            Effect::NotifyPending { pending } => {
                let _ = self.broadcast_tx.send(ChatEvent::StateChange { pending });
            }
            Effect::NotifyWidget { open } => {
                let _ = self.broadcast_tx.send(ChatEvent::Widget { open });
            }
        }
    }
}

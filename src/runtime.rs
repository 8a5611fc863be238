//! Runtime for chat sessions
//!
//! Each page session is owned by one task that applies events strictly in
//! arrival order, so the conversation state needs no locking. The session
//! registry is the only shared structure.

mod executor;


pub use executor::ChatRuntime;

use crate::gateway::AssistantGateway;
use crate::state_machine::{ConversationState, Event, Message, TransitionError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

/// Read model handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatSnapshot {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub pending: bool,
    pub widget_open: bool,
}

impl ChatSnapshot {
    pub fn of(session_id: &str, state: &ConversationState) -> Self {
        Self {
            session_id: session_id.to_string(),
            messages: state.messages().to_vec(),
            pending: state.is_pending(),
            widget_open: state.is_widget_open(),
        }
    }
}

/// Notifications broadcast to subscribed clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Message { index: usize, message: Message },
    ScrollToLatest { index: usize },
    StateChange { pending: bool },
    Widget { open: bool },
}

type Ack = oneshot::Sender<Result<ChatSnapshot, TransitionError>>;

/// Requests accepted by a session runtime
#[derive(Debug)]
pub enum SessionRequest {
    /// Apply an event; the ack carries the state after it, or the rejection
    Dispatch { event: Event, ack: Option<Ack> },
    Snapshot { reply: oneshot::Sender<ChatSnapshot> },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Session runtime stopped")]
    Closed,
    #[error(transparent)]
    Rejected(#[from] TransitionError),
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub session_id: String,
    request_tx: mpsc::Sender<SessionRequest>,
    broadcast_tx: broadcast::Sender<ChatEvent>,
}

impl SessionHandle {
    pub async fn dispatch(&self, event: Event) -> Result<ChatSnapshot, SessionError> {
        let (ack, rx) = oneshot::channel();
        self.request_tx
            .send(SessionRequest::Dispatch {
                event,
                ack: Some(ack),
            })
            .await
            .map_err(|_| SessionError::Closed)?;
        let outcome = rx.await.map_err(|_| SessionError::Closed)?;
        outcome.map_err(SessionError::from)
    }

    pub async fn snapshot(&self) -> Result<ChatSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request_tx
            .send(SessionRequest::Snapshot { reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.broadcast_tx.subscribe()
    }
}

struct SessionEntry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// Manager for all live chat sessions
pub struct SessionManager {
    gateway: Arc<dyn AssistantGateway>,
    greeting: String,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionManager {
    pub fn new(gateway: Arc<dyn AssistantGateway>, greeting: impl Into<String>) -> Self {
        Self {
            gateway,
            greeting: greeting.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new session seeded with the greeting (widget mount)
    pub async fn create(&self) -> SessionHandle {
        let session_id = uuid::Uuid::new_v4().to_string();
        let (request_tx, request_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);

        let runtime = ChatRuntime::new(
            session_id.clone(),
            ConversationState::new(self.greeting.as_str()),
            self.gateway.clone(),
            request_rx,
            broadcast_tx.clone(),
        );
        tokio::spawn(runtime.run());

        let handle = SessionHandle {
            session_id: session_id.clone(),
            request_tx,
            broadcast_tx,
        };

        self.sessions.write().await.insert(
            session_id,
            SessionEntry {
                handle: handle.clone(),
                last_seen: Instant::now(),
            },
        );

        handle
    }

    /// Look up a session, marking it as recently used
    pub async fn get(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        entry.last_seen = Instant::now();
        Ok(entry.handle.clone())
    }

    pub async fn dispatch(&self, session_id: &str, event: Event) -> Result<ChatSnapshot, SessionError> {
        self.get(session_id).await?.dispatch(event).await
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<ChatSnapshot, SessionError> {
        self.get(session_id).await?.snapshot().await
    }

    /// Subscribe to updates, returning the state as of subscription
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Result<(ChatSnapshot, broadcast::Receiver<ChatEvent>), SessionError> {
        let handle = self.get(session_id).await?;
        // Subscribe first so nothing between snapshot and stream is lost
        let rx = handle.subscribe();
        let snapshot = handle.snapshot().await?;
        Ok((snapshot, rx))
    }

    /// Drop a session (navigation or reload). Returns whether it existed.
    ///
    /// An in-flight gateway call is not cancelled; its outcome is discarded.
    pub async fn discard(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Drop sessions not used within `max_idle`
    ///
    /// A session with an open stream belongs to a loaded page and is kept.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.handle.broadcast_tx.receiver_count() > 0
                || entry.last_seen.elapsed() < max_idle
        });
        before - sessions.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

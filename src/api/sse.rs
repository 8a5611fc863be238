//! Server-Sent Events support

use crate::runtime::{ChatEvent, ChatSnapshot};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    snapshot: ChatSnapshot,
    broadcast_rx: broadcast::Receiver<ChatEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let seen = snapshot.messages.len();

    // Create stream that starts with init event then broadcasts
    let init = futures::stream::once(async move {
        Ok(Event::default()
            .event("init")
            .data(json!({ "type": "init", "snapshot": snapshot }).to_string()))
    });

    let broadcasts = updates_after(seen, broadcast_rx).map(|event| Ok(chat_event_to_axum(event)));

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Broadcast events, minus messages the init snapshot already carries
///
/// The receiver is registered before the snapshot is taken, so a message
/// published in between would otherwise arrive twice.
fn updates_after(
    seen: usize,
    broadcast_rx: broadcast::Receiver<ChatEvent>,
) -> impl Stream<Item = ChatEvent> {
    BroadcastStream::new(broadcast_rx).filter_map(move |result| match result {
        Ok(ChatEvent::Message { index, .. }) if index < seen => None,
        Ok(event) => Some(event),
        Err(_) => None, // Skip lagged messages
    })
}

fn chat_event_to_axum(event: ChatEvent) -> Event {
    let (event_type, data) = chat_event_payload(event);
    Event::default().event(event_type).data(data.to_string())
}

fn chat_event_payload(event: ChatEvent) -> (&'static str, serde_json::Value) {
    match event {
        ChatEvent::Message { index, message } => (
            "message",
            json!({
                "type": "message",
                "index": index,
                "message": message
            }),
        ),
        ChatEvent::ScrollToLatest { index } => (
            "scroll_to_latest",
            json!({
                "type": "scroll_to_latest",
                "index": index
            }),
        ),
        ChatEvent::StateChange { pending } => (
            "state_change",
            json!({
                "type": "state_change",
                "pending": pending
            }),
        ),
        ChatEvent::Widget { open } => (
            "widget",
            json!({
                "type": "widget",
                "open": open
            }),
        ),
    }
}

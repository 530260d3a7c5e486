//! Bridges the realtime bus onto SSE responses.
//!
//! Each connection gets a filtered bus subscription and a forwarder task that
//! pushes encoded events into a small bounded channel; axum drops the
//! receiving stream when the client disconnects, which closes the channel and
//! stops the forwarder.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        session::{MessageView, SessionView},
        sse::{MESSAGE_INSERTED_EVENT, SESSION_CREATED_EVENT, SESSION_UPDATED_EVENT, ServerEvent},
    },
    state::{BusEvent, SharedState, Topic},
};

/// Stream match notifications for a waiting identity. Emits a
/// `session_created` event when a session is created with this identity as
/// the claimed side.
pub fn lobby_stream(
    state: &SharedState,
    identity: String,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    let events = state
        .bus()
        .subscribe_filtered(vec![Topic::SessionCreatedFor(identity.clone())]);
    info!(%identity, "new lobby SSE connection");
    to_sse_stream(events, format!("lobby:{identity}"))
}

/// Stream row updates and new messages of one session.
pub fn session_stream(
    state: &SharedState,
    id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    let events = state
        .bus()
        .subscribe_filtered(vec![Topic::SessionUpdated(id), Topic::MessageInserted(id)]);
    info!(session = %id, "new session SSE connection");
    to_sse_stream(events, format!("session:{id}"))
}

/// Convert a filtered bus stream into an SSE response, forwarding events
/// until the client disconnects.
fn to_sse_stream(
    events: impl Stream<Item = BusEvent> + Send + 'static,
    label: String,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        let mut events = std::pin::pin!(events);
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                next = events.next() => {
                    let Some(event) = next else { break };
                    let Some(payload) = encode(&event) else { continue };

                    let mut sse_event = Event::default().data(payload.data);
                    if let Some(name) = payload.event {
                        sse_event = sse_event.event(name);
                    }

                    if tx.send(Ok(sse_event)).await.is_err() {
                        break;
                    }
                }
            }
        }
        info!(stream = %label, "SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Serialise a bus event into its wire form. Serialisation failures drop the
/// event; the client reconciles from storage on the next one.
fn encode(event: &BusEvent) -> Option<ServerEvent> {
    let result = match event {
        BusEvent::SessionCreated(session) => ServerEvent::json(
            SESSION_CREATED_EVENT.to_string(),
            &SessionView::from(session.clone()),
        ),
        BusEvent::SessionUpdated(session) => ServerEvent::json(
            SESSION_UPDATED_EVENT.to_string(),
            &SessionView::from(session.clone()),
        ),
        BusEvent::MessageInserted(message) => ServerEvent::json(
            MESSAGE_INSERTED_EVENT.to_string(),
            &MessageView::from(message.clone()),
        ),
    };

    match result {
        Ok(payload) => Some(payload),
        Err(error) => {
            warn!(%error, "failed to serialise SSE payload, dropping event");
            None
        }
    }
}

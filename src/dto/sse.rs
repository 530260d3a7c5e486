use serde::Serialize;

/// Dispatched payload carried across SSE streams.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    /// SSE event name, if any.
    pub event: Option<String>,
    /// Serialized JSON data field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// Event name emitted when a session is created for the subscribed identity.
pub const SESSION_CREATED_EVENT: &str = "session_created";
/// Event name emitted when a session row changes.
pub const SESSION_UPDATED_EVENT: &str = "session_updated";
/// Event name emitted when a message lands in the subscribed session.
pub const MESSAGE_INSERTED_EVENT: &str = "message_inserted";

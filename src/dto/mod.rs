//! Request, response, and event payloads exchanged with clients.

pub mod health;
pub mod lobby;
pub mod session;
pub mod sse;
pub mod validation;

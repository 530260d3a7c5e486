//! Storage contracts and backends for the waiting queue, chat sessions, and
//! message logs.

pub mod models;
#[cfg(feature = "mongo-store")]
pub mod mongodb;
pub mod queue_store;
pub mod session_store;
pub mod storage;

use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to insert queue entry for `{identity}`")]
    InsertQueueEntry {
        identity: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete queue entry for `{identity}`")]
    DeleteQueueEntry {
        identity: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to claim queue entry for `{identity}`")]
    ClaimQueueEntry {
        identity: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to scan the queue for candidates")]
    ScanQueue {
        #[source]
        source: MongoError,
    },
    #[error("failed to create chat session `{id}`")]
    CreateSession {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load chat session `{id}`")]
    LoadSession {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to update chat session `{id}`")]
    UpdateSession {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to append a message to session `{session_id}`")]
    AppendMessage {
        session_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list messages of session `{session_id}`")]
    ListMessages {
        session_id: Uuid,
        #[source]
        source: MongoError,
    },
}

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::doc,
    options::{ClientOptions, ReturnDocument},
};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        ChatSessionDocument, MessageDocument, QueueEntryDocument, status_as_str, to_bson_datetime,
        vote_as_str,
    },
};
use crate::dao::{
    models::{ChatSessionEntity, MessageEntity, ParticipantSide, QueueEntryEntity, SessionStatus, Vote},
    queue_store::{QueueScanFilter, QueueStore},
    session_store::SessionStore,
    storage::StorageResult,
};

const QUEUE_COLLECTION_NAME: &str = "queue";
const SESSION_COLLECTION_NAME: &str = "chat_sessions";
const MESSAGE_COLLECTION_NAME: &str = "messages";

/// Connection settings for the MongoDB backend.
#[derive(Clone)]
pub struct MongoConfig {
    /// Parsed client options.
    pub options: ClientOptions,
    /// Database holding the queue, session, and message collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse a connection URI, defaulting the database name to `lounge`.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or("lounge").to_owned();
        let options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;

        Ok(Self {
            options,
            database_name,
        })
    }
}

/// MongoDB-backed implementation of both store contracts.
///
/// The claim primitive maps onto `findOneAndDelete`, which MongoDB executes
/// atomically on the single queue document, so concurrent matchers contending
/// for the same candidate resolve without application locks.
#[derive(Clone)]
pub struct MongoLoungeStore {
    _client: Client,
    database: Database,
}

impl MongoLoungeStore {
    /// Establish a connection and ensure the supporting indexes exist.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;
        let store = Self {
            _client: client,
            database,
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Round-trip a ping so supervisors can detect a dead connection.
    pub async fn ping(&self) -> MongoResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        self.queue_collection()
            .create_index(IndexModel::builder().keys(doc! { "enqueued_at": 1 }).build())
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: QUEUE_COLLECTION_NAME,
                index: "enqueued_at",
                source,
            })?;

        self.message_collection()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "session_id": 1, "created_at": 1 })
                    .build(),
            )
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: MESSAGE_COLLECTION_NAME,
                index: "session_id_created_at",
                source,
            })?;

        Ok(())
    }

    fn queue_collection(&self) -> Collection<QueueEntryDocument> {
        self.database.collection(QUEUE_COLLECTION_NAME)
    }

    fn session_collection(&self) -> Collection<ChatSessionDocument> {
        self.database.collection(SESSION_COLLECTION_NAME)
    }

    fn message_collection(&self) -> Collection<MessageDocument> {
        self.database.collection(MESSAGE_COLLECTION_NAME)
    }
}

impl QueueStore for MongoLoungeStore {
    fn insert(&self, entry: QueueEntryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let collection = self.queue_collection();
        Box::pin(async move {
            let identity = entry.identity.clone();
            let document = QueueEntryDocument::from(entry);
            collection
                .insert_one(&document)
                .await
                .map_err(|source| MongoDaoError::InsertQueueEntry { identity, source })?;
            Ok(())
        })
    }

    fn delete(&self, identity: String) -> BoxFuture<'static, StorageResult<()>> {
        let collection = self.queue_collection();
        Box::pin(async move {
            collection
                .delete_one(doc! { "_id": &identity })
                .await
                .map_err(|source| MongoDaoError::DeleteQueueEntry { identity, source })?;
            Ok(())
        })
    }

    fn delete_returning(
        &self,
        identity: String,
    ) -> BoxFuture<'static, StorageResult<Option<QueueEntryEntity>>> {
        let collection = self.queue_collection();
        Box::pin(async move {
            let removed = collection
                .find_one_and_delete(doc! { "_id": &identity })
                .await
                .map_err(|source| MongoDaoError::ClaimQueueEntry { identity, source })?;
            Ok(removed.map(Into::into))
        })
    }

    fn scan(
        &self,
        filter: QueueScanFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<QueueEntryEntity>>> {
        let collection = self.queue_collection();
        Box::pin(async move {
            let query = doc! {
                "_id": { "$nin": filter.exclude },
                "enqueued_at": { "$gt": to_bson_datetime(filter.newer_than) },
            };
            let documents: Vec<QueueEntryDocument> = collection
                .find(query)
                .sort(doc! { "enqueued_at": 1 })
                .limit(filter.limit as i64)
                .await
                .map_err(|source| MongoDaoError::ScanQueue { source })?
                .try_collect()
                .await
                .map_err(|source| MongoDaoError::ScanQueue { source })?;
            Ok(documents.into_iter().map(Into::into).collect())
        })
    }
}

impl SessionStore for MongoLoungeStore {
    fn create(
        &self,
        session: ChatSessionEntity,
    ) -> BoxFuture<'static, StorageResult<ChatSessionEntity>> {
        let collection = self.session_collection();
        Box::pin(async move {
            let id = session.id;
            let document = ChatSessionDocument::from(session);
            collection
                .insert_one(&document)
                .await
                .map_err(|source| MongoDaoError::CreateSession { id, source })?;
            Ok(document.into())
        })
    }

    fn get(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ChatSessionEntity>>> {
        let collection = self.session_collection();
        Box::pin(async move {
            let document = collection
                .find_one(doc! { "_id": id.to_string() })
                .await
                .map_err(|source| MongoDaoError::LoadSession { id, source })?;
            Ok(document.map(Into::into))
        })
    }

    fn update_vote(
        &self,
        id: Uuid,
        side: ParticipantSide,
        value: Vote,
    ) -> BoxFuture<'static, StorageResult<Option<ChatSessionEntity>>> {
        let collection = self.session_collection();
        Box::pin(async move {
            let column = match side {
                ParticipantSide::A => "vote_a",
                ParticipantSide::B => "vote_b",
            };
            let document = collection
                .find_one_and_update(
                    doc! { "_id": id.to_string() },
                    doc! { "$set": { column: vote_as_str(value) } },
                )
                .return_document(ReturnDocument::After)
                .await
                .map_err(|source| MongoDaoError::UpdateSession { id, source })?;
            Ok(document.map(Into::into))
        })
    }

    fn update_status(
        &self,
        id: Uuid,
        value: SessionStatus,
    ) -> BoxFuture<'static, StorageResult<Option<ChatSessionEntity>>> {
        let collection = self.session_collection();
        Box::pin(async move {
            let document = collection
                .find_one_and_update(
                    doc! { "_id": id.to_string() },
                    doc! { "$set": { "status": status_as_str(value) } },
                )
                .return_document(ReturnDocument::After)
                .await
                .map_err(|source| MongoDaoError::UpdateSession { id, source })?;
            Ok(document.map(Into::into))
        })
    }

    fn append_message(
        &self,
        session_id: Uuid,
        author: String,
        content: String,
        created_at: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<MessageEntity>> {
        let collection = self.message_collection();
        Box::pin(async move {
            let message = MessageEntity {
                id: Uuid::new_v4(),
                session_id,
                author,
                content,
                created_at,
            };
            let document = MessageDocument::from(message);
            collection
                .insert_one(&document)
                .await
                .map_err(|source| MongoDaoError::AppendMessage { session_id, source })?;
            Ok(document.into())
        })
    }

    fn list_messages(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>> {
        let collection = self.message_collection();
        Box::pin(async move {
            let documents: Vec<MessageDocument> = collection
                .find(doc! { "session_id": session_id.to_string() })
                .sort(doc! { "created_at": 1 })
                .await
                .map_err(|source| MongoDaoError::ListMessages { session_id, source })?
                .try_collect()
                .await
                .map_err(|source| MongoDaoError::ListMessages { session_id, source })?;
            Ok(documents.into_iter().map(Into::into).collect())
        })
    }
}

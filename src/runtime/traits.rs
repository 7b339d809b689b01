//! Trait abstractions for the lifecycle collaborators
//!
//! These traits enable testing the runtime with in-memory implementations.

use crate::db::{Conversation, Database, DbError};
use crate::lifecycle::{
    ActorId, Request, RequestId, RequestStatus, Response, ResponseId, ResponseStatus, StatusWrite,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failures reported by collaborators
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage failure: {0}")]
    Backend(String),
    /// A batch failed midway and undoing the applied writes failed too
    #[error("Partial commit could not be rolled back: {0}")]
    PartialCommit(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::RequestNotFound(id)
            | DbError::ResponseNotFound(id)
            | DbError::ConversationNotFound(id) => StoreError::NotFound(id),
            DbError::Constraint(msg) => StoreError::Conflict(msg),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Persistence for requests and their responses
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Full request with nested responses
    async fn fetch_request(&self, id: &RequestId) -> Result<Request, StoreError>;

    async fn insert_request(&self, request: &Request) -> Result<(), StoreError>;

    async fn insert_response(&self, response: &Response) -> Result<(), StoreError>;

    async fn persist_response_status(
        &self,
        id: &ResponseId,
        status: ResponseStatus,
    ) -> Result<(), StoreError>;

    async fn persist_request_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
    ) -> Result<(), StoreError>;

    /// Commit a transition's writes as one unit.
    ///
    /// The default applies the writes one at a time and, if one fails,
    /// restores the previous status of every write already applied.
    /// Stores with real transactions should override it.
    async fn commit(&self, writes: &[StatusWrite]) -> Result<(), StoreError> {
        let mut applied: Vec<&StatusWrite> = Vec::with_capacity(writes.len());
        for write in writes {
            if let Err(err) = apply_write(self, write).await {
                tracing::warn!(
                    error = %err,
                    applied = applied.len(),
                    "Status write failed, compensating"
                );
                for done in applied.iter().rev() {
                    if let Err(undo_err) = apply_write(self, &done.inverse()).await {
                        tracing::error!(error = %undo_err, write = ?done, "Compensation failed");
                        return Err(StoreError::PartialCommit(format!(
                            "{err}; rollback failed: {undo_err}"
                        )));
                    }
                }
                return Err(err);
            }
            applied.push(write);
        }
        Ok(())
    }
}

async fn apply_write<S: RequestStore + ?Sized>(
    store: &S,
    write: &StatusWrite,
) -> Result<(), StoreError> {
    match write {
        StatusWrite::Response {
            response_id, to, ..
        } => store.persist_response_status(response_id, *to).await,
        StatusWrite::Request { request_id, to, .. } => {
            store.persist_request_status(request_id, *to).await
        }
    }
}

/// Messaging collaborator
#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn create_conversation(
        &self,
        from: &ActorId,
        to: &ActorId,
        initial_message: &str,
    ) -> Result<Conversation, StoreError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: RequestStore + ?Sized> RequestStore for Arc<T> {
    async fn fetch_request(&self, id: &RequestId) -> Result<Request, StoreError> {
        (**self).fetch_request(id).await
    }

    async fn insert_request(&self, request: &Request) -> Result<(), StoreError> {
        (**self).insert_request(request).await
    }

    async fn insert_response(&self, response: &Response) -> Result<(), StoreError> {
        (**self).insert_response(response).await
    }

    async fn persist_response_status(
        &self,
        id: &ResponseId,
        status: ResponseStatus,
    ) -> Result<(), StoreError> {
        (**self).persist_response_status(id, status).await
    }

    async fn persist_request_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
    ) -> Result<(), StoreError> {
        (**self).persist_request_status(id, status).await
    }

    async fn commit(&self, writes: &[StatusWrite]) -> Result<(), StoreError> {
        (**self).commit(writes).await
    }
}

#[async_trait]
impl<T: ConversationService + ?Sized> ConversationService for Arc<T> {
    async fn create_conversation(
        &self,
        from: &ActorId,
        to: &ActorId,
        initial_message: &str,
    ) -> Result<Conversation, StoreError> {
        (**self).create_conversation(from, to, initial_message).await
    }
}

// ============================================================================
// Production Adapter
// ============================================================================

/// Adapter to use Database as both request store and conversation service
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn inner(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl RequestStore for DatabaseStorage {
    async fn fetch_request(&self, id: &RequestId) -> Result<Request, StoreError> {
        Ok(self.db.get_request(id)?)
    }

    async fn insert_request(&self, request: &Request) -> Result<(), StoreError> {
        Ok(self.db.insert_request(request)?)
    }

    async fn insert_response(&self, response: &Response) -> Result<(), StoreError> {
        Ok(self.db.insert_response(response)?)
    }

    async fn persist_response_status(
        &self,
        id: &ResponseId,
        status: ResponseStatus,
    ) -> Result<(), StoreError> {
        Ok(self.db.update_response_status(id, status)?)
    }

    async fn persist_request_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
    ) -> Result<(), StoreError> {
        Ok(self.db.update_request_status(id, status)?)
    }

    async fn commit(&self, writes: &[StatusWrite]) -> Result<(), StoreError> {
        Ok(self.db.apply_status_writes(writes)?)
    }
}

#[async_trait]
impl ConversationService for DatabaseStorage {
    async fn create_conversation(
        &self,
        from: &ActorId,
        to: &ActorId,
        initial_message: &str,
    ) -> Result<Conversation, StoreError> {
        Ok(self.db.create_conversation(from, to, initial_message)?)
    }
}

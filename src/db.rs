//! Database module
//!
//! Provides persistence for requests, their responses, and the conversations
//! opened when a response is accepted.

mod schema;

pub use schema::*;

use crate::lifecycle::{
    ActorId, Request, RequestId, RequestStatus, Response, ResponseId, ResponseRegistry,
    ResponseStatus, StatusWrite,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),
    #[error("Constraint violated: {0}")]
    Constraint(String),
    #[error("Request not found: {0}")]
    RequestNotFound(String),
    #[error("Response not found: {0}")]
    ResponseNotFound(String),
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),
    #[error("Database connection lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
                DbError::Constraint(msg.unwrap_or_else(|| e.to_string()))
            }
            other => DbError::Sqlite(other),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Request Operations ====================

    /// Insert a new request together with any responses it already carries
    pub fn insert_request(&self, request: &Request) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let created_at = request.created_at.to_rfc3339();

        tx.execute(
            "INSERT INTO requests (id, client_id, title, description, law_area, price_range,
                                   experience_required, status, status_updated_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                request.id.as_str(),
                request.client_id.as_str(),
                request.title,
                request.description,
                request.law_area,
                request.price_range,
                request.experience_required,
                request.status,
                created_at,
            ],
        )?;

        for response in &request.responses {
            insert_response_row(&tx, response)?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Get a request with its responses in arrival order
    pub fn get_request(&self, id: &RequestId) -> DbResult<Request> {
        let conn = self.conn()?;
        load_request(&conn, id)?.ok_or_else(|| DbError::RequestNotFound(id.to_string()))
    }

    /// List requests, newest first, optionally filtered by status
    pub fn list_requests(&self, status: Option<RequestStatus>) -> DbResult<Vec<Request>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id FROM requests
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY created_at DESC",
        )?;
        let ids: Vec<String> = stmt
            .query_map(params![status], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        ids.into_iter()
            .filter_map(|id| load_request(&conn, &RequestId::new(id)).transpose())
            .collect()
    }

    pub fn update_request_status(&self, id: &RequestId, status: RequestStatus) -> DbResult<()> {
        let conn = self.conn()?;
        set_request_status(&conn, id, status)
    }

    // ==================== Response Operations ====================

    /// Append a response to its request
    pub fn insert_response(&self, response: &Response) -> DbResult<()> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM requests WHERE id = ?1)",
            params![response.request_id.as_str()],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(DbError::RequestNotFound(response.request_id.to_string()));
        }
        insert_response_row(&conn, response)
    }

    pub fn update_response_status(&self, id: &ResponseId, status: ResponseStatus) -> DbResult<()> {
        let conn = self.conn()?;
        set_response_status(&conn, id, status)
    }

    /// Apply a batch of status writes in a single transaction
    pub fn apply_status_writes(&self, writes: &[StatusWrite]) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for write in writes {
            match write {
                StatusWrite::Response {
                    response_id, to, ..
                } => set_response_status(&tx, response_id, *to)?,
                StatusWrite::Request { request_id, to, .. } => {
                    set_request_status(&tx, request_id, *to)?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ==================== Conversation Operations ====================

    /// Open a conversation between two actors, or reuse the existing one, and
    /// append `initial_message` from `from` to it
    pub fn create_conversation(
        &self,
        from: &ActorId,
        to: &ActorId,
        initial_message: &str,
    ) -> DbResult<Conversation> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        let (a, b) = if from <= to { (from, to) } else { (to, from) };

        let existing: Option<String> = tx
            .query_row(
                "SELECT id FROM conversations WHERE participant_a = ?1 AND participant_b = ?2",
                params![a.as_str(), b.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let conversation_id = if let Some(id) = existing {
            tx.execute(
                "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
                params![now, id],
            )?;
            id
        } else {
            let id = uuid::Uuid::new_v4().to_string();
            tx.execute(
                "INSERT INTO conversations (id, participant_a, participant_b, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![id, a.as_str(), b.as_str(), now],
            )?;
            id
        };

        let sequence_id: i64 = tx.query_row(
            "SELECT COALESCE(MAX(sequence_id), 0) + 1 FROM conversation_messages WHERE conversation_id = ?1",
            params![conversation_id],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO conversation_messages (message_id, conversation_id, sequence_id, sender_id, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                uuid::Uuid::new_v4().to_string(),
                conversation_id,
                sequence_id,
                from.as_str(),
                initial_message,
                now,
            ],
        )?;

        let conversation = load_conversation(&tx, &conversation_id)?;
        tx.commit()?;
        conversation.ok_or(DbError::ConversationNotFound(conversation_id))
    }

    /// Conversations an actor takes part in, most recently active first
    pub fn list_conversations(&self, actor: &ActorId) -> DbResult<Vec<Conversation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id FROM conversations
             WHERE participant_a = ?1 OR participant_b = ?1
             ORDER BY updated_at DESC",
        )?;
        let ids: Vec<String> = stmt
            .query_map(params![actor.as_str()], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        ids.iter()
            .filter_map(|id| load_conversation(&conn, id).transpose())
            .collect()
    }
}

fn insert_response_row(conn: &Connection, response: &Response) -> DbResult<()> {
    let sequence_id: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sequence_id), 0) + 1 FROM responses WHERE request_id = ?1",
        params![response.request_id.as_str()],
        |row| row.get(0),
    )?;
    let created_at = response.created_at.to_rfc3339();

    conn.execute(
        "INSERT INTO responses (id, request_id, sequence_id, lawyer_id, lawyer_name, message,
                                status, status_updated_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            response.id.as_str(),
            response.request_id.as_str(),
            sequence_id,
            response.lawyer_id.as_str(),
            response.lawyer_name,
            response.message,
            response.status,
            created_at,
        ],
    )?;
    Ok(())
}

fn set_request_status(conn: &Connection, id: &RequestId, status: RequestStatus) -> DbResult<()> {
    let updated = conn.execute(
        "UPDATE requests SET status = ?1, status_updated_at = ?2 WHERE id = ?3",
        params![status, Utc::now().to_rfc3339(), id.as_str()],
    )?;
    if updated == 0 {
        return Err(DbError::RequestNotFound(id.to_string()));
    }
    Ok(())
}

fn set_response_status(conn: &Connection, id: &ResponseId, status: ResponseStatus) -> DbResult<()> {
    let updated = conn.execute(
        "UPDATE responses SET status = ?1, status_updated_at = ?2 WHERE id = ?3",
        params![status, Utc::now().to_rfc3339(), id.as_str()],
    )?;
    if updated == 0 {
        return Err(DbError::ResponseNotFound(id.to_string()));
    }
    Ok(())
}

fn load_request(conn: &Connection, id: &RequestId) -> DbResult<Option<Request>> {
    let request = conn
        .query_row(
            "SELECT id, client_id, title, description, law_area, price_range,
                    experience_required, status, created_at
             FROM requests WHERE id = ?1",
            params![id.as_str()],
            parse_request_row,
        )
        .optional()?;

    let Some(request) = request else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT id, request_id, lawyer_id, lawyer_name, message, status, created_at
         FROM responses WHERE request_id = ?1 ORDER BY sequence_id ASC",
    )?;
    let responses = stmt
        .query_map(params![id.as_str()], parse_response_row)?
        .collect::<Result<ResponseRegistry, _>>()?;

    Ok(Some(request.with_responses(responses)))
}

fn load_conversation(conn: &Connection, id: &str) -> DbResult<Option<Conversation>> {
    let conversation = conn
        .query_row(
            "SELECT id, participant_a, participant_b, created_at, updated_at
             FROM conversations WHERE id = ?1",
            params![id],
            |row| {
                Ok(Conversation {
                    id: row.get(0)?,
                    participant_a: ActorId::new(row.get::<_, String>(1)?),
                    participant_b: ActorId::new(row.get::<_, String>(2)?),
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                    updated_at: parse_datetime(&row.get::<_, String>(4)?),
                    messages: vec![],
                })
            },
        )
        .optional()?;

    let Some(mut conversation) = conversation else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT message_id, sequence_id, sender_id, body, created_at
         FROM conversation_messages WHERE conversation_id = ?1 ORDER BY sequence_id ASC",
    )?;
    conversation.messages = stmt
        .query_map(params![id], |row| {
            Ok(ConversationMessage {
                message_id: row.get(0)?,
                sequence_id: row.get(1)?,
                sender_id: ActorId::new(row.get::<_, String>(2)?),
                body: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?
        .collect::<Result<_, _>>()?;

    Ok(Some(conversation))
}

fn parse_request_row(row: &Row<'_>) -> rusqlite::Result<Request> {
    Ok(Request {
        id: RequestId::new(row.get::<_, String>(0)?),
        client_id: ActorId::new(row.get::<_, String>(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        law_area: row.get(4)?,
        price_range: row.get(5)?,
        experience_required: row.get(6)?,
        status: row.get(7)?,
        responses: ResponseRegistry::default(),
        response_count: 0,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn parse_response_row(row: &Row<'_>) -> rusqlite::Result<Response> {
    Ok(Response {
        id: ResponseId::new(row.get::<_, String>(0)?),
        request_id: RequestId::new(row.get::<_, String>(1)?),
        lawyer_id: ActorId::new(row.get::<_, String>(2)?),
        lawyer_name: row.get(3)?,
        message: row.get(4)?,
        status: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

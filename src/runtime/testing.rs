//! In-memory implementations for testing
//!
//! These mocks enable runtime testing without a database.

use super::traits::{ConversationService, RequestStore, StoreError};
use crate::db::{Conversation, ConversationMessage};
use crate::lifecycle::{
    ActorId, Request, RequestId, RequestStatus, Response, ResponseId, ResponseStatus,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

// ============================================================================
// In-memory Request Store
// ============================================================================

/// Request store that keeps snapshots in a map and writes one status at a time.
///
/// Relies on the default `commit`, so it exercises the compensation path.
#[derive(Default)]
pub struct InMemoryStore {
    requests: Mutex<HashMap<RequestId, Request>>,
    fail_request_writes: Mutex<bool>,
    fail_response_writes_after: Mutex<Option<usize>>,
    /// Every status write that reached the store, in order
    pub writes: Mutex<Vec<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request(self, request: Request) -> Self {
        self.requests
            .lock()
            .unwrap()
            .insert(request.id.clone(), request);
        self
    }

    /// Make every `persist_request_status` call fail
    pub fn fail_request_writes(&self) {
        *self.fail_request_writes.lock().unwrap() = true;
    }

    /// Let `n` more response writes through, then fail the rest
    pub fn fail_response_writes_after(&self, n: usize) {
        *self.fail_response_writes_after.lock().unwrap() = Some(n);
    }

    pub fn snapshot(&self, id: &RequestId) -> Option<Request> {
        self.requests.lock().unwrap().get(id).cloned()
    }

    pub fn recorded_writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestStore for InMemoryStore {
    async fn fetch_request(&self, id: &RequestId) -> Result<Request, StoreError> {
        self.snapshot(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn insert_request(&self, request: &Request) -> Result<(), StoreError> {
        let mut requests = self.requests.lock().unwrap();
        if requests.contains_key(&request.id) {
            return Err(StoreError::Conflict(format!("request {} exists", request.id)));
        }
        requests.insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn insert_response(&self, response: &Response) -> Result<(), StoreError> {
        let mut requests = self.requests.lock().unwrap();
        let request = requests
            .get_mut(&response.request_id)
            .ok_or_else(|| StoreError::NotFound(response.request_id.to_string()))?;
        let responses = request.responses.with_appended(response.clone());
        *request = request.clone().with_responses(responses);
        Ok(())
    }

    async fn persist_response_status(
        &self,
        id: &ResponseId,
        status: ResponseStatus,
    ) -> Result<(), StoreError> {
        {
            let mut budget = self.fail_response_writes_after.lock().unwrap();
            match budget.as_mut() {
                Some(0) => return Err(StoreError::Backend("response write refused".to_string())),
                Some(n) => *n -= 1,
                None => {}
            }
        }

        let mut requests = self.requests.lock().unwrap();
        let request = requests
            .values_mut()
            .find(|r| r.responses.find(id).is_some())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let responses = request.responses.with_status(id, status);
        *request = request.clone().with_responses(responses);
        self.writes
            .lock()
            .unwrap()
            .push(format!("response {id} -> {status}"));
        Ok(())
    }

    async fn persist_request_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
    ) -> Result<(), StoreError> {
        if *self.fail_request_writes.lock().unwrap() {
            return Err(StoreError::Backend("request write refused".to_string()));
        }
        let mut requests = self.requests.lock().unwrap();
        let request = requests
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        request.status = status;
        self.writes
            .lock()
            .unwrap()
            .push(format!("request {id} -> {status}"));
        Ok(())
    }
}

// ============================================================================
// Mock Conversation Service
// ============================================================================

/// Conversation service that records every call
#[derive(Default)]
pub struct MockConversationService {
    fail: Mutex<bool>,
    /// Record of (from, to, initial message)
    pub calls: Mutex<Vec<(ActorId, ActorId, String)>>,
}

impl MockConversationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: Mutex::new(true),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded_calls(&self) -> Vec<(ActorId, ActorId, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationService for MockConversationService {
    async fn create_conversation(
        &self,
        from: &ActorId,
        to: &ActorId,
        initial_message: &str,
    ) -> Result<Conversation, StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push((from.clone(), to.clone(), initial_message.to_string()));
        if *self.fail.lock().unwrap() {
            return Err(StoreError::Backend("messaging unavailable".to_string()));
        }
        let now = Utc::now();
        Ok(Conversation {
            id: format!("conv-{from}-{to}"),
            participant_a: from.clone(),
            participant_b: to.clone(),
            created_at: now,
            updated_at: now,
            messages: vec![ConversationMessage {
                message_id: "msg-1".to_string(),
                sequence_id: 1,
                sender_id: from.clone(),
                body: initial_message.to_string(),
                created_at: now,
            }],
        })
    }
}

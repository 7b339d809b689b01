//! Effects produced by lifecycle transitions
//!
//! The engine only describes follow-up work; the runtime carries it out.

use super::model::{ActorId, RequestId, Response, ResponseId};
use super::status::{RequestStatus, ResponseStatus};
use serde::{Deserialize, Serialize};

/// A single status change to commit. `from` is kept so a failed batch can be compensated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum StatusWrite {
    Response {
        response_id: ResponseId,
        from: ResponseStatus,
        to: ResponseStatus,
    },
    Request {
        request_id: RequestId,
        from: RequestStatus,
        to: RequestStatus,
    },
}

impl StatusWrite {
    /// The write that undoes this one
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self {
            StatusWrite::Response {
                response_id,
                from,
                to,
            } => StatusWrite::Response {
                response_id: response_id.clone(),
                from: *to,
                to: *from,
            },
            StatusWrite::Request {
                request_id,
                from,
                to,
            } => StatusWrite::Request {
                request_id: request_id.clone(),
                from: *to,
                to: *from,
            },
        }
    }
}

/// Instruction for the messaging collaborator, emitted when a response is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRequest {
    pub request_id: RequestId,
    pub request_title: String,
    pub client_id: ActorId,
    pub lawyer_id: ActorId,
    pub lawyer_name: String,
}

/// Effects to be executed after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Commit a status change; all of a transition's writes form one batch
    PersistStatus(StatusWrite),

    /// Store a newly submitted response
    InsertResponse(Response),

    /// Open a conversation between client and lawyer
    CreateConversation(ConversationRequest),
}

impl Effect {
    pub fn persist_response_status(
        response_id: ResponseId,
        from: ResponseStatus,
        to: ResponseStatus,
    ) -> Self {
        Effect::PersistStatus(StatusWrite::Response {
            response_id,
            from,
            to,
        })
    }

    pub fn persist_request_status(
        request_id: RequestId,
        from: RequestStatus,
        to: RequestStatus,
    ) -> Self {
        Effect::PersistStatus(StatusWrite::Request {
            request_id,
            from,
            to,
        })
    }
}

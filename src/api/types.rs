//! API request and response types

use crate::db::Conversation;
use crate::lifecycle::{Actor, ActorId, RequestDetails, RequestView, Role};
use serde::{Deserialize, Serialize};

/// Acting identity carried in every mutating request body
#[derive(Debug, Clone, Deserialize)]
pub struct ActorFields {
    pub actor_id: ActorId,
    pub role: Role,
}

impl From<ActorFields> for Actor {
    fn from(fields: ActorFields) -> Self {
        Actor {
            id: fields.actor_id,
            role: fields.role,
        }
    }
}

/// Optional viewer for read endpoints (`?actor_id=&role=`)
#[derive(Debug, Default, Deserialize)]
pub struct ViewerQuery {
    pub actor_id: Option<String>,
    pub role: Option<Role>,
}

impl ViewerQuery {
    /// Both fields are needed to identify a viewer; otherwise the view is anonymous
    pub fn actor(&self) -> Option<Actor> {
        match (&self.actor_id, self.role) {
            (Some(id), Some(role)) => Some(Actor {
                id: ActorId::new(id.clone()),
                role,
            }),
            _ => None,
        }
    }
}

/// Filters for listing requests
#[derive(Debug, Default, Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<String>,
    pub actor_id: Option<String>,
    pub role: Option<Role>,
}

impl ListRequestsQuery {
    pub fn viewer(&self) -> ViewerQuery {
        ViewerQuery {
            actor_id: self.actor_id.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListConversationsQuery {
    pub actor_id: String,
}

/// Body for posting a new request
#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    #[serde(flatten)]
    pub actor: ActorFields,
    #[serde(flatten)]
    pub details: RequestDetails,
}

/// Body for a lawyer's response submission
#[derive(Debug, Deserialize)]
pub struct SubmitResponseBody {
    #[serde(flatten)]
    pub actor: ActorFields,
    pub lawyer_name: String,
    pub message: String,
}

/// Body for accept, reject, complete and cancel
#[derive(Debug, Deserialize)]
pub struct ActionBody {
    #[serde(flatten)]
    pub actor: ActorFields,
}

/// Result of a lifecycle operation
#[derive(Debug, Serialize)]
pub struct LifecycleResponse {
    pub request: RequestView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<Conversation>,
}

#[derive(Debug, Serialize)]
pub struct RequestResponse {
    pub request: RequestView,
}

#[derive(Debug, Serialize)]
pub struct RequestListResponse {
    pub requests: Vec<RequestView>,
}

#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<Conversation>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable machine-readable category
    pub code: &'static str,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, code: &'static str) -> Self {
        Self {
            error: message.into(),
            code,
        }
    }
}

//! Request and response records

use super::registry::ResponseRegistry;
use super::status::{RequestStatus, ResponseStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Fresh random identifier for creation flows
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(RequestId);
id_newtype!(ResponseId);
id_newtype!(ActorId);

/// A client's posted ask for legal help
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub client_id: ActorId,
    pub title: String,
    pub description: String,
    pub law_area: String,
    pub price_range: String,
    pub experience_required: String,
    pub status: RequestStatus,
    pub responses: ResponseRegistry,
    /// Number of active responses; kept in step with `responses` by [`Request::with_responses`]
    pub response_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Client-authored fields of a new request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDetails {
    pub title: String,
    pub description: String,
    pub law_area: String,
    pub price_range: String,
    pub experience_required: String,
}

impl Request {
    /// A freshly posted request: `Open` with no responses
    pub fn open(id: RequestId, client_id: ActorId, details: RequestDetails) -> Self {
        Self {
            id,
            client_id,
            title: details.title,
            description: details.description,
            law_area: details.law_area,
            price_range: details.price_range,
            experience_required: details.experience_required,
            status: RequestStatus::Open,
            responses: ResponseRegistry::default(),
            response_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Replace the response set, recomputing `response_count`
    #[must_use]
    pub fn with_responses(mut self, responses: ResponseRegistry) -> Self {
        self.response_count = responses.active_count();
        self.responses = responses;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = status;
        self
    }
}

/// A lawyer's offer against a specific request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: ResponseId,
    pub request_id: RequestId,
    pub lawyer_id: ActorId,
    pub lawyer_name: String,
    pub message: String,
    pub status: ResponseStatus,
    pub created_at: DateTime<Utc>,
}

impl Response {
    /// New pending response, as appended by the submission flow
    pub fn pending(
        request_id: RequestId,
        lawyer_id: ActorId,
        lawyer_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: ResponseId::generate(),
            request_id,
            lawyer_id,
            lawyer_name: lawyer_name.into(),
            message: message.into(),
            status: ResponseStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Role of the acting identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Lawyer,
}

/// Acting identity, passed explicitly to every lifecycle call site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
}

#[cfg(test)]
impl Actor {
    pub fn client(id: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(id),
            role: Role::Client,
        }
    }

    pub fn lawyer(id: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(id),
            role: Role::Lawyer,
        }
    }
}

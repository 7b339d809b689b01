//! Read-only views derived from a request snapshot
//!
//! Nothing here is cached; views are recomputed from the snapshot each time.

use super::model::{Actor, ActorId, Request, RequestId, Response, ResponseId, Role};
use super::registry::ResponseRegistry;
use super::status::{RequestStatus, ResponseStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Display tier used for badge colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Neutral,
    Success,
    Warning,
    Danger,
}

/// Label and category for a status enum
pub trait StatusDisplay: Copy {
    fn label(self) -> &'static str;
    fn category(self) -> StatusCategory;
}

impl StatusDisplay for RequestStatus {
    fn label(self) -> &'static str {
        match self {
            RequestStatus::Open => "Open",
            RequestStatus::InProgress => "In Progress",
            RequestStatus::Completed => "Completed",
            RequestStatus::Cancelled => "Cancelled",
        }
    }

    fn category(self) -> StatusCategory {
        match self {
            RequestStatus::Open => StatusCategory::Success,
            RequestStatus::InProgress => StatusCategory::Warning,
            RequestStatus::Completed => StatusCategory::Neutral,
            RequestStatus::Cancelled => StatusCategory::Danger,
        }
    }
}

impl StatusDisplay for ResponseStatus {
    fn label(self) -> &'static str {
        match self {
            ResponseStatus::Pending => "Pending",
            ResponseStatus::Accepted => "Accepted",
            ResponseStatus::Rejected => "Rejected",
        }
    }

    fn category(self) -> StatusCategory {
        match self {
            ResponseStatus::Pending => StatusCategory::Warning,
            ResponseStatus::Accepted => StatusCategory::Success,
            ResponseStatus::Rejected => StatusCategory::Danger,
        }
    }
}

pub fn status_label<S: StatusDisplay>(status: S) -> &'static str {
    status.label()
}

pub fn status_category<S: StatusDisplay>(status: S) -> StatusCategory {
    status.category()
}

pub fn has_responded_as_actor(registry: &ResponseRegistry, actor_id: &ActorId) -> bool {
    registry.find_by_actor(actor_id).is_some()
}

pub fn active_response_count(registry: &ResponseRegistry) -> usize {
    registry.active_count()
}

/// Response as shown to presentation
#[derive(Debug, Clone, Serialize)]
pub struct ResponseView {
    pub id: ResponseId,
    pub lawyer_id: ActorId,
    pub lawyer_name: String,
    pub message: String,
    pub status: ResponseStatus,
    pub status_label: &'static str,
    pub status_category: StatusCategory,
    pub created_at: DateTime<Utc>,
}

impl From<&Response> for ResponseView {
    fn from(response: &Response) -> Self {
        Self {
            id: response.id.clone(),
            lawyer_id: response.lawyer_id.clone(),
            lawyer_name: response.lawyer_name.clone(),
            message: response.message.clone(),
            status: response.status,
            status_label: status_label(response.status),
            status_category: status_category(response.status),
            created_at: response.created_at,
        }
    }
}

/// Request as shown to a particular viewer
#[derive(Debug, Clone, Serialize)]
pub struct RequestView {
    pub id: RequestId,
    pub client_id: ActorId,
    pub title: String,
    pub description: String,
    pub law_area: String,
    pub price_range: String,
    pub experience_required: String,
    pub status: RequestStatus,
    pub status_label: &'static str,
    pub status_category: StatusCategory,
    pub response_count: usize,
    pub responses: Vec<ResponseView>,
    /// Whether the viewer, as a lawyer, already has a response on this request
    pub has_responded: bool,
    /// Whether the viewer may still submit a response
    pub can_respond: bool,
    pub created_at: DateTime<Utc>,
}

impl RequestView {
    /// View of a stored snapshot: every active response is shown
    pub fn project(request: &Request, viewer: Option<&Actor>) -> Self {
        Self::project_visible(request, &request.responses.active(), viewer)
    }

    /// View over an explicit visible set, as produced by a transition
    pub fn project_visible(
        request: &Request,
        visible: &ResponseRegistry,
        viewer: Option<&Actor>,
    ) -> Self {
        let has_responded =
            viewer.is_some_and(|actor| has_responded_as_actor(&request.responses, &actor.id));
        let has_active = viewer.is_some_and(|actor| {
            request
                .responses
                .find_by_actor(&actor.id)
                .is_some_and(Response::is_active)
        });
        let can_respond = viewer.is_some_and(|actor| {
            actor.role == Role::Lawyer
                && request.status == RequestStatus::Open
                && !has_active
        });

        Self {
            id: request.id.clone(),
            client_id: request.client_id.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            law_area: request.law_area.clone(),
            price_range: request.price_range.clone(),
            experience_required: request.experience_required.clone(),
            status: request.status,
            status_label: status_label(request.status),
            status_category: status_category(request.status),
            response_count: active_response_count(&request.responses),
            responses: visible.iter().map(ResponseView::from).collect(),
            has_responded,
            can_respond,
            created_at: request.created_at,
        }
    }
}

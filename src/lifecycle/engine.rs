//! Pure lifecycle transitions over a request snapshot
//!
//! Every operation borrows the caller's snapshot and returns a new request
//! plus the effects needed to commit it. Either all preconditions hold and a
//! full result is returned, or a single [`LifecycleError`] is returned and
//! nothing changes.

use super::effect::{ConversationRequest, Effect, StatusWrite};
use super::model::{ActorId, Request, RequestId, Response, ResponseId};
use super::registry::ResponseRegistry;
use super::status::{RequestStatus, ResponseStatus};
use std::fmt;
use thiserror::Error;

/// Result of a lifecycle transition
#[derive(Debug, Clone)]
pub struct TransitionResult {
    /// Authoritative new snapshot, including rejected records
    pub request: Request,
    pub effects: Vec<Effect>,
    /// Responses the presentation layer should show
    pub visible_responses: ResponseRegistry,
}

impl TransitionResult {
    pub fn new(request: Request) -> Self {
        let visible_responses = request.responses.active();
        Self {
            request,
            effects: vec![],
            visible_responses,
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_visible_responses(mut self, responses: ResponseRegistry) -> Self {
        self.visible_responses = responses;
        self
    }

    /// Status writes that must be committed together
    pub fn status_writes(&self) -> Vec<StatusWrite> {
        self.effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::PersistStatus(write) => Some(write.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn conversation(&self) -> Option<&ConversationRequest> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::CreateConversation(conversation) => Some(conversation),
            _ => None,
        })
    }
}

/// Operation names, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Accept,
    Reject,
    Complete,
    Cancel,
    Submit,
    Post,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Accept => "accept response",
            Operation::Reject => "reject response",
            Operation::Complete => "complete request",
            Operation::Cancel => "cancel request",
            Operation::Submit => "submit response",
            Operation::Post => "post request",
        })
    }
}

/// Coarse failure categories callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidRequestState,
    InvalidResponseState,
    AlreadyHasAcceptedResponse,
    DuplicateResponse,
}

/// Precondition failures. No variant implies any state was changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Response not found: {0}")]
    ResponseNotFound(ResponseId),

    #[error("Cannot {operation}: request {request_id} is {status}")]
    InvalidRequestState {
        request_id: RequestId,
        status: RequestStatus,
        operation: Operation,
    },

    #[error("Cannot {operation}: response {response_id} is {status}")]
    InvalidResponseState {
        response_id: ResponseId,
        status: ResponseStatus,
        operation: Operation,
    },

    #[error("Response {response_id} belongs to request {owner}, not {request_id}")]
    ForeignResponse {
        response_id: ResponseId,
        owner: RequestId,
        request_id: RequestId,
    },

    #[error("Request {request_id} already has an accepted response ({accepted_id})")]
    AlreadyHasAcceptedResponse {
        request_id: RequestId,
        accepted_id: ResponseId,
    },

    #[error("Lawyer {lawyer_id} already responded to request {request_id} ({existing_id})")]
    DuplicateResponse {
        request_id: RequestId,
        lawyer_id: ActorId,
        existing_id: ResponseId,
    },
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::ResponseNotFound(_) => ErrorKind::NotFound,
            LifecycleError::InvalidRequestState { .. } => ErrorKind::InvalidRequestState,
            LifecycleError::InvalidResponseState { .. }
            | LifecycleError::ForeignResponse { .. } => ErrorKind::InvalidResponseState,
            LifecycleError::AlreadyHasAcceptedResponse { .. } => {
                ErrorKind::AlreadyHasAcceptedResponse
            }
            LifecycleError::DuplicateResponse { .. } => ErrorKind::DuplicateResponse,
        }
    }
}

/// Accept a pending response on an open request.
///
/// Moves the response to `Accepted` and the request to `InProgress`, and asks
/// the caller to open a conversation with the lawyer. Other responses keep
/// their status.
pub fn accept_response(
    request: &Request,
    response_id: &ResponseId,
) -> Result<TransitionResult, LifecycleError> {
    ensure_request_transition(request, RequestStatus::InProgress, Operation::Accept)?;
    let response = find_response(request, response_id)?;
    ensure_response_transition(response, ResponseStatus::Accepted, Operation::Accept)?;

    if let Some(accepted) = request.responses.accepted() {
        return Err(LifecycleError::AlreadyHasAcceptedResponse {
            request_id: request.id.clone(),
            accepted_id: accepted.id.clone(),
        });
    }

    let conversation = ConversationRequest {
        request_id: request.id.clone(),
        request_title: request.title.clone(),
        client_id: request.client_id.clone(),
        lawyer_id: response.lawyer_id.clone(),
        lawyer_name: response.lawyer_name.clone(),
    };

    let responses = request
        .responses
        .with_status(response_id, ResponseStatus::Accepted);
    let next = request
        .clone()
        .with_responses(responses)
        .with_status(RequestStatus::InProgress);

    tracing::debug!(
        request_id = %request.id,
        response_id = %response_id,
        lawyer_id = %response.lawyer_id,
        "Accepted response"
    );

    Ok(TransitionResult::new(next)
        .with_effect(Effect::persist_response_status(
            response_id.clone(),
            response.status,
            ResponseStatus::Accepted,
        ))
        .with_effect(Effect::persist_request_status(
            request.id.clone(),
            request.status,
            RequestStatus::InProgress,
        ))
        .with_effect(Effect::CreateConversation(conversation)))
}

/// Reject a pending response on an open request.
///
/// The record stays in `request.responses` marked `Rejected`; the visible set
/// drops it. Rejecting twice fails with `InvalidResponseState`.
pub fn reject_response(
    request: &Request,
    response_id: &ResponseId,
) -> Result<TransitionResult, LifecycleError> {
    ensure_open(request, Operation::Reject)?;
    let response = find_response(request, response_id)?;
    ensure_response_transition(response, ResponseStatus::Rejected, Operation::Reject)?;

    let visible = request.responses.active().with_removed(response_id);
    let responses = request
        .responses
        .with_status(response_id, ResponseStatus::Rejected);
    let next = request.clone().with_responses(responses);

    tracing::debug!(
        request_id = %request.id,
        response_id = %response_id,
        remaining = next.response_count,
        "Rejected response"
    );

    Ok(TransitionResult::new(next)
        .with_visible_responses(visible)
        .with_effect(Effect::persist_response_status(
            response_id.clone(),
            response.status,
            ResponseStatus::Rejected,
        )))
}

/// Mark an in-progress request as completed
pub fn complete_request(request: &Request) -> Result<TransitionResult, LifecycleError> {
    request_status_change(request, RequestStatus::Completed, Operation::Complete)
}

/// Cancel an open or in-progress request. Responses are left as they are.
pub fn cancel_request(request: &Request) -> Result<TransitionResult, LifecycleError> {
    request_status_change(request, RequestStatus::Cancelled, Operation::Cancel)
}

/// Append a lawyer's new pending response.
///
/// A lawyer may respond again only once their previous response was rejected.
pub fn submit_response(
    request: &Request,
    response: Response,
) -> Result<TransitionResult, LifecycleError> {
    ensure_open(request, Operation::Submit)?;

    if response.request_id != request.id {
        return Err(LifecycleError::ForeignResponse {
            response_id: response.id,
            owner: response.request_id,
            request_id: request.id.clone(),
        });
    }
    if response.status != ResponseStatus::Pending {
        return Err(LifecycleError::InvalidResponseState {
            response_id: response.id,
            status: response.status,
            operation: Operation::Submit,
        });
    }

    let existing = request.responses.find(&response.id).or_else(|| {
        request
            .responses
            .find_by_actor(&response.lawyer_id)
            .filter(|r| r.is_active())
    });
    if let Some(existing) = existing {
        return Err(LifecycleError::DuplicateResponse {
            request_id: request.id.clone(),
            lawyer_id: response.lawyer_id,
            existing_id: existing.id.clone(),
        });
    }

    tracing::debug!(
        request_id = %request.id,
        response_id = %response.id,
        lawyer_id = %response.lawyer_id,
        "Submitted response"
    );

    let next = request
        .clone()
        .with_responses(request.responses.with_appended(response.clone()));
    Ok(TransitionResult::new(next).with_effect(Effect::InsertResponse(response)))
}

fn request_status_change(
    request: &Request,
    to: RequestStatus,
    operation: Operation,
) -> Result<TransitionResult, LifecycleError> {
    ensure_request_transition(request, to, operation)?;

    tracing::debug!(
        request_id = %request.id,
        from = %request.status,
        to = %to,
        "Request status changed"
    );

    let next = request.clone().with_status(to);
    Ok(TransitionResult::new(next).with_effect(Effect::persist_request_status(
        request.id.clone(),
        request.status,
        to,
    )))
}

fn ensure_open(request: &Request, operation: Operation) -> Result<(), LifecycleError> {
    if request.status == RequestStatus::Open {
        Ok(())
    } else {
        Err(invalid_request_state(request, operation))
    }
}

fn ensure_request_transition(
    request: &Request,
    to: RequestStatus,
    operation: Operation,
) -> Result<(), LifecycleError> {
    if request.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(invalid_request_state(request, operation))
    }
}

fn ensure_response_transition(
    response: &Response,
    to: ResponseStatus,
    operation: Operation,
) -> Result<(), LifecycleError> {
    if response.status.can_transition_to(to) {
        Ok(())
    } else {
        tracing::debug!(
            response_id = %response.id,
            status = %response.status,
            %operation,
            "Rejected illegal response transition"
        );
        Err(LifecycleError::InvalidResponseState {
            response_id: response.id.clone(),
            status: response.status,
            operation,
        })
    }
}

fn invalid_request_state(request: &Request, operation: Operation) -> LifecycleError {
    tracing::debug!(
        request_id = %request.id,
        status = %request.status,
        %operation,
        "Rejected operation on request"
    );
    LifecycleError::InvalidRequestState {
        request_id: request.id.clone(),
        status: request.status,
        operation,
    }
}

fn find_response<'a>(
    request: &'a Request,
    response_id: &ResponseId,
) -> Result<&'a Response, LifecycleError> {
    request
        .responses
        .find(response_id)
        .ok_or_else(|| LifecycleError::ResponseNotFound(response_id.clone()))
}

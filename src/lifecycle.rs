//! Request–response lifecycle
//!
//! Pure state transitions over a request and its responses. The engine
//! validates and applies status changes and describes the follow-up work as
//! [`Effect`]s; it never performs I/O.

mod effect;
pub mod engine;
pub mod model;
pub mod projection;
pub mod registry;
pub mod status;

#[cfg(test)]
mod proptests;

pub use effect::{ConversationRequest, Effect, StatusWrite};
pub use engine::{
    accept_response, cancel_request, complete_request, reject_response, submit_response,
    ErrorKind, LifecycleError, Operation, TransitionResult,
};
pub use model::{Actor, ActorId, Request, RequestDetails, RequestId, Response, ResponseId, Role};
#[allow(unused_imports)] // Public API re-exports
pub use projection::{
    active_response_count, has_responded_as_actor, status_category, status_label, RequestView,
    ResponseView, StatusCategory, StatusDisplay,
};
pub use registry::ResponseRegistry;
#[allow(unused_imports)] // Public API re-exports
pub use status::{
    is_legal_request_transition, is_legal_response_transition, RequestStatus, ResponseStatus,
};

//! Lifecycle runtime: fetch, transition, commit, follow up

use super::traits::{ConversationService, RequestStore, StoreError};
use crate::db::Conversation;
use crate::lifecycle::{
    self, Actor, ConversationRequest, Effect, LifecycleError, Operation, Request, RequestDetails,
    RequestId, RequestView, Response, ResponseId, Role, TransitionResult,
};
use thiserror::Error;

/// Default template for the first message of a conversation opened on acceptance
pub const DEFAULT_GREETING: &str = "Hello {lawyer}, I have accepted your response to \"{title}\".";

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Actor {actor} may not {operation} on request {request_id}")]
    Forbidden {
        actor: lifecycle::ActorId,
        operation: Operation,
        request_id: RequestId,
    },
}

/// What the caller gets back after a successful operation
#[derive(Debug, Clone)]
pub struct LifecycleOutcome {
    /// Committed snapshot
    pub request: Request,
    /// Projection for the acting viewer
    pub view: RequestView,
    /// Conversation opened by an accept, if the messaging collaborator succeeded
    pub conversation: Option<Conversation>,
}

/// Runs lifecycle operations against a store and a messaging collaborator.
///
/// Every call takes the acting identity explicitly and works on a freshly
/// fetched snapshot. Concurrent callers are not reconciled: the last commit
/// wins.
pub struct LifecycleRuntime<S, M>
where
    S: RequestStore,
    M: ConversationService,
{
    store: S,
    messenger: M,
    greeting: String,
}

impl<S, M> LifecycleRuntime<S, M>
where
    S: RequestStore,
    M: ConversationService,
{
    pub fn new(store: S, messenger: M) -> Self {
        Self {
            store,
            messenger,
            greeting: DEFAULT_GREETING.to_string(),
        }
    }

    /// Override the initial conversation message template (`{lawyer}`, `{title}`)
    #[must_use]
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Post a new open request on behalf of a client
    pub async fn post_request(
        &self,
        actor: &Actor,
        details: RequestDetails,
    ) -> Result<Request, RuntimeError> {
        let request = Request::open(RequestId::generate(), actor.id.clone(), details);
        authorize(actor, &request, Operation::Post)?;
        self.store.insert_request(&request).await?;
        tracing::info!(request_id = %request.id, client_id = %actor.id, "Request posted");
        Ok(request)
    }

    pub async fn view_request(
        &self,
        viewer: Option<&Actor>,
        request_id: &RequestId,
    ) -> Result<RequestView, RuntimeError> {
        let request = self.store.fetch_request(request_id).await?;
        Ok(RequestView::project(&request, viewer))
    }

    pub async fn submit_response(
        &self,
        actor: &Actor,
        request_id: &RequestId,
        lawyer_name: &str,
        message: &str,
    ) -> Result<LifecycleOutcome, RuntimeError> {
        let response = Response::pending(
            request_id.clone(),
            actor.id.clone(),
            lawyer_name,
            message,
        );
        self.run(actor, request_id, Operation::Submit, |request| {
            lifecycle::submit_response(request, response)
        })
        .await
    }

    pub async fn accept_response(
        &self,
        actor: &Actor,
        request_id: &RequestId,
        response_id: &ResponseId,
    ) -> Result<LifecycleOutcome, RuntimeError> {
        self.run(actor, request_id, Operation::Accept, |request| {
            lifecycle::accept_response(request, response_id)
        })
        .await
    }

    pub async fn reject_response(
        &self,
        actor: &Actor,
        request_id: &RequestId,
        response_id: &ResponseId,
    ) -> Result<LifecycleOutcome, RuntimeError> {
        self.run(actor, request_id, Operation::Reject, |request| {
            lifecycle::reject_response(request, response_id)
        })
        .await
    }

    pub async fn complete_request(
        &self,
        actor: &Actor,
        request_id: &RequestId,
    ) -> Result<LifecycleOutcome, RuntimeError> {
        self.run(
            actor,
            request_id,
            Operation::Complete,
            lifecycle::complete_request,
        )
        .await
    }

    pub async fn cancel_request(
        &self,
        actor: &Actor,
        request_id: &RequestId,
    ) -> Result<LifecycleOutcome, RuntimeError> {
        self.run(actor, request_id, Operation::Cancel, lifecycle::cancel_request)
            .await
    }

    async fn run<F>(
        &self,
        actor: &Actor,
        request_id: &RequestId,
        operation: Operation,
        transition: F,
    ) -> Result<LifecycleOutcome, RuntimeError>
    where
        F: FnOnce(&Request) -> Result<TransitionResult, LifecycleError>,
    {
        let snapshot = self.store.fetch_request(request_id).await?;
        authorize(actor, &snapshot, operation)?;

        let result = transition(&snapshot)?;
        let conversation = self.execute_effects(&result).await?;

        tracing::info!(
            request_id = %request_id,
            actor_id = %actor.id,
            %operation,
            status = %result.request.status,
            response_count = result.request.response_count,
            "Lifecycle operation committed"
        );

        let view =
            RequestView::project_visible(&result.request, &result.visible_responses, Some(actor));
        Ok(LifecycleOutcome {
            request: result.request,
            view,
            conversation,
        })
    }

    /// Persist first; only a committed accept opens a conversation
    async fn execute_effects(
        &self,
        result: &TransitionResult,
    ) -> Result<Option<Conversation>, RuntimeError> {
        for effect in &result.effects {
            if let Effect::InsertResponse(response) = effect {
                self.store.insert_response(response).await?;
            }
        }

        let writes = result.status_writes();
        if !writes.is_empty() {
            self.store.commit(&writes).await?;
        }

        match result.conversation() {
            Some(request) => Ok(self.open_conversation(request).await),
            None => Ok(None),
        }
    }

    async fn open_conversation(&self, request: &ConversationRequest) -> Option<Conversation> {
        let message = self
            .greeting
            .replace("{lawyer}", &request.lawyer_name)
            .replace("{title}", &request.request_title);

        match self
            .messenger
            .create_conversation(&request.client_id, &request.lawyer_id, &message)
            .await
        {
            Ok(conversation) => {
                tracing::info!(
                    request_id = %request.request_id,
                    conversation_id = %conversation.id,
                    "Conversation opened"
                );
                Some(conversation)
            }
            Err(e) => {
                // The acceptance is already committed; the chat can be opened later
                tracing::error!(
                    request_id = %request.request_id,
                    lawyer_id = %request.lawyer_id,
                    error = %e,
                    "Failed to open conversation"
                );
                None
            }
        }
    }
}

/// Clients manage their own requests; lawyers only submit responses
fn authorize(actor: &Actor, request: &Request, operation: Operation) -> Result<(), RuntimeError> {
    let allowed = match operation {
        Operation::Submit => actor.role == Role::Lawyer,
        Operation::Post => actor.role == Role::Client,
        Operation::Accept | Operation::Reject | Operation::Complete | Operation::Cancel => {
            actor.role == Role::Client && actor.id == request.client_id
        }
    };
    if allowed {
        Ok(())
    } else {
        tracing::warn!(
            request_id = %request.id,
            actor_id = %actor.id,
            %operation,
            "Forbidden lifecycle operation"
        );
        Err(RuntimeError::Forbidden {
            actor: actor.id.clone(),
            operation,
            request_id: request.id.clone(),
        })
    }
}

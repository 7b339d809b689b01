//! HTTP request handlers

use super::types::{
    ActionBody, ConversationListResponse, CreateRequestBody, ErrorResponse, LifecycleResponse,
    ListConversationsQuery, ListRequestsQuery, RequestListResponse, RequestResponse,
    SubmitResponseBody, ViewerQuery,
};
use super::AppState;
use crate::lifecycle::{
    Actor, ActorId, ErrorKind, RequestId, RequestStatus, RequestView, ResponseId,
};
use crate::runtime::{LifecycleOutcome, RuntimeError, StoreError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Browsing and creation
        .route("/api/requests", get(list_requests).post(create_request))
        .route("/api/requests/:id", get(get_request))
        // Lawyer submissions
        .route("/api/requests/:id/responses", post(submit_response))
        // Client decisions on a response
        .route(
            "/api/requests/:id/responses/:response_id/accept",
            post(accept_response),
        )
        .route(
            "/api/requests/:id/responses/:response_id/reject",
            post(reject_response),
        )
        // Request lifecycle
        .route("/api/requests/:id/complete", post(complete_request))
        .route("/api/requests/:id/cancel", post(cancel_request))
        // Conversations opened by acceptance
        .route("/api/conversations", get(list_conversations))
        // Version
        .route("/version", get(get_version))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================
// Requests
// ============================================================

async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<RequestListResponse>, AppError> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            RequestStatus::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {raw}")))?,
        ),
    };

    let viewer = query.viewer().actor();
    let requests = state
        .runtime
        .store()
        .inner()
        .list_requests(status)
        .map_err(|e| AppError::Runtime(StoreError::from(e).into()))?;

    Ok(Json(RequestListResponse {
        requests: requests
            .iter()
            .map(|r| RequestView::project(r, viewer.as_ref()))
            .collect(),
    }))
}

async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ViewerQuery>,
) -> Result<Json<RequestResponse>, AppError> {
    let viewer = query.actor();
    let request = state
        .runtime
        .view_request(viewer.as_ref(), &RequestId::new(id))
        .await?;
    Ok(Json(RequestResponse { request }))
}

async fn create_request(
    State(state): State<AppState>,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<RequestResponse>), AppError> {
    if body.details.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    let actor = Actor::from(body.actor);
    let request = state.runtime.post_request(&actor, body.details).await?;
    Ok((
        StatusCode::CREATED,
        Json(RequestResponse {
            request: RequestView::project(&request, Some(&actor)),
        }),
    ))
}

// ============================================================
// Responses
// ============================================================

async fn submit_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SubmitResponseBody>,
) -> Result<(StatusCode, Json<LifecycleResponse>), AppError> {
    if body.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message is required".to_string()));
    }
    let actor = Actor::from(body.actor);
    let outcome = state
        .runtime
        .submit_response(&actor, &RequestId::new(id), &body.lawyer_name, &body.message)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

async fn accept_response(
    State(state): State<AppState>,
    Path((id, response_id)): Path<(String, String)>,
    Json(body): Json<ActionBody>,
) -> Result<Json<LifecycleResponse>, AppError> {
    let outcome = state
        .runtime
        .accept_response(
            &Actor::from(body.actor),
            &RequestId::new(id),
            &ResponseId::new(response_id),
        )
        .await?;
    Ok(Json(outcome.into()))
}

async fn reject_response(
    State(state): State<AppState>,
    Path((id, response_id)): Path<(String, String)>,
    Json(body): Json<ActionBody>,
) -> Result<Json<LifecycleResponse>, AppError> {
    let outcome = state
        .runtime
        .reject_response(
            &Actor::from(body.actor),
            &RequestId::new(id),
            &ResponseId::new(response_id),
        )
        .await?;
    Ok(Json(outcome.into()))
}

async fn complete_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ActionBody>,
) -> Result<Json<LifecycleResponse>, AppError> {
    let outcome = state
        .runtime
        .complete_request(&Actor::from(body.actor), &RequestId::new(id))
        .await?;
    Ok(Json(outcome.into()))
}

async fn cancel_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ActionBody>,
) -> Result<Json<LifecycleResponse>, AppError> {
    let outcome = state
        .runtime
        .cancel_request(&Actor::from(body.actor), &RequestId::new(id))
        .await?;
    Ok(Json(outcome.into()))
}

impl From<LifecycleOutcome> for LifecycleResponse {
    fn from(outcome: LifecycleOutcome) -> Self {
        Self {
            request: outcome.view,
            conversation: outcome.conversation,
        }
    }
}

// ============================================================
// Conversations
// ============================================================

async fn list_conversations(
    State(state): State<AppState>,
    Query(query): Query<ListConversationsQuery>,
) -> Result<Json<ConversationListResponse>, AppError> {
    let conversations = state
        .runtime
        .store()
        .inner()
        .list_conversations(&ActorId::new(query.actor_id))
        .map_err(|e| AppError::Runtime(StoreError::from(e).into()))?;
    Ok(Json(ConversationListResponse { conversations }))
}

async fn get_version() -> &'static str {
    concat!("legal-match ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    Runtime(RuntimeError),
}

impl From<RuntimeError> for AppError {
    fn from(err: RuntimeError) -> Self {
        AppError::Runtime(err)
    }
}

fn classify(err: &RuntimeError) -> (StatusCode, &'static str) {
    match err {
        RuntimeError::Lifecycle(e) => match e.kind() {
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ErrorKind::InvalidRequestState | ErrorKind::InvalidResponseState => {
                (StatusCode::CONFLICT, "invalid_state")
            }
            ErrorKind::AlreadyHasAcceptedResponse => (StatusCode::CONFLICT, "already_accepted"),
            ErrorKind::DuplicateResponse => (StatusCode::CONFLICT, "duplicate_response"),
        },
        RuntimeError::Store(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
        RuntimeError::Store(StoreError::Conflict(_)) => (StatusCode::CONFLICT, "conflict"),
        RuntimeError::Store(StoreError::Backend(_) | StoreError::PartialCommit(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "storage")
        }
        RuntimeError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::Runtime(err) => {
                let (status, code) = classify(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "Request failed");
                }
                (status, code, err.to_string())
            }
        };

        (status, Json(ErrorResponse::new(message, code))).into_response()
    }
}

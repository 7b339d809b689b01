//! Property-based tests for the lifecycle engine
//!
//! These tests verify key invariants hold across generated snapshots.

use super::engine::*;
use super::model::*;
use super::projection::active_response_count;
use super::registry::ResponseRegistry;
use super::status::*;
use super::Effect;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_request_status() -> impl Strategy<Value = RequestStatus> {
    prop_oneof![
        Just(RequestStatus::Open),
        Just(RequestStatus::InProgress),
        Just(RequestStatus::Completed),
        Just(RequestStatus::Cancelled),
    ]
}

fn arb_response_status() -> impl Strategy<Value = ResponseStatus> {
    prop_oneof![
        Just(ResponseStatus::Pending),
        Just(ResponseStatus::Accepted),
        Just(ResponseStatus::Rejected),
    ]
}

fn details() -> RequestDetails {
    RequestDetails {
        title: "Employment contract review".to_string(),
        description: "Non-compete clause".to_string(),
        law_area: "Employment".to_string(),
        price_range: "200-400".to_string(),
        experience_required: "5+ years".to_string(),
    }
}

/// Response sets with unique ids and at most one accepted response
fn arb_responses(max: usize) -> impl Strategy<Value = Vec<Response>> {
    proptest::collection::vec(arb_response_status(), 0..max).prop_map(|statuses| {
        let mut seen_accepted = false;
        statuses
            .into_iter()
            .enumerate()
            .map(|(i, status)| {
                let status = if status == ResponseStatus::Accepted && seen_accepted {
                    ResponseStatus::Pending
                } else {
                    seen_accepted |= status == ResponseStatus::Accepted;
                    status
                };
                Response {
                    id: ResponseId::new(format!("resp-{i}")),
                    status,
                    ..Response::pending(
                        RequestId::new("req"),
                        ActorId::new(format!("lawyer-{i}")),
                        format!("Lawyer {i}"),
                        "offer",
                    )
                }
            })
            .collect()
    })
}

fn arb_request() -> impl Strategy<Value = Request> {
    (arb_request_status(), arb_responses(6)).prop_map(|(status, responses)| {
        Request::open(RequestId::new("req"), ActorId::new("client"), details())
            .with_status(status)
            .with_responses(ResponseRegistry::new(responses))
    })
}

/// Open request with only pending responses, at least one
fn arb_open_pending_request() -> impl Strategy<Value = Request> {
    (1usize..6).prop_map(|n| {
        let responses = (0..n)
            .map(|i| Response {
                id: ResponseId::new(format!("resp-{i}")),
                ..Response::pending(
                    RequestId::new("req"),
                    ActorId::new(format!("lawyer-{i}")),
                    format!("Lawyer {i}"),
                    "offer",
                )
            })
            .collect();
        Request::open(RequestId::new("req"), ActorId::new("client"), details())
            .with_responses(ResponseRegistry::new(responses))
    })
}

fn ids(request: &Request) -> Vec<ResponseId> {
    request.responses.iter().map(|r| r.id.clone()).collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_accept_changes_only_target(request in arb_open_pending_request(), pick in any::<prop::sample::Index>()) {
        let target = pick.get(&ids(&request)).clone();
        let result = accept_response(&request, &target).unwrap();

        prop_assert_eq!(result.request.status, RequestStatus::InProgress);
        for (before, after) in request.responses.iter().zip(result.request.responses.iter()) {
            prop_assert_eq!(&before.id, &after.id);
            if before.id == target {
                prop_assert_eq!(after.status, ResponseStatus::Accepted);
            } else {
                prop_assert_eq!(after.status, before.status);
            }
        }
        prop_assert!(result.conversation().is_some());
    }

    #[test]
    fn prop_second_accept_fails(request in arb_open_pending_request(), a in any::<prop::sample::Index>(), b in any::<prop::sample::Index>()) {
        let all = ids(&request);
        let first = accept_response(&request, a.get(&all)).unwrap();
        let err = accept_response(&first.request, b.get(&all)).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidRequestState);
    }

    #[test]
    fn prop_reject_decrements_active_count(request in arb_open_pending_request(), pick in any::<prop::sample::Index>()) {
        let target = pick.get(&ids(&request)).clone();
        let before = active_response_count(&request.responses);
        let result = reject_response(&request, &target).unwrap();

        prop_assert_eq!(active_response_count(&result.request.responses), before - 1);
        prop_assert_eq!(result.request.response_count, before - 1);
        prop_assert_eq!(result.request.status, request.status);
        prop_assert_eq!(result.request.responses.len(), request.responses.len());
        prop_assert!(result.visible_responses.find(&target).is_none());

        let again = reject_response(&result.request, &target).unwrap_err();
        prop_assert_eq!(again.kind(), ErrorKind::InvalidResponseState);
    }

    #[test]
    fn prop_at_most_one_accepted(request in arb_request(), picks in proptest::collection::vec(any::<prop::sample::Index>(), 0..8)) {
        let all = ids(&request);
        let mut current = request;
        for pick in picks {
            if all.is_empty() {
                break;
            }
            if let Ok(result) = accept_response(&current, pick.get(&all)) {
                current = result.request;
            }
        }
        let accepted = current
            .responses
            .iter()
            .filter(|r| r.status == ResponseStatus::Accepted)
            .count();
        prop_assert!(accepted <= 1);
    }

    #[test]
    fn prop_failures_leave_input_untouched(request in arb_request(), pick in any::<prop::sample::Index>(), accept in any::<bool>()) {
        let all = ids(&request);
        let target = if all.is_empty() {
            ResponseId::new("missing")
        } else {
            pick.get(&all).clone()
        };
        let snapshot = request.clone();
        let result = if accept {
            accept_response(&request, &target)
        } else {
            reject_response(&request, &target)
        };
        prop_assert_eq!(&request, &snapshot);

        if let Ok(result) = result {
            // Every status write follows the transition tables
            for effect in &result.effects {
                if let Effect::PersistStatus(write) = effect {
                    match write {
                        super::StatusWrite::Request { from, to, .. } => {
                            prop_assert!(is_legal_request_transition(*from, *to));
                        }
                        super::StatusWrite::Response { from, to, .. } => {
                            prop_assert!(is_legal_response_transition(*from, *to));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn prop_response_count_tracks_active(request in arb_request()) {
        prop_assert_eq!(request.response_count, request.responses.active_responses().len());
    }

    #[test]
    fn prop_accept_requires_open(request in arb_request(), pick in any::<prop::sample::Index>()) {
        prop_assume!(request.status != RequestStatus::Open);
        prop_assume!(!request.responses.is_empty());
        let target = pick.get(&ids(&request)).clone();
        let err = accept_response(&request, &target).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidRequestState);
    }
}

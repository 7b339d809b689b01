//! Ordered response set belonging to one request
//!
//! Queries borrow; every update returns a new registry. Callers swap their
//! reference to the returned value and treat the old one as superseded.

use super::model::{ActorId, Response, ResponseId};
use super::status::ResponseStatus;
use serde::{Deserialize, Serialize};

/// Responses in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseRegistry {
    responses: Vec<Response>,
}

impl ResponseRegistry {
    #[cfg(test)]
    pub fn new(responses: Vec<Response>) -> Self {
        Self { responses }
    }

    pub fn find(&self, response_id: &ResponseId) -> Option<&Response> {
        self.responses.iter().find(|r| &r.id == response_id)
    }

    /// The lawyer's active response, falling back to their latest one
    pub fn find_by_actor(&self, lawyer_id: &ActorId) -> Option<&Response> {
        let mut latest = None;
        for response in self.responses.iter().filter(|r| &r.lawyer_id == lawyer_id) {
            if response.is_active() {
                return Some(response);
            }
            latest = Some(response);
        }
        latest
    }

    pub fn active_responses(&self) -> Vec<&Response> {
        self.responses.iter().filter(|r| r.is_active()).collect()
    }

    pub fn active_count(&self) -> usize {
        self.active_responses().len()
    }

    pub fn accepted(&self) -> Option<&Response> {
        self.responses
            .iter()
            .find(|r| r.status == ResponseStatus::Accepted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Response> {
        self.responses.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Registry without the given response
    #[must_use]
    pub fn with_removed(&self, response_id: &ResponseId) -> Self {
        Self {
            responses: self
                .responses
                .iter()
                .filter(|r| &r.id != response_id)
                .cloned()
                .collect(),
        }
    }

    /// Registry with one response's status replaced; unknown ids leave it unchanged
    #[must_use]
    pub fn with_status(&self, response_id: &ResponseId, status: ResponseStatus) -> Self {
        Self {
            responses: self
                .responses
                .iter()
                .map(|r| {
                    if &r.id == response_id {
                        Response {
                            status,
                            ..r.clone()
                        }
                    } else {
                        r.clone()
                    }
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn with_appended(&self, response: Response) -> Self {
        let mut responses = self.responses.clone();
        responses.push(response);
        Self { responses }
    }

    /// Registry holding only the active responses
    #[must_use]
    pub fn active(&self) -> Self {
        self.active_responses().into_iter().cloned().collect()
    }
}

impl<'a> IntoIterator for &'a ResponseRegistry {
    type Item = &'a Response;
    type IntoIter = std::slice::Iter<'a, Response>;

    fn into_iter(self) -> Self::IntoIter {
        self.responses.iter()
    }
}

impl FromIterator<Response> for ResponseRegistry {
    fn from_iter<I: IntoIterator<Item = Response>>(iter: I) -> Self {
        Self {
            responses: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::model::RequestId;

    fn response(id: &str, lawyer: &str, status: ResponseStatus) -> Response {
        Response {
            status,
            id: ResponseId::new(id),
            ..Response::pending(RequestId::new("req-1"), ActorId::new(lawyer), lawyer, "hi")
        }
    }

    fn sample() -> ResponseRegistry {
        ResponseRegistry::new(vec![
            response("r1", "alice", ResponseStatus::Rejected),
            response("r2", "bob", ResponseStatus::Pending),
            response("r3", "alice", ResponseStatus::Pending),
            response("r4", "carol", ResponseStatus::Accepted),
        ])
    }

    #[test]
    fn test_find() {
        let registry = sample();
        assert_eq!(registry.find(&ResponseId::new("r2")).unwrap().lawyer_id.as_str(), "bob");
        assert!(registry.find(&ResponseId::new("missing")).is_none());
    }

    #[test]
    fn test_find_by_actor_prefers_active_response() {
        let registry = sample();
        let found = registry.find_by_actor(&ActorId::new("alice")).unwrap();
        assert_eq!(found.id.as_str(), "r3");
        assert!(registry.find_by_actor(&ActorId::new("dave")).is_none());
    }

    #[test]
    fn test_find_by_actor_falls_back_to_latest_rejected() {
        let registry = ResponseRegistry::new(vec![
            response("r1", "alice", ResponseStatus::Rejected),
            response("r2", "alice", ResponseStatus::Rejected),
        ]);
        let found = registry.find_by_actor(&ActorId::new("alice")).unwrap();
        assert_eq!(found.id.as_str(), "r2");
    }

    #[test]
    fn test_active_responses_keep_arrival_order() {
        let registry = sample();
        let ids: Vec<_> = registry.active_responses().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r3", "r4"]);
        assert_eq!(registry.active_count(), 3);
        assert_eq!(registry.active().len(), 3);
    }

    #[test]
    fn test_with_removed_leaves_original_untouched() {
        let registry = sample();
        let pruned = registry.with_removed(&ResponseId::new("r2"));
        assert_eq!(pruned.len(), 3);
        assert!(pruned.find(&ResponseId::new("r2")).is_none());
        assert_eq!(registry.len(), 4);
        assert!(registry.find(&ResponseId::new("r2")).is_some());
    }

    #[test]
    fn test_with_status() {
        let registry = sample();
        let updated = registry.with_status(&ResponseId::new("r2"), ResponseStatus::Rejected);
        assert_eq!(
            updated.find(&ResponseId::new("r2")).unwrap().status,
            ResponseStatus::Rejected
        );
        assert_eq!(
            registry.find(&ResponseId::new("r2")).unwrap().status,
            ResponseStatus::Pending
        );
        assert_eq!(updated.active_count(), 2);
    }

    #[test]
    fn test_accepted() {
        assert_eq!(sample().accepted().unwrap().id.as_str(), "r4");
        assert!(ResponseRegistry::default().accepted().is_none());
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let registry = ResponseRegistry::new(vec![response("r1", "bob", ResponseStatus::Pending)]);
        let value = serde_json::to_value(&registry).unwrap();
        assert!(value.is_array());
        let back: ResponseRegistry = serde_json::from_value(value).unwrap();
        assert_eq!(back, registry);
    }
}

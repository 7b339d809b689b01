//! Request and response statuses with their legal transition tables

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a client's request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
}

/// Status of a lawyer's response to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        RequestStatus::Open,
        RequestStatus::InProgress,
        RequestStatus::Completed,
        RequestStatus::Cancelled,
    ];

    /// Storage / wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    pub fn can_transition_to(self, to: RequestStatus) -> bool {
        is_legal_request_transition(self, to)
    }
}

impl ResponseStatus {
    pub const ALL: [ResponseStatus; 3] = [
        ResponseStatus::Pending,
        ResponseStatus::Accepted,
        ResponseStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResponseStatus::Pending => "pending",
            ResponseStatus::Accepted => "accepted",
            ResponseStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Active responses count toward the request and block the lawyer from responding again
    pub fn is_active(self) -> bool {
        matches!(self, ResponseStatus::Pending | ResponseStatus::Accepted)
    }

    pub fn can_transition_to(self, to: ResponseStatus) -> bool {
        is_legal_response_transition(self, to)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legal request transitions:
///
/// ```text
/// Open ──> InProgress ──> Completed
///   │          │
///   └──────────┴──> Cancelled
/// ```
pub fn is_legal_request_transition(from: RequestStatus, to: RequestStatus) -> bool {
    use RequestStatus::{Cancelled, Completed, InProgress, Open};
    matches!(
        (from, to),
        (Open, InProgress) | (InProgress, Completed) | (Open | InProgress, Cancelled)
    )
}

/// Legal response transitions: `Pending -> Accepted` and `Pending -> Rejected`
pub fn is_legal_response_transition(from: ResponseStatus, to: ResponseStatus) -> bool {
    use ResponseStatus::{Accepted, Pending, Rejected};
    matches!((from, to), (Pending, Accepted | Rejected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_transition_table() {
        let legal: Vec<_> = RequestStatus::ALL
            .iter()
            .flat_map(|from| RequestStatus::ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| is_legal_request_transition(*from, *to))
            .collect();

        assert_eq!(
            legal,
            vec![
                (RequestStatus::Open, RequestStatus::InProgress),
                (RequestStatus::Open, RequestStatus::Cancelled),
                (RequestStatus::InProgress, RequestStatus::Completed),
                (RequestStatus::InProgress, RequestStatus::Cancelled),
            ]
        );
    }

    #[test]
    fn test_response_transition_table() {
        for from in ResponseStatus::ALL {
            for to in ResponseStatus::ALL {
                let expected = from == ResponseStatus::Pending && to != ResponseStatus::Pending;
                assert_eq!(is_legal_response_transition(from, to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in [RequestStatus::Completed, RequestStatus::Cancelled] {
            assert!(RequestStatus::ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
        for from in [ResponseStatus::Accepted, ResponseStatus::Rejected] {
            assert!(ResponseStatus::ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn test_self_transitions_are_illegal() {
        assert!(!is_legal_request_transition(RequestStatus::Open, RequestStatus::Open));
        assert!(!is_legal_response_transition(ResponseStatus::Pending, ResponseStatus::Pending));
    }

    #[test]
    fn test_parse_matches_serde_names() {
        for status in RequestStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        for status in ResponseStatus::ALL {
            assert_eq!(ResponseStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::parse("archived"), None);
    }
}

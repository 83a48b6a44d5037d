#![forbid(unsafe_code)]

//! Completion and signature-help requests.
//!
//! A request lives in the notebook state while it is pending. The state
//! holds the [`Resolver`]; whoever asked holds the matching [`Deferred`].

use nbstate_core::deferred::{Deferred, Resolver, deferred};
use serde::{Deserialize, Serialize};

use crate::cell::CellId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionCandidate {
    pub name: String,
    #[serde(default)]
    pub type_params: Vec<String>,
    pub result_type: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionHint {
    pub cell: CellId,
    pub offset: usize,
    pub completions: Vec<CompletionCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterHint {
    pub name: String,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    pub parameters: Vec<ParameterHint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signatures {
    pub hints: Vec<SignatureInfo>,
    pub active_signature: usize,
    pub active_parameter: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHint {
    pub cell: CellId,
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Signatures>,
}

/// A pending completion request. Compares by identity of its resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub cell: CellId,
    pub offset: usize,
    pub resolver: Resolver<CompletionHint>,
}

impl CompletionRequest {
    /// A new request and the deferred its answer arrives on.
    pub fn new(cell: CellId, offset: usize) -> (Self, Deferred<CompletionHint>) {
        let (resolver, pending) = deferred();
        (
            Self {
                cell,
                offset,
                resolver,
            },
            pending,
        )
    }
}

/// A pending signature-help request. Compares by identity of its resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRequest {
    pub cell: CellId,
    pub offset: usize,
    pub resolver: Resolver<SignatureHint>,
}

impl SignatureRequest {
    /// A new request and the deferred its answer arrives on.
    pub fn new(cell: CellId, offset: usize) -> (Self, Deferred<SignatureHint>) {
        let (resolver, pending) = deferred();
        (
            Self {
                cell,
                offset,
                resolver,
            },
            pending,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn requests_compare_by_identity() {
        let (a, _pa) = CompletionRequest::new(1, 4);
        let (b, _pb) = CompletionRequest::new(1, 4);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn resolving_a_request_settles_its_deferred() {
        let (req, pending) = SignatureRequest::new(3, 0);
        let hint = SignatureHint {
            cell: 3,
            offset: 0,
            signatures: None,
        };
        assert!(req.resolver.resolve(hint.clone()));
        assert_eq!(block_on(pending), Ok(hint));
    }
}

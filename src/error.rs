use crate::source::{SourceGraph, TensorId};
use thiserror::Error;

/// Failure reported by a target backend.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message}")]
pub struct BackendError {
    message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScopeError {
    #[error("tensor {tensor} has not been legalized yet")]
    Unresolved { tensor: TensorId },
    #[error("tensor {tensor} is already registered in scope")]
    Duplicate { tensor: TensorId },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LegalizeError {
    /// An input was never legalized upstream; the caller visited ops out of topological order.
    #[error("op '{op}': input tensor '{tensor}' is not in scope")]
    UnresolvedTensor { op: String, tensor: String },
    #[error("op '{op}': backend cannot represent output tensor '{tensor}': {source}")]
    OutputLegalization {
        op: String,
        tensor: String,
        #[source]
        source: BackendError,
    },
    #[error("op '{op}': tensor '{tensor}' is already registered in scope")]
    DuplicateRegistration { op: String, tensor: String },
    #[error("op '{op}': backend rejected node: {source}")]
    BackendNodeSubmission {
        op: String,
        #[source]
        source: BackendError,
    },
    /// The session already failed on `failed_op` and must be discarded.
    #[error("op '{op}': session already failed at op '{failed_op}'")]
    SessionFailed { op: String, failed_op: String },
}

impl LegalizeError {
    pub(crate) fn from_scope(graph: &SourceGraph, op: &str, err: ScopeError) -> Self {
        match err {
            ScopeError::Unresolved { tensor } => LegalizeError::UnresolvedTensor {
                op: op.to_string(),
                tensor: graph.describe_tensor(tensor),
            },
            ScopeError::Duplicate { tensor } => LegalizeError::DuplicateRegistration {
                op: op.to_string(),
                tensor: graph.describe_tensor(tensor),
            },
        }
    }

    pub fn op(&self) -> &str {
        match self {
            LegalizeError::UnresolvedTensor { op, .. }
            | LegalizeError::OutputLegalization { op, .. }
            | LegalizeError::DuplicateRegistration { op, .. }
            | LegalizeError::BackendNodeSubmission { op, .. }
            | LegalizeError::SessionFailed { op, .. } => op,
        }
    }

    /// Offending tensor, when the failure is tied to one.
    pub fn tensor(&self) -> Option<&str> {
        match self {
            LegalizeError::UnresolvedTensor { tensor, .. }
            | LegalizeError::OutputLegalization { tensor, .. }
            | LegalizeError::DuplicateRegistration { tensor, .. } => Some(tensor),
            LegalizeError::BackendNodeSubmission { .. } | LegalizeError::SessionFailed { .. } => None,
        }
    }
}

pub type LegalizeResult<T> = Result<T, LegalizeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{DataType, Shape, TensorType};

    #[test]
    fn scope_errors_pick_up_op_identity() {
        let mut graph = SourceGraph::new();
        let missing = graph.add_tensor("t_missing", TensorType { shape: Shape::default(), dtype: DataType::F32 });
        let err = LegalizeError::from_scope(&graph, "add_0", ScopeError::Unresolved { tensor: missing });
        assert_eq!(err.op(), "add_0");
        assert_eq!(err.tensor(), Some("t_missing"));
        assert_eq!(err.to_string(), "op 'add_0': input tensor 't_missing' is not in scope");
    }

    #[test]
    fn submission_errors_keep_backend_message() {
        let err = LegalizeError::BackendNodeSubmission {
            op: "fc".into(),
            source: BackendError::new("op type not supported"),
        };
        assert_eq!(err.tensor(), None);
        assert!(err.to_string().ends_with("op type not supported"));
    }
}

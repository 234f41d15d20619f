//! Operator legalization for the Sion graph compiler: rewrites source-graph
//! ops one at a time into nodes of an incrementally built backend graph.

pub mod config;
pub mod core;
pub mod dump;
pub mod error;
pub mod legalize;
pub mod logging;
pub mod pipeline;
pub mod scope;
pub mod session;
pub mod source;
pub mod stages;
pub mod target;

pub use config::{CommitMode, SessionConfig};
pub use error::{BackendError, LegalizeError, LegalizeResult, ScopeError};
pub use legalize::legalize_simple_op;
pub use logging::{BufferLogger, Logger, Severity, StderrLogger};
pub use scope::ScopeTable;
pub use session::{legalize_partitions, LegalizeSession};
pub use source::{OpId, SourceGraph, SourceOp, SourceTensor, TensorId};
pub use target::{TargetGraphBuilder, TargetNodeDescriptor, TargetTensorHandle, TensorKind};

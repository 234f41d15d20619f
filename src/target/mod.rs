//! Target backend boundary: tensor handles, node descriptors and the
//! builder the legalizer submits them to.

pub mod memory;

use crate::core::op::ParamValue;
use crate::core::types::DataType;
use crate::error::BackendError;
use crate::source::{SourceTensor, TensorId};
use serde::Serialize;

/// Op package stamped on nodes by builders that do not name their own.
pub const DEFAULT_PACKAGE: &str = "sion.core";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TensorKind {
    /// Written by the application before execution.
    AppInput,
    /// Read back by the application after execution.
    AppOutput,
    /// Intermediate value internal to the target graph.
    Native,
    /// Constant data baked into the target graph.
    Static,
}

/// Backend descriptor for a tensor in the target graph. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TargetTensorHandle {
    pub id: u32,
    pub name: String,
    pub dtype: DataType,
    pub dims: Vec<u32>,
    pub kind: TensorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetNodeDescriptor {
    pub name: String,
    pub package: String,
    pub op_type: String,
    pub params: Vec<(String, ParamValue)>,
    pub inputs: Vec<TargetTensorHandle>,
    pub outputs: Vec<TargetTensorHandle>,
}

/// Mutable, incrementally built backend graph. Node addition is one-shot:
/// a committed node cannot be retracted.
pub trait TargetGraphBuilder {
    /// Op package written into every node descriptor this builder receives.
    fn package(&self) -> &str {
        DEFAULT_PACKAGE
    }

    /// Allocates a tensor with no producer: `AppInput` for graph inputs, `Static` for constants.
    fn legalize_input(&mut self, id: TensorId, tensor: &SourceTensor, kind: TensorKind) -> Result<TargetTensorHandle, BackendError>;

    /// Translates an op output into a fresh target tensor: `AppOutput` for graph outputs, `Native` otherwise.
    fn legalize_output(&mut self, id: TensorId, tensor: &SourceTensor, kind: TensorKind) -> Result<TargetTensorHandle, BackendError>;

    fn add_node(&mut self, node: TargetNodeDescriptor) -> Result<(), BackendError>;
}

impl<B: TargetGraphBuilder + ?Sized> TargetGraphBuilder for &mut B {
    fn package(&self) -> &str {
        (**self).package()
    }

    fn legalize_input(&mut self, id: TensorId, tensor: &SourceTensor, kind: TensorKind) -> Result<TargetTensorHandle, BackendError> {
        (**self).legalize_input(id, tensor, kind)
    }

    fn legalize_output(&mut self, id: TensorId, tensor: &SourceTensor, kind: TensorKind) -> Result<TargetTensorHandle, BackendError> {
        (**self).legalize_output(id, tensor, kind)
    }

    fn add_node(&mut self, node: TargetNodeDescriptor) -> Result<(), BackendError> {
        (**self).add_node(node)
    }
}

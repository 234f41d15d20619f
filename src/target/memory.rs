use crate::core::types::{DataType, Dim};
use crate::error::BackendError;
use crate::source::{SourceTensor, TensorId};
use crate::target::{TargetGraphBuilder, TargetNodeDescriptor, TargetTensorHandle, TensorKind, DEFAULT_PACKAGE};
use serde::Serialize;
use std::collections::HashSet;

/// Reference backend that keeps the committed graph in memory.
#[derive(Debug, Clone)]
pub struct InMemoryGraph {
    name: String,
    package: String,
    next_id: u32,
    tensors: Vec<TargetTensorHandle>,
    nodes: Vec<TargetNodeDescriptor>,
    unsupported_dtypes: HashSet<DataType>,
    rejected_ops: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSnapshot {
    pub name: String,
    pub tensors: Vec<TargetTensorHandle>,
    pub nodes: Vec<TargetNodeDescriptor>,
}

impl InMemoryGraph {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            package: DEFAULT_PACKAGE.to_string(),
            next_id: 0,
            tensors: Vec::new(),
            nodes: Vec::new(),
            unsupported_dtypes: HashSet::new(),
            rejected_ops: HashSet::new(),
        }
    }

    pub fn with_package(mut self, package: &str) -> Self {
        self.package = package.to_string();
        self
    }

    pub fn with_unsupported_dtype(mut self, dtype: DataType) -> Self {
        self.unsupported_dtypes.insert(dtype);
        self
    }

    pub fn with_rejected_op(mut self, op_type: &str) -> Self {
        self.rejected_ops.insert(op_type.to_string());
        self
    }

    pub fn nodes(&self) -> &[TargetNodeDescriptor] {
        &self.nodes
    }

    pub fn tensors(&self) -> &[TargetTensorHandle] {
        &self.tensors
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            name: self.name.clone(),
            tensors: self.tensors.clone(),
            nodes: self.nodes.clone(),
        }
    }

    fn allocate(&mut self, tensor: &SourceTensor, kind: TensorKind) -> Result<TargetTensorHandle, BackendError> {
        let ty = &tensor.ty;
        if self.unsupported_dtypes.contains(&ty.dtype) {
            return Err(BackendError::new(format!("dtype {} is not supported", ty.dtype)));
        }
        let dims = ty.shape.dims.iter()
            .map(|d| match d {
                Dim::Static(v) => u32::try_from(*v)
                    .map_err(|_| BackendError::new(format!("dimension {} does not fit in u32", v))),
                Dim::Symbol(s) => Err(BackendError::new(format!("symbolic dimension '{}' is not supported", s))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let handle = TargetTensorHandle {
            id: self.next_id,
            name: tensor.name.clone(),
            dtype: ty.dtype,
            dims,
            kind,
        };
        self.next_id += 1;
        self.tensors.push(handle.clone());
        Ok(handle)
    }
}

impl TargetGraphBuilder for InMemoryGraph {
    fn package(&self) -> &str {
        &self.package
    }

    fn legalize_input(&mut self, _id: TensorId, tensor: &SourceTensor, kind: TensorKind) -> Result<TargetTensorHandle, BackendError> {
        self.allocate(tensor, kind)
    }

    fn legalize_output(&mut self, _id: TensorId, tensor: &SourceTensor, kind: TensorKind) -> Result<TargetTensorHandle, BackendError> {
        self.allocate(tensor, kind)
    }

    fn add_node(&mut self, node: TargetNodeDescriptor) -> Result<(), BackendError> {
        if self.rejected_ops.contains(&node.op_type) {
            return Err(BackendError::new(format!("op type {} is not supported", node.op_type)));
        }
        for handle in node.inputs.iter().chain(&node.outputs) {
            if !self.tensors.iter().any(|t| t.id == handle.id) {
                return Err(BackendError::new(format!("node '{}' references unknown tensor {}", node.name, handle.id)));
            }
        }
        self.nodes.push(node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Shape, TensorType};

    fn tensor(name: &str, dtype: DataType, shape: Shape) -> SourceTensor {
        SourceTensor { name: name.to_string(), ty: TensorType { shape, dtype } }
    }

    #[test]
    fn allocates_sequential_handles() {
        let mut g = InMemoryGraph::new("g");
        let a = g.legalize_input(TensorId(0), &tensor("a", DataType::F32, Shape::from_static(&[2, 3])), TensorKind::AppInput).unwrap();
        let b = g.legalize_output(TensorId(1), &tensor("b", DataType::F32, Shape::from_static(&[6])), TensorKind::Native).unwrap();
        assert_eq!((a.id, a.kind), (0, TensorKind::AppInput));
        assert_eq!((b.id, b.kind), (1, TensorKind::Native));
        assert_eq!(a.dims, vec![2, 3]);
    }

    #[test]
    fn symbolic_and_unsupported_tensors_fail() {
        let mut g = InMemoryGraph::new("g").with_unsupported_dtype(DataType::I64);
        let dynamic = Shape::new(vec![Dim::Symbol("N".into())]);
        assert!(g.legalize_output(TensorId(0), &tensor("x", DataType::F32, dynamic), TensorKind::Native).is_err());
        assert!(g.legalize_output(TensorId(1), &tensor("y", DataType::I64, Shape::default()), TensorKind::AppOutput).is_err());
        assert!(g.tensors().is_empty());
    }

    #[test]
    fn nodes_with_unknown_tensors_are_rejected() {
        let mut g = InMemoryGraph::new("g");
        let stray = TargetTensorHandle {
            id: 42,
            name: "stray".into(),
            dtype: DataType::F32,
            dims: vec![],
            kind: TensorKind::Native,
        };
        let node = TargetNodeDescriptor {
            name: "n".into(),
            package: DEFAULT_PACKAGE.into(),
            op_type: "Relu".into(),
            params: vec![],
            inputs: vec![stray],
            outputs: vec![],
        };
        assert!(g.add_node(node).is_err());
        assert!(g.nodes().is_empty());
    }
}

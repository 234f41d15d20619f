//! Source computation graph as seen by the legalizer: tensors addressed by
//! identity and ops that reference them in declared order.

pub mod json;

use crate::core::op::OpKind;
use crate::core::types::TensorType;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Identity of a tensor within one source graph. Two tensors with identical
/// metadata are still distinct refs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TensorId(pub usize);

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OpId(pub usize);

#[derive(Debug, Clone)]
pub struct SourceTensor {
    pub name: String,
    pub ty: TensorType,
}

#[derive(Debug, Clone)]
pub struct SourceOp {
    pub name: String,
    pub kind: OpKind,
    pub inputs: Vec<TensorId>,
    pub outputs: Vec<TensorId>,
}

#[derive(Debug, Clone, Default)]
pub struct SourceGraph {
    tensors: Vec<SourceTensor>,
    ops: Vec<SourceOp>,
    pub inputs: Vec<TensorId>,
    pub outputs: Vec<TensorId>,
    /// Tensors with no producer whose data is baked into the target graph.
    pub constants: Vec<TensorId>,
}

impl SourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tensor(&mut self, name: &str, ty: TensorType) -> TensorId {
        self.tensors.push(SourceTensor { name: name.to_string(), ty });
        TensorId(self.tensors.len() - 1)
    }

    pub fn add_op(&mut self, name: &str, kind: OpKind, inputs: Vec<TensorId>, outputs: Vec<TensorId>) -> OpId {
        self.ops.push(SourceOp { name: name.to_string(), kind, inputs, outputs });
        OpId(self.ops.len() - 1)
    }

    /// `None` for a ref that does not belong to this graph.
    pub fn tensor(&self, id: TensorId) -> Option<&SourceTensor> {
        self.tensors.get(id.0)
    }

    pub fn tensor_name(&self, id: TensorId) -> Option<&str> {
        self.tensors.get(id.0).map(|t| t.name.as_str())
    }

    /// Name for diagnostics; falls back to the raw ref for foreign tensors.
    pub fn describe_tensor(&self, id: TensorId) -> String {
        match self.tensor_name(id) {
            Some(name) => name.to_string(),
            None => id.to_string(),
        }
    }

    pub fn is_graph_output(&self, id: TensorId) -> bool {
        self.outputs.contains(&id)
    }

    pub fn op(&self, id: OpId) -> &SourceOp {
        &self.ops[id.0]
    }

    pub fn ops(&self) -> impl Iterator<Item = (OpId, &SourceOp)> {
        self.ops.iter().enumerate().map(|(i, op)| (OpId(i), op))
    }

    pub fn num_tensors(&self) -> usize {
        self.tensors.len()
    }

    pub fn op_ins<'a>(&self, op: &'a SourceOp) -> &'a [TensorId] {
        &op.inputs
    }

    pub fn op_outs<'a>(&self, op: &'a SourceOp) -> &'a [TensorId] {
        &op.outputs
    }

    /// Producers-first op order. Tensors without a producer (graph inputs,
    /// constants bound by the caller) impose no edge.
    pub fn topological_order(&self) -> anyhow::Result<Vec<OpId>> {
        let mut graph: DiGraph<OpId, TensorId> = DiGraph::new();
        let nodes: Vec<NodeIndex> = self.ops().map(|(id, _)| graph.add_node(id)).collect();

        let mut producers: HashMap<TensorId, NodeIndex> = HashMap::new();
        for (id, op) in self.ops() {
            for &out in &op.outputs {
                if producers.insert(out, nodes[id.0]).is_some() {
                    return Err(anyhow::anyhow!("Tensor '{}' has more than one producer", self.describe_tensor(out)));
                }
            }
        }

        for (id, op) in self.ops() {
            for &input in &op.inputs {
                if let Some(&src) = producers.get(&input) {
                    graph.add_edge(src, nodes[id.0], input);
                }
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            let op = graph[cycle.node_id()];
            anyhow::anyhow!("Cycle detected in source graph at op '{}'", self.op(op).name)
        })?;
        Ok(order.into_iter().map(|idx| graph[idx]).collect())
    }
}

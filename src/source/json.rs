use crate::core::op::OpKind;
use crate::core::types::{DataType, Shape, TensorType};
use crate::source::{SourceGraph, TensorId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JsonTensor {
    pub name: String,
    pub dtype: DataType,
    #[serde(default)]
    pub shape: Shape,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JsonOp {
    pub name: String,
    pub op: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JsonGraph {
    pub tensors: Vec<JsonTensor>,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub constants: Vec<String>,
    pub ops: Vec<JsonOp>,
}

impl JsonGraph {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_source_graph(self) -> anyhow::Result<SourceGraph> {
        let mut graph = SourceGraph::new();
        let mut by_name: HashMap<String, TensorId> = HashMap::new();

        for t in self.tensors {
            if by_name.contains_key(&t.name) {
                return Err(anyhow::anyhow!("Duplicate tensor name: {}", t.name));
            }
            let id = graph.add_tensor(&t.name, TensorType { shape: t.shape, dtype: t.dtype });
            by_name.insert(t.name, id);
        }

        let resolve = |name: &String| -> anyhow::Result<TensorId> {
            by_name.get(name).copied().ok_or_else(|| anyhow::anyhow!("Unknown tensor: {}", name))
        };

        graph.inputs = self.inputs.iter().map(resolve).collect::<anyhow::Result<_>>()?;
        graph.outputs = self.outputs.iter().map(resolve).collect::<anyhow::Result<_>>()?;
        graph.constants = self.constants.iter().map(resolve).collect::<anyhow::Result<_>>()?;

        let mut produced = HashSet::new();
        for op_def in &self.ops {
            let kind = OpKind::from_json(&op_def.op, &op_def.params)
                .map_err(|e| anyhow::anyhow!("Op '{}': {}", op_def.name, e))?;
            let inputs = op_def.inputs.iter().map(resolve).collect::<anyhow::Result<Vec<_>>>()?;
            let outputs = op_def.outputs.iter().map(resolve).collect::<anyhow::Result<Vec<_>>>()?;
            for out in &outputs {
                if !produced.insert(*out) {
                    return Err(anyhow::anyhow!("Tensor '{}' has more than one producer", graph.describe_tensor(*out)));
                }
            }
            graph.add_op(&op_def.name, kind, inputs, outputs);
        }

        Ok(graph)
    }
}

pub fn load_source_graph(path: &Path) -> anyhow::Result<SourceGraph> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    JsonGraph::from_json(&content)?.into_source_graph()
}

use crate::logging::{Logger, Severity};
use crate::source::{SourceGraph, SourceOp, TensorId};
use tera::{Context, Tera};

const OP_TEMPLATE: &str = "\
op {{ name }} <{{ kind }}>
  inputs:
{% for t in inputs %}    {{ t.id }} {{ t.name }}: {{ t.ty }}
{% endfor %}  outputs:
{% for t in outputs %}    {{ t.id }} {{ t.name }}: {{ t.ty }}
{% endfor %}";

const OPTIONS_TEMPLATE: &str = "\
  options:{% if params | length == 0 %} none{% endif %}
{% for p in params %}    {{ p.0 }} = {{ p.1 }}
{% endfor %}";

fn tensor_rows(graph: &SourceGraph, ids: &[TensorId]) -> Vec<serde_json::Value> {
    ids.iter()
        .map(|&id| match graph.tensor(id) {
            Some(t) => serde_json::json!({
                "id": id.to_string(),
                "name": t.name,
                "ty": t.ty.to_string(),
            }),
            None => serde_json::json!({ "id": id.to_string(), "name": "<foreign>", "ty": "?" }),
        })
        .collect()
}

pub fn dump_op(graph: &SourceGraph, op: &SourceOp) -> tera::Result<String> {
    let mut context = Context::new();
    context.insert("name", &op.name);
    context.insert("kind", &op.kind.to_string());
    context.insert("inputs", &tensor_rows(graph, graph.op_ins(op)));
    context.insert("outputs", &tensor_rows(graph, graph.op_outs(op)));
    Tera::one_off(OP_TEMPLATE, &context, false)
}

pub fn dump_options(op: &SourceOp) -> tera::Result<String> {
    let params: Vec<(String, String)> = op.kind.params()
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect();
    let mut context = Context::new();
    context.insert("params", &params);
    Tera::one_off(OPTIONS_TEMPLATE, &context, false)
}

/// Logs the op at Info. Nothing is formatted when Info is below the logger's threshold.
pub fn dump_legalization<L: Logger + ?Sized>(logger: &L, graph: &SourceGraph, op: &SourceOp) {
    if !logger.enabled(Severity::Info) {
        return;
    }
    match dump_op(graph, op).and_then(|d| Ok(d + &dump_options(op)?)) {
        Ok(dump) => logger.log(Severity::Info, &dump),
        Err(e) => logger.log(Severity::Warning, &format!("failed to dump op '{}': {}", op.name, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::op::OpKind;
    use crate::core::types::{DataType, Shape, TensorType};
    use crate::logging::BufferLogger;

    fn softmax_graph() -> SourceGraph {
        let mut g = SourceGraph::new();
        let ty = TensorType { shape: Shape::from_static(&[1, 8]), dtype: DataType::F32 };
        let x = g.add_tensor("logits", ty.clone());
        let y = g.add_tensor("probs", ty);
        g.add_op("softmax_0", OpKind::Softmax { beta: 0.5 }, vec![x], vec![y]);
        g
    }

    #[test]
    fn dump_lists_tensors_and_options() {
        let g = softmax_graph();
        let (_, op) = g.ops().next().unwrap();
        let text = dump_op(&g, op).unwrap();
        assert!(text.starts_with("op softmax_0 <Softmax>"));
        assert!(text.contains("%0 logits: f32[1, 8]"));
        assert!(text.contains("%1 probs: f32[1, 8]"));
        assert!(dump_options(op).unwrap().contains("beta = 0.5"));
    }

    #[test]
    fn dump_is_skipped_below_threshold() {
        let g = softmax_graph();
        let (_, op) = g.ops().next().unwrap();

        let quiet = BufferLogger::new(Severity::Warning);
        dump_legalization(&quiet, &g, op);
        assert!(quiet.lines().is_empty());

        let verbose = BufferLogger::new(Severity::Verbose);
        dump_legalization(&verbose, &g, op);
        let lines = verbose.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Severity::Info);
        assert!(lines[0].1.contains("options:"));
    }

    #[test]
    fn foreign_refs_are_dumped_without_metadata() {
        let mut g = SourceGraph::new();
        let y = g.add_tensor("y", TensorType { shape: Shape::default(), dtype: DataType::F32 });
        g.add_op("relu", OpKind::Relu, vec![TensorId(7)], vec![y]);
        let (_, op) = g.ops().next().unwrap();
        assert!(dump_op(&g, op).unwrap().contains("%7 <foreign>: ?"));
    }
}

use crate::config::SessionConfig;
use crate::error::{LegalizeError, LegalizeResult, ScopeError};
use crate::legalize::legalize_simple_op;
use crate::logging::{Logger, Severity};
use crate::scope::ScopeTable;
use crate::source::{OpId, SourceGraph, TensorId};
use crate::target::{TargetGraphBuilder, TargetTensorHandle, TensorKind};
use rayon::prelude::*;

const GRAPH_INPUTS: &str = "<graph inputs>";

/// One graph-build session: a scope table and a backend graph that only one
/// legalization touches at a time. Independent subgraphs get independent sessions.
///
/// The first failed legalization poisons the session: the backend graph may be
/// partially populated, so every later call is refused.
pub struct LegalizeSession<B, L> {
    scope: ScopeTable,
    builder: B,
    logger: L,
    config: SessionConfig,
    failed_op: Option<String>,
}

impl<B: TargetGraphBuilder, L: Logger> LegalizeSession<B, L> {
    pub fn new(builder: B, logger: L, config: SessionConfig) -> Self {
        Self { scope: ScopeTable::new(), builder, logger, config, failed_op: None }
    }

    pub fn scope(&self) -> &ScopeTable {
        &self.scope
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn is_failed(&self) -> bool {
        self.failed_op.is_some()
    }

    pub fn into_parts(self) -> (ScopeTable, B) {
        (self.scope, self.builder)
    }

    fn ensure_usable(&self, op: &str) -> LegalizeResult<()> {
        match &self.failed_op {
            Some(failed_op) => Err(LegalizeError::SessionFailed {
                op: op.to_string(),
                failed_op: failed_op.clone(),
            }),
            None => Ok(()),
        }
    }

    fn track<T>(&mut self, result: LegalizeResult<T>) -> LegalizeResult<T> {
        if let Err(e) = &result {
            if self.failed_op.is_none() {
                self.failed_op = Some(e.op().to_string());
            }
        }
        result
    }

    /// Registers a tensor the caller legalized by other means.
    pub fn bind(&mut self, tensor: TensorId, handle: TargetTensorHandle) -> Result<(), ScopeError> {
        self.scope.register(tensor, handle)
    }

    /// Allocates and registers the graph inputs (`AppInput`) and constants (`Static`).
    pub fn bind_graph_inputs(&mut self, graph: &SourceGraph) -> LegalizeResult<()> {
        self.ensure_usable(GRAPH_INPUTS)?;
        let result = self.bind_sources(graph);
        self.track(result)
    }

    fn bind_sources(&mut self, graph: &SourceGraph) -> LegalizeResult<()> {
        let inputs = graph.inputs.iter().map(|&t| (t, TensorKind::AppInput));
        let constants = graph.constants.iter().map(|&t| (t, TensorKind::Static));
        for (id, kind) in inputs.chain(constants) {
            let scope_err = |e| LegalizeError::from_scope(graph, GRAPH_INPUTS, e);
            let tensor = graph.tensor(id).ok_or_else(|| scope_err(ScopeError::Unresolved { tensor: id }))?;
            let handle = self.builder.legalize_input(id, tensor, kind)
                .map_err(|source| LegalizeError::OutputLegalization {
                    op: GRAPH_INPUTS.to_string(),
                    tensor: tensor.name.clone(),
                    source,
                })?;
            self.scope.register(id, handle).map_err(scope_err)?;
        }
        Ok(())
    }

    pub fn legalize_op(&mut self, graph: &SourceGraph, op: OpId) -> LegalizeResult<()> {
        let op = graph.op(op);
        self.ensure_usable(&op.name)?;
        let result = legalize_simple_op(
            graph,
            op,
            &mut self.scope,
            &mut self.builder,
            &self.logger,
            self.config.commit_mode,
        );
        self.track(result)
    }

    /// Legalizes every op in producer-first order and stops at the first
    /// failure. Returns the number of nodes added.
    pub fn legalize_graph(&mut self, graph: &SourceGraph) -> anyhow::Result<usize> {
        let order = graph.topological_order()?;
        for (count, &op) in order.iter().enumerate() {
            if let Err(e) = self.legalize_op(graph, op) {
                self.logger.log(Severity::Error, &format!(
                    "graph '{}': legalization failed after {} of {} ops: {}",
                    self.config.graph_name, count, order.len(), e
                ));
                return Err(e.into());
            }
        }
        if self.logger.enabled(Severity::Info) {
            self.logger.log(Severity::Info, &format!(
                "graph '{}': legalized {} ops, {} tensors in scope",
                self.config.graph_name, order.len(), self.scope.len()
            ));
        }
        Ok(order.len())
    }
}

/// Legalizes independent graphs in parallel. `make_backend` is called once
/// per graph so no session is ever shared between threads.
pub fn legalize_partitions<B, L, F>(
    graphs: &[SourceGraph],
    config: &SessionConfig,
    logger: &L,
    make_backend: F,
) -> Vec<anyhow::Result<(ScopeTable, B)>>
where
    B: TargetGraphBuilder + Send,
    L: Logger + Sync,
    F: Fn(usize) -> B + Sync,
{
    graphs
        .par_iter()
        .enumerate()
        .map(|(i, graph)| {
            let config = SessionConfig {
                graph_name: format!("{}.{}", config.graph_name, i),
                ..config.clone()
            };
            let mut session = LegalizeSession::new(make_backend(i), logger, config);
            session.bind_graph_inputs(graph)?;
            session.legalize_graph(graph)?;
            Ok(session.into_parts())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::op::OpKind;
    use crate::core::types::{DataType, Shape, TensorType};
    use crate::logging::BufferLogger;
    use crate::target::memory::InMemoryGraph;

    fn chain(len: usize) -> SourceGraph {
        let mut g = SourceGraph::new();
        let ty = TensorType { shape: Shape::from_static(&[8]), dtype: DataType::F32 };
        let mut prev = g.add_tensor("x", ty.clone());
        g.inputs.push(prev);
        for i in 0..len {
            let next = g.add_tensor(&format!("t{}", i), ty.clone());
            g.add_op(&format!("relu_{}", i), OpKind::Relu, vec![prev], vec![next]);
            prev = next;
        }
        g.outputs.push(prev);
        g
    }

    #[test]
    fn legalizes_whole_graph_in_order() {
        let g = chain(3);
        let logger = BufferLogger::new(Severity::Info);
        let mut session = LegalizeSession::new(InMemoryGraph::new("g"), &logger, SessionConfig::default());
        session.bind_graph_inputs(&g).unwrap();
        assert_eq!(session.legalize_graph(&g).unwrap(), 3);
        assert_eq!(session.scope().len(), 4);
        assert_eq!(session.builder().nodes().len(), 3);
        assert!(logger.lines().iter().any(|(_, l)| l.contains("legalized 3 ops")));
    }

    #[test]
    fn missing_graph_inputs_surface_as_unresolved() {
        let g = chain(2);
        let logger = BufferLogger::new(Severity::Error);
        let mut session = LegalizeSession::new(InMemoryGraph::new("g"), &logger, SessionConfig::default());
        let err = session.legalize_graph(&g).unwrap_err();
        let err = err.downcast::<LegalizeError>().unwrap();
        assert_eq!(err, LegalizeError::UnresolvedTensor { op: "relu_0".into(), tensor: "x".into() });
        assert!(session.builder().nodes().is_empty());
        assert_eq!(logger.lines().len(), 1);
    }

    #[test]
    fn binding_twice_is_rejected() {
        let g = chain(1);
        let mut session = LegalizeSession::new(
            InMemoryGraph::new("g"),
            BufferLogger::new(Severity::Silent),
            SessionConfig::default(),
        );
        session.bind_graph_inputs(&g).unwrap();
        let err = session.bind_graph_inputs(&g).unwrap_err();
        assert!(matches!(err, LegalizeError::DuplicateRegistration { .. }));
    }

    #[test]
    fn partitions_use_independent_sessions() {
        let graphs = vec![chain(2), chain(5), chain(1)];
        let logger = BufferLogger::new(Severity::Silent);
        let results = legalize_partitions(&graphs, &SessionConfig::default(), &logger, |i| {
            InMemoryGraph::new(&format!("part{}", i))
        });
        let node_counts: Vec<usize> = results
            .into_iter()
            .map(|r| r.unwrap().1.nodes().len())
            .collect();
        assert_eq!(node_counts, vec![2, 5, 1]);
    }

    #[test]
    fn graph_boundary_tensors_get_app_kinds() {
        let mut g = chain(1);
        let ty = TensorType { shape: Shape::from_static(&[8]), dtype: DataType::F32 };
        let bias = g.add_tensor("bias", ty.clone());
        let out = g.add_tensor("out", ty);
        g.constants.push(bias);
        let relu_out = g.outputs[0];
        g.outputs = vec![out];
        g.add_op("bias_add", OpKind::Add, vec![relu_out, bias], vec![out]);

        let mut session = LegalizeSession::new(
            InMemoryGraph::new("g"),
            BufferLogger::new(Severity::Silent),
            SessionConfig::default(),
        );
        session.bind_graph_inputs(&g).unwrap();
        session.legalize_graph(&g).unwrap();

        let kind = |t| session.scope().lookup(t).unwrap().kind;
        assert_eq!(kind(g.inputs[0]), TensorKind::AppInput);
        assert_eq!(kind(bias), TensorKind::Static);
        assert_eq!(kind(relu_out), TensorKind::Native);
        assert_eq!(kind(out), TensorKind::AppOutput);
    }

    #[test]
    fn failed_session_refuses_further_work() {
        let g = chain(2);
        let logger = BufferLogger::new(Severity::Silent);
        let mut session = LegalizeSession::new(InMemoryGraph::new("g"), &logger, SessionConfig::default());
        let order = g.topological_order().unwrap();

        // Inputs were never bound, so the first op fails.
        assert!(session.legalize_op(&g, order[0]).is_err());
        assert!(session.is_failed());

        let err = session.bind_graph_inputs(&g).unwrap_err();
        assert!(matches!(err, LegalizeError::SessionFailed { ref failed_op, .. } if failed_op == "relu_0"));
        let err = session.legalize_op(&g, order[1]).unwrap_err();
        assert_eq!(err, LegalizeError::SessionFailed { op: "relu_1".into(), failed_op: "relu_0".into() });
        assert!(session.scope().is_empty());
        assert!(session.builder().tensors().is_empty());
    }
}

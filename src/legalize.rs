use crate::config::CommitMode;
use crate::dump::dump_legalization;
use crate::error::{LegalizeError, LegalizeResult, ScopeError};
use crate::logging::Logger;
use crate::scope::ScopeTable;
use crate::source::{SourceGraph, SourceOp};
use crate::target::{TargetGraphBuilder, TargetNodeDescriptor, TargetTensorHandle, TensorKind};

/// Legalizes one op whose target node has the same inputs and outputs, one to one.
///
/// Inputs are resolved through `scope` before any output is allocated, so an op
/// can never observe its own outputs. Every failure aborts before the node
/// reaches `builder`, except a rejection by `add_node` itself.
///
/// With [`CommitMode::Incremental`] each output is registered as soon as it is
/// allocated and stays registered if a later step fails. With
/// [`CommitMode::Transactional`] the scope only changes after the node is added.
///
/// Outputs listed in `graph.outputs` are allocated as [`TensorKind::AppOutput`].
/// A tensor ref that does not belong to `graph` is reported as unresolved.
pub fn legalize_simple_op<B, L>(
    graph: &SourceGraph,
    op: &SourceOp,
    scope: &mut ScopeTable,
    builder: &mut B,
    logger: &L,
    mode: CommitMode,
) -> LegalizeResult<()>
where
    B: TargetGraphBuilder + ?Sized,
    L: Logger + ?Sized,
{
    dump_legalization(logger, graph, op);
    let scope_err = |e: ScopeError| LegalizeError::from_scope(graph, &op.name, e);

    let op_ins = graph.op_ins(op);
    let mut inputs: Vec<TargetTensorHandle> = Vec::with_capacity(op_ins.len());
    for &op_in in op_ins {
        inputs.push(scope.lookup(op_in).map_err(scope_err)?.clone());
    }

    let op_outs = graph.op_outs(op);
    let mut outputs: Vec<TargetTensorHandle> = Vec::with_capacity(op_outs.len());
    for (i, &op_out) in op_outs.iter().enumerate() {
        if mode == CommitMode::Transactional
            && (scope.contains(op_out) || op_outs[..i].contains(&op_out))
        {
            return Err(scope_err(ScopeError::Duplicate { tensor: op_out }));
        }
        let tensor = graph
            .tensor(op_out)
            .ok_or_else(|| scope_err(ScopeError::Unresolved { tensor: op_out }))?;
        let kind = if graph.is_graph_output(op_out) { TensorKind::AppOutput } else { TensorKind::Native };
        let handle = builder
            .legalize_output(op_out, tensor, kind)
            .map_err(|source| LegalizeError::OutputLegalization {
                op: op.name.clone(),
                tensor: tensor.name.clone(),
                source,
            })?;
        if mode == CommitMode::Incremental {
            scope.register(op_out, handle.clone()).map_err(scope_err)?;
        }
        outputs.push(handle);
    }

    let node = TargetNodeDescriptor {
        name: op.name.clone(),
        package: builder.package().to_string(),
        op_type: op.kind.target_op_type().to_string(),
        params: op.kind.params(),
        inputs,
        outputs,
    };
    // Transactional commits need the handles after the descriptor is moved.
    let committed = match mode {
        CommitMode::Transactional => node.outputs.clone(),
        CommitMode::Incremental => Vec::new(),
    };

    builder.add_node(node).map_err(|source| LegalizeError::BackendNodeSubmission {
        op: op.name.clone(),
        source,
    })?;

    for (&op_out, handle) in op_outs.iter().zip(committed) {
        scope.register(op_out, handle).map_err(scope_err)?;
    }
    Ok(())
}

use crate::config::SessionConfig;
use crate::logging::StderrLogger;
use crate::pipeline::{CompilerContext, Stage};
use crate::session::LegalizeSession;
use crate::source::json::load_source_graph;
use crate::target::memory::InMemoryGraph;

pub struct LoadStage;
impl Stage for LoadStage {
    fn name(&self) -> &str { "Load Source Graph" }
    fn run(&self, ctx: &mut CompilerContext) -> anyhow::Result<()> {
        if let Some(path) = &ctx.config_path {
            ctx.config = SessionConfig::load(path)?;
        }
        let graph = load_source_graph(&ctx.graph_path)?;
        ctx.graph = Some(graph);
        Ok(())
    }
}

pub struct LegalizeStage;
impl Stage for LegalizeStage {
    fn name(&self) -> &str { "Legalize Ops" }
    fn run(&self, ctx: &mut CompilerContext) -> anyhow::Result<()> {
        let graph = ctx.graph.as_ref().ok_or_else(|| anyhow::anyhow!("No source graph loaded"))?;
        let backend = InMemoryGraph::new(&ctx.config.graph_name);
        let logger = StderrLogger::new(ctx.config.min_severity);

        let mut session = LegalizeSession::new(backend, logger, ctx.config.clone());
        session.bind_graph_inputs(graph)?;
        session.legalize_graph(graph)?;

        let (_, backend) = session.into_parts();
        ctx.snapshot = Some(backend.snapshot());
        Ok(())
    }
}

pub struct ReportStage;
impl Stage for ReportStage {
    fn name(&self) -> &str { "Report Backend Graph" }
    fn run(&self, ctx: &mut CompilerContext) -> anyhow::Result<()> {
        let snapshot = ctx.snapshot.as_ref().ok_or_else(|| anyhow::anyhow!("Nothing was legalized"))?;
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;

    #[test]
    fn legalize_stage_requires_a_loaded_graph() {
        let mut ctx = CompilerContext::new("unused.json", None);
        let err = LegalizeStage.run(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("No source graph"));
    }

    #[test]
    fn pipeline_runs_load_and_legalize() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("sion-legalize-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;
        let graph_path = dir.join("graph.json");
        std::fs::write(&graph_path, r#"{
            "tensors": [
                { "name": "x", "dtype": "F32", "shape": [4] },
                { "name": "y", "dtype": "F32", "shape": [4] }
            ],
            "inputs": ["x"],
            "outputs": ["y"],
            "ops": [{ "name": "abs_0", "op": "Abs", "inputs": ["x"], "outputs": ["y"] }]
        }"#)?;

        let mut pipeline = Pipeline::new();
        pipeline.add_stage(LoadStage);
        pipeline.add_stage(LegalizeStage);
        let mut ctx = CompilerContext::new(&graph_path.to_string_lossy(), None);
        pipeline.execute(&mut ctx)?;

        let snapshot = ctx.snapshot.expect("snapshot");
        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(snapshot.nodes[0].op_type, "ElementWiseAbs");
        assert_eq!(snapshot.tensors.len(), 2);
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}

use crate::config::SessionConfig;
use crate::source::SourceGraph;
use crate::target::memory::GraphSnapshot;
use std::path::PathBuf;

pub struct CompilerContext {
    pub graph_path: PathBuf,
    pub config_path: Option<PathBuf>,

    pub config: SessionConfig,
    pub graph: Option<SourceGraph>,
    pub snapshot: Option<GraphSnapshot>,
}

impl CompilerContext {
    pub fn new(graph_path: &str, config_path: Option<&str>) -> Self {
        Self {
            graph_path: PathBuf::from(graph_path),
            config_path: config_path.map(PathBuf::from),
            config: SessionConfig::default(),
            graph: None,
            snapshot: None,
        }
    }
}

pub trait Stage {
    fn name(&self) -> &str;
    fn run(&self, ctx: &mut CompilerContext) -> anyhow::Result<()>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) {
        self.stages.push(Box::new(stage));
    }

    pub fn execute(&self, ctx: &mut CompilerContext) -> anyhow::Result<()> {
        for stage in &self.stages {
            eprintln!("[Stage: {}]", stage.name());
            stage.run(ctx).map_err(|e| e.context(format!("stage '{}' failed", stage.name())))?;
        }
        Ok(())
    }
}

use sion_legalize::pipeline::{CompilerContext, Pipeline};
use sion_legalize::stages::{LegalizeStage, LoadStage, ReportStage};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: sion-legalize <graph.json> [config.json]");
        std::process::exit(2);
    }

    let mut ctx = CompilerContext::new(&args[1], args.get(2).map(|s| s.as_str()));

    let mut pipeline = Pipeline::new();
    pipeline.add_stage(LoadStage);
    pipeline.add_stage(LegalizeStage);
    pipeline.add_stage(ReportStage);

    pipeline.execute(&mut ctx)
}

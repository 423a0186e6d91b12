use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use modelgen::assemble;
use modelgen::config::Args;
use modelgen::ir::Schema;
use modelgen::writer::Writer;

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.default_log_level()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let source = fs::read_to_string(&args.document)
        .with_context(|| format!("Failed to read {}", args.document.display()))?;
    let schema = Schema::from_json(&source)
        .with_context(|| format!("Invalid model document {}", args.document.display()))?;
    info!(entities = schema.entities.len(), "loaded {}", args.document.display());

    let generation = assemble::generate(&schema, &args.owner_policy(), &args.layout())
        .context("Generation failed")?;

    Writer::new(&args.out_dir)
        .dry_run(args.dry_run)
        .write_all(&generation.artifacts)
        .with_context(|| format!("Failed to write output under {}", args.out_dir.display()))?;

    Ok(())
}

use std::path::PathBuf;

use clap::Parser;

use crate::assemble::OutputLayout;
use crate::ir::OwnerPolicy;

/// Generate entity contracts, ORM models, GraphQL, OpenAPI and REST
/// scaffolds from a JSON model document.
#[derive(Debug, Clone, Parser)]
#[command(name = "modelgen", version, about)]
pub struct Args {
    /// Model document (JSON)
    pub document: PathBuf,

    /// Output root
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Hand-editable scaffold tree, relative to the output root
    #[arg(long, default_value = "resources")]
    pub resources_dir: PathBuf,

    /// Always-overwritten copy of the scaffold tree
    #[arg(long, default_value = "generated/resources")]
    pub reference_dir: PathBuf,

    /// Aggregate files
    #[arg(long, default_value = "generated")]
    pub generated_dir: PathBuf,

    /// Entity whose references mark a field as the owner field
    #[arg(long, default_value = "User")]
    pub owner_model: String,

    /// Owner field used when no field references the owner model
    #[arg(long, default_value = "owner_id")]
    pub owner_field: String,

    /// Compute and log every write without touching the disk
    #[arg(long)]
    pub dry_run: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn owner_policy(&self) -> OwnerPolicy {
        OwnerPolicy {
            owner_model: self.owner_model.clone(),
            default_field: self.owner_field.clone(),
        }
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout {
            resources_dir: self.resources_dir.clone(),
            reference_dir: self.reference_dir.clone(),
            generated_dir: self.generated_dir.clone(),
        }
    }

    /// `RUST_LOG` wins; otherwise `info`, or `debug` with `-v`.
    pub fn default_log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

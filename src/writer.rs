//! Applies each artifact's write policy under an output root.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::assemble::Artifact;
use crate::error::GenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Hand-editable scaffold: never replace an existing file.
    SkipIfExists,
    /// Always replaced, through a temp file and rename.
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Skipped,
    /// Dry run; nothing touched.
    Planned,
}

#[derive(Debug, Clone)]
pub struct Writer {
    root: PathBuf,
    dry_run: bool,
}

impl Writer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Write every artifact. Skip-if-exists files go first so a failure
    /// while writing them leaves every aggregate untouched.
    pub fn write_all(&self, artifacts: &[Artifact]) -> Result<Vec<(PathBuf, WriteOutcome)>, GenError> {
        let (scaffold, aggregate): (Vec<&Artifact>, Vec<&Artifact>) = artifacts
            .iter()
            .partition(|a| a.policy == WritePolicy::SkipIfExists);

        let mut outcomes = Vec::with_capacity(artifacts.len());
        for artifact in scaffold.into_iter().chain(aggregate) {
            let outcome = self.write(artifact)?;
            outcomes.push((artifact.path.clone(), outcome));
        }

        let written = outcomes.iter().filter(|(_, o)| *o == WriteOutcome::Written).count();
        let skipped = outcomes.iter().filter(|(_, o)| *o == WriteOutcome::Skipped).count();
        info!(written, skipped, dry_run = self.dry_run, "output complete");
        Ok(outcomes)
    }

    pub fn write(&self, artifact: &Artifact) -> Result<WriteOutcome, GenError> {
        let path = self.root.join(&artifact.path);
        if self.dry_run {
            info!(path = %path.display(), policy = ?artifact.policy, "would write");
            return Ok(WriteOutcome::Planned);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GenError::io(parent, e))?;
        }

        let outcome = match artifact.policy {
            WritePolicy::SkipIfExists => write_new(&path, &artifact.contents)?,
            WritePolicy::Overwrite => {
                replace(&path, &artifact.contents)?;
                WriteOutcome::Written
            }
        };
        match outcome {
            WriteOutcome::Skipped => info!(path = %path.display(), "exists, skipped"),
            _ => debug!(path = %path.display(), bytes = artifact.contents.len(), "written"),
        }
        Ok(outcome)
    }
}

// Contents are staged in a temp file and linked into place, so a failed
// write never leaves a truncated file that later runs would skip.
fn write_new(path: &Path, contents: &str) -> Result<WriteOutcome, GenError> {
    if path.exists() {
        return Ok(WriteOutcome::Skipped);
    }
    let tmp = temp_path(path);
    fs::write(&tmp, contents).map_err(|e| GenError::io(&tmp, e))?;
    let linked = fs::hard_link(&tmp, path);
    let _ = fs::remove_file(&tmp);
    match linked {
        Ok(()) => Ok(WriteOutcome::Written),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(WriteOutcome::Skipped),
        Err(e) => Err(GenError::io(path, e)),
    }
}

fn replace(path: &Path, contents: &str) -> Result<(), GenError> {
    let tmp = temp_path(path);
    fs::write(&tmp, contents).map_err(|e| GenError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| GenError::io(path, e))
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.tmp"))
}

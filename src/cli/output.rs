use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use tempfile::NamedTempFile;

/// Output written to a temporary file beside its destination.
///
/// Nothing appears at the destination until [`StagedOutput::commit`]; a
/// dropped stage removes its temporary file.
pub struct StagedOutput<'a> {
    temp_file: NamedTempFile,
    path: &'a Path,
}

impl<'a> StagedOutput<'a> {
    pub fn new(path: &'a Path) -> Result<Self> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let temp_file = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        Ok(Self { temp_file, path })
    }

    /// A handle for writing into the temporary file
    pub fn file(&self) -> Result<File> {
        self.temp_file
            .reopen()
            .context("Failed to open temporary output file")
    }

    /// Move the completed file onto the destination
    pub fn commit(self) -> Result<()> {
        self.temp_file
            .persist(self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

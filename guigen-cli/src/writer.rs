//! Output file handling for both binaries.
//!
//! Content is staged in a temporary file next to the target and renamed
//! over it, so a failed run never leaves a truncated source behind. Output
//! directories are created here and nowhere else, after generation
//! succeeded. `guigen-fix` often writes back to its own input; a rewrite
//! that changes nothing leaves the file untouched.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::WriteError;

/// What happened to an output path.
#[derive(Debug)]
pub enum WriteResult {
    /// The file was replaced (or created) with `bytes` of new content.
    Written { path: PathBuf, bytes: usize },
    /// The file already held exactly this content.
    Unchanged { path: PathBuf },
    /// Dry run: `content` is what would have been written.
    DryRun { content: String, path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path, .. }
            | WriteResult::Unchanged { path }
            | WriteResult::DryRun { path, .. } => path,
        }
    }

    /// True only when the file on disk changed.
    pub fn was_written(&self) -> bool {
        matches!(self, WriteResult::Written { .. })
    }
}

/// Writes a single generated or rewritten source file.
#[derive(Debug, Clone, Copy)]
pub struct FileWriter {
    dry_run: bool,
}

impl FileWriter {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Put `content` at `path`.
    pub fn write(&self, path: &Path, content: &str) -> Result<WriteResult, WriteError> {
        if self.dry_run {
            return Ok(WriteResult::DryRun {
                content: content.to_string(),
                path: path.to_path_buf(),
            });
        }

        if std::fs::read_to_string(path).is_ok_and(|existing| existing == content) {
            tracing::debug!(path = %path.display(), "output already up to date");
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }

        let dir = output_dir(path);
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|source| WriteError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
            tracing::debug!(path = %dir.display(), "created output directory");
        }

        let staged = stage(dir, content).map_err(|source| WriteError::WriteFile {
            path: path.to_path_buf(),
            source,
        })?;
        staged.persist(path).map_err(|e| WriteError::WriteFile {
            path: path.to_path_buf(),
            source: e.error,
        })?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "wrote output");
        Ok(WriteResult::Written {
            path: path.to_path_buf(),
            bytes: content.len(),
        })
    }
}

/// Parent directory of `path`; a bare file name lives in the working directory.
fn output_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn stage(dir: &Path, content: &str) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.as_file().sync_all()?;
    Ok(file)
}

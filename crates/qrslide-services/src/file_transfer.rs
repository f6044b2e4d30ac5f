//! File transfer: reading outgoing files and persisting received ones.
//!
//! The sessions only ever see in-memory text. This module is the boundary
//! where that text comes from and goes to.

use std::io;
use std::path::{Component, Path, PathBuf};

use qrslide_core::slide::SlideError;

use crate::receiver::ReceivedFile;

/// An outgoing file, loaded and ready for [`crate::Sender::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub file_name: String,
    pub content: String,
}

/// Read a text file for sending.
///
/// The file name sent in the Title frame is the path's final component.
/// Unreadable files and files that are not valid UTF-8 are reported as
/// [`TransferError::SourceUnavailable`].
pub fn read_source(path: &Path) -> Result<SourceFile, TransferError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| TransferError::SourceUnavailable {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no usable file name"),
        })?
        .to_owned();

    let content =
        std::fs::read_to_string(path).map_err(|source| TransferError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(file_name = %file_name, bytes = content.len(), "source file loaded");
    Ok(SourceFile { file_name, content })
}

/// Write a completed transfer into `dir`. Returns the written path.
///
/// The file name arrived over the optical channel, so anything other than a
/// single plain path component is refused.
pub fn persist(dir: &Path, file: &ReceivedFile) -> Result<PathBuf, TransferError> {
    let name = safe_file_name(&file.file_name)?;

    std::fs::create_dir_all(dir).map_err(|source| TransferError::PersistFailed {
        path: dir.to_path_buf(),
        source,
    })?;

    let output_path = dir.join(name);
    std::fs::write(&output_path, &file.content).map_err(|source| {
        TransferError::PersistFailed {
            path: output_path.clone(),
            source,
        }
    })?;

    tracing::info!(
        file_name = %file.file_name,
        bytes = file.content.len(),
        path = %output_path.display(),
        "file received and saved"
    );
    Ok(output_path)
}

fn safe_file_name(name: &str) -> Result<&Path, TransferError> {
    let path = Path::new(name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(path),
        _ => Err(TransferError::UnsafeFileName(name.to_owned())),
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures surfaced when starting or finishing a transfer.
///
/// Noise seen while a transfer is running is never reported this way; the
/// sessions absorb it.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("file name is {len} bytes, exceeds maximum {max}")]
    FileNameTooLong { len: usize, max: usize },

    #[error("source {path:?} unavailable: {source}")]
    SourceUnavailable { path: PathBuf, source: io::Error },

    #[error("refusing to save received file under unsafe name {0:?}")]
    UnsafeFileName(String),

    #[error("failed to write {path:?}: {source}")]
    PersistFailed { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Frame(#[from] SlideError),
}

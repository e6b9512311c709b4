use std::path::{Component, Path};

use crate::TransferError;
use crate::store::{ARTIFACT_BASE_NAME, ARTIFACT_EXTENSION, RESUME_MARKER_FILE, TMP_SUFFIX};

/// Validates a transfer filename.
///
/// Files live flat in the download or upload directory, so the name must
/// be a single plain component. Rejects:
/// - Empty names
/// - Absolute paths and Windows prefixes (`C:`, `\\server`)
/// - Parent directory traversal (`..`) and nested directories
/// - Names reserved for resume state (`request.json`, `chunk{N}.bin`
///   and their `.tmp` siblings)
pub fn validate_filename(filename: &str) -> Result<(), TransferError> {
    if filename.is_empty() {
        return Err(TransferError::InvalidPath("empty filename".into()));
    }

    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        (Some(Component::ParentDir), _) | (Some(Component::Normal(_)), Some(Component::ParentDir)) => {
            return Err(TransferError::InvalidPath(format!(
                "parent directory traversal not allowed: {filename}"
            )));
        }
        (Some(Component::RootDir | Component::Prefix(_)), _) => {
            return Err(TransferError::InvalidPath(format!(
                "absolute path not allowed: {filename}"
            )));
        }
        _ => {
            return Err(TransferError::InvalidPath(format!(
                "filename must not contain directories: {filename}"
            )));
        }
    }

    if is_reserved(filename) {
        return Err(TransferError::InvalidPath(format!(
            "filename is reserved for resume state: {filename}"
        )));
    }

    Ok(())
}

fn is_reserved(filename: &str) -> bool {
    if filename.starts_with(RESUME_MARKER_FILE) {
        return true;
    }
    let filename = filename.strip_suffix(TMP_SUFFIX).unwrap_or(filename);
    filename
        .strip_prefix(ARTIFACT_BASE_NAME)
        .and_then(|rest| rest.strip_suffix(ARTIFACT_EXTENSION))
        .and_then(|rest| rest.strip_suffix('.'))
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

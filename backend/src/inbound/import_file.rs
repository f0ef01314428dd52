//! Region import records read from a JSON file.
//!
//! Files are opened through `cap_std` with ambient authority scoped to the
//! parent directory. The document is a JSON array of
//! [`RegionImportRecord`] values, the same shape the bulk import endpoint
//! accepts.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use thiserror::Error;

use crate::domain::MAX_IMPORT_RECORDS;
use crate::domain::ports::RegionImportRecord;

/// Failures while loading an import file.
#[derive(Debug, Error)]
pub enum ImportFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} holds {count} records; at most {MAX_IMPORT_RECORDS} are accepted")]
    TooManyRecords { path: PathBuf, count: usize },
}

fn parent_and_file_name(path: &Path) -> io::Result<(&Path, OsString)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path must name a file")
    })?;
    Ok((parent, file_name.to_os_string()))
}

fn read_to_string(path: &Path) -> io::Result<String> {
    let (parent, file_name) = parent_and_file_name(path)?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
    directory.read_to_string(Path::new(&file_name))
}

/// Load import records from `path`.
///
/// # Errors
/// Returns [`ImportFileError`] when the file cannot be read, is not a JSON
/// array of records, or exceeds the per-request record limit.
pub fn read_import_records(path: &Path) -> Result<Vec<RegionImportRecord>, ImportFileError> {
    let raw = read_to_string(path).map_err(|source| ImportFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<RegionImportRecord> =
        serde_json::from_str(&raw).map_err(|source| ImportFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    if records.len() > MAX_IMPORT_RECORDS {
        return Err(ImportFileError::TooManyRecords {
            path: path.to_path_buf(),
            count: records.len(),
        });
    }
    Ok(records)
}

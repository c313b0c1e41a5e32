//! Output file store.
//!
//! Owns the directory master files are written into (the original layout's
//! `data/` directory). Writes are atomic (write to .tmp, rename into place)
//! so a concurrent download never sees a half-written file. Names handed in
//! by the download endpoint are confined to the directory: separators and
//! parent references are rejected.

use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    #[error("invalid output filename '{0}'")]
    InvalidName(String),

    #[error("no such output file '{0}'")]
    NotFound(String),

    #[error("failed to list output directory {path}: {source}")]
    List {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Directory of dated master CSV files.
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    /// Open the store, creating the directory if it does not exist.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a frame as CSV under `filename`, replacing any previous file.
    ///
    /// Writes to `<filename>.tmp` then renames into place.
    pub fn write_csv(&self, filename: &str, df: &mut DataFrame) -> Result<PathBuf, StoreError> {
        validate_name(filename)?;
        let path = self.dir.join(filename);
        let tmp_path = path.with_extension("csv.tmp");

        let file = fs::File::create(&tmp_path).map_err(|source| StoreError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        CsvWriter::new(file)
            .include_header(true)
            .finish(df)
            .map_err(|e| {
                let _ = fs::remove_file(&tmp_path);
                StoreError::Encode {
                    path: tmp_path.clone(),
                    message: e.to_string(),
                }
            })?;

        fs::rename(&tmp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Write {
                path: path.clone(),
                source,
            }
        })?;
        Ok(path)
    }

    /// Resolve a previously written file for download.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, StoreError> {
        validate_name(filename)?;
        let path = self.dir.join(filename);
        if !path.is_file() {
            return Err(StoreError::NotFound(filename.to_string()));
        }
        Ok(path)
    }

    /// Sorted names of the CSV files currently in the store.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::List {
            path: self.dir.clone(),
            source,
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::List {
                path: self.dir.clone(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".csv") && entry.path().is_file() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Download names must stay inside the store directory.
fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

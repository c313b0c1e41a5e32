//! Symbol-to-sector reference table.
//!
//! Loaded fresh on every pipeline invocation from a CSV file with `Symbol`
//! and `Sector` columns. Symbols absent from the table are tolerated by the
//! pipeline's left join; a missing or malformed file is a hard error, never
//! silently skipped.

use polars::prelude::{Column, DataFrame, PolarsError};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SectorError {
    #[error("failed to read sector file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV parse error in sector file: {0}")]
    Csv(#[from] csv::Error),

    #[error("sector file is missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// Static symbol → sector mapping.
///
/// Duplicate symbols keep the first mapping seen in the file.
#[derive(Debug, Clone, Default)]
pub struct SectorMap {
    entries: BTreeMap<String, String>,
}

impl SectorMap {
    pub fn from_file(path: &Path) -> Result<Self, SectorError> {
        let file = std::fs::File::open(path).map_err(|source| SectorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SectorError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let symbol_idx = find_column(&headers, "Symbol")?;
        let sector_idx = find_column(&headers, "Sector")?;

        let mut entries = BTreeMap::new();
        for record in csv_reader.records() {
            let record = record?;
            let symbol = record.get(symbol_idx).unwrap_or("").trim();
            let sector = record.get(sector_idx).unwrap_or("").trim();
            if symbol.is_empty() {
                continue;
            }
            entries
                .entry(symbol.to_string())
                .or_insert_with(|| sector.to_string());
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sector_of(&self, symbol: &str) -> Option<&str> {
        self.entries.get(symbol).map(String::as_str)
    }

    /// Two-column frame for the pipeline's left join.
    pub fn to_dataframe(&self) -> Result<DataFrame, PolarsError> {
        let symbols: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        let sectors: Vec<&str> = self.entries.values().map(String::as_str).collect();
        DataFrame::new(vec![
            Column::new("Symbol".into(), symbols),
            Column::new("Sector".into(), sectors),
        ])
    }
}

fn find_column(headers: &csv::StringRecord, name: &'static str) -> Result<usize, SectorError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or(SectorError::MissingColumn(name))
}

//! BhavMaster Core — daily bhav-copy ETL for NSE futures.
//!
//! This crate contains the whole data path:
//! - Trade dates in their DD-MM-YYYY boundary form and inclusive ranges
//! - Snapshot providers (NSE archives over HTTP, deterministic synthetic)
//! - Symbol → sector reference table
//! - The per-date pipeline: fetch → filter futures → join sectors → join
//!   spot → coerce numerics → aggregate per symbol → persist CSV
//! - The sequential range driver with its per-date summary
//! - The output store with atomic writes and download-safe name resolution

pub mod pipeline;
pub mod provider;
pub mod range;
pub mod sectors;
pub mod store;
pub mod trade_date;

pub use pipeline::{DateOutcome, MasterFile, MasterPipeline, PipelineError};
pub use provider::nse::NseProvider;
pub use provider::synthetic::SyntheticProvider;
pub use provider::{BhavProvider, DerivativesRow, FetchError, SpotRow};
pub use range::{process_range, DateReport, DateStatus, RangeSummary};
pub use sectors::{SectorError, SectorMap};
pub use store::{OutputStore, StoreError};
pub use trade_date::{DateParseError, DateRange, TradeDate, DATE_FORMAT};

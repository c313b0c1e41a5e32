//! Snapshot provider trait and structured error types.
//!
//! The BhavProvider trait abstracts over the two upstream sources (derivatives
//! bhav copy, spot bhav copy with delivery data) so the pipeline can run
//! against the real NSE archives or a deterministic synthetic source in tests.

pub mod nse;
pub mod synthetic;

use crate::trade_date::TradeDate;
use serde::Deserialize;
use thiserror::Error;

/// One derivatives row as published upstream, numeric fields still text.
///
/// Field names follow the pipeline's semantic vocabulary; the serde renames
/// map them onto the abbreviated UDiFF headers. Coercion to numbers is the
/// pipeline's job, so parse failures surface as missing values there instead
/// of fetch errors here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DerivativesRow {
    #[serde(rename = "BizDt")]
    pub date: String,
    #[serde(rename = "TckrSymb")]
    pub symbol: String,
    #[serde(rename = "XpryDt")]
    pub expiry_date: String,
    #[serde(rename = "OpnIntrst")]
    pub open_interest: String,
    #[serde(rename = "ChngInOpnIntrst")]
    pub change_in_open_interest: String,
    #[serde(rename = "FinInstrmNm")]
    pub instrument_name: String,
    #[serde(rename = "TtlTradgVol")]
    pub total_trading_volume: String,
    #[serde(rename = "HghPric")]
    pub high_price: String,
    #[serde(rename = "LwPric")]
    pub low_price: String,
    #[serde(rename = "TtlTrfVal")]
    pub total_value: String,
    #[serde(rename = "NewBrdLotQty")]
    pub lot_size: String,
}

/// One spot row: one (symbol, series) pair per row upstream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpotRow {
    #[serde(rename = "SYMBOL")]
    pub symbol: String,
    #[serde(rename = "SERIES")]
    pub series: String,
    #[serde(rename = "PREV_CLOSE")]
    pub prev_close: String,
    #[serde(rename = "CLOSE_PRICE")]
    pub close_price: String,
    #[serde(rename = "DELIV_PER")]
    pub delivery_percentage: String,
}

/// Structured error types for snapshot fetches.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The exchange published nothing for this date (holiday or weekend).
    /// Expected, not a defect; the pipeline maps it to a no-data outcome.
    #[error("no data published for {date}")]
    NoData { date: TradeDate },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    pub fn is_no_data(&self) -> bool {
        matches!(self, FetchError::NoData { .. })
    }
}

/// Trait for bhav-copy snapshot providers.
///
/// Implementations fetch both snapshots for a single trade date. Empty row
/// sets and `NoData` are both legitimate on non-trading days; callers treat
/// them identically.
pub trait BhavProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the derivatives bhav copy for one trade date.
    fn derivatives(&self, date: TradeDate) -> Result<Vec<DerivativesRow>, FetchError>;

    /// Fetch the spot bhav copy (with delivery data) for the same date.
    fn spot(&self, date: TradeDate) -> Result<Vec<SpotRow>, FetchError>;
}

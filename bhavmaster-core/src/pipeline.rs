//! Per-date master pipeline.
//!
//! One trade date in, one master CSV out: fetch both snapshots, keep futures
//! rows, join the sector table, join spot columns, coerce numerics, collapse
//! duplicate symbols, persist. Non-trading days are a typed outcome
//! (`NoTradingData`), not an error; real failures carry their cause.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::provider::{BhavProvider, DerivativesRow, FetchError, SpotRow};
use crate::sectors::{SectorError, SectorMap};
use crate::store::{OutputStore, StoreError};
use crate::trade_date::TradeDate;

/// Columns coerced from text to Float64; unparseable values become null.
const NUMERIC_COLUMNS: &[&str] = &[
    "Open Interest",
    "Change in Open Interest",
    "Total Trading Volume",
    "High Price",
    "Low Price",
    "Total Value",
    "Lot Size",
    "Previous Close",
    "Close Price",
    "Delivery Percentage",
];

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch failed: {0}")]
    Fetch(FetchError),

    #[error("sector lookup failed: {0}")]
    Sector(#[from] SectorError),

    #[error("transform failed: {0}")]
    Transform(#[from] PolarsError),

    #[error("output store failed: {0}")]
    Store(#[from] StoreError),
}

/// What a single date produced.
#[derive(Debug, Clone, PartialEq)]
pub enum DateOutcome {
    /// Master file written for the date.
    Written(MasterFile),
    /// Holiday, weekend, or empty snapshot; nothing written.
    NoTradingData,
}

/// Handle to a written master file.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterFile {
    pub filename: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// The per-date ETL pipeline.
///
/// Stateless between invocations: the sector table is reloaded on every
/// call and each date writes a distinct, fully regenerated file.
pub struct MasterPipeline<'a> {
    provider: &'a dyn BhavProvider,
    sectors_file: &'a Path,
    store: &'a OutputStore,
}

impl<'a> MasterPipeline<'a> {
    pub fn new(
        provider: &'a dyn BhavProvider,
        sectors_file: &'a Path,
        store: &'a OutputStore,
    ) -> Self {
        Self {
            provider,
            sectors_file,
            store,
        }
    }

    /// Run the full pipeline for one trade date.
    pub fn process_date(&self, date: TradeDate) -> Result<DateOutcome, PipelineError> {
        info!(date = %date, provider = self.provider.name(), "processing trade date");

        let Some(derivatives) = fetch_step(self.provider.derivatives(date), date, "derivatives")?
        else {
            return Ok(DateOutcome::NoTradingData);
        };

        let futures = futures_frame(&derivatives)?;
        if futures.height() == 0 {
            info!(date = %date, "no futures rows after filtering");
            return Ok(DateOutcome::NoTradingData);
        }

        let sectors = SectorMap::from_file(self.sectors_file)?;

        let Some(spot) = fetch_step(self.provider.spot(date), date, "spot")? else {
            return Ok(DateOutcome::NoTradingData);
        };

        let mut master = build_master(futures, &sectors, &spot)?;

        let filename = format!("Masterdata_{}.csv", date.file_stamp());
        let rows = master.height();
        let path = self.store.write_csv(&filename, &mut master)?;
        info!(date = %date, rows, file = %path.display(), "master file written");
        Ok(DateOutcome::Written(MasterFile {
            filename,
            path,
            rows,
        }))
    }
}

/// Classify one fetch: rows to process, benign nothing, or a hard error.
///
/// The upstream sources may publish an empty snapshot instead of a 404 on
/// non-trading days, so an empty row set counts as no data.
fn fetch_step<T>(
    result: Result<Vec<T>, FetchError>,
    date: TradeDate,
    what: &str,
) -> Result<Option<Vec<T>>, PipelineError> {
    match result {
        Ok(rows) if rows.is_empty() => {
            info!(date = %date, "{what} snapshot is empty");
            Ok(None)
        }
        Ok(rows) => Ok(Some(rows)),
        Err(e) if e.is_no_data() => {
            info!(date = %date, "no {what} data published");
            Ok(None)
        }
        Err(e) => Err(PipelineError::Fetch(e)),
    }
}

/// Steps 1–2: semantic string-typed frame from raw rows, futures only.
fn futures_frame(rows: &[DerivativesRow]) -> Result<DataFrame, PolarsError> {
    let frame = derivatives_frame(rows)?;
    frame
        .lazy()
        .filter(col("Instrument Name").str().ends_with(lit("FUT")))
        .collect()
}

fn derivatives_frame(rows: &[DerivativesRow]) -> Result<DataFrame, PolarsError> {
    let dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
    let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
    let expiries: Vec<&str> = rows.iter().map(|r| r.expiry_date.as_str()).collect();
    let open_interest: Vec<&str> = rows.iter().map(|r| r.open_interest.as_str()).collect();
    let oi_change: Vec<&str> = rows
        .iter()
        .map(|r| r.change_in_open_interest.as_str())
        .collect();
    let instruments: Vec<&str> = rows.iter().map(|r| r.instrument_name.as_str()).collect();
    let volumes: Vec<&str> = rows
        .iter()
        .map(|r| r.total_trading_volume.as_str())
        .collect();
    let highs: Vec<&str> = rows.iter().map(|r| r.high_price.as_str()).collect();
    let lows: Vec<&str> = rows.iter().map(|r| r.low_price.as_str()).collect();
    let values: Vec<&str> = rows.iter().map(|r| r.total_value.as_str()).collect();
    let lots: Vec<&str> = rows.iter().map(|r| r.lot_size.as_str()).collect();

    DataFrame::new(vec![
        Column::new("Date".into(), dates),
        Column::new("Symbol".into(), symbols),
        Column::new("Expiry Date".into(), expiries),
        Column::new("Open Interest".into(), open_interest),
        Column::new("Change in Open Interest".into(), oi_change),
        Column::new("Instrument Name".into(), instruments),
        Column::new("Total Trading Volume".into(), volumes),
        Column::new("High Price".into(), highs),
        Column::new("Low Price".into(), lows),
        Column::new("Total Value".into(), values),
        Column::new("Lot Size".into(), lots),
    ])
}

/// Step 4 frame: spot columns under their output names, still text.
fn spot_frame(rows: &[SpotRow]) -> Result<DataFrame, PolarsError> {
    let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
    let prev_closes: Vec<&str> = rows.iter().map(|r| r.prev_close.as_str()).collect();
    let closes: Vec<&str> = rows.iter().map(|r| r.close_price.as_str()).collect();
    let deliveries: Vec<&str> = rows
        .iter()
        .map(|r| r.delivery_percentage.as_str())
        .collect();

    DataFrame::new(vec![
        Column::new("Symbol".into(), symbols),
        Column::new("Previous Close".into(), prev_closes),
        Column::new("Close Price".into(), closes),
        Column::new("Delivery Percentage".into(), deliveries),
    ])
}

/// Steps 3–7: joins, coercion, and the per-symbol aggregation.
///
/// The spot file carries one row per (symbol, series); only the first row
/// per symbol joins, so futures rows are never multiplied. Aggregation
/// output is sorted by symbol and drops the expiry axis.
fn build_master(
    futures: DataFrame,
    sectors: &SectorMap,
    spot_rows: &[SpotRow],
) -> Result<DataFrame, PolarsError> {
    let sector_df = sectors.to_dataframe()?;
    let spot_unique = spot_frame(spot_rows)?
        .lazy()
        .unique_stable(Some(vec!["Symbol".into()]), UniqueKeepStrategy::First);

    let coercions: Vec<Expr> = NUMERIC_COLUMNS
        .iter()
        .map(|name| col(*name).cast(DataType::Float64))
        .collect();

    futures
        .lazy()
        .join(
            sector_df.lazy(),
            [col("Symbol")],
            [col("Symbol")],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            spot_unique,
            [col("Symbol")],
            [col("Symbol")],
            JoinArgs::new(JoinType::Left),
        )
        .with_columns(coercions)
        .group_by([col("Symbol")])
        .agg([
            col("Date").first(),
            col("Sector").first(),
            col("Open Interest").sum(),
            col("Change in Open Interest").sum(),
            col("Close Price").mean(),
            col("Previous Close").mean(),
            col("Delivery Percentage").mean(),
            col("Instrument Name").first(),
            col("Total Trading Volume").sum(),
            col("High Price").max(),
            col("Low Price").min(),
            col("Total Value").sum(),
            col("Lot Size").first(),
        ])
        .sort(["Symbol"], SortMultipleOptions::default())
        .collect()
}

//! Range driver — repeats the per-date pipeline over an inclusive span.

use crate::pipeline::{DateOutcome, MasterPipeline};
use crate::trade_date::{DateRange, TradeDate};
use serde::Serialize;
use tracing::{info, warn};

/// Run the pipeline for every date from `start` to `end` inclusive, ascending.
///
/// Strictly sequential, and the walk never aborts: a date with no data or a
/// hard failure is recorded in the summary and the next date still runs.
/// Callers guarantee start ≤ end; an inverted pair yields an empty summary.
pub fn process_range(
    pipeline: &MasterPipeline<'_>,
    start: TradeDate,
    end: TradeDate,
) -> RangeSummary {
    let mut dates = Vec::new();
    let mut written = 0;
    let mut no_data = 0;
    let mut failed = 0;

    for date in DateRange::new(start, end) {
        let status = match pipeline.process_date(date) {
            Ok(DateOutcome::Written(file)) => {
                written += 1;
                DateStatus::Written {
                    filename: file.filename,
                    rows: file.rows,
                }
            }
            Ok(DateOutcome::NoTradingData) => {
                no_data += 1;
                info!(date = %date, "skipped: no trading data");
                DateStatus::NoTradingData
            }
            Err(e) => {
                failed += 1;
                warn!(date = %date, error = %e, "date processing failed");
                DateStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        dates.push(DateReport {
            date: date.to_string(),
            status,
        });
    }

    info!(
        total = dates.len(),
        written, no_data, failed, "range run complete"
    );
    RangeSummary {
        total: dates.len(),
        written,
        no_data,
        failed,
        dates,
    }
}

/// Outcome of one date within a range run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum DateStatus {
    Written { filename: String, rows: usize },
    NoTradingData,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateReport {
    pub date: String,
    #[serde(flatten)]
    pub status: DateStatus,
}

/// Summary of a range run, in date order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSummary {
    pub total: usize,
    pub written: usize,
    pub no_data: usize,
    pub failed: usize,
    pub dates: Vec<DateReport>,
}

impl RangeSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

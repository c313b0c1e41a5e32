//! One-shot range run driven by environment variables.
//!
//! `main` calls `run_if_configured` once, before the server starts
//! accepting requests. An incomplete or invalid window never aborts
//! startup; it is logged and the server comes up anyway.

use tracing::{info, warn};

use bhavmaster_core::{process_range, TradeDate};

use crate::state::AppState;

pub const START_DATE_ENV: &str = "START_DATE";
pub const END_DATE_ENV: &str = "END_DATE";

/// Run the startup window if one is configured in the environment.
///
/// Both `START_DATE` and `END_DATE` must be set (DD-MM-YYYY, ascending).
/// A bad window is logged and skipped so the server still comes up.
pub fn run_if_configured(state: &AppState) {
    let start = std::env::var(START_DATE_ENV).ok();
    let end = std::env::var(END_DATE_ENV).ok();
    match parse_window(start.as_deref(), end.as_deref()) {
        None => {}
        Some(Err(reason)) => warn!(%reason, "ignoring startup window"),
        Some(Ok((start, end))) => {
            info!(start = %start, end = %end, "running startup window");
            let pipeline = state.pipeline();
            let summary = process_range(&pipeline, start, end);
            info!(
                total = summary.total,
                written = summary.written,
                no_data = summary.no_data,
                failed = summary.failed,
                "startup window finished"
            );
        }
    }
}

/// Interpret the raw variable pair.
///
/// `None` means no window is configured (both variables absent or blank).
/// `Some(Err)` carries the reason a configured window cannot run.
pub fn parse_window(
    start: Option<&str>,
    end: Option<&str>,
) -> Option<Result<(TradeDate, TradeDate), String>> {
    let start = start.map(str::trim).filter(|s| !s.is_empty());
    let end = end.map(str::trim).filter(|s| !s.is_empty());
    let (start, end) = match (start, end) {
        (None, None) => return None,
        (Some(start), Some(end)) => (start, end),
        (Some(_), None) => return Some(Err(format!("{END_DATE_ENV} is not set"))),
        (None, Some(_)) => return Some(Err(format!("{START_DATE_ENV} is not set"))),
    };
    let parsed = TradeDate::parse(start).and_then(|s| TradeDate::parse(end).map(|e| (s, e)));
    let (start, end) = match parsed {
        Ok(pair) => pair,
        Err(e) => return Some(Err(e.to_string())),
    };
    if start > end {
        return Some(Err(format!("start {start} falls after end {end}")));
    }
    Some(Ok((start, end)))
}

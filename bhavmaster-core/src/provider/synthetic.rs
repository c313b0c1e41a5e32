//! Deterministic synthetic snapshot provider.
//!
//! Generates plausible bhav-copy rows without touching the network, for
//! offline runs and tests. Output is a pure function of (seed, date):
//! the RNG is seeded from a BLAKE3 hash of both, with separate streams for
//! the derivatives and spot fetches so call order never matters.
//!
//! The generated data deliberately includes the awkward shapes the pipeline
//! must handle: multiple expiries per symbol, non-futures instruments,
//! symbols missing from the spot file, duplicate spot series rows, and
//! unparseable numeric text.

use super::{BhavProvider, DerivativesRow, FetchError, SpotRow};
use crate::trade_date::TradeDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SYMBOLS: &[&str] = &[
    "RELIANCE",
    "TCS",
    "INFY",
    "HDFCBANK",
    "SBIN",
    "TATAMOTORS",
    "ITC",
    "WIPRO",
];

// Symbols past this index get no spot row, so left-join nulls occur.
const SPOT_COVERED: usize = 6;

const LOT_SIZES: &[u32] = &[250, 175, 400, 550, 750, 550, 1600, 1500];

/// Offline provider with deterministic per-date output.
pub struct SyntheticProvider {
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Symbols every generated derivatives snapshot covers with futures rows.
    pub fn symbols() -> &'static [&'static str] {
        SYMBOLS
    }

    fn rng_for(&self, date: TradeDate, stream: &str) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(date.file_stamp().as_bytes());
        hasher.update(stream.as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    fn check_trading_day(date: TradeDate) -> Result<(), FetchError> {
        if date.is_weekend() {
            return Err(FetchError::NoData { date });
        }
        Ok(())
    }
}

impl BhavProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn derivatives(&self, date: TradeDate) -> Result<Vec<DerivativesRow>, FetchError> {
        Self::check_trading_day(date)?;
        let mut rng = self.rng_for(date, "fo");
        let iso_date = date.as_date().format("%Y-%m-%d").to_string();
        let near_expiry = date.as_date() + chrono::Duration::days(10);
        let far_expiry = date.as_date() + chrono::Duration::days(38);

        let mut rows = Vec::with_capacity(SYMBOLS.len() * 3);
        for (i, symbol) in SYMBOLS.iter().enumerate() {
            let lot = LOT_SIZES[i];
            for expiry in [near_expiry, far_expiry] {
                let price = rng.gen_range(500.0..3000.0_f64);
                let change: i64 = rng.gen_range(-20_000..20_000);
                // Occasional blank change field, as the real files have.
                let change_text = if rng.gen_bool(0.05) {
                    String::new()
                } else {
                    change.to_string()
                };
                rows.push(DerivativesRow {
                    date: iso_date.clone(),
                    symbol: (*symbol).to_string(),
                    expiry_date: expiry.format("%Y-%m-%d").to_string(),
                    open_interest: rng.gen_range(10_000..500_000u64).to_string(),
                    change_in_open_interest: change_text,
                    instrument_name: format!("{symbol}{}FUT", expiry.format("%y%b").to_string().to_uppercase()),
                    total_trading_volume: rng.gen_range(1_000..90_000u64).to_string(),
                    high_price: format!("{:.2}", price * 1.02),
                    low_price: format!("{:.2}", price * 0.97),
                    total_value: format!("{:.2}", price * rng.gen_range(100.0..900.0)),
                    lot_size: lot.to_string(),
                });
            }
            // One option row per symbol; the futures filter must drop it.
            let strike = rng.gen_range(500..3000);
            rows.push(DerivativesRow {
                date: iso_date.clone(),
                symbol: (*symbol).to_string(),
                expiry_date: near_expiry.format("%Y-%m-%d").to_string(),
                open_interest: rng.gen_range(1_000..50_000u64).to_string(),
                change_in_open_interest: rng.gen_range(-5_000..5_000i64).to_string(),
                instrument_name: format!("{symbol}{strike}CE"),
                total_trading_volume: rng.gen_range(100..9_000u64).to_string(),
                high_price: format!("{:.2}", rng.gen_range(5.0..120.0)),
                low_price: format!("{:.2}", rng.gen_range(0.5..5.0)),
                total_value: format!("{:.2}", rng.gen_range(1_000.0..50_000.0)),
                lot_size: lot.to_string(),
            });
        }
        Ok(rows)
    }

    fn spot(&self, date: TradeDate) -> Result<Vec<SpotRow>, FetchError> {
        Self::check_trading_day(date)?;
        let mut rng = self.rng_for(date, "spot");

        let mut rows = Vec::with_capacity(SPOT_COVERED + 1);
        for symbol in &SYMBOLS[..SPOT_COVERED] {
            let close = rng.gen_range(500.0..3000.0_f64);
            let prev = close * rng.gen_range(0.96..1.04);
            rows.push(SpotRow {
                symbol: (*symbol).to_string(),
                series: "EQ".to_string(),
                prev_close: format!("{prev:.2}"),
                close_price: format!("{close:.2}"),
                delivery_percentage: format!("{:.2}", rng.gen_range(10.0..90.0)),
            });
        }
        // Duplicate series row for the first symbol; delivery is published
        // as "-" outside the EQ series.
        rows.push(SpotRow {
            symbol: SYMBOLS[0].to_string(),
            series: "BE".to_string(),
            prev_close: format!("{:.2}", rng.gen_range(500.0..3000.0)),
            close_price: format!("{:.2}", rng.gen_range(500.0..3000.0)),
            delivery_percentage: "-".to_string(),
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> TradeDate {
        TradeDate::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn weekend_is_no_data() {
        let provider = SyntheticProvider::new(7);
        let saturday = date(2025, 2, 1);
        assert!(provider.derivatives(saturday).unwrap_err().is_no_data());
        assert!(provider.spot(saturday).unwrap_err().is_no_data());
    }

    #[test]
    fn same_seed_same_date_is_deterministic() {
        let a = SyntheticProvider::new(42);
        let b = SyntheticProvider::new(42);
        let monday = date(2025, 2, 3);
        assert_eq!(a.derivatives(monday).unwrap(), b.derivatives(monday).unwrap());
        assert_eq!(a.spot(monday).unwrap(), b.spot(monday).unwrap());
    }

    #[test]
    fn different_seeds_differ() {
        let a = SyntheticProvider::new(1);
        let b = SyntheticProvider::new(2);
        let monday = date(2025, 2, 3);
        assert_ne!(a.derivatives(monday).unwrap(), b.derivatives(monday).unwrap());
    }

    #[test]
    fn every_symbol_has_futures_and_options_rows() {
        let provider = SyntheticProvider::new(7);
        let rows = provider.derivatives(date(2025, 2, 3)).unwrap();
        for symbol in SyntheticProvider::symbols() {
            let futs = rows
                .iter()
                .filter(|r| r.symbol == *symbol && r.instrument_name.ends_with("FUT"))
                .count();
            let others = rows
                .iter()
                .filter(|r| r.symbol == *symbol && !r.instrument_name.ends_with("FUT"))
                .count();
            assert_eq!(futs, 2, "{symbol} should carry two expiries");
            assert_eq!(others, 1, "{symbol} should carry one option row");
        }
    }

    #[test]
    fn spot_leaves_some_symbols_uncovered() {
        let provider = SyntheticProvider::new(7);
        let rows = provider.spot(date(2025, 2, 3)).unwrap();
        let covered: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert!(covered.contains(&"RELIANCE"));
        assert!(!covered.contains(&"WIPRO"));
        // Duplicate series rows exist for dedup handling downstream.
        assert!(rows.iter().filter(|r| r.symbol == "RELIANCE").count() > 1);
    }
}

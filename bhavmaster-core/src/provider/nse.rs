//! NSE archive provider.
//!
//! Fetches the UDiFF derivatives bhav copy (a zip holding one CSV) and the
//! full spot bhav copy with delivery data from the NSE archive host. The
//! archive serves 404 for dates with no session, which maps to `NoData`.
//! No retry or backoff: a failed fetch for a date is final.

use super::{BhavProvider, DerivativesRow, FetchError, SpotRow};
use crate::trade_date::TradeDate;
use std::io::{Cursor, Read};
use std::time::Duration;
use tracing::debug;
use zip::ZipArchive;

const ARCHIVE_HOST: &str = "https://nsearchives.nseindia.com";

/// Default request timeout for archive fetches.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// The archive host rejects clients without a browser-like agent string.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Blocking client over the NSE archive host.
pub struct NseProvider {
    client: reqwest::blocking::Client,
}

impl NseProvider {
    pub fn new() -> Self {
        Self::with_options(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    pub fn with_options(timeout: Duration, user_agent: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }

    /// Zip member name doubles as the archive basename.
    fn derivatives_member(date: TradeDate) -> String {
        format!(
            "BhavCopy_NSE_FO_0_0_0_{}_F_0000.csv",
            date.as_date().format("%Y%m%d")
        )
    }

    fn derivatives_url(date: TradeDate) -> String {
        format!(
            "{ARCHIVE_HOST}/content/fo/{}.zip",
            Self::derivatives_member(date)
        )
    }

    fn spot_url(date: TradeDate) -> String {
        format!(
            "{ARCHIVE_HOST}/products/content/sec_bhavdata_full_{}.csv",
            date.as_date().format("%d%m%Y")
        )
    }

    /// GET a URL; 404 means the exchange published nothing for the date.
    fn get_bytes(&self, url: &str, date: TradeDate) -> Result<Vec<u8>, FetchError> {
        debug!(%url, "fetching bhav copy");
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NoData { date });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.bytes()?.to_vec())
    }
}

impl Default for NseProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract one named CSV member from an in-memory zip archive.
fn unzip_member(bytes: Vec<u8>, member: &str) -> Result<String, FetchError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut file = archive.by_name(member)?;
    let mut buffer = String::with_capacity(file.size() as usize);
    file.read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn parse_derivatives_csv(buffer: &str) -> Result<Vec<DerivativesRow>, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(buffer.as_bytes());
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

/// The spot file pads headers and fields with spaces; trim everything.
fn parse_spot_csv(bytes: &[u8]) -> Result<Vec<SpotRow>, FetchError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes);
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

impl BhavProvider for NseProvider {
    fn name(&self) -> &str {
        "nse_archives"
    }

    fn derivatives(&self, date: TradeDate) -> Result<Vec<DerivativesRow>, FetchError> {
        let bytes = self.get_bytes(&Self::derivatives_url(date), date)?;
        let buffer = unzip_member(bytes, &Self::derivatives_member(date))?;
        let rows = parse_derivatives_csv(&buffer)?;
        debug!(date = %date, rows = rows.len(), "derivatives bhav copy parsed");
        Ok(rows)
    }

    fn spot(&self, date: TradeDate) -> Result<Vec<SpotRow>, FetchError> {
        let bytes = self.get_bytes(&Self::spot_url(date), date)?;
        let rows = parse_spot_csv(&bytes)?;
        debug!(date = %date, rows = rows.len(), "spot bhav copy parsed");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn date(y: i32, m: u32, d: u32) -> TradeDate {
        TradeDate::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn url_stamps_match_archive_layout() {
        let d = date(2025, 2, 3);
        assert_eq!(
            NseProvider::derivatives_url(d),
            "https://nsearchives.nseindia.com/content/fo/BhavCopy_NSE_FO_0_0_0_20250203_F_0000.csv.zip"
        );
        assert_eq!(
            NseProvider::spot_url(d),
            "https://nsearchives.nseindia.com/products/content/sec_bhavdata_full_03022025.csv"
        );
    }

    #[test]
    fn derivatives_csv_ignores_extra_columns() {
        // UDiFF files carry dozens of columns; only the renamed ones matter.
        let csv = "\
TradDt,BizDt,Sgmt,TckrSymb,XpryDt,FinInstrmNm,OpnIntrst,ChngInOpnIntrst,TtlTradgVol,HghPric,LwPric,TtlTrfVal,NewBrdLotQty
2025-02-03,2025-02-03,FO,RELIANCE,2025-02-27,RELIANCE25FEBFUT,1000,50,200,1305.5,1280.0,50000.25,250
2025-02-03,2025-02-03,FO,RELIANCE,2025-02-27,RELIANCE25FEBCE,400,10,90,30.5,22.0,900.0,250
";
        let rows = parse_derivatives_csv(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "RELIANCE");
        assert_eq!(rows[0].instrument_name, "RELIANCE25FEBFUT");
        assert_eq!(rows[0].open_interest, "1000");
        assert_eq!(rows[1].instrument_name, "RELIANCE25FEBCE");
    }

    #[test]
    fn spot_csv_trims_padded_fields() {
        let csv = "\
SYMBOL, SERIES, DATE1, PREV_CLOSE, OPEN_PRICE, CLOSE_PRICE, DELIV_PER
RELIANCE, EQ, 03-Feb-2025, 1290.10, 1291.00, 1300.45, 54.32
RELIANCE, BL, 03-Feb-2025, 1290.10, 1291.00, 1299.00, -
";
        let rows = parse_spot_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "RELIANCE");
        assert_eq!(rows[0].series, "EQ");
        assert_eq!(rows[0].close_price, "1300.45");
        // Unparseable delivery marker survives as text for the coercion step.
        assert_eq!(rows[1].delivery_percentage, "-");
    }

    #[test]
    fn unzip_member_round_trip() {
        let mut zipped = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut zipped));
            writer
                .start_file("inner.csv", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"a,b\n1,2\n").unwrap();
            writer.finish().unwrap();
        }
        let text = unzip_member(zipped, "inner.csv").unwrap();
        assert_eq!(text, "a,b\n1,2\n");
    }

    #[test]
    fn unzip_missing_member_is_archive_error() {
        let mut zipped = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut zipped));
            writer
                .start_file("other.csv", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"x\n").unwrap();
            writer.finish().unwrap();
        }
        let err = unzip_member(zipped, "inner.csv").unwrap_err();
        assert!(matches!(err, FetchError::Archive(_)));
    }
}

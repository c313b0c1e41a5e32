//! Command-line interface for the bhav-copy master-data pipeline.
//!
//! Commands:
//! - `process`: build `Masterdata_<DDMMYYYY>.csv` files for a single trade
//!   date or an inclusive date range, against the NSE archives or the
//!   deterministic synthetic feed.

use std::path::PathBuf;

use anyhow::{bail, Result};
use bhavmaster_core::{
    process_range, BhavProvider, DateOutcome, DateStatus, MasterPipeline, NseProvider,
    OutputStore, SyntheticProvider, TradeDate,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bhavmaster", about = "Daily NSE bhav-copy master-data builder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, join, and aggregate bhav copies into master-data files.
    Process {
        /// Single trade date, DD-MM-YYYY.
        #[arg(long)]
        date: Option<String>,

        /// First date of an inclusive range, DD-MM-YYYY.
        #[arg(long)]
        start: Option<String>,

        /// Last date of an inclusive range, DD-MM-YYYY.
        #[arg(long)]
        end: Option<String>,

        /// Directory the master-data files are written into.
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,

        /// Symbol-to-sector lookup file.
        #[arg(long, default_value = "sectors.csv")]
        sectors: PathBuf,

        /// Use the deterministic synthetic feed instead of the NSE archives.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bhavmaster_core=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Process {
            date,
            start,
            end,
            out_dir,
            sectors,
            synthetic,
        } => run_process(date, start, end, out_dir, sectors, synthetic),
    }
}

/// The dates a `process` invocation covers.
enum Window {
    Single(TradeDate),
    Range(TradeDate, TradeDate),
}

/// Validate the date flags before anything touches the filesystem.
fn resolve_window(
    date: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Window> {
    match (date, start, end) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
            bail!("--date and --start/--end are mutually exclusive")
        }
        (Some(date), None, None) => Ok(Window::Single(TradeDate::parse(date)?)),
        (None, Some(start), Some(end)) => {
            let start = TradeDate::parse(start)?;
            let end = TradeDate::parse(end)?;
            if start > end {
                bail!("start date {start} falls after end date {end}");
            }
            Ok(Window::Range(start, end))
        }
        (None, Some(_), None) | (None, None, Some(_)) => {
            bail!("--start and --end must be given together")
        }
        (None, None, None) => bail!("one of --date or --start/--end is required"),
    }
}

fn run_process(
    date: Option<String>,
    start: Option<String>,
    end: Option<String>,
    out_dir: PathBuf,
    sectors: PathBuf,
    synthetic: bool,
) -> Result<()> {
    let window = resolve_window(date.as_deref(), start.as_deref(), end.as_deref())?;

    let provider: Box<dyn BhavProvider> = if synthetic {
        Box::new(SyntheticProvider::new(0))
    } else {
        Box::new(NseProvider::new())
    };
    let store = OutputStore::create(&out_dir)?;
    let pipeline = MasterPipeline::new(provider.as_ref(), &sectors, &store);

    match window {
        Window::Single(date) => match pipeline.process_date(date)? {
            DateOutcome::Written(file) => {
                println!("{date}: wrote {} ({} rows)", file.filename, file.rows);
            }
            DateOutcome::NoTradingData => {
                println!("{date}: no trading data published");
            }
        },
        Window::Range(start, end) => {
            let summary = process_range(&pipeline, start, end);
            for report in &summary.dates {
                match &report.status {
                    DateStatus::Written { filename, rows } => {
                        println!("{}: wrote {filename} ({rows} rows)", report.date);
                    }
                    DateStatus::NoTradingData => {
                        println!("{}: no trading data published", report.date);
                    }
                    DateStatus::Failed { error } => {
                        eprintln!("{}: failed: {error}", report.date);
                    }
                }
            }
            println!(
                "\n{} dates: {} written, {} without trading data, {} failed",
                summary.total, summary.written, summary.no_data, summary.failed
            );
            if !summary.all_succeeded() {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

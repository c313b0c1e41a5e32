//! HTTP facade over the bhav-copy master pipeline.
//!
//! Routes:
//! - `GET /process` runs the pipeline over an inclusive date range
//! - `GET|POST /process/date` runs a single trade date
//! - `GET /files` lists written master files
//! - `GET /files/{filename}` downloads one master file
//! - `GET /health` reports service identity and output-file count
//!
//! The pipeline is blocking; handlers push each run onto a blocking worker
//! thread and stay async only at the HTTP edge.

pub mod config;
pub mod routes;
pub mod startup;
pub mod state;

pub use config::AppConfig;
pub use routes::router;
pub use state::AppState;

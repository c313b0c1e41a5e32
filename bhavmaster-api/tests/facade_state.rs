//! Integration tests wiring configuration, state, and the pipeline together.

use bhavmaster_api::config::AppConfig;
use bhavmaster_api::state::AppState;
use bhavmaster_core::{DateOutcome, SyntheticProvider, TradeDate};

#[test]
fn state_creates_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        data_dir: dir.path().join("out"),
        sectors_file: dir.path().join("sectors.csv"),
        ..AppConfig::default()
    };

    let state = AppState::from_config(&config).unwrap();
    assert!(config.data_dir.is_dir());
    assert_eq!(state.store().list().unwrap().len(), 0);
}

#[test]
fn synthetic_run_through_state_writes_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        data_dir: dir.path().join("out"),
        sectors_file: dir.path().join("sectors.csv"),
        ..AppConfig::default()
    };
    std::fs::write(&config.sectors_file, "Symbol,Sector\nRELIANCE,Energy\n").unwrap();

    let state = AppState::from_config(&config)
        .unwrap()
        .with_provider(Box::new(SyntheticProvider::new(11)));

    // A Monday, so the synthetic feed publishes data.
    let date = TradeDate::parse("03-02-2025").unwrap();
    let outcome = state.pipeline().process_date(date).unwrap();
    let DateOutcome::Written(file) = outcome else {
        panic!("expected a written master file");
    };
    assert_eq!(file.filename, "Masterdata_03022025.csv");
    assert_eq!(
        state.store().list().unwrap(),
        vec!["Masterdata_03022025.csv".to_string()]
    );
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bhavmaster.toml");
    std::fs::write(
        &path,
        "bind = \"0.0.0.0:8080\"\ndata_dir = \"output\"\n\n[provider]\ntimeout_secs = 5\n",
    )
    .unwrap();

    let config = AppConfig::from_file(&path).unwrap();
    assert_eq!(config.bind, "0.0.0.0:8080");
    assert_eq!(config.data_dir, std::path::PathBuf::from("output"));
    assert_eq!(config.sectors_file, std::path::PathBuf::from("sectors.csv"));
    assert_eq!(config.provider.timeout_secs, 5);

    let err = AppConfig::from_file(&dir.path().join("missing.toml")).unwrap_err();
    assert!(err.to_string().contains("missing.toml"));
}

//! Focused unit tests covering import CLI configuration validation.

use super::*;
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path).expect("utf-8 path")
}

#[rstest]
fn converting_without_osm_pbf_errors() {
    let args = ImportArgs {
        database: Some(Utf8PathBuf::from("out.db")),
        ..ImportArgs::default()
    };
    let err = ImportConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_OSM_PBF);
            assert_eq!(env, ENV_OSM_PBF);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn converting_applies_defaults() {
    let args = ImportArgs {
        osm_pbf: Some(Utf8PathBuf::from("bandung.osm.pbf")),
        ..ImportArgs::default()
    };
    let config = ImportConfig::try_from(args).expect("defaults should apply");
    assert_eq!(config.database, Utf8PathBuf::from(DEFAULT_DATABASE));
    assert_eq!(config.log_level, LevelFilter::Info);
}

#[rstest]
#[case("debug", LevelFilter::Debug)]
#[case("WARN", LevelFilter::Warn)]
#[case("off", LevelFilter::Off)]
fn converting_parses_log_levels(#[case] raw: &str, #[case] expected: LevelFilter) {
    let args = ImportArgs {
        osm_pbf: Some(Utf8PathBuf::from("bandung.osm.pbf")),
        log_level: Some(raw.to_owned()),
        ..ImportArgs::default()
    };
    let config = ImportConfig::try_from(args).expect("valid level");
    assert_eq!(config.log_level, expected);
}

#[rstest]
fn converting_rejects_unknown_log_level() {
    let args = ImportArgs {
        osm_pbf: Some(Utf8PathBuf::from("bandung.osm.pbf")),
        log_level: Some("chatty".to_owned()),
        ..ImportArgs::default()
    };
    let err = ImportConfig::try_from(args).expect_err("unknown level should error");
    match err {
        CliError::InvalidLogLevel { value } => assert_eq!(value, "chatty"),
        other => panic!("expected InvalidLogLevel, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_missing_files() {
    let tmp = TempDir::new().expect("tempdir");
    let config = ImportConfig {
        osm_pbf: utf8(tmp.path().join("missing.osm.pbf")),
        database: utf8(tmp.path().join("out.db")),
        log_level: LevelFilter::Info,
    };
    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_OSM_PBF),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn validate_sources_rejects_directories() {
    let dir = TempDir::new().expect("tempdir");
    let config = ImportConfig {
        osm_pbf: utf8(dir.path().to_path_buf()),
        database: utf8(dir.path().join("out.db")),
        log_level: LevelFilter::Info,
    };
    let err = config
        .validate_sources()
        .expect_err("expected directory rejection");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_OSM_PBF),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn validate_sources_accepts_existing_file() {
    let dir = TempDir::new().expect("tempdir");
    let osm = dir.path().join("planet.osm.pbf");
    fs::write(&osm, b"osm").expect("write osm placeholder");
    let config = ImportConfig {
        osm_pbf: utf8(osm),
        database: utf8(dir.path().join("out.db")),
        log_level: LevelFilter::Info,
    };
    config.validate_sources().expect("existing file passes");
}

#[rstest]
fn parsing_requires_a_subcommand() {
    let err = Cli::try_parse_from(["waysplit"]).expect_err("subcommand is required");
    assert!(matches!(
        err.kind(),
        clap::error::ErrorKind::MissingSubcommand
            | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    ));
}

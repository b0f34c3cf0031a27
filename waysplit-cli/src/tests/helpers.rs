//! Test helpers for composing import datasets and layered overrides.

use super::*;
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Clone, Default)]
pub(super) struct LayerOverrides {
    pub(super) osm_pbf: Option<Utf8PathBuf>,
    pub(super) database: Option<Utf8PathBuf>,
    pub(super) log_level: Option<String>,
}

#[derive(Debug)]
pub(super) struct DatasetFiles {
    dir: TempDir,
    cli_osm: Utf8PathBuf,
    config_osm: Utf8PathBuf,
}

impl DatasetFiles {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let cli_osm = workspace_path(&dir, "cli.osm.pbf");
        let config_osm = workspace_path(&dir, "config.osm.pbf");
        for path in [&cli_osm, &config_osm] {
            fs::write(path, b"dataset contents").expect("write dataset file");
        }
        Self {
            dir,
            cli_osm,
            config_osm,
        }
    }

    pub(super) fn osm(&self) -> &Utf8Path {
        &self.cli_osm
    }

    pub(super) fn config_osm(&self) -> &Utf8Path {
        &self.config_osm
    }

    pub(super) fn config_database(&self) -> Utf8PathBuf {
        workspace_path(&self.dir, "config.db")
    }

    pub(super) fn env_database(&self) -> Utf8PathBuf {
        workspace_path(&self.dir, "env.db")
    }
}

pub(super) fn workspace_path(dir: &TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf-8 path")
}

pub(super) fn merge_layers(
    mut cli_args: ImportArgs,
    file_layer: Option<LayerOverrides>,
    env_layer: Option<LayerOverrides>,
) -> Result<ImportConfig, CliError> {
    merge_field(
        &mut cli_args.osm_pbf,
        extract_field(&env_layer, |layer| &layer.osm_pbf),
        extract_field(&file_layer, |layer| &layer.osm_pbf),
    );
    merge_field(
        &mut cli_args.database,
        extract_field(&env_layer, |layer| &layer.database),
        extract_field(&file_layer, |layer| &layer.database),
    );
    merge_field(
        &mut cli_args.log_level,
        extract_field(&env_layer, |layer| &layer.log_level),
        extract_field(&file_layer, |layer| &layer.log_level),
    );
    resolve_import_config(cli_args)
}

fn merge_field<T: Clone>(target: &mut Option<T>, env_value: Option<T>, file_value: Option<T>) {
    if target.is_none()
        && let Some(value) = env_value.or(file_value)
    {
        *target = Some(value);
    }
}

fn extract_field<T: Clone>(
    layer: &Option<LayerOverrides>,
    accessor: fn(&LayerOverrides) -> &Option<T>,
) -> Option<T> {
    layer.as_ref().and_then(|entry| accessor(entry).clone())
}

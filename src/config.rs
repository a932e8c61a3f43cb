// src/config.rs
//! Run configuration, read once from YAML at startup.

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::error::{EtlError, Result};
use crate::process::DEFAULT_YEAR_COLUMN;
use crate::schema::Schema;

pub const DEFAULT_DATE_COLUMN: &str = "Date of birth";
pub const QUALITY_METRICS_DIR: &str = "quality_metrics";

/// Which side of the transform a quality snapshot was taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snapshot {
    Raw,
    Processed,
}

impl Snapshot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Snapshot::Raw => "raw",
            Snapshot::Processed => "processed",
        }
    }
}

fn default_date_column() -> String {
    DEFAULT_DATE_COLUMN.to_string()
}

fn default_year_column() -> String {
    DEFAULT_YEAR_COLUMN.to_string()
}

fn default_logs() -> PathBuf {
    PathBuf::from("logs")
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Source file stems; `inputs/<stem>.csv` is read for each.
    pub csv_files: Vec<String>,
    pub inputs: PathBuf,
    pub temp: PathBuf,
    pub outputs: PathBuf,
    /// Declared columns, in file order.
    pub variables: Schema,
    #[serde(default)]
    pub uppercase: Vec<String>,
    #[serde(default)]
    pub remove_columns: Vec<String>,
    #[serde(default)]
    pub cols_to_hash: Vec<String>,
    /// A salt file, or a directory holding `salt.txt`.
    pub salt: PathBuf,
    pub output_asset_name: String,
    #[serde(default)]
    pub partition_columns: Vec<String>,

    #[serde(default = "default_date_column")]
    pub date_column: String,
    #[serde(default = "default_year_column")]
    pub year_column: String,
    #[serde(default)]
    pub special_characters: Vec<String>,
    #[serde(default = "default_logs")]
    pub logs: PathBuf,
    #[serde(default)]
    pub metrics_dir: Option<PathBuf>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_err = |reason: String| EtlError::ConfigLoad {
            path: path.to_path_buf(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let cfg: Config = serde_yaml::from_str(&text).map_err(|e| load_err(e.to_string()))?;
        cfg.validate().map_err(load_err)?;
        info!(
            path = %path.display(),
            files = cfg.csv_files.len(),
            variables = cfg.variables.len(),
            "loaded config"
        );
        Ok(cfg)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.csv_files.is_empty() {
            return Err("csv_files is empty".into());
        }
        if let Some(blank) = self.csv_files.iter().find(|f| f.trim().is_empty()) {
            return Err(format!("csv_files contains a blank entry `{}`", blank));
        }
        if self.output_asset_name.trim().is_empty() {
            return Err("output_asset_name is empty".into());
        }
        Ok(())
    }

    pub fn input_csv(&self, file: &str) -> PathBuf {
        self.inputs.join(format!("{}.csv", file))
    }

    /// Intermediate table of `file`, rewritten by every stage.
    pub fn temp_parquet(&self, file: &str) -> PathBuf {
        self.temp.join(format!("{}.parquet", file))
    }

    pub fn metrics_path(&self, snapshot: Snapshot, file: &str) -> PathBuf {
        let root = self.metrics_dir.as_ref().unwrap_or(&self.temp);
        root.join(QUALITY_METRICS_DIR)
            .join(snapshot.as_str())
            .join(format!("{}_{}.parquet", file, snapshot.as_str()))
    }

    /// Final artifact for a run stamped `timestamp` (`YYYYMMDD_HHMMSS`).
    pub fn output_path(&self, timestamp: &str) -> PathBuf {
        self.outputs
            .join(format!("{}_{}.parquet", self.output_asset_name, timestamp))
    }
}

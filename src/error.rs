// src/error.rs

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use std::path::PathBuf;
use thiserror::Error;

/// Every failure the transformation engine can raise.
///
/// Name and type mismatches against a declared schema are not errors; the
/// validators report them as `false` and leave the decision to the caller.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("column count mismatch: expected {expected}, found {found}")]
    SchemaCountMismatch { expected: usize, found: usize },

    #[error("column `{column}` row {row}: cannot parse `{value}` as a date")]
    DateParse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("config {}: {reason}", .path.display())]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("column `{0}` not found")]
    ColumnNotFound(String),

    #[error("partition column `{0}` not found")]
    PartitionColumnMissing(String),

    #[error("table #{index} does not share the schema of table #0")]
    SchemaDivergence { index: usize },

    #[error("no tables to combine")]
    NothingToCombine,

    #[error("salt: {0}")]
    Salt(String),

    #[error("write {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Arrow(#[from] ArrowError),

    #[error(transparent)]
    Parquet(#[from] ParquetError),
}

pub type Result<T, E = EtlError> = std::result::Result<T, E>;

// src/output/mod.rs

use arrow::{
    array::{Array, ArrayRef, UInt64Array},
    compute::{concat_batches, take},
    record_batch::RecordBatch,
};
use rayon::prelude::*;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::error::{EtlError, Result};
use crate::process::utils::{as_text, remove_columns};
use crate::storage::write_parquet;

/// Directory value used for a null partition key.
pub const NULL_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Name of the data file inside each partition directory.
pub const FRAGMENT_NAME: &str = "part-0.parquet";

/// Stack `tables` row-wise, in order.
///
/// All inputs must share the first table's schema; nothing is aligned or
/// reconciled here.
pub fn combine(tables: &[RecordBatch]) -> Result<RecordBatch> {
    let first = tables.first().ok_or(EtlError::NothingToCombine)?;
    let schema = first.schema();
    for (index, t) in tables.iter().enumerate().skip(1) {
        if t.schema().fields() != schema.fields() {
            return Err(EtlError::SchemaDivergence { index });
        }
    }
    let combined = concat_batches(&schema, tables)?;
    info!(
        tables = tables.len(),
        rows = combined.num_rows(),
        "combined tables"
    );
    Ok(combined)
}

/// One path segment for a partition value, percent-encoded.
fn escape_partition_value(value: &str) -> String {
    let encoded = urlencoding::encode(value).into_owned();
    // "." and ".." would step out of the partition directory
    if encoded.chars().all(|c| c == '.') {
        encoded.replace('.', "%2E")
    } else {
        encoded
    }
}

/// Group row indices by the rendered `col=value/...` directory they belong to.
fn partition_rows(batch: &RecordBatch, key_idx: &[usize], names: &[String]) -> Result<BTreeMap<PathBuf, Vec<u64>>> {
    let keys = key_idx
        .iter()
        .map(|&i| as_text(batch.column(i)))
        .collect::<Result<Vec<_>>>()?;

    let mut groups: BTreeMap<PathBuf, Vec<u64>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let mut dir = PathBuf::new();
        for (name, key) in names.iter().zip(&keys) {
            let value = if key.is_null(row) {
                NULL_PARTITION.to_string()
            } else {
                escape_partition_value(key.value(row))
            };
            dir.push(format!("{}={}", name, value));
        }
        groups.entry(dir).or_default().push(row as u64);
    }
    Ok(groups)
}

fn write_fragment(data: &RecordBatch, rows: &[u64], dir: &Path) -> Result<()> {
    let indices = UInt64Array::from(rows.to_vec());
    let cols = data
        .columns()
        .iter()
        .map(|c| take(c.as_ref(), &indices, None))
        .collect::<std::result::Result<Vec<ArrayRef>, _>>()?;
    let fragment = RecordBatch::try_new(data.schema(), cols)?;
    write_parquet(&fragment, dir.join(FRAGMENT_NAME))?;
    debug!(dir = %dir.display(), rows = rows.len(), "wrote partition");
    Ok(())
}

fn write_error(path: &Path, err: impl std::fmt::Display) -> EtlError {
    EtlError::Write {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Write `batch` as Parquet at `output_path`.
///
/// Without partition columns this is a single file. Otherwise `output_path`
/// becomes a directory in Hive layout (`<col>=<value>/.../part-0.parquet`),
/// and the partition columns are carried by the directory names only.
pub fn persist(batch: &RecordBatch, output_path: impl AsRef<Path>, partition_columns: &[String]) -> Result<()> {
    let output_path = output_path.as_ref();

    if partition_columns.is_empty() {
        write_parquet(batch, output_path).map_err(|e| write_error(output_path, e))?;
        info!(path = %output_path.display(), rows = batch.num_rows(), "saved output");
        return Ok(());
    }

    let schema = batch.schema();
    let key_idx = partition_columns
        .iter()
        .map(|name| {
            schema
                .index_of(name)
                .map_err(|_| EtlError::PartitionColumnMissing(name.clone()))
        })
        .collect::<Result<Vec<usize>>>()?;
    if key_idx.len() >= batch.num_columns() {
        return Err(write_error(
            output_path,
            "every column is a partition column; no data columns left",
        ));
    }

    let groups = partition_rows(batch, &key_idx, partition_columns)?;
    let data = remove_columns(batch, &key_idx)?;

    fs::create_dir_all(output_path).map_err(|e| write_error(output_path, e))?;
    groups
        .par_iter()
        .try_for_each(|(rel, rows)| {
            let dir = output_path.join(rel);
            write_fragment(&data, rows, &dir).map_err(|e| write_error(&dir, e))
        })?;

    info!(
        path = %output_path.display(),
        rows = batch.num_rows(),
        partitions = groups.len(),
        "saved partitioned output"
    );
    Ok(())
}

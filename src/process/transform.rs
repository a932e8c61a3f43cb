use crate::error::{EtlError, Result};
use crate::process::{
    date_parser::parse_date,
    salt::Salt,
    utils::{as_text, column_index, remove_columns, upsert_column},
};
use arrow::{
    array::{Array, ArrayRef, Int64Builder, StringArray},
    compute::cast,
    datatypes::DataType,
    record_batch::RecordBatch,
};
use chrono::Datelike;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

/// Name given to the derived year column unless the caller picks another.
pub const DEFAULT_YEAR_COLUMN: &str = "Year of birth";

/// Provenance column written by [`tag_source`].
pub const SOURCE_COLUMN: &str = "source_file";

/// Suffix of the digest column that replaces a hashed column.
pub const HASHED_SUFFIX: &str = "_hashed";

/// Add `output_name` holding the calendar year of `date_column`.
///
/// All-or-nothing: one unparseable value fails the whole table.
pub fn derive_year(batch: &RecordBatch, date_column: &str, output_name: &str) -> Result<RecordBatch> {
    let idx = column_index(batch, date_column)?;
    let col = batch.column(idx);

    // native date/timestamp columns go through Arrow's own rendering
    let text = match col.data_type() {
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            as_text(&cast(col, &DataType::Date32)?)?
        }
        _ => as_text(col)?,
    };

    let mut years = Int64Builder::with_capacity(text.len());
    for (row, opt) in text.iter().enumerate() {
        match opt {
            None => years.append_null(),
            Some(raw) => {
                let date = parse_date(raw).ok_or_else(|| EtlError::DateParse {
                    column: date_column.to_string(),
                    row,
                    value: raw.to_string(),
                })?;
                years.append_value(i64::from(date.year()));
            }
        }
    }

    upsert_column(batch, output_name, Arc::new(years.finish()) as ArrayRef)
}

/// Drop every listed column that exists; unknown names are ignored.
pub fn drop_columns(batch: &RecordBatch, names: &[String]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let drop: Vec<usize> = names
        .iter()
        .filter_map(|n| schema.index_of(n).ok())
        .collect();
    if drop.is_empty() {
        return Ok(batch.clone());
    }
    debug!(dropped = drop.len(), "dropping columns");
    remove_columns(batch, &drop)
}

/// Hex SHA-256 of `value` followed by the salt.
pub fn salted_digest(value: &str, salt: &Salt) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.update(salt.expose().as_bytes());
    hex::encode(hasher.finalize())
}

/// Replace each listed column by `<name>_hashed`, a salted SHA-256 digest of
/// its text. The original column is removed; nulls stay null.
pub fn hash_columns(batch: &RecordBatch, names: &[String], salt: &Salt) -> Result<RecordBatch> {
    let mut out = batch.clone();
    for name in names {
        let idx = column_index(&out, name)?;
        let text = as_text(out.column(idx))?;
        let hashed: StringArray = text
            .iter()
            .map(|opt| opt.map(|v| salted_digest(v, salt)))
            .collect();
        out = upsert_column(
            &out,
            &format!("{}{}", name, HASHED_SUFFIX),
            Arc::new(hashed) as ArrayRef,
        )?;
        out = remove_columns(&out, &[idx])?;
    }
    Ok(out)
}

/// Set `source_file` to `label` on every row, adding the column if needed.
pub fn tag_source(batch: &RecordBatch, label: &str) -> Result<RecordBatch> {
    let tags = StringArray::from(vec![label; batch.num_rows()]);
    upsert_column(batch, SOURCE_COLUMN, Arc::new(tags) as ArrayRef)
}

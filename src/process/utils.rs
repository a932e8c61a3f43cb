use arrow::{
    array::{Array, ArrayRef, Float32Array, Float64Array, StringArray},
    compute::cast,
    datatypes::{DataType, Field, FieldRef, Schema},
    record_batch::{RecordBatch, RecordBatchOptions},
};
use std::sync::Arc;

use crate::error::{EtlError, Result};

/// Textual rendering of a missing value wherever one is needed (length stats).
pub const NULL_TEXT: &str = "NaN";

/// Position of `name` in `batch`, or `ColumnNotFound`.
pub fn column_index(batch: &RecordBatch, name: &str) -> Result<usize> {
    batch
        .schema()
        .index_of(name)
        .map_err(|_| EtlError::ColumnNotFound(name.to_string()))
}

/// Render any column as Utf8, nulls preserved.
pub fn as_text(arr: &ArrayRef) -> Result<StringArray> {
    let utf8 = cast(arr, &DataType::Utf8)?;
    let sarr = utf8
        .as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| {
            arrow::error::ArrowError::CastError(format!(
                "{:?} did not cast to a string array",
                arr.data_type()
            ))
        })?;
    Ok(sarr)
}

/// Map the text of every non-null value through `f`.
pub fn map_text<F>(arr: &ArrayRef, f: F) -> Result<ArrayRef>
where
    F: Fn(&str) -> String,
{
    let sarr = as_text(arr)?;
    let mapped: StringArray = sarr.iter().map(|opt| opt.map(&f)).collect();
    Ok(Arc::new(mapped) as ArrayRef)
}

/// Null or floating-point NaN.
pub fn is_missing(arr: &dyn Array, row: usize) -> bool {
    if arr.is_null(row) {
        return true;
    }
    match arr.data_type() {
        DataType::Float64 => arr
            .as_any()
            .downcast_ref::<Float64Array>()
            .is_some_and(|a| a.value(row).is_nan()),
        DataType::Float32 => arr
            .as_any()
            .downcast_ref::<Float32Array>()
            .is_some_and(|a| a.value(row).is_nan()),
        _ => false,
    }
}

fn rebuild(fields: Vec<FieldRef>, cols: Vec<ArrayRef>, num_rows: usize) -> Result<RecordBatch> {
    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), cols, &options)
        .map_err(Into::into)
}

/// New batch with column `idx` swapped for `arr`; the field type follows `arr`.
pub fn replace_column(batch: &RecordBatch, idx: usize, arr: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
    let mut cols = batch.columns().to_vec();
    let name = fields[idx].name().clone();
    fields[idx] = Arc::new(Field::new(name, arr.data_type().clone(), true));
    cols[idx] = arr;
    rebuild(fields, cols, batch.num_rows())
}

/// Overwrite `name` in place if present, otherwise append it.
pub fn upsert_column(batch: &RecordBatch, name: &str, arr: ArrayRef) -> Result<RecordBatch> {
    if let Ok(idx) = batch.schema().index_of(name) {
        return replace_column(batch, idx, arr);
    }
    let schema = batch.schema();
    let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
    let mut cols = batch.columns().to_vec();
    fields.push(Arc::new(Field::new(name, arr.data_type().clone(), true)));
    cols.push(arr);
    rebuild(fields, cols, batch.num_rows())
}

/// New batch without the columns at `drop` (indices into `batch`).
pub fn remove_columns(batch: &RecordBatch, drop: &[usize]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let (fields, cols): (Vec<FieldRef>, Vec<ArrayRef>) = schema
        .fields()
        .iter()
        .cloned()
        .zip(batch.columns().iter().cloned())
        .enumerate()
        .filter(|(i, _)| !drop.contains(i))
        .map(|(_, pair)| pair)
        .unzip();
    rebuild(fields, cols, batch.num_rows())
}

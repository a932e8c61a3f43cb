use crate::error::Result;
use crate::schema::{map_to_arrow_type, ColumnType};
use arrow::{
    array::{Array, ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringArray},
    datatypes::{Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Narrowest type every non-null value of a text column parses as.
///
/// Int64 → Float64 → Boolean → String. A column with rows but no values is
/// Float64, the way a missing numeric column comes out of a CSV reader; an
/// empty column stays String.
pub fn infer_column_type(sarr: &StringArray) -> ColumnType {
    if sarr.is_empty() {
        return ColumnType::String;
    }
    let mut values = sarr.iter().flatten().map(str::trim).peekable();
    if values.peek().is_none() {
        return ColumnType::Float64;
    }
    let values: Vec<&str> = values.collect();
    if values.iter().all(|v| v.parse::<i64>().is_ok()) {
        ColumnType::Int64
    } else if values.iter().all(|v| v.parse::<f64>().is_ok()) {
        ColumnType::Float64
    } else if values.iter().all(|v| parse_bool(v).is_some()) {
        ColumnType::Boolean
    } else {
        ColumnType::String
    }
}

fn convert_column(sarr: &StringArray, ty: ColumnType) -> ArrayRef {
    match ty {
        ColumnType::Int64 => {
            let mut b = Int64Builder::with_capacity(sarr.len());
            for opt in sarr.iter() {
                b.append_option(opt.and_then(|s| s.trim().parse().ok()));
            }
            Arc::new(b.finish())
        }
        ColumnType::Float64 => {
            let mut b = Float64Builder::with_capacity(sarr.len());
            for opt in sarr.iter() {
                b.append_option(opt.and_then(|s| s.trim().parse().ok()));
            }
            Arc::new(b.finish())
        }
        ColumnType::Boolean => {
            let mut b = BooleanBuilder::with_capacity(sarr.len());
            for opt in sarr.iter() {
                b.append_option(opt.and_then(parse_bool));
            }
            Arc::new(b.finish())
        }
        _ => Arc::new(sarr.clone()),
    }
}

/// Convert an all-Utf8 batch into inferred final types, column by column.
pub fn convert_to_inferred_types(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut out = Vec::with_capacity(batch.num_columns());

    for (arr, fld) in batch.columns().iter().zip(schema.fields()) {
        match arr.as_any().downcast_ref::<StringArray>() {
            Some(sarr) => {
                let ty = infer_column_type(sarr);
                fields.push(Field::new(fld.name(), map_to_arrow_type(ty), true));
                out.push(convert_column(sarr, ty));
            }
            // already typed
            None => {
                fields.push((**fld).clone());
                out.push(arr.clone());
            }
        }
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), out).map_err(Into::into)
}

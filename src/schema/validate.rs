// src/schema/validate.rs

use arrow::record_batch::RecordBatch;
use tracing::{error, info, warn};

use super::arrow::column_type_of;
use super::types::{ColumnType, Schema};
use crate::error::{EtlError, Result};

/// Column names of `batch`, in order.
fn table_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

/// True iff the column names, in order, equal the declared names in order.
pub fn check_names(batch: &RecordBatch, schema: &Schema) -> bool {
    let found = table_names(batch);
    let ok = found.iter().map(String::as_str).eq(schema.names());
    if ok {
        info!("column names align with the declared schema");
    } else {
        let expected: Vec<&str> = schema.names().collect();
        warn!(?expected, ?found, "column names do not align with the declared schema");
    }
    ok
}

/// True iff each column's type equals the declared type at the same position.
///
/// The comparison is positional only, so it says nothing about names; run
/// [`check_names`] alongside it.
pub fn check_types(batch: &RecordBatch, schema: &Schema) -> bool {
    let found: Vec<Option<ColumnType>> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| column_type_of(f.data_type()))
        .collect();
    let ok = found.len() == schema.len()
        && found
            .iter()
            .zip(schema.types())
            .all(|(have, want)| *have == Some(want));
    if ok {
        info!("column types align with the declared schema");
    } else {
        let expected: Vec<ColumnType> = schema.types().collect();
        warn!(?expected, ?found, "column types do not align with the declared schema");
    }
    ok
}

/// Column count must match exactly; anything else is unrecoverable.
pub fn check_count(batch: &RecordBatch, schema: &Schema) -> Result<bool> {
    let expected = schema.len();
    let found = batch.num_columns();
    if expected != found {
        error!(expected, found, "column count mismatch");
        return Err(EtlError::SchemaCountMismatch { expected, found });
    }
    info!(columns = found, "column count matches");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
    use std::sync::Arc;

    fn sample_batch() -> RecordBatch {
        let schema = ArrowSchema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("age", DataType::Int64, true),
            Field::new("date_of_birth", DataType::Utf8, true),
        ]);
        let cols: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec!["Alice", "Bob", "Charlie"])),
            Arc::new(Int64Array::from(vec![25, 30, 35])),
            Arc::new(StringArray::from(vec![
                "1997-01-01",
                "1992-01-01",
                "1987-01-01",
            ])),
        ];
        RecordBatch::try_new(Arc::new(schema), cols).unwrap()
    }

    fn sample_schema() -> Schema {
        Schema::new([
            ("name", ColumnType::String),
            ("age", ColumnType::Int64),
            ("date_of_birth", ColumnType::String),
        ])
    }

    #[test]
    fn names_match_in_order() {
        assert!(check_names(&sample_batch(), &sample_schema()));

        let renamed = Schema::new([
            ("full_name", ColumnType::String),
            ("age", ColumnType::Int64),
            ("dob", ColumnType::String),
        ]);
        assert!(!check_names(&sample_batch(), &renamed));
    }

    #[test]
    fn names_are_order_sensitive() {
        let permuted = Schema::new([
            ("age", ColumnType::Int64),
            ("name", ColumnType::String),
            ("date_of_birth", ColumnType::String),
        ]);
        assert!(!check_names(&sample_batch(), &permuted));
    }

    #[test]
    fn types_compare_positionally() {
        assert!(check_types(&sample_batch(), &sample_schema()));

        let batch = sample_batch();
        let mut cols = batch.columns().to_vec();
        cols[1] = Arc::new(Float64Array::from(vec![25.0, 30.0, 35.0]));
        let schema = ArrowSchema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("age", DataType::Float64, true),
            Field::new("date_of_birth", DataType::Utf8, true),
        ]);
        let floated = RecordBatch::try_new(Arc::new(schema), cols).unwrap();
        assert!(!check_types(&floated, &sample_schema()));
    }

    #[test]
    fn types_fail_on_length_difference() {
        let short = Schema::new([("name", ColumnType::String), ("age", ColumnType::Int64)]);
        assert!(!check_types(&sample_batch(), &short));
    }

    #[test]
    fn count_mismatch_is_an_error() {
        assert!(check_count(&sample_batch(), &sample_schema()).unwrap());

        let batch = sample_batch();
        let trimmed = batch.project(&[0, 1]).unwrap();
        match check_count(&trimmed, &sample_schema()) {
            Err(EtlError::SchemaCountMismatch { expected, found }) => {
                assert_eq!((expected, found), (3, 2));
            }
            other => panic!("expected SchemaCountMismatch, got {:?}", other),
        }
    }
}

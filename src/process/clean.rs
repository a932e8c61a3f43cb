use crate::error::Result;
use crate::process::utils::{column_index, map_text, replace_column};
use arrow::{array::ArrayRef, record_batch::RecordBatch};
use once_cell::sync::Lazy;
use regex::Regex;

static SPECIAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("static regex"));

/// Remove everything but ASCII letters, digits and whitespace from `column`.
/// The column comes back as Utf8 whatever its type was.
pub fn strip_special_characters(batch: &RecordBatch, column: &str) -> Result<RecordBatch> {
    let idx = column_index(batch, column)?;
    let stripped = map_text(batch.column(idx), |s| {
        SPECIAL_CHARS.replace_all(s, "").into_owned()
    })?;
    replace_column(batch, idx, stripped)
}

/// Remove all whitespace, inner and outer, from every value of every column.
pub fn collapse_whitespace(batch: &RecordBatch) -> Result<RecordBatch> {
    let mut out = batch.clone();
    for idx in 0..batch.num_columns() {
        let collapsed: ArrayRef = map_text(batch.column(idx), |s| {
            s.split_whitespace().collect::<String>()
        })?;
        out = replace_column(&out, idx, collapsed)?;
    }
    Ok(out)
}

/// Uppercase the text of each listed column; unlisted columns are untouched.
pub fn uppercase(batch: &RecordBatch, columns: &[String]) -> Result<RecordBatch> {
    let mut out = batch.clone();
    for name in columns {
        let idx = column_index(&out, name)?;
        let upper = map_text(out.column(idx), str::to_uppercase)?;
        out = replace_column(&out, idx, upper)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn strings(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
        batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    fn people() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("age", DataType::Int64, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec![Some("A!lice"), Some("Bo@b"), None])) as ArrayRef,
                Arc::new(Int64Array::from(vec![25, 30, 35])) as ArrayRef,
            ],
        )
        .unwrap()
    }

    #[test]
    fn strips_special_characters() {
        let out = strip_special_characters(&people(), "name").unwrap();
        assert_eq!(
            strings(&out, "name"),
            vec![Some("Alice".into()), Some("Bob".into()), None]
        );
    }

    #[test]
    fn strip_keeps_spaces_and_is_idempotent() {
        let schema = Schema::new(vec![Field::new("addr", DataType::Utf8, true)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec!["12 Main St., #4", "Flat-9 (rear)"])) as ArrayRef],
        )
        .unwrap();
        let once = strip_special_characters(&batch, "addr").unwrap();
        let twice = strip_special_characters(&once, "addr").unwrap();
        assert_eq!(
            strings(&once, "addr"),
            vec![Some("12 Main St 4".into()), Some("Flat9 rear".into())]
        );
        assert_eq!(strings(&once, "addr"), strings(&twice, "addr"));
    }

    #[test]
    fn strip_stringifies_numbers() {
        let out = strip_special_characters(&people(), "age").unwrap();
        assert_eq!(out.schema().field(1).data_type(), &DataType::Utf8);
        assert_eq!(
            strings(&out, "age"),
            vec![Some("25".into()), Some("30".into()), Some("35".into())]
        );
    }

    #[test]
    fn strip_missing_column_errors() {
        let err = strip_special_characters(&people(), "email").unwrap_err();
        assert!(matches!(err, EtlError::ColumnNotFound(c) if c == "email"));
    }

    #[test]
    fn collapses_all_whitespace() {
        let schema = Schema::new(vec![
            Field::new("col1", DataType::Utf8, true),
            Field::new("col2", DataType::Utf8, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec![" A l i c e  "])) as ArrayRef,
                Arc::new(StringArray::from(vec![" B o b "])) as ArrayRef,
            ],
        )
        .unwrap();
        let out = collapse_whitespace(&batch).unwrap();
        assert_eq!(strings(&out, "col1"), vec![Some("Alice".into())]);
        assert_eq!(strings(&out, "col2"), vec![Some("Bob".into())]);
    }

    #[test]
    fn collapse_turns_every_column_into_text() {
        let out = collapse_whitespace(&people()).unwrap();
        for field in out.schema().fields() {
            assert_eq!(field.data_type(), &DataType::Utf8);
        }
        assert_eq!(strings(&out, "name")[2], None);
    }

    #[test]
    fn uppercases_listed_columns_only() {
        let schema = Schema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("city", DataType::Utf8, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec!["alice", "bob", "charlie"])) as ArrayRef,
                Arc::new(StringArray::from(vec!["leeds", "york", "hull"])) as ArrayRef,
            ],
        )
        .unwrap();
        let out = uppercase(&batch, &["name".to_string()]).unwrap();
        assert_eq!(
            strings(&out, "name"),
            vec![
                Some("ALICE".into()),
                Some("BOB".into()),
                Some("CHARLIE".into())
            ]
        );
        assert_eq!(strings(&out, "city"), strings(&batch, "city"));
    }
}

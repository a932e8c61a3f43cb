// src/quality/mod.rs
//! Per-column data-quality profile of a table.
//!
//! Statistics that have no defined value (percentages of an empty table, the
//! spread of a single value, aggregates of a column with no values) are
//! `None` here and null cells in [`QualitySummary::to_record_batch`].

use arrow::{
    array::{Array, ArrayRef, Float64Array, StringArray},
    compute::cast,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use rayon::prelude::*;
use std::{collections::HashSet, sync::Arc};
use tracing::debug;

use crate::error::Result;
use crate::process::utils::{as_text, is_missing, NULL_TEXT};
use crate::schema::is_numeric;

/// Preferred name of the label column of the tabular summary.
pub const METRIC_COLUMN: &str = "metric";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    TotalCount,
    NullCount,
    NullPercentage,
    DistinctCount,
    DistinctPercentage,
    MaxLength,
    MinLength,
    Max,
    Min,
    Mean,
    StdDev,
}

impl Metric {
    /// Rows present for every table.
    pub const BASE: [Metric; 7] = [
        Metric::TotalCount,
        Metric::NullCount,
        Metric::NullPercentage,
        Metric::DistinctCount,
        Metric::DistinctPercentage,
        Metric::MaxLength,
        Metric::MinLength,
    ];

    /// Rows appended when the table has at least one numeric column.
    pub const NUMERIC: [Metric; 4] = [Metric::Max, Metric::Min, Metric::Mean, Metric::StdDev];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::TotalCount => "Total Count",
            Metric::NullCount => "Null Count",
            Metric::NullPercentage => "Null Percentage",
            Metric::DistinctCount => "Distinct Count",
            Metric::DistinctPercentage => "Distinct Percentage",
            Metric::MaxLength => "Max Length",
            Metric::MinLength => "Min Length",
            Metric::Max => "Max",
            Metric::Min => "Min",
            Metric::Mean => "Mean",
            Metric::StdDev => "StdDev",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericStats {
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1).
    pub std_dev: Option<f64>,
}

impl NumericStats {
    fn from_values(values: &[f64]) -> Self {
        let n = values.len();
        let max = values.iter().copied().reduce(f64::max);
        let min = values.iter().copied().reduce(f64::min);
        let mean = (n > 0).then(|| values.iter().sum::<f64>() / n as f64);
        let std_dev = mean.filter(|_| n > 1).map(|m| {
            let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        });
        Self {
            max,
            min,
            mean,
            std_dev,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnQuality {
    pub name: String,
    pub total_count: usize,
    pub null_count: usize,
    pub null_percentage: Option<f64>,
    pub distinct_count: usize,
    pub distinct_percentage: Option<f64>,
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
    /// Present only for numeric columns.
    pub numeric: Option<NumericStats>,
}

impl ColumnQuality {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::TotalCount => Some(self.total_count as f64),
            Metric::NullCount => Some(self.null_count as f64),
            Metric::NullPercentage => self.null_percentage,
            Metric::DistinctCount => Some(self.distinct_count as f64),
            Metric::DistinctPercentage => self.distinct_percentage,
            Metric::MaxLength => self.max_length.map(|v| v as f64),
            Metric::MinLength => self.min_length.map(|v| v as f64),
            Metric::Max => self.numeric.and_then(|n| n.max),
            Metric::Min => self.numeric.and_then(|n| n.min),
            Metric::Mean => self.numeric.and_then(|n| n.mean),
            Metric::StdDev => self.numeric.and_then(|n| n.std_dev),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualitySummary {
    pub columns: Vec<ColumnQuality>,
}

impl QualitySummary {
    pub fn column(&self, name: &str) -> Option<&ColumnQuality> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Cell at (`metric`, `column`); `None` when absent or undefined.
    pub fn get(&self, metric: Metric, column: &str) -> Option<f64> {
        self.column(column).and_then(|c| c.metric(metric))
    }

    /// Metric rows in output order.
    pub fn metrics(&self) -> Vec<Metric> {
        let mut rows = Metric::BASE.to_vec();
        if self.columns.iter().any(|c| c.numeric.is_some()) {
            rows.extend(Metric::NUMERIC);
        }
        rows
    }

    /// Name of the label column: `metric`, underscored until it clashes with
    /// no source column.
    pub fn label_column(&self) -> String {
        let mut name = METRIC_COLUMN.to_string();
        while self.column(&name).is_some() {
            name.push('_');
        }
        name
    }

    /// Transposed table: one row per metric, one Float64 column per source column.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let rows = self.metrics();
        let mut fields = vec![Field::new(self.label_column(), DataType::Utf8, false)];
        let mut cols: Vec<ArrayRef> = vec![Arc::new(StringArray::from(
            rows.iter().map(Metric::label).collect::<Vec<_>>(),
        ))];
        for c in &self.columns {
            fields.push(Field::new(&c.name, DataType::Float64, true));
            let values: Float64Array = rows.iter().map(|m| c.metric(*m)).collect();
            cols.push(Arc::new(values));
        }
        RecordBatch::try_new(Arc::new(Schema::new(fields)), cols).map_err(Into::into)
    }
}

fn profile_column(name: &str, arr: &ArrayRef) -> Result<ColumnQuality> {
    let total = arr.len();
    let text = as_text(arr)?;

    let mut null_count = 0;
    let mut distinct: HashSet<&str> = HashSet::new();
    let mut max_length: Option<usize> = None;
    let mut min_length: Option<usize> = None;
    for row in 0..total {
        let rendered = if is_missing(arr.as_ref(), row) {
            null_count += 1;
            NULL_TEXT
        } else {
            let v = text.value(row);
            distinct.insert(v);
            v
        };
        let len = rendered.chars().count();
        max_length = Some(max_length.map_or(len, |m| m.max(len)));
        min_length = Some(min_length.map_or(len, |m| m.min(len)));
    }

    let percent = |count: usize| (total > 0).then(|| count as f64 / total as f64 * 100.0);

    let numeric = if is_numeric(arr.data_type()) {
        let floats = cast(arr, &DataType::Float64)?;
        let floats = floats
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| {
                arrow::error::ArrowError::CastError(format!("{} is not castable to f64", name))
            })?;
        let values: Vec<f64> = floats.iter().flatten().filter(|v| !v.is_nan()).collect();
        Some(NumericStats::from_values(&values))
    } else {
        None
    };

    Ok(ColumnQuality {
        name: name.to_string(),
        total_count: total,
        null_count,
        null_percentage: percent(null_count),
        distinct_count: distinct.len(),
        distinct_percentage: percent(distinct.len()),
        max_length,
        min_length,
        numeric,
    })
}

/// Profile every column of `batch`. The input is left untouched.
pub fn summarize(batch: &RecordBatch) -> Result<QualitySummary> {
    let schema = batch.schema();
    let columns = schema
        .fields()
        .par_iter()
        .zip(batch.columns().par_iter())
        .map(|(field, arr)| profile_column(field.name(), arr))
        .collect::<Result<Vec<_>>>()?;
    debug!(
        columns = columns.len(),
        rows = batch.num_rows(),
        "summarized table"
    );
    Ok(QualitySummary { columns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;

    fn sample() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("age", DataType::Int64, true),
            Field::new("nickname", DataType::Utf8, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec!["Alice", "Bob", "Bob"])) as ArrayRef,
                Arc::new(Int64Array::from(vec![25, 30, 35])) as ArrayRef,
                Arc::new(StringArray::from(vec![None::<&str>, None, None])) as ArrayRef,
            ],
        )
        .unwrap()
    }

    #[test]
    fn total_count_is_row_count_everywhere() {
        let s = summarize(&sample()).unwrap();
        for c in ["name", "age", "nickname"] {
            assert_eq!(s.get(Metric::TotalCount, c), Some(3.0));
        }
    }

    #[test]
    fn fully_null_column() {
        let s = summarize(&sample()).unwrap();
        assert_eq!(s.get(Metric::NullCount, "nickname"), Some(3.0));
        assert_eq!(s.get(Metric::NullPercentage, "nickname"), Some(100.0));
        assert_eq!(s.get(Metric::DistinctCount, "nickname"), Some(0.0));
        // nulls render as "NaN"
        assert_eq!(s.get(Metric::MaxLength, "nickname"), Some(3.0));
    }

    #[test]
    fn distinct_and_lengths() {
        let s = summarize(&sample()).unwrap();
        assert_eq!(s.get(Metric::DistinctCount, "name"), Some(2.0));
        let pct = s.get(Metric::DistinctPercentage, "name").unwrap();
        assert!((pct - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.get(Metric::MaxLength, "name"), Some(5.0));
        assert_eq!(s.get(Metric::MinLength, "name"), Some(3.0));
        assert_eq!(s.get(Metric::MaxLength, "age"), Some(2.0));
    }

    #[test]
    fn numeric_only_for_numeric_columns() {
        let s = summarize(&sample()).unwrap();
        assert_eq!(s.get(Metric::Max, "age"), Some(35.0));
        assert_eq!(s.get(Metric::Min, "age"), Some(25.0));
        assert_eq!(s.get(Metric::Mean, "age"), Some(30.0));
        assert_eq!(s.get(Metric::StdDev, "age"), Some(5.0));
        assert!(s.column("name").unwrap().numeric.is_none());
        assert_eq!(s.get(Metric::Mean, "name"), None);
    }

    #[test]
    fn single_value_std_is_undefined() {
        let schema = Schema::new(vec![Field::new("x", DataType::Float64, true)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(Float64Array::from(vec![4.2])) as ArrayRef],
        )
        .unwrap();
        let s = summarize(&batch).unwrap();
        assert_eq!(s.get(Metric::Mean, "x"), Some(4.2));
        assert_eq!(s.get(Metric::StdDev, "x"), None);
    }

    #[test]
    fn empty_table_percentages_are_undefined() {
        let schema = Schema::new(vec![Field::new("x", DataType::Utf8, true)]);
        let batch = RecordBatch::new_empty(Arc::new(schema));
        let s = summarize(&batch).unwrap();
        assert_eq!(s.get(Metric::TotalCount, "x"), Some(0.0));
        assert_eq!(s.get(Metric::NullPercentage, "x"), None);
        assert_eq!(s.get(Metric::DistinctPercentage, "x"), None);
        assert_eq!(s.get(Metric::MaxLength, "x"), None);
    }

    #[test]
    fn tabular_summary_is_transposed() {
        let s = summarize(&sample()).unwrap();
        let batch = s.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 11);
        assert_eq!(batch.num_columns(), 4);
        let labels = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(labels.value(0), "Total Count");
        assert_eq!(labels.value(2), "Null Percentage");
        assert_eq!(labels.value(7), "Max");
        assert_eq!(labels.value(10), "StdDev");
        assert_eq!(batch.schema().field(0).name(), METRIC_COLUMN);

        let nickname = batch
            .column_by_name("nickname")
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(nickname.value(2), 100.0);
        // numeric rows are null for text columns
        assert!(nickname.is_null(7));
    }

    #[test]
    fn no_numeric_rows_without_numeric_columns() {
        let batch = sample().project(&[0, 2]).unwrap();
        let s = summarize(&batch).unwrap();
        assert_eq!(s.metrics(), Metric::BASE.to_vec());
        assert_eq!(s.to_record_batch().unwrap().num_rows(), 7);
    }

    #[test]
    fn label_column_never_shadows_a_source_column() {
        let schema = Schema::new(vec![
            Field::new("metric", DataType::Int64, true),
            Field::new("metric_", DataType::Utf8, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
                Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef,
            ],
        )
        .unwrap();
        let s = summarize(&batch).unwrap();
        assert_eq!(s.label_column(), "metric__");

        let table = s.to_record_batch().unwrap();
        let schema = table.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["metric__", "metric", "metric_"]);
        let source = table
            .column_by_name("metric")
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(source.value(0), 2.0);
    }
}

// src/schema/arrow.rs

use arrow::datatypes::{DataType, TimeUnit};

use super::types::ColumnType;

/// Map an Arrow DataType onto the declared-type vocabulary.
///
/// Covers:
/// - Utf8, LargeUtf8, Utf8View            → String
/// - Int8..Int64, UInt8..UInt64           → Int64
/// - Float16, Float32, Float64            → Float64
/// - Boolean                              → Boolean
/// - Date32, Date64                       → Date
/// - Timestamp(*)                         → Timestamp
/// - anything else                        → None (never matches a declaration)
pub fn column_type_of(dt: &DataType) -> Option<ColumnType> {
    match dt {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => Some(ColumnType::String),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => Some(ColumnType::Int64),
        DataType::Float16 | DataType::Float32 | DataType::Float64 => Some(ColumnType::Float64),
        DataType::Boolean => Some(ColumnType::Boolean),
        DataType::Date32 | DataType::Date64 => Some(ColumnType::Date),
        DataType::Timestamp(_, _) => Some(ColumnType::Timestamp),
        _ => None,
    }
}

/// The Arrow type a declared column is materialized as.
pub fn map_to_arrow_type(ty: ColumnType) -> DataType {
    match ty {
        ColumnType::String => DataType::Utf8,
        ColumnType::Int64 => DataType::Int64,
        ColumnType::Float64 => DataType::Float64,
        ColumnType::Boolean => DataType::Boolean,
        ColumnType::Date => DataType::Date32,
        ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
    }
}

/// Whether statistics like mean and standard deviation apply to `dt`.
pub fn is_numeric(dt: &DataType) -> bool {
    dt.is_integer() || dt.is_floating()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_types_round_trip_through_arrow() {
        for ty in [
            ColumnType::String,
            ColumnType::Int64,
            ColumnType::Float64,
            ColumnType::Boolean,
            ColumnType::Date,
            ColumnType::Timestamp,
        ] {
            assert_eq!(column_type_of(&map_to_arrow_type(ty)), Some(ty));
        }
        assert_eq!(column_type_of(&DataType::Binary), None);
    }

    #[test]
    fn numeric_excludes_boolean() {
        assert!(is_numeric(&DataType::Int32));
        assert!(is_numeric(&DataType::Float64));
        assert!(!is_numeric(&DataType::Boolean));
        assert!(!is_numeric(&DataType::Utf8));
    }
}

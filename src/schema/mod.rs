pub mod arrow;
pub mod types;
pub mod validate;

pub use self::arrow::{column_type_of, is_numeric, map_to_arrow_type};
pub use types::{ColumnType, Schema, SchemaField};
pub use validate::{check_count, check_names, check_types};

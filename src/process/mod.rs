// src/process/mod.rs
//! Table-level cleaning and transformation. Every function takes a batch by
//! reference and hands back a new one.

pub mod clean;
pub mod convert;
pub mod date_parser;
pub mod salt;
pub mod transform;
pub mod utils;

pub use clean::{collapse_whitespace, strip_special_characters, uppercase};
pub use convert::convert_to_inferred_types;
pub use salt::Salt;
pub use transform::{
    derive_year, drop_columns, hash_columns, tag_source, DEFAULT_YEAR_COLUMN, SOURCE_COLUMN,
};

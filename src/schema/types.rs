// src/schema/types.rs

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// Declared type of a column, as written in the `variables` config block.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    String,
    Int64,
    Float64,
    Boolean,
    Date,
    Timestamp,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "object",
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::Boolean => "bool",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "datetime64[ns]",
        }
    }
}

impl FromStr for ColumnType {
    type Err = String;

    /// Accepts pandas dtype names alongside the usual SQL / Arrow spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let ty = match lower.as_str() {
            "object" | "str" | "string" | "utf8" | "text" => ColumnType::String,
            "int" | "int64" | "integer" | "bigint" => ColumnType::Int64,
            "float" | "float64" | "double" | "number" | "numeric" => ColumnType::Float64,
            "bool" | "boolean" => ColumnType::Boolean,
            "date" | "date32" => ColumnType::Date,
            "timestamp" | "datetime" => ColumnType::Timestamp,
            other if other.starts_with("datetime64") => ColumnType::Timestamp,
            other if other.starts_with("varchar") || other.starts_with("char") => {
                ColumnType::String
            }
            other => return Err(format!("unknown column type `{}`", other)),
        };
        Ok(ty)
    }
}

impl TryFrom<String> for ColumnType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ColumnType> for String {
    fn from(ty: ColumnType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declared column.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct SchemaField {
    pub name: String,
    pub ty: ColumnType,
}

/// Ordered list of declared columns. Order is significant for validation.
#[derive(Debug, Default, PartialEq, Clone, Eq)]
pub struct Schema {
    pub fields: Vec<SchemaField>,
}

impl Schema {
    pub fn new<N: Into<String>>(fields: impl IntoIterator<Item = (N, ColumnType)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, ty)| SchemaField {
                    name: name.into(),
                    ty,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn types(&self) -> impl Iterator<Item = ColumnType> + '_ {
        self.fields.iter().map(|f| f.ty)
    }
}

// YAML mappings keep document order, so the schema is read entry by entry
// instead of going through a HashMap.
impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of column name to column type")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Schema, A::Error> {
                let mut fields: Vec<SchemaField> = Vec::new();
                while let Some((name, ty)) = map.next_entry::<String, ColumnType>()? {
                    if fields.iter().any(|f| f.name == name) {
                        return Err(de::Error::custom(format!("duplicate column `{}`", name)));
                    }
                    fields.push(SchemaField { name, ty });
                }
                Ok(Schema { fields })
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

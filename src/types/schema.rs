//! Result set shapes: column types, schemas, rows and parquet locations.

use crate::error::ProtocolViolation;
use crate::transport::messages as proto;
use crate::types::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::path::{Path, PathBuf};

/// Column data type declared in a result schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Null,
    Bool,
    Int,
    UInt,
    Double,
    Decimal,
    String,
    DateTime,
    Date,
    Time,
    Interval,
}

impl DataType {
    /// Lowercase type name, as used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Null => "null",
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::UInt => "uint",
            DataType::Double => "double",
            DataType::Decimal => "decimal",
            DataType::String => "string",
            DataType::DateTime => "datetime",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::Interval => "interval",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<proto::DataType> for DataType {
    type Error = ProtocolViolation;

    fn try_from(value: proto::DataType) -> Result<Self, Self::Error> {
        match value {
            proto::DataType::DatatypeUnspecified => Err(ProtocolViolation::UnknownDataType(
                proto::DataType::DatatypeUnspecified as i32,
            )),
            proto::DataType::DatatypeNull => Ok(DataType::Null),
            proto::DataType::DatatypeBool => Ok(DataType::Bool),
            proto::DataType::DatatypeInt => Ok(DataType::Int),
            proto::DataType::DatatypeUint => Ok(DataType::UInt),
            proto::DataType::DatatypeDouble => Ok(DataType::Double),
            proto::DataType::DatatypeDecimal => Ok(DataType::Decimal),
            proto::DataType::DatatypeString => Ok(DataType::String),
            proto::DataType::DatatypeDatetime => Ok(DataType::DateTime),
            proto::DataType::DatatypeDate => Ok(DataType::Date),
            proto::DataType::DatatypeTime => Ok(DataType::Time),
            proto::DataType::DatatypeInterval => Ok(DataType::Interval),
        }
    }
}

impl TryFrom<i32> for DataType {
    type Error = ProtocolViolation;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        proto::DataType::try_from(value)
            .map_err(|_| ProtocolViolation::UnknownDataType(value))
            .and_then(DataType::try_from)
    }
}

impl From<DataType> for proto::DataType {
    fn from(value: DataType) -> Self {
        match value {
            DataType::Null => proto::DataType::DatatypeNull,
            DataType::Bool => proto::DataType::DatatypeBool,
            DataType::Int => proto::DataType::DatatypeInt,
            DataType::UInt => proto::DataType::DatatypeUint,
            DataType::Double => proto::DataType::DatatypeDouble,
            DataType::Decimal => proto::DataType::DatatypeDecimal,
            DataType::String => proto::DataType::DatatypeString,
            DataType::DateTime => proto::DataType::DatatypeDatetime,
            DataType::Date => proto::DataType::DatatypeDate,
            DataType::Time => proto::DataType::DatatypeTime,
            DataType::Interval => proto::DataType::DatatypeInterval,
        }
    }
}

/// Column metadata from a result schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Declared data type
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of result columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Position of the first column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl TryFrom<&proto::Schema> for Schema {
    type Error = ProtocolViolation;

    fn try_from(schema: &proto::Schema) -> Result<Self, Self::Error> {
        let columns = schema
            .columns
            .iter()
            .map(|c| Ok(Column::new(c.name.clone(), DataType::try_from(c.data_type)?)))
            .collect::<Result<Vec<_>, ProtocolViolation>>()?;
        Ok(Schema::new(columns))
    }
}

/// One result row; the i-th value belongs to the i-th schema column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Row(values)
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }
}

impl Index<usize> for Row {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// A tabular query result: schema plus rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Rows {
    schema: Schema,
    rows: Vec<Row>,
}

impl Rows {
    /// Create a row set. Rows are expected to match the schema's arity.
    pub fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Position of the column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.column_index(name)
    }

    /// Value at `row` in the column named `column`.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// All values of one column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    pub fn into_parts(self) -> (Schema, Vec<Row>) {
        (self.schema, self.rows)
    }
}

impl Index<usize> for Rows {
    type Output = Row;

    fn index(&self, index: usize) -> &Self::Output {
        &self.rows[index]
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Rows {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Where the server wrote a parquet export.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ParquetLocation {
    /// A file on the server's local filesystem
    Local(PathBuf),
}

impl ParquetLocation {
    /// Local path, if this is a local file.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            ParquetLocation::Local(path) => Some(path),
        }
    }
}

impl fmt::Display for ParquetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParquetLocation::Local(path) => write!(f, "file://{}", path.display()),
        }
    }
}

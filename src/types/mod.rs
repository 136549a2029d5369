//! Native values, result shapes, and the codec to and from wire scalars.

mod mapping;
mod schema;
mod value;

pub use mapping::{ColumnDecoder, ValueCodec};
pub use schema::{Column, DataType, ParquetLocation, Row, Rows, Schema};
pub use value::{CalendarInterval, Decimal, ToScalar, Value};

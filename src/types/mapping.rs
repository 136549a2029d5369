//! Value codec between native values and wire scalars.

use crate::error::{EncodingError, ProtocolViolation};
use crate::transport::messages::{self as proto, scalar_value::Kind};
use crate::types::schema::{DataType, Schema};
use crate::types::value::{CalendarInterval, Decimal, ToScalar, Value};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc};

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MICRO: i64 = 1_000;

/// Codec for converting between native values and wire scalars.
pub struct ValueCodec;

impl ValueCodec {
    /// Encode a native value as a wire scalar.
    ///
    /// # Errors
    /// Returns `EncodingError::OutOfRange` for a leap-second time or
    /// timestamp, or an interval whose normalized parts overflow the wire
    /// fields.
    pub fn encode(value: &Value) -> Result<proto::ScalarValue, EncodingError> {
        let kind = match value {
            Value::Null => Kind::NullValue(prost_types::NullValue::NullValue as i32),
            Value::Bool(b) => Kind::BoolValue(*b),
            Value::Int(i) => Kind::IntValue(*i),
            Value::UInt(u) => Kind::UintValue(*u),
            Value::Double(d) => Kind::DoubleValue(*d),
            Value::Decimal(d) => Kind::DecimalValue(proto::Decimal {
                value: d.as_str().to_string(),
            }),
            Value::String(s) => Kind::StrValue(s.clone()),
            Value::DateTime(dt) => Kind::DatetimeValue(Self::encode_datetime(dt)?),
            Value::Date(d) => Kind::DateValue(proto::Date {
                year: d.year(),
                month: d.month(),
                day: d.day(),
            }),
            Value::Time(t) => Kind::TimeValue(Self::encode_time(t)?),
            Value::Interval(i) => Kind::IntervalValue(Self::encode_interval(i)?),
        };

        Ok(proto::ScalarValue { kind: Some(kind) })
    }

    /// Encode a parameter list, failing on the first unencodable value.
    pub fn encode_params(params: &[&dyn ToScalar]) -> Result<proto::Params, EncodingError> {
        let params = params
            .iter()
            .map(|p| p.to_scalar().and_then(|v| Self::encode(&v)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(proto::Params { params })
    }

    /// Decode a wire scalar into a native value.
    ///
    /// # Errors
    /// Returns `ProtocolViolation::UnsetValue` if no tag is set, and
    /// `ProtocolViolation::InvalidValue` if the payload is not a valid value
    /// for its tag.
    pub fn decode(scalar: &proto::ScalarValue) -> Result<Value, ProtocolViolation> {
        let kind = scalar.kind.as_ref().ok_or(ProtocolViolation::UnsetValue)?;

        match kind {
            Kind::NullValue(_) => Ok(Value::Null),
            Kind::BoolValue(b) => Ok(Value::Bool(*b)),
            Kind::IntValue(i) => Ok(Value::Int(*i)),
            Kind::UintValue(u) => Ok(Value::UInt(*u)),
            Kind::DoubleValue(d) => Ok(Value::Double(*d)),
            Kind::DecimalValue(d) => d
                .value
                .parse::<Decimal>()
                .map(Value::Decimal)
                .map_err(|e| invalid("decimal", e.to_string())),
            Kind::StrValue(s) => Ok(Value::String(s.clone())),
            Kind::DatetimeValue(ts) => Self::decode_datetime(ts).map(Value::DateTime),
            Kind::DateValue(d) => Self::decode_date(d).map(Value::Date),
            Kind::TimeValue(t) => Self::decode_time(t).map(Value::Time),
            Kind::IntervalValue(i) => Ok(Value::Interval(Self::decode_interval(i))),
        }
    }

    fn encode_datetime(dt: &DateTime<Utc>) -> Result<prost_types::Timestamp, EncodingError> {
        let nanos = dt.timestamp_subsec_nanos();
        if i64::from(nanos) >= NANOS_PER_SECOND {
            return Err(EncodingError::out_of_range(dt, "leap seconds have no wire form"));
        }
        Ok(prost_types::Timestamp {
            seconds: dt.timestamp(),
            nanos: nanos as i32,
        })
    }

    fn encode_time(t: &NaiveTime) -> Result<proto::Time, EncodingError> {
        let nanos = t.nanosecond();
        if i64::from(nanos) >= NANOS_PER_SECOND {
            return Err(EncodingError::out_of_range(t, "leap seconds have no wire form"));
        }
        // Wire resolution is one microsecond.
        Ok(proto::Time {
            hours: t.hour(),
            minutes: t.minute(),
            seconds: t.second(),
            nanos: nanos / 1_000 * 1_000,
        })
    }

    pub(crate) fn encode_interval(
        interval: &CalendarInterval,
    ) -> Result<proto::Interval, EncodingError> {
        let n = interval.normalized();
        let overflow = |field: &str| {
            EncodingError::out_of_range(interval, format!("{} overflow the wire field", field))
        };

        let months = n
            .years
            .checked_mul(12)
            .and_then(|m| m.checked_add(n.months))
            .and_then(|m| i32::try_from(m).ok())
            .ok_or_else(|| overflow("months"))?;

        let days = i32::try_from(n.days).map_err(|_| overflow("days"))?;

        let nanos = n
            .hours
            .checked_mul(3600)
            .and_then(|s| s.checked_add(n.minutes.checked_mul(60)?))
            .and_then(|s| s.checked_add(n.seconds))
            .and_then(|s| s.checked_mul(NANOS_PER_SECOND))
            .and_then(|ns| ns.checked_add(n.microseconds.checked_mul(NANOS_PER_MICRO)?))
            .ok_or_else(|| overflow("nanoseconds"))?;

        Ok(proto::Interval {
            months,
            days,
            nanos,
        })
    }

    fn decode_datetime(ts: &prost_types::Timestamp) -> Result<DateTime<Utc>, ProtocolViolation> {
        let nanos = u32::try_from(ts.nanos)
            .ok()
            .filter(|n| i64::from(*n) < NANOS_PER_SECOND)
            .ok_or_else(|| invalid("datetime", format!("nanos {} out of range", ts.nanos)))?;

        DateTime::from_timestamp(ts.seconds, nanos).ok_or_else(|| {
            invalid(
                "datetime",
                format!("timestamp {}s is out of range", ts.seconds),
            )
        })
    }

    fn decode_date(d: &proto::Date) -> Result<NaiveDate, ProtocolViolation> {
        NaiveDate::from_ymd_opt(d.year, d.month, d.day).ok_or_else(|| {
            invalid(
                "date",
                format!("{:04}-{:02}-{:02} is not a calendar date", d.year, d.month, d.day),
            )
        })
    }

    fn decode_time(t: &proto::Time) -> Result<NaiveTime, ProtocolViolation> {
        let bad = || {
            invalid(
                "time",
                format!(
                    "{:02}:{:02}:{:02}.{:09} is not a time of day",
                    t.hours, t.minutes, t.seconds, t.nanos
                ),
            )
        };
        if i64::from(t.nanos) >= NANOS_PER_SECOND {
            return Err(bad());
        }
        NaiveTime::from_hms_micro_opt(t.hours, t.minutes, t.seconds, t.nanos / 1_000)
            .ok_or_else(bad)
    }

    fn decode_interval(i: &proto::Interval) -> CalendarInterval {
        CalendarInterval::from_parts(
            i64::from(i.months),
            i64::from(i.days),
            i.nanos / NANOS_PER_MICRO,
        )
    }
}

fn invalid(tag: &'static str, message: String) -> ProtocolViolation {
    ProtocolViolation::InvalidValue { tag, message }
}

/// Decoder for one column of a row set.
///
/// Accepts null or a value whose tag matches the column's declared type.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDecoder {
    column: usize,
    data_type: DataType,
}

impl ColumnDecoder {
    pub fn new(column: usize, data_type: DataType) -> Self {
        Self { column, data_type }
    }

    /// One decoder per schema column, in column order.
    pub fn for_schema(schema: &Schema) -> Vec<ColumnDecoder> {
        schema
            .columns()
            .iter()
            .enumerate()
            .map(|(i, c)| ColumnDecoder::new(i, c.data_type))
            .collect()
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Decode the value of this column in row `row`.
    pub fn decode(&self, row: usize, scalar: &proto::ScalarValue) -> Result<Value, ProtocolViolation> {
        let value = ValueCodec::decode(scalar)?;
        let actual = value.data_type();

        if actual != DataType::Null && actual != self.data_type {
            return Err(ProtocolViolation::TypeMismatch {
                row,
                column: self.column,
                expected: self.data_type.name(),
                actual: actual.name(),
            });
        }

        Ok(value)
    }
}

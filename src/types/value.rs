//! Native values exchanged with the gduck service.

use crate::error::EncodingError;
use crate::types::schema::DataType;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A native scalar value.
///
/// This is the closed set of values the codec can put on and take off the
/// wire. Use [`ToScalar`] to turn ordinary Rust values into query parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// BOOLEAN
    Bool(bool),
    /// Signed integer (TINYINT through BIGINT)
    Int(i64),
    /// Unsigned integer (UTINYINT through UBIGINT)
    UInt(u64),
    /// FLOAT / DOUBLE
    Double(f64),
    /// DECIMAL, exact
    Decimal(Decimal),
    /// VARCHAR
    String(String),
    /// TIMESTAMP, interpreted as UTC
    DateTime(DateTime<Utc>),
    /// DATE
    Date(NaiveDate),
    /// TIME, microsecond resolution on the wire
    Time(NaiveTime),
    /// INTERVAL
    Interval(CalendarInterval),
}

impl Value {
    /// The data type of this value (`DataType::Null` for NULL).
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Bool(_) => DataType::Bool,
            Value::Int(_) => DataType::Int,
            Value::UInt(_) => DataType::UInt,
            Value::Double(_) => DataType::Double,
            Value::Decimal(_) => DataType::Decimal,
            Value::String(_) => DataType::String,
            Value::DateTime(_) => DataType::DateTime,
            Value::Date(_) => DataType::Date,
            Value::Time(_) => DataType::Time,
            Value::Interval(_) => DataType::Interval,
        }
    }

    /// Check if this is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Signed integer view; unsigned values that fit are converted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(u) => Some(*u),
            Value::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&Decimal> {
        match self {
            Value::Decimal(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_interval(&self) -> Option<&CalendarInterval> {
        match self {
            Value::Interval(i) => Some(i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::UInt(u) => write!(f, "{}", u),
            Value::Double(d) => write!(f, "{}", d),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%F %T%.f")),
            Value::Date(d) => write!(f, "{}", d.format("%F")),
            Value::Time(t) => write!(f, "{}", t.format("%T%.f")),
            Value::Interval(i) => write!(f, "{}", i),
        }
    }
}

/// Exact decimal number kept in its canonical textual form.
///
/// Canonical form is `[-]digits[.digits]`: no exponent, no superfluous
/// leading zeros, and no negative zero. Trailing fractional zeros are kept,
/// so `1.10` and `1.1` have different scales and compare unequal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(String);

impl Decimal {
    /// The canonical decimal string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of fractional digits.
    pub fn scale(&self) -> usize {
        self.0.split_once('.').map(|(_, frac)| frac.len()).unwrap_or(0)
    }

    pub fn is_negative(&self) -> bool {
        self.0.starts_with('-')
    }

    /// Lossy conversion to a float.
    pub fn to_f64(&self) -> f64 {
        // Canonical form is always a valid float literal.
        self.0.parse().unwrap_or(f64::NAN)
    }
}

impl FromStr for Decimal {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EncodingError::InvalidDecimal(s.to_string());
        let trimmed = s.trim();

        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let (integer, fraction) = match unsigned.split_once('.') {
            Some((integer, fraction)) => (integer, fraction),
            None => (unsigned, ""),
        };

        if integer.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !integer.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let integer = integer.trim_start_matches('0');
        let integer = if integer.is_empty() { "0" } else { integer };
        let is_zero = integer == "0" && fraction.bytes().all(|b| b == b'0');

        let mut canonical = String::with_capacity(integer.len() + fraction.len() + 2);
        if negative && !is_zero {
            canonical.push('-');
        }
        canonical.push_str(integer);
        if !fraction.is_empty() {
            canonical.push('.');
            canonical.push_str(fraction);
        }

        Ok(Decimal(canonical))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal(value.to_string())
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal(value.to_string())
    }
}

/// A calendar-aware time span.
///
/// Years and months are calendar units; days are days. Hours and smaller
/// units travel as one nanosecond count on the wire.
///
/// Equality compares the span, not the field layout: two intervals are equal
/// when they normalize to the same month, day and sub-day totals, which is
/// exactly when they encode to the same wire value.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarInterval {
    pub years: i64,
    pub months: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub microseconds: i64,
}

impl CalendarInterval {
    /// Build from the wire units, normalized.
    pub fn from_parts(months: i64, days: i64, microseconds: i64) -> Self {
        CalendarInterval {
            months,
            days,
            microseconds,
            ..Default::default()
        }
        .normalized()
    }

    pub fn with_years(mut self, years: i64) -> Self {
        self.years = years;
        self
    }

    pub fn with_months(mut self, months: i64) -> Self {
        self.months = months;
        self
    }

    pub fn with_days(mut self, days: i64) -> Self {
        self.days = days;
        self
    }

    pub fn with_hours(mut self, hours: i64) -> Self {
        self.hours = hours;
        self
    }

    pub fn with_minutes(mut self, minutes: i64) -> Self {
        self.minutes = minutes;
        self
    }

    pub fn with_seconds(mut self, seconds: i64) -> Self {
        self.seconds = seconds;
        self
    }

    pub fn with_microseconds(mut self, microseconds: i64) -> Self {
        self.microseconds = microseconds;
        self
    }

    /// Carry overflowing units into the next larger one.
    ///
    /// Microseconds carry into seconds, seconds into minutes, minutes into
    /// hours, hours into days and months into years. Carries truncate toward
    /// zero so each unit keeps its sign. Days never carry into months.
    pub fn normalized(self) -> Self {
        let mut n = self;

        n.seconds = n.seconds.saturating_add(n.microseconds / 1_000_000);
        n.microseconds %= 1_000_000;

        n.minutes = n.minutes.saturating_add(n.seconds / 60);
        n.seconds %= 60;

        n.hours = n.hours.saturating_add(n.minutes / 60);
        n.minutes %= 60;

        n.days = n.days.saturating_add(n.hours / 24);
        n.hours %= 24;

        n.years = n.years.saturating_add(n.months / 12);
        n.months %= 12;

        n
    }

    /// Normalized `(months, days, microseconds)` totals.
    fn totals(&self) -> (i128, i128, i128) {
        let n = self.normalized();
        let months = i128::from(n.years) * 12 + i128::from(n.months);
        let micros = ((i128::from(n.hours) * 60 + i128::from(n.minutes)) * 60
            + i128::from(n.seconds))
            * 1_000_000
            + i128::from(n.microseconds);
        (months, i128::from(n.days), micros)
    }
}

impl PartialEq for CalendarInterval {
    fn eq(&self, other: &Self) -> bool {
        self.totals() == other.totals()
    }
}

impl Eq for CalendarInterval {}

impl Hash for CalendarInterval {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.totals().hash(state);
    }
}

impl fmt::Display for CalendarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} years {} months {} days {:02}:{:02}:{:02}.{:06}",
            self.years,
            self.months,
            self.days,
            self.hours,
            self.minutes,
            self.seconds,
            self.microseconds
        )
    }
}

/// Conversion of a Rust value into a query parameter.
///
/// Types with no wire representation implement this by failing with
/// `EncodingError::UnsupportedType`, so a bad parameter is reported before
/// anything is sent.
pub trait ToScalar {
    fn to_scalar(&self) -> Result<Value, EncodingError>;
}

impl ToScalar for Value {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Ok(self.clone())
    }
}

impl<T: ToScalar + ?Sized> ToScalar for &T {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        (**self).to_scalar()
    }
}

impl<T: ToScalar> ToScalar for Option<T> {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        match self {
            Some(value) => value.to_scalar(),
            None => Ok(Value::Null),
        }
    }
}

impl ToScalar for bool {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Ok(Value::Bool(*self))
    }
}

macro_rules! signed_to_scalar {
    ($($t:ty),*) => {$(
        impl ToScalar for $t {
            fn to_scalar(&self) -> Result<Value, EncodingError> {
                Ok(Value::Int(i64::from(*self)))
            }
        }
    )*};
}

signed_to_scalar!(i8, i16, i32, i64, u8, u16, u32);

impl ToScalar for u64 {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Ok(Value::UInt(*self))
    }
}

impl ToScalar for isize {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        i64::try_from(*self)
            .map(Value::Int)
            .map_err(|_| EncodingError::out_of_range(self, "does not fit in 64 bits"))
    }
}

impl ToScalar for usize {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        u64::try_from(*self)
            .map(Value::UInt)
            .map_err(|_| EncodingError::out_of_range(self, "does not fit in 64 bits"))
    }
}

impl ToScalar for i128 {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        if let Ok(i) = i64::try_from(*self) {
            Ok(Value::Int(i))
        } else if let Ok(u) = u64::try_from(*self) {
            Ok(Value::UInt(u))
        } else {
            Err(EncodingError::out_of_range(self, "does not fit in 64 bits"))
        }
    }
}

impl ToScalar for u128 {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        u64::try_from(*self)
            .map(Value::UInt)
            .map_err(|_| EncodingError::out_of_range(self, "does not fit in 64 bits"))
    }
}

impl ToScalar for f32 {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Ok(Value::Double(f64::from(*self)))
    }
}

impl ToScalar for f64 {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Ok(Value::Double(*self))
    }
}

impl ToScalar for Decimal {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Ok(Value::Decimal(self.clone()))
    }
}

impl ToScalar for str {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Ok(Value::String(self.to_string()))
    }
}

impl ToScalar for String {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Ok(Value::String(self.clone()))
    }
}

impl ToScalar for DateTime<Utc> {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Ok(Value::DateTime(*self))
    }
}

impl ToScalar for DateTime<FixedOffset> {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Ok(Value::DateTime(self.with_timezone(&Utc)))
    }
}

impl ToScalar for NaiveDate {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Ok(Value::Date(*self))
    }
}

impl ToScalar for NaiveTime {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Ok(Value::Time(*self))
    }
}

impl ToScalar for CalendarInterval {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Ok(Value::Interval(*self))
    }
}

// No wire representation: a zoneless timestamp is ambiguous, and binary
// and duration values have no tag.
impl ToScalar for NaiveDateTime {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Err(EncodingError::unsupported(self))
    }
}

impl ToScalar for [u8] {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Err(EncodingError::unsupported(self))
    }
}

impl ToScalar for Vec<u8> {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Err(EncodingError::unsupported(self))
    }
}

impl ToScalar for std::time::Duration {
    fn to_scalar(&self) -> Result<Value, EncodingError> {
        Err(EncodingError::unsupported(self))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Value::Time(value)
    }
}

impl From<CalendarInterval> for Value {
    fn from(value: CalendarInterval) -> Self {
        Value::Interval(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Build a parameter slice for a query.
///
/// ```
/// use gduck_client::params;
///
/// let params = params![1, "abc", None::<i64>];
/// assert_eq!(params.len(), 3);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        &[] as &[&dyn $crate::types::ToScalar]
    };
    ($($param:expr),+ $(,)?) => {
        &[$(&$param as &dyn $crate::types::ToScalar),+] as &[&dyn $crate::types::ToScalar]
    };
}

use crate::{Error, Result, Value, truncate_long};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, borrow::Cow, str::FromStr};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::parse_borrowed};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// It is what model fields, condition operands and row decoding go through. Converting back with
/// [`AsValue::try_from_value`] is lenient: integers are accepted across widths (range checked) and
/// textual encodings are parsed, since some backends (MySQL text protocol) deliver everything as
/// strings.
///
/// `is_zero` reports whether the value is the zero value of its type. Zero values are never used
/// as implicit filters and an unset serial key is recognized by it.
///
/// # Examples
/// ```rust
/// use fluentdb_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// Typed `NULL` for this type.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    fn is_zero(&self) -> bool {
        false
    }
    /// Parse from the textual form used by SQL backends.
    fn parse(input: &str) -> Result<Self>
    where
        Self: Sized,
    {
        Err(Error::msg(format!(
            "Cannot parse `{}` as {}",
            truncate_long!(input),
            any::type_name::<Self>()
        )))
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>()
    ))
}

fn text_of(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Varchar(Some(v)) => Some(Cow::Borrowed(v.as_str())),
        Value::Blob(Some(v)) => std::str::from_utf8(v).ok().map(Cow::Borrowed),
        _ => None,
    }
}

macro_rules! narrow_integer {
    ($target:ty, $v:expr, $from:literal) => {{
        let v = $v as i128;
        if v < <$target>::MIN as i128 || v > <$target>::MAX as i128 {
            return Err(Error::msg(format!(
                "Value {v}: {} is out of range for {}",
                $from,
                any::type_name::<$target>(),
            )));
        }
        Ok(v as $target)
    }};
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            #[allow(unreachable_patterns)]
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    Value::Int8(Some(v)) => narrow_integer!($source, v, "i8"),
                    Value::Int16(Some(v)) => narrow_integer!($source, v, "i16"),
                    Value::Int32(Some(v)) => narrow_integer!($source, v, "i32"),
                    Value::Int64(Some(v)) => narrow_integer!($source, v, "i64"),
                    Value::UInt8(Some(v)) => narrow_integer!($source, v, "u8"),
                    Value::UInt16(Some(v)) => narrow_integer!($source, v, "u16"),
                    Value::UInt32(Some(v)) => narrow_integer!($source, v, "u32"),
                    Value::UInt64(Some(v)) => narrow_integer!($source, v, "u64"),
                    Value::Boolean(Some(v)) => Ok(v as _),
                    Value::Decimal(Some(v)) if v.fract().is_zero() => v
                        .to_i128()
                        .ok_or_else(|| mismatch::<Self>(&value))
                        .and_then(|v| narrow_integer!($source, v, "Decimal")),
                    ref v => match text_of(v) {
                        Some(text) => Self::parse(&text),
                        None => Err(mismatch::<Self>(&value)),
                    },
                }
            }
            fn is_zero(&self) -> bool {
                *self == 0
            }
            fn parse(input: &str) -> Result<Self> {
                <$source>::from_str(input.trim()).map_err(|e| {
                    Error::new(e).context(format!(
                        "Cannot parse `{}` as {}",
                        truncate_long!(input),
                        any::type_name::<Self>()
                    ))
                })
            }
        }
    };
}

impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);

macro_rules! impl_as_value_float {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            #[allow(unreachable_patterns)]
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    Value::Float32(Some(v)) => Ok(v as _),
                    Value::Float64(Some(v)) => Ok(v as _),
                    Value::Int8(Some(v)) => Ok(v as _),
                    Value::Int16(Some(v)) => Ok(v as _),
                    Value::Int32(Some(v)) => Ok(v as _),
                    Value::Int64(Some(v)) => Ok(v as _),
                    Value::UInt8(Some(v)) => Ok(v as _),
                    Value::UInt16(Some(v)) => Ok(v as _),
                    Value::UInt32(Some(v)) => Ok(v as _),
                    Value::UInt64(Some(v)) => Ok(v as _),
                    Value::Decimal(Some(v)) => v
                        .to_f64()
                        .map(|v| v as _)
                        .ok_or_else(|| mismatch::<Self>(&value)),
                    ref v => match text_of(v) {
                        Some(text) => Self::parse(&text),
                        None => Err(mismatch::<Self>(&value)),
                    },
                }
            }
            fn is_zero(&self) -> bool {
                *self == 0.0
            }
            fn parse(input: &str) -> Result<Self> {
                <$source>::from_str(input.trim()).map_err(|e| {
                    Error::new(e).context(format!(
                        "Cannot parse `{}` as {}",
                        truncate_long!(input),
                        any::type_name::<Self>()
                    ))
                })
            }
        }
    };
}

impl_as_value_float!(f32, Value::Float32);
impl_as_value_float!(f64, Value::Float64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int8(Some(v)) => Ok(v != 0),
            Value::Int16(Some(v)) => Ok(v != 0),
            Value::Int32(Some(v)) => Ok(v != 0),
            Value::Int64(Some(v)) => Ok(v != 0),
            Value::UInt8(Some(v)) => Ok(v != 0),
            Value::UInt16(Some(v)) => Ok(v != 0),
            Value::UInt32(Some(v)) => Ok(v != 0),
            Value::UInt64(Some(v)) => Ok(v != 0),
            ref v => match text_of(v) {
                Some(text) => Self::parse(&text),
                None => Err(mismatch::<Self>(&value)),
            },
        }
    }
    fn is_zero(&self) -> bool {
        !*self
    }
    fn parse(input: &str) -> Result<Self> {
        match input.trim() {
            v if v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("t") || v == "1" => {
                Ok(true)
            }
            v if v.eq_ignore_ascii_case("false") || v.eq_ignore_ascii_case("f") || v == "0" => {
                Ok(false)
            }
            v => Err(Error::msg(format!(
                "Cannot parse `{}` as bool",
                truncate_long!(v)
            ))),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Blob(Some(v)) => String::from_utf8(v.into_vec())
                .map_err(|e| Error::new(e).context("Blob is not a valid UTF-8 string")),
            Value::Uuid(Some(v)) => Ok(v.to_string()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
    fn parse(input: &str) -> Result<Self> {
        Ok(input.to_owned())
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v.into_vec()),
            Value::Varchar(Some(v)) => Ok(v.into_bytes()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Int8(Some(v)) => Ok(Decimal::from(v)),
            Value::Int16(Some(v)) => Ok(Decimal::from(v)),
            Value::Int32(Some(v)) => Ok(Decimal::from(v)),
            Value::Int64(Some(v)) => Ok(Decimal::from(v)),
            Value::UInt8(Some(v)) => Ok(Decimal::from(v)),
            Value::UInt16(Some(v)) => Ok(Decimal::from(v)),
            Value::UInt32(Some(v)) => Ok(Decimal::from(v)),
            Value::UInt64(Some(v)) => Ok(Decimal::from(v)),
            Value::Float32(Some(v)) => {
                Decimal::from_f32(v).ok_or_else(|| mismatch::<Self>(&value))
            }
            Value::Float64(Some(v)) => {
                Decimal::from_f64(v).ok_or_else(|| mismatch::<Self>(&value))
            }
            ref v => match text_of(v) {
                Some(text) => Self::parse(&text),
                None => Err(mismatch::<Self>(&value)),
            },
        }
    }
    fn is_zero(&self) -> bool {
        Decimal::is_zero(self)
    }
    fn parse(input: &str) -> Result<Self> {
        Decimal::from_str(input.trim()).map_err(|e| {
            Error::new(e).context(format!(
                "Cannot parse `{}` as Decimal",
                truncate_long!(input)
            ))
        })
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Blob(Some(ref v)) if v.len() == 16 => {
                Uuid::from_slice(v).map_err(|e| Error::new(e).context("Invalid uuid bytes"))
            }
            ref v => match text_of(v) {
                Some(text) => Self::parse(&text),
                None => Err(mismatch::<Self>(&value)),
            },
        }
    }
    fn is_zero(&self) -> bool {
        self.is_nil()
    }
    fn parse(input: &str) -> Result<Self> {
        Uuid::parse_str(input.trim()).map_err(|e| {
            Error::new(e).context(format!("Cannot parse `{}` as Uuid", truncate_long!(input)))
        })
    }
}

macro_rules! parse_time {
    ($ty:ty, $input:expr, $($formats:literal),+ $(,)?) => {{
        let input = $input.trim();
        'value: {
            for format in [$($formats,)+] {
                let format = parse_borrowed::<2>(format)?;
                if let Ok(result) = <$ty>::parse(input, format.as_slice()) {
                    break 'value Ok(result);
                }
            }
            Err(Error::msg(format!(
                "Cannot parse `{}` as {}",
                truncate_long!(input),
                any::type_name::<$ty>()
            )))
        }
    }};
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::TimestampWithTimezone(Some(v)) => Ok(v.date()),
            ref v => match text_of(v) {
                Some(text) => <Self as AsValue>::parse(&text),
                None => Err(mismatch::<Self>(&value)),
            },
        }
    }
    fn parse(input: &str) -> Result<Self> {
        parse_time!(Date, input, "[year]-[month]-[day]")
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(Some(v)) => Ok(v),
            ref v => match text_of(v) {
                Some(text) => <Self as AsValue>::parse(&text),
                None => Err(mismatch::<Self>(&value)),
            },
        }
    }
    fn parse(input: &str) -> Result<Self> {
        parse_time!(
            Time,
            input,
            "[hour]:[minute]:[second].[subsecond]",
            "[hour]:[minute]:[second]",
            "[hour]:[minute]",
        )
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::TimestampWithTimezone(Some(v)) => {
                let v = v.to_offset(time::UtcOffset::UTC);
                Ok(PrimitiveDateTime::new(v.date(), v.time()))
            }
            Value::Date(Some(v)) => Ok(v.midnight()),
            ref v => match text_of(v) {
                Some(text) => <Self as AsValue>::parse(&text),
                None => Err(mismatch::<Self>(&value)),
            },
        }
    }
    fn parse(input: &str) -> Result<Self> {
        parse_time!(
            PrimitiveDateTime,
            input,
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]",
            "[year]-[month]-[day] [hour]:[minute]:[second]",
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]",
            "[year]-[month]-[day]T[hour]:[minute]:[second]",
            "[year]-[month]-[day] [hour]:[minute]",
        )
    }
}

impl AsValue for OffsetDateTime {
    fn as_empty_value() -> Value {
        Value::TimestampWithTimezone(None)
    }
    fn as_value(self) -> Value {
        Value::TimestampWithTimezone(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::TimestampWithTimezone(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
            Value::Date(Some(v)) => Ok(v.midnight().assume_utc()),
            ref v => match text_of(v) {
                Some(text) => <Self as AsValue>::parse(&text),
                None => Err(mismatch::<Self>(&value)),
            },
        }
    }
    fn parse(input: &str) -> Result<Self> {
        parse_time!(
            OffsetDateTime,
            input,
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]",
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]",
            "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]",
            "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]",
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]",
            "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]",
        )
        .or_else(|_| <PrimitiveDateTime as AsValue>::parse(input).map(|v| v.assume_utc()))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(if value.is_null() {
            None
        } else {
            Some(<T as AsValue>::try_from_value(value)?)
        })
    }
    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(Self::new(<T as AsValue>::try_from_value(value)?))
    }
    fn is_zero(&self) -> bool {
        T::is_zero(self)
    }
}

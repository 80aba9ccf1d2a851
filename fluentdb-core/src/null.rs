//! Adapters between optional scalars and [`Value`].
//!
//! `<ty>_any` turns an optional scalar into a value (typed `NULL` when absent), `<ty>_nil` hands the
//! optional back as is, `<ty>` accepts anything convertible into a [`Value`] and keeps it only when
//! it is a non null value of exactly that kind.
use crate::Value;
use time::OffsetDateTime;

macro_rules! null_adapter {
    ($ty:ty, $variant:path, $any:ident, $nil:ident, $from:ident) => {
        pub fn $any(value: Option<$ty>) -> Value {
            $variant(value)
        }

        pub fn $nil(value: Option<$ty>) -> Option<$ty> {
            value
        }

        pub fn $from(value: impl Into<Value>) -> Option<$ty> {
            match value.into() {
                $variant(v) => v,
                _ => None,
            }
        }
    };
}

null_adapter!(String, Value::Varchar, string_any, string_nil, string);
null_adapter!(i16, Value::Int16, int16_any, int16_nil, int16);
null_adapter!(i32, Value::Int32, int32_any, int32_nil, int32);
null_adapter!(i64, Value::Int64, int64_any, int64_nil, int64);
null_adapter!(f64, Value::Float64, float64_any, float64_nil, float64);
null_adapter!(bool, Value::Boolean, bool_any, bool_nil, boolean);
null_adapter!(u8, Value::UInt8, byte_any, byte_nil, byte);
null_adapter!(
    OffsetDateTime,
    Value::TimestampWithTimezone,
    time_any,
    time_nil,
    time
);

/// Current UTC time as a present value.
pub fn now_time() -> Option<OffsetDateTime> {
    Some(OffsetDateTime::now_utc())
}

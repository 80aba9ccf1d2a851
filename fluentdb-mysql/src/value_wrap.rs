use fluentdb_core::{Error, Value};
use time::{Date, Month, PrimitiveDateTime, Time, UtcOffset};

pub(crate) struct ValueWrap(pub(crate) Value);

impl From<Value> for ValueWrap {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<ValueWrap> for Value {
    fn from(value: ValueWrap) -> Self {
        value.0
    }
}

impl mysql_async::prelude::FromValue for ValueWrap {
    type Intermediate = ValueWrap;
}

impl TryFrom<mysql_async::Value> for ValueWrap {
    type Error = mysql_async::FromValueError;

    fn try_from(value: mysql_async::Value) -> Result<Self, Self::Error> {
        let invalid = || mysql_async::FromValueError(value.clone());
        Ok(match &value {
            mysql_async::Value::NULL => Value::Null,
            mysql_async::Value::Bytes(v) => Value::Blob(Some(v.clone().into())),
            mysql_async::Value::Int(v) => Value::Int64(Some(*v)),
            mysql_async::Value::UInt(v) => Value::UInt64(Some(*v)),
            mysql_async::Value::Float(v) => Value::Float32(Some(*v)),
            mysql_async::Value::Double(v) => Value::Float64(Some(*v)),
            mysql_async::Value::Date(year, month, day, hour, minute, second, micro) => {
                let month = Month::try_from(*month).map_err(|_| invalid())?;
                let date =
                    Date::from_calendar_date(*year as _, month, *day).map_err(|_| invalid())?;
                let time = Time::from_hms_micro(*hour, *minute, *second, *micro)
                    .map_err(|_| invalid())?;
                Value::Timestamp(Some(PrimitiveDateTime::new(date, time)))
            }
            mysql_async::Value::Time(false, 0, hours, minutes, seconds, micro) => Value::Time(
                Some(
                    Time::from_hms_micro(*hours, *minutes, *seconds, *micro)
                        .map_err(|_| invalid())?,
                ),
            ),
            mysql_async::Value::Time(..) => return Err(invalid()),
        }
        .into())
    }
}

impl TryFrom<ValueWrap> for mysql_async::Value {
    type Error = Error;

    fn try_from(value: ValueWrap) -> Result<Self, Self::Error> {
        type MySqlValue = mysql_async::Value;
        macro_rules! ensure_date_range {
            ($date:expr) => {{
                let date = $date;
                if (0..=9999).contains(&date.year()) {
                    Ok(MySqlValue::Date(
                        date.year() as _,
                        date.month().into(),
                        date.day(),
                        date.hour(),
                        date.minute(),
                        date.second(),
                        date.microsecond(),
                    ))
                } else {
                    Err(Error::msg(format!("Date {} is out of range for MySQL", date)))
                }
            }};
        }
        Ok(match value.0 {
            _ if value.0.is_null() => MySqlValue::NULL,
            Value::Boolean(Some(v)) => MySqlValue::from(v),
            Value::Int8(Some(v)) => MySqlValue::from(v),
            Value::Int16(Some(v)) => MySqlValue::from(v),
            Value::Int32(Some(v)) => MySqlValue::from(v),
            Value::Int64(Some(v)) => MySqlValue::from(v),
            Value::UInt8(Some(v)) => MySqlValue::from(v),
            Value::UInt16(Some(v)) => MySqlValue::from(v),
            Value::UInt32(Some(v)) => MySqlValue::from(v),
            Value::UInt64(Some(v)) => MySqlValue::from(v),
            Value::Float32(Some(v)) => MySqlValue::from(v),
            Value::Float64(Some(v)) => MySqlValue::from(v),
            Value::Decimal(Some(v)) => MySqlValue::from(v),
            Value::Varchar(Some(v)) => MySqlValue::from(v),
            Value::Blob(Some(v)) => MySqlValue::from(v.into_vec()),
            Value::Date(Some(v)) => ensure_date_range!(v.midnight())?,
            Value::Time(Some(v)) => MySqlValue::from(v),
            Value::Timestamp(Some(v)) => ensure_date_range!(v)?,
            Value::TimestampWithTimezone(Some(v)) => {
                let v = v.to_offset(UtcOffset::UTC);
                ensure_date_range!(PrimitiveDateTime::new(v.date(), v.time()))?
            }
            Value::Uuid(Some(v)) => MySqlValue::from(v.hyphenated().to_string()),
            ref v => {
                return Err(Error::msg(format!(
                    "Value `{:?}` cannot be bound as a MySQL parameter",
                    v
                )));
            }
        })
    }
}

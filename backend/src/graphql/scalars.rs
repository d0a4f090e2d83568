//! Custom GraphQL scalars

use async_graphql::{InputValueResult, Scalar, ScalarType, Value};
use chrono::{TimeZone, Utc};

use crate::db::sqlite_helpers::{datetime_to_str, str_to_datetime};

/// The `DateTime` scalar.
///
/// Output is an RFC 3339 string in UTC with millisecond precision. Input
/// accepts RFC 3339 strings, bare `YYYY-MM-DD` dates and millisecond
/// timestamps. Anything else, including unparsable strings, reads as null
/// instead of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTimeScalar(pub Option<chrono::DateTime<Utc>>);

impl DateTimeScalar {
    pub fn into_inner(self) -> Option<chrono::DateTime<Utc>> {
        self.0
    }
}

impl From<chrono::DateTime<Utc>> for DateTimeScalar {
    fn from(value: chrono::DateTime<Utc>) -> Self {
        Self(Some(value))
    }
}

fn parse_millis(value: &async_graphql::Number) -> Option<chrono::DateTime<Utc>> {
    let millis = value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))?;
    Utc.timestamp_millis_opt(millis).single()
}

#[Scalar(name = "DateTime")]
impl ScalarType for DateTimeScalar {
    fn parse(value: Value) -> InputValueResult<Self> {
        let parsed = match &value {
            Value::String(s) => str_to_datetime(s),
            Value::Number(n) => parse_millis(n),
            _ => None,
        };
        if parsed.is_none() {
            tracing::debug!(value = %value, "Unparsable DateTime input, using null");
        }
        Ok(Self(parsed))
    }

    fn to_value(&self) -> Value {
        match self.0 {
            Some(dt) => Value::String(datetime_to_str(dt)),
            None => Value::Null,
        }
    }
}

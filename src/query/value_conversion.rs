//! `sea_query::Value` to `ToSql` parameter conversion.
//!
//! Each value becomes an owned, boxed `ToSql`; the closure receives borrowed
//! views into that storage, so the references stay valid for the whole call.
//! NULLs keep the Rust type of their variant so PostgreSQL infers the right
//! parameter type.

use crate::executor::DaoError;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use may_postgres::types::ToSql;
use rust_decimal::Decimal;
use sea_query::Value;
use uuid::Uuid;

type Param = Box<dyn ToSql + Sync>;

/// Convert `values` and run `f` with the positional parameters
///
/// # Errors
///
/// Returns `DaoError::Query` for unsupported variants or out-of-range unsigned
/// integers, otherwise whatever `f` returns.
pub fn with_converted_params<F, R>(values: &[Value], f: F) -> Result<R, DaoError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, DaoError>,
{
    let owned = values
        .iter()
        .map(to_param)
        .collect::<Result<Vec<Param>, DaoError>>()?;
    let params: Vec<&dyn ToSql> = owned.iter().map(|p| p.as_ref() as &dyn ToSql).collect();
    f(&params)
}

fn boxed<T: ToSql + Sync + 'static>(value: T) -> Param {
    Box::new(value)
}

fn to_param(value: &Value) -> Result<Param, DaoError> {
    let param = match value {
        Value::Bool(v) => boxed(*v),
        Value::TinyInt(v) => boxed(v.map(i16::from)),
        Value::SmallInt(v) => boxed(*v),
        Value::Int(v) => boxed(*v),
        Value::BigInt(v) => boxed(*v),
        Value::TinyUnsigned(v) => boxed(v.map(i16::from)),
        Value::SmallUnsigned(v) => boxed(v.map(i32::from)),
        Value::Unsigned(v) => boxed(v.map(i64::from)),
        Value::BigUnsigned(v) => boxed(
            v.map(|u| {
                i64::try_from(u).map_err(|_| {
                    DaoError::Query(format!(
                        "unsigned value {u} exceeds i64::MAX and cannot be bound"
                    ))
                })
            })
            .transpose()?,
        ),
        Value::Float(v) => boxed(*v),
        Value::Double(v) => boxed(*v),
        Value::String(v) => boxed(v.as_ref().map(|s| String::clone(s))),
        Value::Char(v) => boxed(v.map(String::from)),
        Value::Bytes(v) => boxed(v.as_ref().map(|b| Vec::<u8>::clone(b))),
        Value::Json(v) => boxed(v.as_ref().map(|j| serde_json::Value::clone(j))),
        Value::ChronoDate(v) => boxed(v.as_ref().map(|d| NaiveDate::clone(d))),
        Value::ChronoTime(v) => boxed(v.as_ref().map(|t| NaiveTime::clone(t))),
        Value::ChronoDateTime(v) => boxed(v.as_ref().map(|t| NaiveDateTime::clone(t))),
        Value::ChronoDateTimeUtc(v) => boxed(v.as_ref().map(|t| DateTime::<Utc>::clone(t))),
        Value::ChronoDateTimeLocal(v) => boxed(v.as_ref().map(|t| DateTime::<Local>::clone(t))),
        Value::ChronoDateTimeWithTimeZone(v) => {
            boxed(v.as_ref().map(|t| DateTime::<FixedOffset>::clone(t)))
        }
        Value::Uuid(v) => boxed(v.as_ref().map(|u| Uuid::clone(u))),
        Value::Decimal(v) => boxed(v.as_ref().map(|d| Decimal::clone(d))),
        #[allow(unreachable_patterns)]
        other => {
            return Err(DaoError::Query(format!(
                "Unsupported value type in query: {other:?}"
            )))
        }
    };
    Ok(param)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_align_with_values() {
        let values = vec![
            Value::from(1i32),
            Value::from("code"),
            Value::Int(None),
            Value::from(true),
            Value::from(2.5f64),
        ];
        let count = with_converted_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn test_empty_values() {
        let count = with_converted_params(&[], |params| Ok(params.len())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_big_unsigned_overflow_is_rejected() {
        let values = vec![Value::BigUnsigned(Some(u64::MAX))];
        let err = with_converted_params(&values, |_| Ok(())).unwrap_err();
        assert!(matches!(err, DaoError::Query(_)));
    }

    #[test]
    fn test_closure_error_is_returned() {
        let values = vec![Value::from(7i64)];
        let err = with_converted_params(&values, |_| -> Result<(), DaoError> {
            Err(DaoError::Other("driver down".to_string()))
        })
        .unwrap_err();
        assert!(err.to_string().contains("driver down"));
    }
}

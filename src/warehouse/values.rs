use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt::{Display, Write};
use tiberius::{ColumnData, FromSql};

use crate::error::WarehouseError;

/// Render any cell as CSV text. NULL becomes the empty string.
pub fn cell_to_text(data: &ColumnData<'static>) -> String {
    match data {
        ColumnData::U8(v) => display(v),
        ColumnData::I16(v) => display(v),
        ColumnData::I32(v) => display(v),
        ColumnData::I64(v) => display(v),
        ColumnData::F32(v) => display(v),
        ColumnData::F64(v) => display(v),
        ColumnData::Bit(v) => v
            .map(|b| if b { "True" } else { "False" }.to_string())
            .unwrap_or_default(),
        ColumnData::String(v) => v.as_deref().unwrap_or_default().to_string(),
        ColumnData::Guid(v) => display(v),
        ColumnData::Binary(v) => v.as_deref().map(hex).unwrap_or_default(),
        ColumnData::Numeric(v) => display(v),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|xml| (**xml).clone().into_string())
            .unwrap_or_default(),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            temporal::<NaiveDateTime>(data)
        }
        ColumnData::Date(_) => temporal::<NaiveDate>(data),
        ColumnData::Time(_) => temporal::<NaiveTime>(data),
        ColumnData::DateTimeOffset(_) => temporal::<DateTime<FixedOffset>>(data),
        #[allow(unreachable_patterns)]
        other => format!("{:?}", other),
    }
}

/// Read an integer cell of any width as `i64`
pub fn cell_to_i64(column: &str, data: &ColumnData<'static>) -> Result<i64, WarehouseError> {
    let value = match data {
        ColumnData::U8(Some(v)) => Some(i64::from(*v)),
        ColumnData::I16(Some(v)) => Some(i64::from(*v)),
        ColumnData::I32(Some(v)) => Some(i64::from(*v)),
        ColumnData::I64(Some(v)) => Some(*v),
        // bigint aggregates sometimes come back as decimal(19,0)
        ColumnData::Numeric(Some(n)) if n.scale() == 0 => i64::try_from(n.value()).ok(),
        _ => None,
    };

    value.ok_or_else(|| WarehouseError::UnexpectedValue {
        column: column.to_string(),
        found: describe(data),
    })
}

fn describe(data: &ColumnData<'static>) -> String {
    let text = cell_to_text(data);
    if text.is_empty() && is_null(data) {
        "NULL".to_string()
    } else {
        format!("{:?}", text)
    }
}

fn is_null(data: &ColumnData<'static>) -> bool {
    matches!(
        data,
        ColumnData::U8(None)
            | ColumnData::I16(None)
            | ColumnData::I32(None)
            | ColumnData::I64(None)
            | ColumnData::F32(None)
            | ColumnData::F64(None)
            | ColumnData::Bit(None)
            | ColumnData::String(None)
            | ColumnData::Guid(None)
            | ColumnData::Binary(None)
            | ColumnData::Numeric(None)
            | ColumnData::Xml(None)
            | ColumnData::DateTime(None)
            | ColumnData::SmallDateTime(None)
            | ColumnData::Time(None)
            | ColumnData::Date(None)
            | ColumnData::DateTime2(None)
            | ColumnData::DateTimeOffset(None)
    )
}

fn display<T: Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

fn temporal<'a, T>(data: &'a ColumnData<'static>) -> String
where
    T: FromSql<'a> + Display,
{
    T::from_sql(data)
        .ok()
        .flatten()
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        let _ = write!(out, "{:02X}", b);
    }
    out
}

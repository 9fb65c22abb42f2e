//! Row materialization: raw row-candidate objects into typed rows.
//!
//! Conversion is lenient. Failures are recorded in the threaded `Problems`
//! collector and never abort the batch; a failed scalar conversion yields
//! Null, a failed array-element conversion drops the element, and a raw
//! value of an unsupported runtime type is kept as-is.

use crate::problem::{Error, Problems};
use crate::table::schema::{ColumnSchema, ColumnType};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// One materialized row: column name to typed value, aligned to the schema.
pub type Row = IndexMap<String, Value>;

// Fast-path check before handing a candidate string to chrono.
static DATETIME_SHAPE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}:\d{2}(\.\d+)?)?$").unwrap()
});

/// Materialize every row-candidate object into a typed row.
///
/// `top` caps the total number of rows across all candidate lists combined.
/// Non-object elements are not row candidates and are skipped.
pub fn materialize_rows(
    candidates: &[&Vec<Value>],
    schema: &[ColumnSchema],
    top: Option<usize>,
    problems: &mut Problems,
) -> Vec<Row> {
    let mut rows = Vec::new();

    for candidate in candidates {
        for element in candidate.iter() {
            if let Some(cap) = top {
                if rows.len() >= cap {
                    return rows;
                }
            }
            let Some(obj) = element.as_object() else { continue };

            let mut row = Row::with_capacity(schema.len());
            for column in schema {
                let raw = obj.get(&column.name).unwrap_or(&Value::Null);
                let typed = if column.array {
                    convert_array(raw, column, problems)
                } else {
                    convert_scalar(raw, column, problems)
                };
                row.insert(column.name.clone(), typed);
            }
            rows.push(row);
        }
    }

    rows
}

/// Convert an array occurrence: every element is coerced to the column's
/// element type, and an element that fails to convert is dropped.
fn convert_array(raw: &Value, column: &ColumnSchema, problems: &mut Problems) -> Value {
    let elements: Vec<&Value> = match raw {
        Value::Null => return Value::Null,
        Value::Array(items) => items.iter().collect(),
        // A scalar occurrence of an array column converts as a
        // single-element array.
        other => vec![other],
    };

    let mut typed = Vec::with_capacity(elements.len());
    for element in elements {
        let before = problems.total();
        let converted = convert_scalar(element, column, problems);
        if problems.total() == before {
            typed.push(converted);
        }
    }
    Value::Array(typed)
}

fn convert_scalar(raw: &Value, column: &ColumnSchema, problems: &mut Problems) -> Value {
    match raw {
        Value::Null => Value::Null,
        Value::String(s) => convert_string(s, column, problems),
        other => convert_raw(other, column, problems),
    }
}

/// String values parse per the declared type. A parse failure records a
/// problem and yields Null; an empty string yields Null without a problem
/// for non-text columns.
fn convert_string(s: &str, column: &ColumnSchema, problems: &mut Problems) -> Value {
    if s.eq_ignore_ascii_case("null") {
        return Value::Null;
    }

    if s.is_empty() && !matches!(column.ty, ColumnType::Text) {
        return Value::Null;
    }
    let parsed = match &column.ty {
        ColumnType::Text => return Value::String(s.to_string()),
        ColumnType::Bool => parse_bool(s).map(Value::Bool),
        ColumnType::Int => s.trim().parse::<i64>().ok().map(Value::Int),
        ColumnType::Double { .. } => s.trim().parse::<f64>().ok().map(Value::Double),
        ColumnType::DateTime => parse_datetime(s).map(Value::DateTime),
    };
    match parsed {
        Some(value) => value,
        None => {
            problems.push(conversion_problem(s, "string", &column.ty));
            Value::Null
        }
    }
}

/// Non-string raw values: the matching runtime type passes through, ints
/// widen to doubles, doubles truncate to ints; anything else records a
/// problem and keeps the raw value as-is.
fn convert_raw(raw: &Value, column: &ColumnSchema, problems: &mut Problems) -> Value {
    match (&column.ty, raw) {
        (ColumnType::Bool, Value::Bool(_))
        | (ColumnType::Int, Value::Int(_))
        | (ColumnType::Double { .. }, Value::Double(_))
        | (ColumnType::DateTime, Value::DateTime(_)) => raw.clone(),
        (ColumnType::Double { .. }, Value::Int(i)) => Value::Double(*i as f64),
        (ColumnType::Int, Value::Double(d)) => Value::Int(d.trunc() as i64),
        (ty, other) => {
            problems.push(conversion_problem(&other.to_string(), other.kind(), ty));
            raw.clone()
        }
    }
}

fn conversion_problem(value: &str, kind: &'static str, ty: &ColumnType) -> Error {
    Error::TypeConversionFailure {
        value: value.to_string(),
        kind,
        target: type_name(ty).to_string(),
    }
}

fn type_name(ty: &ColumnType) -> &'static str {
    match ty {
        ColumnType::Bool => "boolean",
        ColumnType::Int => "integer",
        ColumnType::Double { .. } => "double",
        ColumnType::DateTime => "datetime",
        ColumnType::Text => "string",
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Lenient datetime literal parsing: ISO date-time with `T` or space
/// separator, optional fractional seconds, or a bare date at midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if !DATETIME_SHAPE_REGEX.is_match(s) {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

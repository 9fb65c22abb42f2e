//! Deriving a tabular view from a value graph.
//!
//! `read_table` is the front door: locate row-candidate arrays, infer a
//! column schema over them, then materialize typed rows.

pub mod rows;
pub mod schema;

pub use rows::{materialize_rows, Row};
pub use schema::{infer_schema, ColumnSchema, ColumnSource, ColumnType, TableOptions};

use crate::navigate::find_arrays;
use crate::problem::{Error, Problems};
use crate::value::Value;

/// A derived table: ordered column schema plus the materialized rows.
#[derive(Debug)]
pub struct Table {
    pub columns: Vec<ColumnSchema>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Render the rows as a JSON array of objects for the external encoder.
    pub fn to_json_rows(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::with_capacity(row.len());
                for (name, value) in row {
                    obj.insert(name.clone(), value.to_json());
                }
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}

/// Read a table out of a value graph.
///
/// `array_name` selects the row-candidate arrays (empty name = first array
/// found); with `append_all` every array of that name in the tree
/// contributes rows. `top` caps total materialized rows. Conversion
/// problems accumulate in `problems`; a root that is neither an object nor
/// an array, or a name that locates no array at all, is fatal.
pub fn read_table(
    root: &Value,
    array_name: &str,
    append_all: bool,
    options: &TableOptions,
    top: Option<usize>,
    problems: &mut Problems,
) -> Result<Table, Error> {
    match root {
        Value::Object(_) | Value::Array(_) => {}
        other => return Err(Error::MalformedInput(other.kind())),
    }

    let candidates = find_arrays(root, array_name, append_all);
    if candidates.is_empty() {
        return Err(Error::PathNotFound(format!(
            "no array named {:?}",
            array_name
        )));
    }

    let columns = infer_schema(&candidates, options);
    let rows = materialize_rows(&candidates, &columns, top, problems);
    Ok(Table { columns, rows })
}

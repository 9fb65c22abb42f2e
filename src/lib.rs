//! # Quarry - path-addressed JSON mutation and table derivation
//!
//! A library for working with JSON-shaped value trees through dotted,
//! wildcard-capable property paths: reading tabular data out of nested
//! documents (with column type inference), and writing properties back in,
//! singly or broadcast across array elements.
//!
//! ## Modules
//!
//! - **value**: the dynamically-typed value graph (`Value`)
//! - **path**: dotted paths with `*` glob segments (`PathExpr`)
//! - **navigate**: array-by-name and parent-container location
//! - **table**: schema inference and row materialization
//! - **mutate**: get/set/initialize properties at a path
//! - **matcher**: correlate external table rows to nested objects
//! - **problem**: error taxonomy and the capped problem collector
//!
//! ## Quick Start
//!
//! ### Reading a table
//!
//! ```rust
//! use quarry::{read_table, Problems, TableOptions, Value};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), quarry::Error> {
//! let root = Value::from_json(json!({
//!     "sites": {
//!         "station": [
//!             {"id": "A", "value": 1},
//!             {"id": "B", "value": 2}
//!         ]
//!     }
//! }));
//!
//! let mut problems = Problems::new();
//! let table = read_table(&root, "station", false, &TableOptions::default(), None, &mut problems)?;
//!
//! assert_eq!(table.columns.len(), 2);
//! assert_eq!(table.rows.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ### Setting a property
//!
//! ```rust
//! use quarry::{get_property, set_property, PathExpr, Problems, Value};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), quarry::Error> {
//! let mut root = Value::from_json(json!({"meta": {"version": 1}}));
//! let path = PathExpr::parse("meta.version")?;
//!
//! set_property(&mut root, &path, Value::Int(2))?;
//!
//! let mut problems = Problems::new();
//! assert_eq!(get_property(&root, &path, &mut problems), Some(Value::Int(2)));
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::io::BufRead;

pub mod matcher;
pub mod mutate;
pub mod navigate;
pub mod path;
pub mod problem;
pub mod table;
pub mod value;

// Re-export commonly used types for convenience
pub use matcher::{update_record, MatchSpec, PropertyMap};
pub use mutate::{get_property, initialize_properties, set_property};
pub use navigate::{find_arrays, locate_parent, resolve, resolve_mut, Step};
pub use path::{PathExpr, Segment};
pub use problem::{Error, Problems, MAX_REPORTED_PROBLEMS};
pub use table::{
    infer_schema, materialize_rows, read_table, ColumnSchema, ColumnSource, ColumnType, Row,
    Table, TableOptions,
};
pub use value::{Value, DATETIME_FORMAT};

/// Convenience entry point: decode a JSON document from a reader and derive
/// a table from it. Returns the table together with any non-fatal problems
/// collected during materialization.
pub fn read_table_from_reader<R: BufRead>(
    reader: R,
    array_name: &str,
    append_all: bool,
    options: &TableOptions,
    top: Option<usize>,
) -> Result<(Table, Problems)> {
    let decoded: serde_json::Value =
        serde_json::from_reader(reader).context("Failed to parse JSON")?;
    let root = Value::from_json(decoded);

    let mut problems = Problems::new();
    let table = read_table(&root, array_name, append_all, options, top, &mut problems)
        .context("Failed to derive table")?;
    Ok((table, problems))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_table_from_reader() {
        let input = json!({
            "rows": [
                {"id": 1, "name": "Alice"},
                {"id": 2, "name": "Bob"}
            ]
        })
        .to_string();

        let (table, problems) = read_table_from_reader(
            input.as_bytes(),
            "rows",
            false,
            &TableOptions::default(),
            None,
        )
        .unwrap();

        assert!(problems.is_empty());
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["name"], Value::String("Alice".to_string()));
    }

    #[test]
    fn test_decoded_documents_keep_document_key_order() {
        // Keys deliberately out of alphabetical order; column order must
        // follow the document, all the way from JSON text.
        let input = r#"{"rows": [{"zeta": 1, "alpha": 2, "mid": 3}]}"#;

        let (table, _) = read_table_from_reader(
            input.as_bytes(),
            "rows",
            false,
            &TableOptions::default(),
            None,
        )
        .unwrap();

        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }
}

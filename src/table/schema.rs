//! Column schema inference over row-candidate objects.
//!
//! This is a streaming accumulator: one pass discovers columns in first-seen
//! key order, tallies per-column type counts, then a final resolve step
//! turns tallies into column types. Caller overrides always win over the
//! tallied decision.

use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Inferred or forced type of one table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Bool,
    Int,
    Double { precision: u32 },
    DateTime,
    Text,
}

/// Whether a column's type came from the tallies or from a caller override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnSource {
    Inferred,
    Overridden,
}

/// Description of one table column. Column order across a schema follows
/// first-seen key order over the scanned rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
    /// True when the column holds arrays of the given type.
    pub array: bool,
    /// Approximate rendered width, for consumers that size columns.
    pub width: usize,
    pub source: ColumnSource,
}

/// Caller knobs for schema inference. All name lists match column names
/// case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct TableOptions {
    /// Keys to leave out of the schema entirely.
    pub exclude_names: Vec<String>,
    /// Keys whose array values become array-typed columns. Array-valued
    /// keys not listed here are skipped.
    pub array_columns: Vec<String>,
    pub boolean_columns: Vec<String>,
    pub datetime_columns: Vec<String>,
    pub double_columns: Vec<String>,
    pub integer_columns: Vec<String>,
    pub text_columns: Vec<String>,
}

impl TableOptions {
    fn override_for(&self, name: &str) -> Option<ColumnType> {
        if contains_ci(&self.boolean_columns, name) {
            Some(ColumnType::Bool)
        } else if contains_ci(&self.datetime_columns, name) {
            Some(ColumnType::DateTime)
        } else if contains_ci(&self.double_columns, name) {
            Some(ColumnType::Double {
                precision: DEFAULT_PRECISION,
            })
        } else if contains_ci(&self.integer_columns, name) {
            Some(ColumnType::Int)
        } else if contains_ci(&self.text_columns, name) {
            Some(ColumnType::Text)
        } else {
            None
        }
    }

    fn is_excluded(&self, name: &str) -> bool {
        contains_ci(&self.exclude_names, name)
    }

    fn is_array_column(&self, name: &str) -> bool {
        contains_ci(&self.array_columns, name)
    }
}

fn contains_ci(names: &[String], name: &str) -> bool {
    names.iter().any(|n| n.eq_ignore_ascii_case(name))
}

const DEFAULT_PRECISION: u32 = 6;
const BOOL_WIDTH: usize = 5;
const DATETIME_WIDTH: usize = 19;

/// Per-column tallies accumulated over every occurrence.
#[derive(Debug, Default)]
struct ColumnStats {
    nulls: usize,
    bools: usize,
    ints: usize,
    doubles: usize,
    strings: usize,
    /// Max rendered length of any non-null value seen.
    max_text_len: usize,
    /// Max fractional digits after the last `.` in string values.
    frac_digits: u32,
    /// Max integer magnitude seen across ints and doubles.
    max_magnitude: u64,
    /// For array columns, the longest occurrence.
    max_elements: usize,
    saw_array: bool,
}

impl ColumnStats {
    fn tally(&mut self, value: &Value) {
        match value {
            Value::Null => self.nulls += 1,
            Value::Bool(_) => {
                self.bools += 1;
                self.max_text_len = self.max_text_len.max(BOOL_WIDTH);
            }
            Value::Int(i) => {
                // An int is a widenable double, so it tallies as both; the
                // Int decision below requires ints == doubles, i.e. every
                // numeric occurrence was an int.
                self.ints += 1;
                self.doubles += 1;
                self.max_magnitude = self.max_magnitude.max(i.unsigned_abs());
                self.max_text_len = self.max_text_len.max(i.to_string().len());
            }
            Value::Double(d) => {
                self.doubles += 1;
                self.max_magnitude = self.max_magnitude.max(d.abs().trunc() as u64);
                self.max_text_len = self.max_text_len.max(d.to_string().len());
            }
            Value::String(s) => {
                self.strings += 1;
                self.max_text_len = self.max_text_len.max(s.len());
                if let Some(frac) = fractional_digits(s) {
                    self.frac_digits = self.frac_digits.max(frac);
                }
            }
            // DateTime never comes out of the JSON decoder but can appear
            // after mutation; it counts as a string occurrence of its
            // external representation.
            Value::DateTime(_) => {
                self.strings += 1;
                self.max_text_len = self.max_text_len.max(DATETIME_WIDTH);
            }
            // Nested containers are not tallied; discovery already decided
            // whether an array occurrence contributes elements.
            Value::Array(_) | Value::Object(_) => {}
        }
    }

    /// Resolve the tallies into a type, ignoring overrides.
    fn decide(&self) -> ColumnType {
        if self.bools > 0 && self.strings == 0 && self.doubles == 0 && self.ints == 0 {
            ColumnType::Bool
        } else if self.ints > 0
            && self.strings == 0
            && (self.doubles == 0 || self.ints == self.doubles)
        {
            ColumnType::Int
        } else if self.doubles > 0 && self.strings == 0 {
            ColumnType::Double {
                precision: self.precision(),
            }
        } else {
            ColumnType::Text
        }
    }

    fn precision(&self) -> u32 {
        if (1..=DEFAULT_PRECISION).contains(&self.frac_digits) {
            self.frac_digits
        } else {
            DEFAULT_PRECISION
        }
    }

    /// Approximate rendered width of one scalar of the given type.
    fn scalar_width(&self, name: &str, ty: &ColumnType) -> usize {
        match ty {
            ColumnType::Bool => BOOL_WIDTH,
            ColumnType::Int => digits(self.max_magnitude),
            ColumnType::Double { precision } => {
                digits(self.max_magnitude) + 1 + *precision as usize
            }
            ColumnType::DateTime => DATETIME_WIDTH,
            ColumnType::Text => {
                if self.max_text_len > 0 {
                    self.max_text_len
                } else {
                    name.len()
                }
            }
        }
    }

    /// Width for the final column: brackets and separators are added for
    /// array columns so the width approximates the comma-joined form.
    fn width(&self, name: &str, ty: &ColumnType, array: bool) -> usize {
        let scalar = self.scalar_width(name, ty);
        if array {
            2 + self.max_elements * (scalar + 1)
        } else {
            scalar
        }
    }
}

fn digits(mut magnitude: u64) -> usize {
    let mut count = 1;
    while magnitude >= 10 {
        magnitude /= 10;
        count += 1;
    }
    count
}

/// Count the digits after the last `.` in a string, if the tail is all
/// digits. Used as the precision hint for double columns.
fn fractional_digits(s: &str) -> Option<u32> {
    let (_, tail) = s.rsplit_once('.')?;
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(tail.len() as u32)
}

/// Infer an ordered column schema from one or more row-candidate arrays.
///
/// Non-object elements of candidate arrays are not row candidates and are
/// skipped. Running this twice over the same input yields an identical
/// schema.
pub fn infer_schema(candidates: &[&Vec<Value>], options: &TableOptions) -> Vec<ColumnSchema> {
    let mut stats: IndexMap<String, ColumnStats> = IndexMap::new();

    for candidate in candidates {
        for row in candidate.iter() {
            let Some(obj) = row.as_object() else { continue };
            for (key, value) in obj {
                if options.is_excluded(key) {
                    continue;
                }
                match value {
                    // Nested objects never become columns.
                    Value::Object(_) => continue,
                    Value::Array(items) => {
                        if !options.is_array_column(key) {
                            continue;
                        }
                        let entry = stats.entry(key.clone()).or_default();
                        entry.saw_array = true;
                        entry.max_elements = entry.max_elements.max(items.len());
                        for element in items {
                            entry.tally(element);
                        }
                    }
                    _ => {
                        stats.entry(key.clone()).or_default().tally(value);
                    }
                }
            }
        }
    }

    stats
        .into_iter()
        .map(|(name, column)| {
            let (ty, source) = match options.override_for(&name) {
                Some(forced) => (forced, ColumnSource::Overridden),
                None => (column.decide(), ColumnSource::Inferred),
            };
            let array = column.saw_array;
            let width = column.width(&name, &ty, array);
            ColumnSchema {
                name,
                ty,
                array,
                width,
                source,
            }
        })
        .collect()
}

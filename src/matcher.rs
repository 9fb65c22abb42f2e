//! Correlating external table rows to nested objects.
//!
//! A `MatchSpec` pairs table field names with target paths that share a
//! common prefix; the matcher descends that prefix the same way parent
//! location does, tests every candidate object it reaches by multi-field
//! equality, and applies a remapped property update to the first full
//! match.

use crate::path::PathExpr;
use crate::problem::{Error, Problems};
use crate::value::Value;
use indexmap::IndexMap;

/// Ordered (table field, target path) pairs. All paths are assumed to share
/// an identical prefix of length `segments(first) - 1`; that invariant is
/// the caller's to uphold, not validated here.
#[derive(Debug, Clone)]
pub struct MatchSpec {
    pairs: Vec<(String, PathExpr)>,
}

impl MatchSpec {
    pub fn new(pairs: Vec<(String, PathExpr)>) -> Result<Self, Error> {
        if pairs.is_empty() {
            return Err(Error::MalformedPath("empty match spec".to_string()));
        }
        Ok(MatchSpec { pairs })
    }

    /// Build from raw `field -> dotted path` pairs.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, Error> {
        let mut parsed = Vec::with_capacity(pairs.len());
        for (field, path) in pairs {
            parsed.push((field.clone(), PathExpr::parse(path)?));
        }
        MatchSpec::new(parsed)
    }

    /// Number of shared prefix segments above the leaf fields.
    fn common_depth(&self) -> usize {
        self.pairs[0].1.len() - 1
    }

    /// The shared prefix, taken from the first path.
    fn prefix(&self) -> &PathExpr {
        &self.pairs[0].1
    }
}

/// Table-field to object-property-name remap. Fields without an entry keep
/// their own name.
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    remap: IndexMap<String, String>,
}

impl PropertyMap {
    /// The identity remap.
    pub fn identity() -> Self {
        PropertyMap::default()
    }

    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut remap = IndexMap::new();
        for (field, property) in pairs {
            remap.insert(field.clone(), property.clone());
        }
        PropertyMap { remap }
    }

    fn resolve<'a>(&'a self, field: &'a str) -> &'a str {
        self.remap.get(field).map(String::as_str).unwrap_or(field)
    }
}

/// Find the unique object matching `match_values` and apply `updates` to it.
///
/// Candidate objects live at the spec's common depth; each is tested field
/// by field (two Nulls are equal, one Null is not, everything else compares
/// by external string representation). The first full match wins and
/// receives every update, with field names remapped through `property_map`.
/// No match leaves the tree unchanged and records a problem.
pub fn update_record(
    root: &mut Value,
    spec: &MatchSpec,
    match_values: &[Value],
    updates: &[(String, Value)],
    property_map: &PropertyMap,
    problems: &mut Problems,
) -> bool {
    let depth = spec.common_depth();

    let matched = match root {
        Value::Object(map) => {
            if depth == 0 {
                try_candidates(map, spec, match_values, updates, property_map)
            } else {
                descend(map, spec, 0, depth, match_values, updates, property_map)
            }
        }
        Value::Array(items) => {
            let mut found = false;
            for element in items.iter_mut() {
                if let Value::Object(map) = element {
                    found = if depth == 0 {
                        try_candidates(map, spec, match_values, updates, property_map)
                    } else {
                        descend(map, spec, 0, depth, match_values, updates, property_map)
                    };
                    if found {
                        break;
                    }
                }
            }
            found
        }
        _ => false,
    };

    if !matched {
        let rendered: Vec<String> = match_values.iter().map(|v| v.to_string()).collect();
        problems.push(Error::RecordNotMatched(rendered.join(", ")));
    }
    matched
}

fn descend(
    obj: &mut IndexMap<String, Value>,
    spec: &MatchSpec,
    levels_processed: usize,
    depth: usize,
    match_values: &[Value],
    updates: &[(String, Value)],
    property_map: &PropertyMap,
) -> bool {
    let segment = &spec.prefix().segments()[levels_processed];

    for (key, entry) in obj.iter_mut() {
        if !segment.matches(key) {
            continue;
        }
        let at_candidates = levels_processed + 1 == depth;
        match entry {
            Value::Object(inner) => {
                let hit = if at_candidates {
                    try_candidates(inner, spec, match_values, updates, property_map)
                } else {
                    descend(
                        inner,
                        spec,
                        levels_processed + 1,
                        depth,
                        match_values,
                        updates,
                        property_map,
                    )
                };
                if hit {
                    return true;
                }
            }
            Value::Array(items) => {
                for element in items.iter_mut() {
                    if let Value::Object(inner) = element {
                        let hit = if at_candidates {
                            try_candidates(inner, spec, match_values, updates, property_map)
                        } else {
                            descend(
                                inner,
                                spec,
                                levels_processed + 1,
                                depth,
                                match_values,
                                updates,
                                property_map,
                            )
                        };
                        if hit {
                            return true;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    false
}

/// Test one candidate object against every match field; on a full match,
/// apply the updates and report success.
fn try_candidates(
    candidate: &mut IndexMap<String, Value>,
    spec: &MatchSpec,
    match_values: &[Value],
    updates: &[(String, Value)],
    property_map: &PropertyMap,
) -> bool {
    for (i, (_, path)) in spec.pairs.iter().enumerate() {
        let leaf = path.leaf();
        let candidate_value = candidate
            .iter()
            .find(|(key, _)| leaf.matches(key.as_str()))
            .map(|(_, value)| value)
            .unwrap_or(&Value::Null);
        let expected = match_values.get(i).unwrap_or(&Value::Null);
        if !values_equal(candidate_value, expected) {
            return false;
        }
    }

    for (field, value) in updates {
        let property = property_map.resolve(field);
        candidate.insert(property.to_string(), value.clone());
    }
    true
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.is_null(), b.is_null()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        (false, false) => a.to_string() == b.to_string(),
    }
}

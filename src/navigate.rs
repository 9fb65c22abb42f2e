//! Recursive descent over the value graph.
//!
//! Two search modes: locating arrays by name (the row-candidate source for
//! the table module) and locating the direct parent container of a path's
//! leaf segment (the anchor for property mutation).
//!
//! Parent location is split into a search phase and a resolve phase: the
//! search records the concrete key/index hops from the root as a `Step`
//! list, and `resolve`/`resolve_mut` walk those hops afterwards. One search
//! then serves both the read path and the write path.

use crate::path::PathExpr;
use crate::value::Value;
use indexmap::IndexMap;

/// One concrete hop from a container to the entry inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Object entry by key.
    Key(String),
    /// Array element by position.
    Index(usize),
}

/// Find arrays named `name` anywhere in the tree.
///
/// An empty `name` matches the first array-valued entry encountered at the
/// shallowest level that has one, and returns immediately with just that
/// array. Otherwise every entry whose key equals `name` and whose value is
/// an array is a match; with `append_all` false the first match wins, with
/// `append_all` true the whole tree is swept and all matches accumulate.
///
/// An empty result is not an error; the caller decides whether it is fatal.
pub fn find_arrays<'a>(root: &'a Value, name: &str, append_all: bool) -> Vec<&'a Vec<Value>> {
    let mut results = Vec::new();
    match root {
        Value::Object(obj) => {
            search_arrays(obj, name, append_all, &mut results);
        }
        Value::Array(items) => {
            for element in items {
                if let Value::Object(obj) = element {
                    if search_arrays(obj, name, append_all, &mut results) {
                        break;
                    }
                }
            }
        }
        _ => {}
    }
    results
}

/// Two-pass search over one object level. Returns true when the caller
/// should stop scanning (early return on a non-append-all match).
fn search_arrays<'a>(
    obj: &'a IndexMap<String, Value>,
    name: &str,
    append_all: bool,
    results: &mut Vec<&'a Vec<Value>>,
) -> bool {
    // Pass 1: matches at this level.
    for (key, entry) in obj {
        if let Value::Array(items) = entry {
            if name.is_empty() {
                results.push(items);
                return true;
            }
            if key == name {
                results.push(items);
                if !append_all {
                    return true;
                }
            }
        }
    }

    // Pass 2: deeper levels. A non-append-all match at this level already
    // returned above, so reaching here means nothing matched locally or the
    // search is sweeping the whole tree.
    for entry in obj.values() {
        match entry {
            Value::Object(inner) => {
                if search_arrays(inner, name, append_all, results) {
                    return true;
                }
            }
            Value::Array(items) => {
                for element in items {
                    if let Value::Object(inner) = element {
                        if search_arrays(inner, name, append_all, results) {
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

/// Locate the direct parent container of `path`'s leaf segment.
///
/// Returns the hop list from `root` to the parent: an empty list means the
/// root itself is the parent (single-segment path), `None` means no parent
/// was found. The first matching branch wins at every level.
pub fn locate_parent(root: &Value, path: &PathExpr) -> Option<Vec<Step>> {
    if path.len() < 2 {
        // A single-segment path's parent is the root itself.
        return Some(Vec::new());
    }
    let parent_level = path.len() - 2;
    let mut trail = Vec::new();

    match root {
        Value::Object(obj) => {
            if search_parent(obj, path, 0, parent_level, &mut trail) {
                return Some(trail);
            }
        }
        Value::Array(items) => {
            for (idx, element) in items.iter().enumerate() {
                if let Value::Object(obj) = element {
                    trail.push(Step::Index(idx));
                    if search_parent(obj, path, 0, parent_level, &mut trail) {
                        return Some(trail);
                    }
                    trail.pop();
                }
            }
        }
        _ => {}
    }
    None
}

fn search_parent(
    obj: &IndexMap<String, Value>,
    path: &PathExpr,
    levels_processed: usize,
    parent_level: usize,
    trail: &mut Vec<Step>,
) -> bool {
    let segment = &path.segments()[levels_processed];

    for (key, entry) in obj {
        if !segment.matches(key) {
            continue;
        }
        if levels_processed == parent_level {
            trail.push(Step::Key(key.clone()));
            return true;
        }
        match entry {
            Value::Object(inner) => {
                trail.push(Step::Key(key.clone()));
                if search_parent(inner, path, levels_processed + 1, parent_level, trail) {
                    return true;
                }
                trail.pop();
            }
            Value::Array(items) => {
                trail.push(Step::Key(key.clone()));
                for (idx, element) in items.iter().enumerate() {
                    if let Value::Object(inner) = element {
                        trail.push(Step::Index(idx));
                        if search_parent(inner, path, levels_processed + 1, parent_level, trail) {
                            return true;
                        }
                        trail.pop();
                    }
                }
                trail.pop();
            }
            // A scalar cannot hold deeper segments; keep scanning siblings.
            _ => {}
        }
    }

    false
}

/// Walk a hop list immutably.
pub fn resolve<'a>(root: &'a Value, steps: &[Step]) -> Option<&'a Value> {
    let mut current = root;
    for step in steps {
        current = match (current, step) {
            (Value::Object(map), Step::Key(key)) => map.get(key)?,
            (Value::Array(items), Step::Index(idx)) => items.get(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Walk a hop list mutably.
pub fn resolve_mut<'a>(root: &'a mut Value, steps: &[Step]) -> Option<&'a mut Value> {
    let mut current = root;
    for step in steps {
        current = match (current, step) {
            (Value::Object(map), Step::Key(key)) => map.get_mut(key)?,
            (Value::Array(items), Step::Index(idx)) => items.get_mut(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        Value::from_json(json!({
            "meta": {"version": 2},
            "sites": {
                "station": [
                    {"id": "A", "value": 1},
                    {"id": "B", "value": 2}
                ],
                "extra": {"station": [{"id": "C"}]}
            }
        }))
    }

    #[test]
    fn test_find_arrays_by_name_first_match() {
        let root = doc();
        let found = find_arrays(&root, "station", false);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].len(), 2);
    }

    #[test]
    fn test_find_arrays_append_all_sweeps_tree() {
        let root = doc();
        let found = find_arrays(&root, "station", true);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].len(), 2);
        assert_eq!(found[1].len(), 1);
    }

    #[test]
    fn test_find_arrays_empty_name_takes_first_array() {
        let root = Value::from_json(json!({
            "scalar": 1,
            "first": [1, 2],
            "second": [{"a": 1}]
        }));
        let found = find_arrays(&root, "", false);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].len(), 2);
    }

    #[test]
    fn test_find_arrays_recurses_through_array_elements() {
        let root = Value::from_json(json!({
            "outer": [{"inner": {"rows": [1, 2, 3]}}]
        }));
        let found = find_arrays(&root, "rows", false);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].len(), 3);
    }

    #[test]
    fn test_find_arrays_missing_name_is_empty_not_error() {
        let root = doc();
        assert!(find_arrays(&root, "nothing", true).is_empty());
    }

    #[test]
    fn test_locate_parent_single_segment_is_root() {
        let root = doc();
        let path = PathExpr::parse("meta").unwrap();
        let steps = locate_parent(&root, &path).unwrap();
        assert!(steps.is_empty());
        assert!(std::ptr::eq(resolve(&root, &steps).unwrap(), &root));
    }

    #[test]
    fn test_locate_parent_returns_direct_container() {
        let root = doc();
        let path = PathExpr::parse("meta.version").unwrap();
        let steps = locate_parent(&root, &path).unwrap();
        assert_eq!(steps, vec![Step::Key("meta".to_string())]);

        let parent = resolve(&root, &steps).unwrap();
        assert_eq!(parent.as_object().unwrap()["version"], Value::Int(2));
    }

    #[test]
    fn test_locate_parent_descends_through_array_elements() {
        let root = doc();
        // Parent of "value" under sites.station.<element>.value
        let path = PathExpr::parse("sites.station.value").unwrap();
        let steps = locate_parent(&root, &path).unwrap();
        // First match wins: the station array itself is the parent container.
        let parent = resolve(&root, &steps).unwrap();
        assert!(parent.as_array().is_some());
        assert_eq!(parent.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_locate_parent_wildcard_segment() {
        let root = doc();
        let path = PathExpr::parse("sites.stat*.id").unwrap();
        let steps = locate_parent(&root, &path).unwrap();
        let parent = resolve(&root, &steps).unwrap();
        assert!(parent.as_array().is_some());
    }

    #[test]
    fn test_locate_parent_not_found() {
        let root = doc();
        let path = PathExpr::parse("sites.missing.id").unwrap();
        assert!(locate_parent(&root, &path).is_none());
    }

    #[test]
    fn test_resolve_mut_reaches_same_container() {
        let mut root = doc();
        let path = PathExpr::parse("meta.version").unwrap();
        let steps = locate_parent(&root, &path).unwrap();
        let parent = resolve_mut(&mut root, &steps).unwrap();
        parent
            .as_object_mut()
            .unwrap()
            .insert("version".to_string(), Value::Int(3));
        assert_eq!(
            root.as_object().unwrap()["meta"].as_object().unwrap()["version"],
            Value::Int(3)
        );
    }
}

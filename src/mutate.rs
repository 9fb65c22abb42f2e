//! Property mutation: get, set, and initialize values at a dotted path.
//!
//! All three resolve the leaf's parent container the same way; set on an
//! array parent broadcasts across the elements, and initialize visits every
//! matching branch instead of stopping at the first so a batch of
//! table-driven sets starts from a uniform shape.

use crate::navigate::{locate_parent, resolve, resolve_mut};
use crate::path::PathExpr;
use crate::problem::{Error, Problems};
use crate::value::Value;
use indexmap::IndexMap;

/// Read the value at `path`, cloned out of the tree.
///
/// Returns None and records a problem when no parent is found or when the
/// parent is an array (reading through an array parent is not supported,
/// only writing is). A located parent that simply lacks the leaf key
/// returns None without a problem.
pub fn get_property(root: &Value, path: &PathExpr, problems: &mut Problems) -> Option<Value> {
    let Some(steps) = locate_parent(root, path) else {
        problems.push(Error::PathNotFound(path.raw().to_string()));
        return None;
    };
    let Some(parent) = resolve(root, &steps) else {
        problems.push(Error::PathNotFound(path.raw().to_string()));
        return None;
    };

    let leaf = path.leaf();
    match parent {
        Value::Object(map) => {
            for (key, value) in map {
                if leaf.matches(key) {
                    return Some(value.clone());
                }
            }
            None
        }
        Value::Array(_) => {
            problems.push(Error::PathNotFound(format!(
                "{}: reading through an array parent is not supported",
                path.raw()
            )));
            None
        }
        _ => {
            problems.push(Error::PathNotFound(path.raw().to_string()));
            None
        }
    }
}

/// Write `value` at `path`.
///
/// An object parent gets an upsert of the leaf key. An array parent
/// broadcasts: object elements get the leaf set on every matching key
/// (inserted when absent and the leaf is not a wildcard), and a primitive
/// element is replaced wholesale with `value` whatever the leaf token says.
pub fn set_property(root: &mut Value, path: &PathExpr, value: Value) -> Result<(), Error> {
    let steps =
        locate_parent(root, path).ok_or_else(|| Error::PathNotFound(path.raw().to_string()))?;
    let parent =
        resolve_mut(root, &steps).ok_or_else(|| Error::PathNotFound(path.raw().to_string()))?;

    match parent {
        Value::Object(map) => {
            set_in_object(map, path, &value);
            Ok(())
        }
        Value::Array(items) => {
            for element in items.iter_mut() {
                match element {
                    Value::Object(map) => set_in_object(map, path, &value),
                    other => *other = value.clone(),
                }
            }
            Ok(())
        }
        _ => Err(Error::PathNotFound(path.raw().to_string())),
    }
}

fn set_in_object(map: &mut IndexMap<String, Value>, path: &PathExpr, value: &Value) {
    let leaf = path.leaf();
    if leaf.is_pattern() {
        for (key, entry) in map.iter_mut() {
            if leaf.matches(key) {
                *entry = value.clone();
            }
        }
    } else {
        map.insert(leaf.raw().to_string(), value.clone());
    }
}

/// Ensure every object reachable at the level above `match_path`'s leaf has
/// each of `property_names` present, inserting Null where absent.
///
/// Unlike parent location, this descends every matching branch at each
/// level, so all candidate objects end up with a uniform shape.
pub fn initialize_properties(root: &mut Value, match_path: &PathExpr, property_names: &[String]) {
    if match_path.len() < 2 {
        ensure_container(root, property_names);
        return;
    }
    let parent_level = match_path.len() - 2;
    match root {
        Value::Object(map) => init_walk(map, match_path, 0, parent_level, property_names),
        Value::Array(items) => {
            for element in items {
                if let Value::Object(map) = element {
                    init_walk(map, match_path, 0, parent_level, property_names);
                }
            }
        }
        _ => {}
    }
}

fn init_walk(
    obj: &mut IndexMap<String, Value>,
    path: &PathExpr,
    levels_processed: usize,
    parent_level: usize,
    names: &[String],
) {
    let segment = &path.segments()[levels_processed];
    for (key, entry) in obj.iter_mut() {
        if !segment.matches(key) {
            continue;
        }
        if levels_processed == parent_level {
            ensure_container(entry, names);
            continue;
        }
        match entry {
            Value::Object(inner) => {
                init_walk(inner, path, levels_processed + 1, parent_level, names)
            }
            Value::Array(items) => {
                for element in items {
                    if let Value::Object(inner) = element {
                        init_walk(inner, path, levels_processed + 1, parent_level, names);
                    }
                }
            }
            _ => {}
        }
    }
}

fn ensure_container(value: &mut Value, names: &[String]) {
    match value {
        Value::Object(map) => ensure_names(map, names),
        Value::Array(items) => {
            for element in items {
                if let Value::Object(map) = element {
                    ensure_names(map, names);
                }
            }
        }
        _ => {}
    }
}

fn ensure_names(map: &mut IndexMap<String, Value>, names: &[String]) {
    for name in names {
        if !map.contains_key(name) {
            map.insert(name.clone(), Value::Null);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        Value::from_json(json!({
            "meta": {"version": 2},
            "items": [1, 2, 3],
            "sites": {
                "station": [
                    {"id": "A", "value": 1},
                    {"id": "B", "value": 2}
                ]
            }
        }))
    }

    #[test]
    fn test_set_then_get_round_trip() {
        let mut root = doc();
        let path = PathExpr::parse("meta.owner").unwrap();
        set_property(&mut root, &path, Value::from("alice")).unwrap();

        let mut problems = Problems::new();
        let got = get_property(&root, &path, &mut problems).unwrap();
        assert_eq!(got, Value::String("alice".to_string()));
        assert!(problems.is_empty());
    }

    #[test]
    fn test_set_single_segment_path_writes_on_root() {
        let mut root = doc();
        let path = PathExpr::parse("top").unwrap();
        set_property(&mut root, &path, Value::Int(9)).unwrap();
        assert_eq!(root.as_object().unwrap()["top"], Value::Int(9));
    }

    #[test]
    fn test_set_missing_parent_fails() {
        let mut root = doc();
        let path = PathExpr::parse("nowhere.at.all").unwrap();
        let err = set_property(&mut root, &path, Value::Null).unwrap_err();
        assert!(matches!(err, Error::PathNotFound(_)));
    }

    #[test]
    fn test_set_broadcasts_over_object_elements() {
        let mut root = doc();
        let path = PathExpr::parse("sites.station.value").unwrap();
        set_property(&mut root, &path, Value::Int(0)).unwrap();

        let stations = root.as_object().unwrap()["sites"].as_object().unwrap()["station"]
            .as_array()
            .unwrap();
        for station in stations {
            assert_eq!(station.as_object().unwrap()["value"], Value::Int(0));
        }
    }

    #[test]
    fn test_set_inserts_missing_key_in_object_elements() {
        let mut root = doc();
        let path = PathExpr::parse("sites.station.flagged").unwrap();
        set_property(&mut root, &path, Value::Bool(true)).unwrap();

        let stations = root.as_object().unwrap()["sites"].as_object().unwrap()["station"]
            .as_array()
            .unwrap();
        for station in stations {
            assert_eq!(station.as_object().unwrap()["flagged"], Value::Bool(true));
        }
    }

    #[test]
    fn test_set_wildcard_replaces_primitive_elements() {
        let mut root = doc();
        let path = PathExpr::parse("items.*").unwrap();
        set_property(&mut root, &path, Value::from("X")).unwrap();

        let items = root.as_object().unwrap()["items"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        for item in items {
            assert_eq!(item, &Value::String("X".to_string()));
        }
    }

    #[test]
    fn test_set_primitive_elements_replaced_for_any_leaf_token() {
        // Broadcast over primitives ignores the leaf name entirely.
        let mut root = doc();
        let path = PathExpr::parse("items.whatever").unwrap();
        set_property(&mut root, &path, Value::Int(7)).unwrap();

        let items = root.as_object().unwrap()["items"].as_array().unwrap();
        assert!(items.iter().all(|item| item == &Value::Int(7)));
    }

    #[test]
    fn test_set_wildcard_leaf_updates_matching_keys_only() {
        let mut root = Value::from_json(json!({
            "station": [{"val_a": 1, "val_b": 2, "id": "A"}]
        }));
        let path = PathExpr::parse("station.val*").unwrap();
        set_property(&mut root, &path, Value::Int(0)).unwrap();

        let station = root.as_object().unwrap()["station"].as_array().unwrap()[0]
            .as_object()
            .unwrap()
            .clone();
        assert_eq!(station["val_a"], Value::Int(0));
        assert_eq!(station["val_b"], Value::Int(0));
        assert_eq!(station["id"], Value::String("A".to_string()));
    }

    #[test]
    fn test_set_wildcard_leaf_on_object_parent_updates_without_insert() {
        // Parent is the object itself, not array elements; matching keys
        // are updated and the wildcard token is never inserted as a key.
        let mut root = Value::from_json(json!({
            "config": {"val_a": 1, "val_b": 2, "id": "x"}
        }));
        let path = PathExpr::parse("config.val*").unwrap();
        set_property(&mut root, &path, Value::Int(0)).unwrap();

        let config = root.as_object().unwrap()["config"].as_object().unwrap();
        assert_eq!(config["val_a"], Value::Int(0));
        assert_eq!(config["val_b"], Value::Int(0));
        assert_eq!(config["id"], Value::String("x".to_string()));
        assert_eq!(config.len(), 3);
    }

    #[test]
    fn test_get_array_parent_is_unsupported() {
        let root = doc();
        let path = PathExpr::parse("sites.station.value").unwrap();
        let mut problems = Problems::new();
        assert!(get_property(&root, &path, &mut problems).is_none());
        assert_eq!(problems.total(), 1);
    }

    #[test]
    fn test_get_missing_leaf_is_none_without_problem() {
        // The parent exists; only the leaf is absent.
        let root = doc();
        let path = PathExpr::parse("meta.missing").unwrap();
        let mut problems = Problems::new();
        assert!(get_property(&root, &path, &mut problems).is_none());
        assert!(problems.is_empty());
    }

    #[test]
    fn test_get_missing_parent_records_problem() {
        let root = doc();
        let path = PathExpr::parse("nowhere.at.all").unwrap();
        let mut problems = Problems::new();
        assert!(get_property(&root, &path, &mut problems).is_none());
        assert_eq!(problems.total(), 1);
    }

    #[test]
    fn test_initialize_fills_every_branch() {
        let mut root = Value::from_json(json!({
            "a": {"station": [{"id": 1}]},
            "b": {"station": [{"id": 2}, {"id": 3, "extra": "keep"}]}
        }));
        let path = PathExpr::parse("*.station.id").unwrap();
        initialize_properties(
            &mut root,
            &path,
            &["extra".to_string(), "flag".to_string()],
        );

        for branch in ["a", "b"] {
            let stations = root.as_object().unwrap()[branch].as_object().unwrap()["station"]
                .as_array()
                .unwrap();
            for station in stations {
                let obj = station.as_object().unwrap();
                assert!(obj.contains_key("extra"));
                assert!(obj.contains_key("flag"));
            }
        }
        // Existing values are left alone.
        let kept = &root.as_object().unwrap()["b"].as_object().unwrap()["station"]
            .as_array()
            .unwrap()[1];
        assert_eq!(
            kept.as_object().unwrap()["extra"],
            Value::String("keep".to_string())
        );
    }
}

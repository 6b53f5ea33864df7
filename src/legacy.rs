//! Merging rules of the legacy (draft-03/draft-04) inlining approach.
//!
//! Older documentation pipelines copied the contents of base schemas into
//! the derived schema and described `required` as a boolean flag on each
//! property. These helpers reproduce those rules on copies of the cached
//! schemas.

use serde_json::{Map, Value};

/// Merge the members of `base` into `derived`.
///
/// - Arrays are concatenated (derived first, then a copy of the base).
/// - Objects are merged member by member: a member missing in the derived
///   object is copied, an object member present on both sides gets the
///   base's keys assigned over it, any other existing member is kept.
/// - Scalars are only copied when the derived schema lacks the key.
///   `typeName` is only inherited when both schemas share a `title`.
pub fn merge_properties(derived: &mut Map<String, Value>, base: &Map<String, Value>) {
    let titles_match = derived.get("title") == base.get("title");

    for (name, base_value) in base {
        match base_value {
            Value::Array(base_items) => {
                let merged = match derived.remove(name) {
                    Some(Value::Array(mut items)) => {
                        items.extend(base_items.iter().cloned());
                        items
                    }
                    _ => base_items.clone(),
                };
                derived.insert(name.clone(), Value::Array(merged));
            }
            Value::Object(base_members) => {
                let slot = derived
                    .entry(name.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                let Value::Object(derived_members) = slot else {
                    continue;
                };
                for (member_name, base_member) in base_members {
                    match (derived_members.get_mut(member_name), base_member) {
                        (Some(Value::Object(existing)), Value::Object(incoming)) => {
                            for (k, v) in incoming {
                                existing.insert(k.clone(), v.clone());
                            }
                        }
                        (Some(_), _) => {}
                        (None, _) => {
                            derived_members.insert(member_name.clone(), base_member.clone());
                        }
                    }
                }
            }
            _ => {
                if name == "typeName" && !titles_match {
                    continue;
                }
                if !derived.contains_key(name) {
                    derived.insert(name.clone(), base_value.clone());
                }
            }
        }
    }
}

/// Return a copy of `schema` in which array-form `required` lists are
/// turned into `"required": true` on the named properties.
///
/// Applies recursively to the properties of every object that has
/// `properties`; objects without `properties` are returned unchanged.
pub fn normalize_required(schema: &Value) -> Value {
    let Some(object) = schema.as_object() else {
        return schema.clone();
    };
    let Some(properties) = object.get("properties").and_then(Value::as_object) else {
        return schema.clone();
    };

    let required: Vec<&str> = object
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut normalized_properties = Map::new();
    for (name, property) in properties {
        let mut normalized = normalize_required(property);
        if required.contains(&name.as_str()) {
            if let Value::Object(map) = &mut normalized {
                map.insert("required".to_string(), Value::Bool(true));
            }
        }
        normalized_properties.insert(name.clone(), normalized);
    }

    let mut result = Map::new();
    for (key, value) in object {
        match key.as_str() {
            "required" if value.is_array() => {}
            "properties" => {
                result.insert(key.clone(), Value::Object(normalized_properties.clone()));
            }
            _ => {
                result.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn merge_keeps_derived_scalars() {
        let mut derived = object(json!({"description": "derived", "title": "D"}));
        let base = object(json!({"description": "base", "type": "object", "title": "B"}));
        merge_properties(&mut derived, &base);
        assert_eq!(derived["description"], "derived");
        assert_eq!(derived["type"], "object");
        assert_eq!(derived["title"], "D");
    }

    #[test]
    fn merge_concatenates_arrays() {
        let mut derived = object(json!({"required": ["name"]}));
        let base = object(json!({"required": ["id", "name"]}));
        merge_properties(&mut derived, &base);
        assert_eq!(derived["required"], json!(["name", "id", "name"]));
    }

    #[test]
    fn merge_property_members() {
        let mut derived = object(json!({
            "properties": {
                "id": {"type": "string", "description": "derived id"},
                "flag": true
            }
        }));
        let base = object(json!({
            "properties": {
                "id": {"description": "base id", "minLength": 1},
                "flag": {"type": "boolean"},
                "extras": {"type": "object"}
            }
        }));
        merge_properties(&mut derived, &base);
        assert_eq!(
            derived["properties"],
            json!({
                "id": {"type": "string", "description": "base id", "minLength": 1},
                "flag": true,
                "extras": {"type": "object"}
            })
        );
    }

    #[test]
    fn merge_type_name_requires_matching_title() {
        let mut derived = object(json!({"title": "Derived"}));
        merge_properties(&mut derived, &object(json!({"title": "Base", "typeName": "base"})));
        assert!(derived.get("typeName").is_none());

        let mut derived = object(json!({"title": "Same"}));
        merge_properties(&mut derived, &object(json!({"title": "Same", "typeName": "same"})));
        assert_eq!(derived["typeName"], "same");
    }

    #[test]
    fn normalize_required_sets_flags() {
        let schema = json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": {"type": "string"},
                "nested": {
                    "required": ["inner"],
                    "properties": {"inner": {"type": "number"}}
                }
            }
        });
        let normalized = normalize_required(&schema);
        assert_eq!(
            normalized,
            json!({
                "type": "object",
                "properties": {
                    "id": {"type": "string", "required": true},
                    "nested": {
                        "properties": {"inner": {"type": "number", "required": true}}
                    }
                }
            })
        );
        // The input is left untouched.
        assert_eq!(schema["required"], json!(["id"]));
    }

    #[test]
    fn normalize_required_without_properties_is_unchanged() {
        let schema = json!({"required": ["x"], "type": "object"});
        assert_eq!(normalize_required(&schema), schema);
    }
}

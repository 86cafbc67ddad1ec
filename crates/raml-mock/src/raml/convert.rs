//! YAML to JSON value conversion.

use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;

/// Convert a YAML value to JSON. Tags are dropped, mapping keys are stringified.
pub fn yaml_to_json(value: &YamlValue) -> Value {
    match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(*b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        YamlValue::String(s) => Value::String(s.clone()),
        YamlValue::Sequence(items) => Value::Array(items.iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(mapping) => {
            let mut object = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                object.insert(key_to_string(key), yaml_to_json(value));
            }
            Value::Object(object)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

/// String form of a mapping key (`200` → `"200"`, `true` → `"true"`).
pub fn key_to_string(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Null => "null".to_string(),
        YamlValue::Tagged(tagged) => key_to_string(&tagged.value),
        other => yaml_to_json(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn yaml(source: &str) -> YamlValue {
        serde_yaml::from_str(source).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(yaml_to_json(&yaml("true")), json!(true));
        assert_eq!(yaml_to_json(&yaml("23")), json!(23));
        assert_eq!(yaml_to_json(&yaml("-4")), json!(-4));
        assert_eq!(yaml_to_json(&yaml("1.5")), json!(1.5));
        assert_eq!(yaml_to_json(&yaml("~")), Value::Null);
        assert_eq!(yaml_to_json(&yaml("'true'")), json!("true"));
    }

    #[test]
    fn test_nested_structures_keep_order() {
        let value = yaml_to_json(&yaml("zeta: 1\nalpha:\n  - foo\n  - bar\n"));
        assert_eq!(value, json!({"zeta": 1, "alpha": ["foo", "bar"]}));
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_non_string_keys_are_stringified() {
        let value = yaml_to_json(&yaml("200: ok\ntrue: yes\n"));
        assert_eq!(value, json!({"200": "ok", "true": "yes"}));
    }

    #[test]
    fn test_tags_are_dropped() {
        let value = yaml_to_json(&yaml("!custom {a: 1}"));
        assert_eq!(value, json!({"a": 1}));
    }
}

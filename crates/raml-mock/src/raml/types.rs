//! Type declarations and example facets.
//!
//! Turns RAML type declarations (1.0 `types`, 0.8 `schemas`, and the inline
//! declarations of headers, bodies and properties) into [`ValueSpec`]s and the
//! [`TypeRegistry`] used for property-example composition.
//!
//! A declaration is either a string (a builtin or a declared type name) or a
//! mapping with `type`/`schema`, `properties`, `default`, `example` and
//! `examples`. Declared parents contribute their properties, and their example
//! facets when the declaration has none of its own.

use super::convert::{key_to_string, yaml_to_json};
use super::error::DocumentLoadError;
use crate::mock::{TypeDefinition, TypeRef, TypeRegistry, ValueSpec};
use serde_json::Value;
use serde_yaml::{Mapping, Value as YamlValue};
use std::collections::HashMap;
use tracing::warn;

/// Keys allowed next to `value` in an expanded example.
const EXAMPLE_FACETS: &[&str] = &["value", "displayName", "description", "strict"];

/// A parent of a type declaration.
enum Parent<'v> {
    Named(String),
    Inline(&'v YamlValue),
}

/// Resolves declarations against the document's named types.
pub struct TypeResolver<'a> {
    declarations: HashMap<String, &'a YamlValue>,
    definitions: HashMap<String, TypeDefinition>,
    in_progress: Vec<String>,
}

impl<'a> TypeResolver<'a> {
    /// Collect the named types declared under `schemas` and `types`.
    pub fn new(root: &'a Mapping) -> Self {
        let mut declarations = HashMap::new();
        for section in ["schemas", "types"] {
            match root.get(section) {
                Some(YamlValue::Mapping(types)) => collect(types, &mut declarations),
                // RAML 0.8 allows a list of single-entry mappings.
                Some(YamlValue::Sequence(items)) => {
                    for types in items.iter().filter_map(YamlValue::as_mapping) {
                        collect(types, &mut declarations);
                    }
                }
                _ => {}
            }
        }

        Self {
            declarations,
            definitions: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// Property definitions of every named type.
    pub fn registry(&mut self) -> Result<TypeRegistry, DocumentLoadError> {
        let mut names: Vec<String> = self.declarations.keys().cloned().collect();
        names.sort();

        let mut registry = TypeRegistry::new();
        for name in names {
            let definition = self.named_definition(&name)?;
            registry.insert(name, definition);
        }
        Ok(registry)
    }

    /// Value spec of a header, body or property declaration.
    pub fn value_spec(&mut self, decl: &YamlValue) -> Result<ValueSpec, DocumentLoadError> {
        let mut spec = self.facets(decl, &mut Vec::new())?;

        let parents = self.parents(decl);
        let has_properties = decl.get("properties").is_some_and(YamlValue::is_mapping);
        let composite = has_properties
            || parents.len() > 1
            || parents.iter().any(|p| matches!(p, Parent::Inline(_)));

        spec.type_example_source = if composite {
            let definition = self.definition(decl)?;
            (!definition.properties.is_empty()).then(|| TypeRef::Inline(Box::new(definition)))
        } else if let [Parent::Named(name)] = parents.as_slice() {
            Some(TypeRef::Named(name.clone()))
        } else {
            None
        };

        Ok(spec)
    }

    fn parents<'v>(&self, decl: &'v YamlValue) -> Vec<Parent<'v>> {
        let reference = match decl {
            YamlValue::String(_) => Some(decl),
            YamlValue::Mapping(mapping) => mapping.get("type").or_else(|| mapping.get("schema")),
            _ => None,
        };

        match reference {
            Some(YamlValue::String(expression)) => self.named(expression).into_iter().collect(),
            Some(YamlValue::Sequence(items)) => items
                .iter()
                .filter_map(|item| match item {
                    YamlValue::String(expression) => self.named(expression),
                    YamlValue::Mapping(_) => Some(Parent::Inline(item)),
                    _ => None,
                })
                .collect(),
            Some(inline) if inline.is_mapping() => vec![Parent::Inline(inline)],
            _ => Vec::new(),
        }
    }

    // Builtins, arrays (`User[]`), unions and schema text are not parents.
    fn named<'v>(&self, expression: &str) -> Option<Parent<'v>> {
        let name = expression.trim();
        self.declarations
            .contains_key(name)
            .then(|| Parent::Named(name.to_string()))
    }

    /// Example facets of `decl`, inherited from the first parent that has any.
    fn facets(
        &self,
        decl: &YamlValue,
        visiting: &mut Vec<String>,
    ) -> Result<ValueSpec, DocumentLoadError> {
        let own = own_facets(decl)?;
        if !own.is_empty() {
            return Ok(own);
        }

        for parent in self.parents(decl) {
            let inherited = match parent {
                Parent::Named(name) => {
                    if visiting.contains(&name) {
                        continue;
                    }
                    let Some(parent_decl) = self.declarations.get(&name).copied() else {
                        continue;
                    };
                    visiting.push(name);
                    let facets = self.facets(parent_decl, visiting);
                    visiting.pop();
                    facets?
                }
                Parent::Inline(parent_decl) => self.facets(parent_decl, visiting)?,
            };
            if !inherited.is_empty() {
                return Ok(inherited);
            }
        }

        Ok(ValueSpec::new())
    }

    /// Properties of `decl`: inherited ones first, then its own.
    fn definition(&mut self, decl: &YamlValue) -> Result<TypeDefinition, DocumentLoadError> {
        let mut definition = TypeDefinition::default();

        for parent in self.parents(decl) {
            let inherited = match parent {
                Parent::Named(name) => self.named_definition(&name)?,
                Parent::Inline(parent_decl) => self.definition(parent_decl)?,
            };
            for (name, spec) in inherited.properties {
                definition = definition.with_property(name, spec);
            }
        }

        if let Some(properties) = decl.get("properties").and_then(YamlValue::as_mapping) {
            for (key, property) in properties {
                let name = key_to_string(key);
                let name = name.strip_suffix('?').unwrap_or(&name).to_string();
                let spec = self.value_spec(property)?;
                definition = definition.with_property(name, spec);
            }
        }

        Ok(definition)
    }

    fn named_definition(&mut self, name: &str) -> Result<TypeDefinition, DocumentLoadError> {
        if let Some(definition) = self.definitions.get(name) {
            return Ok(definition.clone());
        }
        if self.in_progress.iter().any(|n| n == name) {
            warn!("Type '{}' inherits from itself, ignoring the cycle", name);
            return Ok(TypeDefinition::default());
        }
        let Some(decl) = self.declarations.get(name).copied() else {
            return Ok(TypeDefinition::default());
        };

        self.in_progress.push(name.to_string());
        let definition = self.definition(decl);
        self.in_progress.pop();

        let definition = definition?;
        self.definitions.insert(name.to_string(), definition.clone());
        Ok(definition)
    }
}

fn collect<'a>(types: &'a Mapping, declarations: &mut HashMap<String, &'a YamlValue>) {
    for (name, decl) in types {
        declarations.insert(key_to_string(name), decl);
    }
}

/// `default`, `example` and `examples` declared directly on `decl`.
fn own_facets(decl: &YamlValue) -> Result<ValueSpec, DocumentLoadError> {
    let Some(mapping) = decl.as_mapping() else {
        return Ok(ValueSpec::new());
    };

    let mut spec = ValueSpec::new();
    if let Some(default) = mapping.get("default").filter(|value| !value.is_null()) {
        spec = spec.with_default(yaml_to_json(default));
    }
    if let Some(example) = mapping.get("example").and_then(example_value) {
        spec = spec.with_example(example);
    }
    match mapping.get("examples") {
        None | Some(YamlValue::Null) => {}
        Some(YamlValue::Mapping(examples)) => {
            spec = spec.with_examples(
                examples.iter().filter_map(|(name, example)| {
                    example_value(example).map(|example| (key_to_string(name), example))
                }),
            );
        }
        Some(YamlValue::Sequence(examples)) => {
            spec = spec.with_examples(
                examples.iter().enumerate().filter_map(|(index, example)| {
                    example_value(example).map(|example| (index.to_string(), example))
                }),
            );
        }
        Some(_) => {
            return Err(DocumentLoadError::invalid(
                "examples",
                "expected a mapping of named examples",
            ))
        }
    }
    Ok(spec)
}

/// An example value, unwrapping the expanded `{ value: ... }` form. A null
/// example is an empty placeholder and counts as no example.
fn example_value(example: &YamlValue) -> Option<Value> {
    if let Some(mapping) = example.as_mapping() {
        if let Some(value) = mapping.get("value") {
            let expanded = mapping.keys().all(|key| {
                key.as_str().is_some_and(|key| {
                    EXAMPLE_FACETS.contains(&key) || key.starts_with('(')
                })
            });
            if expanded {
                return (!value.is_null()).then(|| yaml_to_json(value));
            }
        }
    }
    (!example.is_null()).then(|| yaml_to_json(example))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root(source: &str) -> Mapping {
        serde_yaml::from_str(source).unwrap()
    }

    fn decl(source: &str) -> YamlValue {
        serde_yaml::from_str(source).unwrap()
    }

    #[test]
    fn test_named_type_properties() {
        let root = root(
            r#"
types:
  User:
    type: object
    properties:
      name:
        type: string
        example: Kendrick
      nickname?:
        type: string
        example: K-Dot
      age: number
"#,
        );
        let mut resolver = TypeResolver::new(&root);
        let registry = resolver.registry().unwrap();
        let user = &registry["User"];

        let names: Vec<&str> = user.properties.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["name", "nickname", "age"]);
        assert_eq!(user.properties[0].1.example, Some(json!("Kendrick")));
        assert!(user.properties[2].1.is_empty());
    }

    #[test]
    fn test_reference_to_named_type() {
        let root =
            root("types:\n  User:\n    properties:\n      name:\n        example: Kendrick\n");
        let mut resolver = TypeResolver::new(&root);

        let spec = resolver.value_spec(&decl("type: User")).unwrap();
        assert_eq!(spec.type_example_source, Some(TypeRef::Named("User".to_string())));
        assert_eq!(spec.example, None);

        let shorthand = resolver.value_spec(&decl("User")).unwrap();
        assert_eq!(shorthand.type_example_source, Some(TypeRef::Named("User".to_string())));
    }

    #[test]
    fn test_builtin_and_array_are_not_references() {
        let root = root("types:\n  User:\n    properties:\n      name: string\n");
        let mut resolver = TypeResolver::new(&root);
        assert!(resolver.value_spec(&decl("type: string")).unwrap().is_empty());
        assert!(resolver.value_spec(&decl("type: User[]")).unwrap().is_empty());
    }

    #[test]
    fn test_example_facets_are_inherited() {
        let root = root(
            r#"
types:
  Base:
    type: object
    example:
      id: 1
  Derived:
    type: Base
"#,
        );
        let mut resolver = TypeResolver::new(&root);
        let spec = resolver.value_spec(&decl("type: Derived")).unwrap();
        assert_eq!(spec.example, Some(json!({"id": 1})));

        let own = resolver
            .value_spec(&decl("type: Derived\ndefault: {id: 2}"))
            .unwrap();
        assert_eq!(own.default_value, Some(json!({"id": 2})));
        assert_eq!(own.example, None);
    }

    #[test]
    fn test_properties_are_inherited_and_overridden() {
        let root = root(
            r#"
types:
  Person:
    properties:
      name:
        example: Kendrick
      age:
        example: 30
  Student:
    type: Person
    properties:
      age:
        example: 10
      school:
        example: Centennial
"#,
        );
        let mut resolver = TypeResolver::new(&root);
        let registry = resolver.registry().unwrap();
        let student = &registry["Student"];

        let names: Vec<&str> = student.properties.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["name", "age", "school"]);
        assert_eq!(student.properties[1].1.example, Some(json!(10)));
    }

    #[test]
    fn test_inline_properties_compose() {
        let root = root("types: {}\n");
        let mut resolver = TypeResolver::new(&root);
        let spec = resolver
            .value_spec(&decl(
                "properties:\n  stringProperty:\n    example: foo\n  numberProperty:\n    example: 23\n",
            ))
            .unwrap();

        let Some(TypeRef::Inline(definition)) = spec.type_example_source else {
            panic!("expected an inline type source");
        };
        assert_eq!(definition.properties.len(), 2);
        assert_eq!(definition.properties[1].1.example, Some(json!(23)));
    }

    #[test]
    fn test_expanded_examples() {
        let root = root("types: {}\n");
        let mut resolver = TypeResolver::new(&root);
        let spec = resolver
            .value_spec(&decl(
                r#"
examples:
  first:
    displayName: First
    value:
      name: example1
  second:
    name: example2
"#,
            ))
            .unwrap();

        assert_eq!(
            spec.examples,
            Some(vec![
                ("first".to_string(), json!({"name": "example1"})),
                ("second".to_string(), json!({"name": "example2"})),
            ])
        );
    }

    #[test]
    fn test_value_property_is_not_an_expanded_example() {
        let spec = own_facets(&decl("example:\n  value: 3\n  unit: kg\n")).unwrap();
        assert_eq!(spec.example, Some(json!({"value": 3, "unit": "kg"})));
    }

    #[test]
    fn test_null_facets_are_absent() {
        let spec = own_facets(&decl("default:\nexample:\n")).unwrap();
        assert!(spec.is_empty());

        let spec = own_facets(&decl(
            "examples:\n  empty:\n  expanded:\n    value:\n  real:\n    value: 1\n",
        ))
        .unwrap();
        assert_eq!(spec.examples, Some(vec![("real".to_string(), json!(1))]));

        let spec = own_facets(&decl("examples:\n  - ~\n  - 2\n")).unwrap();
        assert_eq!(spec.examples, Some(vec![("1".to_string(), json!(2))]));
    }

    #[test]
    fn test_inheritance_cycle_terminates() {
        let root = root(
            r#"
types:
  A:
    type: B
    properties:
      a:
        example: 1
  B:
    type: A
    properties:
      b:
        example: 2
"#,
        );
        let mut resolver = TypeResolver::new(&root);
        let registry = resolver.registry().unwrap();
        assert!(!registry["A"].properties.is_empty());
        assert!(!registry["B"].properties.is_empty());
        assert!(resolver.value_spec(&decl("type: A")).unwrap().example.is_none());
    }

    #[test]
    fn test_schemas_list_form() {
        let root = root("schemas:\n  - Song:\n      example: '{\"title\": \"DNA\"}'\n");
        let mut resolver = TypeResolver::new(&root);
        let spec = resolver.value_spec(&decl("schema: Song")).unwrap();
        assert_eq!(spec.example, Some(json!(r#"{"title": "DNA"}"#)));
    }

    #[test]
    fn test_invalid_examples() {
        let err = own_facets(&decl("examples: 3")).unwrap_err();
        assert!(matches!(err, DocumentLoadError::Invalid { .. }));
    }
}

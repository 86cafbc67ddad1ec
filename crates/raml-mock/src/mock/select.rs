//! Example selection.
//!
//! Resolves a [`ValueSpec`] to one concrete value. Precedence, first match
//! wins: `default`, `example`, one of the named `examples`, an object composed
//! from the property examples of the referenced type, otherwise nothing.

use super::types::{TypeDefinition, TypeRef, TypeRegistry, ValueSpec};
use rand::Rng;
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// Chooses one of several named examples.
///
/// Any index in range is a valid answer and it may differ between calls.
pub trait SelectionPolicy: Send + Sync + fmt::Debug {
    /// Pick an index in `0..count`. `count` is never zero.
    fn choose(&self, count: usize) -> usize;
}

/// Uniformly random choice (the default).
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelection;

impl SelectionPolicy for RandomSelection {
    fn choose(&self, count: usize) -> usize {
        rand::thread_rng().gen_range(0..count)
    }
}

/// Always the first example in document order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstSelection;

impl SelectionPolicy for FirstSelection {
    fn choose(&self, _count: usize) -> usize {
        0
    }
}

/// Resolves value specs against a type registry with one selection policy.
///
/// Build one selector per response so the same policy applies to the body
/// and every header.
#[derive(Debug, Clone, Copy)]
pub struct ExampleSelector<'a> {
    types: &'a TypeRegistry,
    policy: &'a dyn SelectionPolicy,
}

impl<'a> ExampleSelector<'a> {
    pub fn new(types: &'a TypeRegistry, policy: &'a dyn SelectionPolicy) -> Self {
        Self { types, policy }
    }

    /// Select a value for `spec`, or `None` when nothing is declared.
    pub fn select(&self, spec: &ValueSpec) -> Option<Value> {
        let mut visiting = Vec::new();
        self.resolve(spec, &mut visiting)
    }

    fn resolve(&self, spec: &ValueSpec, visiting: &mut Vec<String>) -> Option<Value> {
        if let Some(value) = &spec.default_value {
            return Some(value.clone());
        }
        if let Some(value) = &spec.example {
            return Some(value.clone());
        }
        if let Some(examples) = spec.examples.as_deref().filter(|e| !e.is_empty()) {
            let index = self.policy.choose(examples.len()).min(examples.len() - 1);
            return Some(examples[index].1.clone());
        }
        let source = spec.type_example_source.as_ref()?;
        self.compose(source, visiting)
    }

    fn compose(&self, source: &TypeRef, visiting: &mut Vec<String>) -> Option<Value> {
        match source {
            TypeRef::Inline(definition) => self.compose_properties(definition, visiting),
            TypeRef::Named(name) => {
                if visiting.iter().any(|v| v == name) {
                    debug!("Recursive type '{}' has no example, stopping", name);
                    return None;
                }
                let definition = self.types.get(name)?;
                visiting.push(name.clone());
                let value = self.compose_properties(definition, visiting);
                visiting.pop();
                value
            }
        }
    }

    // An object with no resolvable property is absent rather than `{}`.
    fn compose_properties(
        &self,
        definition: &TypeDefinition,
        visiting: &mut Vec<String>,
    ) -> Option<Value> {
        let mut object = Map::new();
        for (name, property) in &definition.properties {
            if let Some(value) = self.resolve(property, visiting) {
                object.insert(name.clone(), value);
            }
        }
        if object.is_empty() {
            None
        } else {
            Some(Value::Object(object))
        }
    }
}

/// Select a value for `spec` without holding on to a selector.
pub fn select(
    spec: &ValueSpec,
    types: &TypeRegistry,
    policy: &dyn SelectionPolicy,
) -> Option<Value> {
    ExampleSelector::new(types, policy).select(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn no_types() -> TypeRegistry {
        TypeRegistry::new()
    }

    #[test]
    fn test_empty_spec_is_absent() {
        assert_eq!(select(&ValueSpec::new(), &no_types(), &FirstSelection), None);
    }

    #[test]
    fn test_default_beats_example() {
        let spec = ValueSpec::new()
            .with_example(json!("bar"))
            .with_default(json!("test"));
        assert_eq!(
            select(&spec, &no_types(), &RandomSelection),
            Some(json!("test"))
        );
    }

    #[test]
    fn test_example_beats_examples() {
        let spec = ValueSpec::new()
            .with_example(json!(1))
            .with_examples([("a", json!(2)), ("b", json!(3))]);
        assert_eq!(select(&spec, &no_types(), &RandomSelection), Some(json!(1)));
    }

    #[test]
    fn test_first_selection_picks_document_order() {
        let spec = ValueSpec::new().with_examples([("b", json!("second")), ("a", json!("first"))]);
        assert_eq!(
            select(&spec, &no_types(), &FirstSelection),
            Some(json!("second"))
        );
    }

    #[test]
    fn test_out_of_range_policy_is_clamped() {
        #[derive(Debug)]
        struct Past;
        impl SelectionPolicy for Past {
            fn choose(&self, count: usize) -> usize {
                count + 5
            }
        }
        let spec = ValueSpec::new().with_examples([("a", json!(1)), ("b", json!(2))]);
        assert_eq!(select(&spec, &no_types(), &Past), Some(json!(2)));
    }

    #[test]
    fn test_composite_from_named_type() {
        let mut types = TypeRegistry::new();
        types.insert(
            "User".to_string(),
            TypeDefinition::default()
                .with_property("name", ValueSpec::new().with_example(json!("Kendrick")))
                .with_property("age", ValueSpec::new().with_example(json!(10)))
                .with_property("nickname", ValueSpec::new()),
        );
        let spec = ValueSpec::new().with_type_source(TypeRef::Named("User".to_string()));

        assert_eq!(
            select(&spec, &types, &FirstSelection),
            Some(json!({"name": "Kendrick", "age": 10}))
        );
    }

    #[test]
    fn test_composite_nests_recursively() {
        let mut types = TypeRegistry::new();
        types.insert(
            "Address".to_string(),
            TypeDefinition::default()
                .with_property("city", ValueSpec::new().with_default(json!("Compton"))),
        );
        let inline = TypeDefinition::default()
            .with_property(
                "address",
                ValueSpec::new().with_type_source(TypeRef::Named("Address".to_string())),
            )
            .with_property(
                "tags",
                ValueSpec::new().with_examples([("only", json!(["a", "b"]))]),
            );
        let spec = ValueSpec::new().with_type_source(TypeRef::Inline(Box::new(inline)));

        assert_eq!(
            select(&spec, &types, &RandomSelection),
            Some(json!({"address": {"city": "Compton"}, "tags": ["a", "b"]}))
        );
    }

    #[test]
    fn test_composite_without_examples_is_absent() {
        let inline = TypeDefinition::default().with_property("name", ValueSpec::new());
        let spec = ValueSpec::new().with_type_source(TypeRef::Inline(Box::new(inline)));
        assert_eq!(select(&spec, &no_types(), &FirstSelection), None);
    }

    #[test]
    fn test_recursive_type_terminates() {
        let mut types = TypeRegistry::new();
        types.insert(
            "Node".to_string(),
            TypeDefinition::default()
                .with_property("id", ValueSpec::new().with_example(json!(1)))
                .with_property(
                    "next",
                    ValueSpec::new().with_type_source(TypeRef::Named("Node".to_string())),
                ),
        );
        let spec = ValueSpec::new().with_type_source(TypeRef::Named("Node".to_string()));
        assert_eq!(select(&spec, &types, &FirstSelection), Some(json!({"id": 1})));
    }

    #[test]
    fn test_unknown_named_type_is_absent() {
        let spec = ValueSpec::new().with_type_source(TypeRef::Named("Missing".to_string()));
        assert_eq!(select(&spec, &no_types(), &FirstSelection), None);
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,12}".prop_map(Value::String),
        ]
    }

    proptest! {
        #[test]
        fn prop_default_always_wins(
            default in scalar(),
            example in proptest::option::of(scalar()),
            examples in proptest::collection::vec(scalar(), 0..5),
        ) {
            let mut spec = ValueSpec::new()
                .with_default(default.clone())
                .with_examples(examples.into_iter().enumerate().map(|(i, v)| (format!("e{i}"), v)))
                .with_type_source(TypeRef::Named("Anything".to_string()));
            spec.example = example;
            prop_assert_eq!(select(&spec, &no_types(), &RandomSelection), Some(default));
        }

        #[test]
        fn prop_selection_is_a_member(
            examples in proptest::collection::vec(scalar(), 1..8),
        ) {
            let spec = ValueSpec::new().with_examples(
                examples
                    .iter()
                    .cloned()
                    .enumerate()
                    .map(|(i, v)| (format!("e{i}"), v)),
            );
            for _ in 0..10 {
                let selected = select(&spec, &no_types(), &RandomSelection);
                prop_assert!(selected.map_or(false, |v| examples.contains(&v)));
            }
        }

        #[test]
        fn prop_composite_collects_property_examples(
            first in scalar(),
            second in scalar(),
        ) {
            let mut types = TypeRegistry::new();
            types.insert(
                "Pair".to_string(),
                TypeDefinition::default()
                    .with_property("p1", ValueSpec::new().with_example(first.clone()))
                    .with_property("p2", ValueSpec::new().with_example(second.clone())),
            );
            let spec = ValueSpec::new().with_type_source(TypeRef::Named("Pair".to_string()));
            prop_assert_eq!(
                select(&spec, &types, &RandomSelection),
                Some(json!({"p1": first, "p2": second}))
            );
        }
    }
}

use std::collections::HashMap;

use sable::diagnostics::RuntimeError;
use sable::runtime::{NativeFunction, Protocol, Tag, Value};

fn method(name: &'static str) -> Value {
    Value::Function(NativeFunction::new(name, move |_| {
        Ok(Value::String(name.into()))
    }))
}

fn table(names: &[&'static str]) -> HashMap<String, Value> {
    names
        .iter()
        .map(|name| (name.to_string(), method(name)))
        .collect()
}

fn single(name: &'static str, result: &'static str) -> HashMap<String, Value> {
    [(
        name.to_string(),
        Value::Function(NativeFunction::new(result, move |_| {
            Ok(Value::String(result.into()))
        })),
    )]
    .into_iter()
    .collect()
}

#[test]
fn exact_method_set_is_accepted_and_retrievable() {
    let eq = Protocol::define("Eq");
    eq.require("equals");

    let point = Tag::fresh("Point");
    eq.add_implementation(point.clone(), table(&["equals"]))
        .unwrap();

    let stored = eq.get_implementation(&point).unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored.contains_key("equals"));
}

#[test]
fn missing_methods_are_named_precisely() {
    let ord = Protocol::define("Ord");
    ord.require("compare");
    ord.require("max");
    ord.require("min");

    let point = Tag::fresh("Point");
    let err = ord
        .add_implementation(point.clone(), table(&["compare"]))
        .unwrap_err();
    assert_eq!(
        err,
        RuntimeError::MissingMethods {
            protocol: "Ord".to_string(),
            type_tag: point,
            missing: vec!["max".to_string(), "min".to_string()],
        }
    );
}

#[test]
fn extraneous_methods_are_named_precisely() {
    let eq = Protocol::define("Eq");
    eq.require("equals");

    let point = Tag::fresh("Point");
    let err = eq
        .add_implementation(point.clone(), table(&["equals", "extra"]))
        .unwrap_err();
    assert_eq!(
        err,
        RuntimeError::ExtraneousMethods {
            protocol: "Eq".to_string(),
            type_tag: point,
            extraneous: vec!["extra".to_string()],
        }
    );
}

#[test]
fn defaults_fill_omitted_methods() {
    let show = Protocol::define("Show");
    show.require("describe");
    show.require_with_default(
        "describe-brief",
        NativeFunction::new("describe-brief", |_| Ok(Value::String("brief".into()))),
    );

    let point = Tag::fresh("Point");
    show.add_implementation(point.clone(), table(&["describe"]))
        .unwrap();

    let stored = show.get_implementation(&point).unwrap();
    assert!(stored.contains_key("describe"));
    assert!(stored.contains_key("describe-brief"));
}

#[test]
fn supplied_methods_override_defaults() {
    let show = Protocol::define("Show");
    show.require_with_default(
        "describe",
        NativeFunction::new("default-describe", |_| Ok(Value::String("default".into()))),
    );

    let point = Tag::fresh("Point");
    show.add_implementation(point.clone(), single("describe", "overridden"))
        .unwrap();

    let result = show
        .invoke("describe", vec![Value::TypeMarker(point)])
        .unwrap();
    assert_eq!(result, Value::String("overridden".into()));
}

#[test]
fn lookup_without_implementation_fails() {
    let eq = Protocol::define("Eq");
    eq.require("equals");

    let err = eq.get_implementation(&Tag::Number).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::NoImplementation {
            protocol: "Eq".to_string(),
            type_tag: Tag::Number,
        }
    );
    assert_eq!(
        err.to_string(),
        "No available implementations of Eq for: number"
    );
}

#[test]
fn invoke_dispatches_on_the_first_argument() {
    let eq = Protocol::define("Eq");
    eq.require("equals");
    eq.add_implementation(Tag::Number, table(&["equals"]))
        .unwrap();

    let result = eq.invoke("equals", vec![Value::Integer(1), Value::Integer(2)]);
    assert_eq!(result.unwrap(), Value::String("equals".into()));

    let err = eq
        .invoke("equals", vec![Value::String("s".into())])
        .unwrap_err();
    assert!(matches!(err, RuntimeError::NoImplementation { .. }));
}

#[test]
fn invoke_without_a_receiver_is_an_arity_error() {
    let eq = Protocol::define("Eq");
    eq.require("equals");

    let err = eq.invoke("equals", vec![]).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::WrongArity {
            callable: "Eq.equals".to_string(),
            expected: 1,
            got: 0,
        }
    );
}

#[test]
fn surface_shortcuts_dispatch_like_invoke() {
    let eq = Protocol::define("Eq");
    eq.require("equals");
    eq.add_implementation(Tag::Number, table(&["equals"]))
        .unwrap();

    let bindings = eq.surface_bindings();
    assert_eq!(bindings.len(), 1);
    let (name, shortcut) = &bindings[0];
    assert_eq!(name, "equals");
    let Value::Function(shortcut) = shortcut else {
        panic!("expected a function");
    };
    let result = shortcut
        .call(vec![Value::Integer(1), Value::Integer(1)])
        .unwrap();
    assert_eq!(result, Value::String("equals".into()));
}

#[test]
fn extend_with_disjoint_requirements_succeeds() {
    let eq = Protocol::define("Eq");
    eq.require("equals");
    let ord = Protocol::define("Ord");
    ord.require("compare");

    ord.extend(&eq).unwrap();
}

#[test]
fn extend_with_overlapping_requirements_names_the_conflicts() {
    let eq = Protocol::define("Eq");
    eq.require("equals");
    eq.require("hash");
    let setlike = Protocol::define("SetLike");
    setlike.require("union");
    setlike.require("equals");
    setlike.require("hash");

    let err = setlike.extend(&eq).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::RequirementConflict {
            protocol: "SetLike".to_string(),
            parent: "Eq".to_string(),
            conflicts: vec!["equals".to_string(), "hash".to_string()],
        }
    );
}

#[test]
fn parent_validation_is_deferred_until_asked() {
    let eq = Protocol::define("Eq");
    eq.require("equals");
    let ord = Protocol::define("Ord");
    ord.require("compare");
    ord.extend(&eq).unwrap();

    let point = Tag::fresh("Point");
    // Adding an Ord implementation without an Eq one succeeds: the parent
    // chain may still grow during linking.
    ord.add_implementation(point.clone(), table(&["compare"]))
        .unwrap();

    let err = ord.validate_parents().unwrap_err();
    assert_eq!(
        err,
        RuntimeError::UnsatisfiedParent {
            parent: "Eq".to_string(),
            type_tag: point.clone(),
        }
    );

    eq.add_implementation(point, table(&["equals"])).unwrap();
    ord.validate_parents().unwrap();
}

#[test]
fn duplicate_registration_overwrites_silently() {
    let eq = Protocol::define("Eq");
    eq.require("equals");

    let point = Tag::fresh("Point");
    eq.add_implementation(point.clone(), single("equals", "first"))
        .unwrap();
    eq.add_implementation(point.clone(), single("equals", "second"))
        .unwrap();

    let result = eq.invoke("equals", vec![Value::TypeMarker(point)]).unwrap();
    assert_eq!(result, Value::String("second".into()));
}

#[test]
fn merge_unions_implementations_of_equal_copies() {
    let left = Protocol::define_stable("Eq", "core", "core/eq.sbl:1");
    left.require("equals");
    let right = Protocol::define_stable("Eq", "core", "core/eq.sbl:1");
    right.require("equals");

    left.add_implementation(Tag::Number, table(&["equals"]))
        .unwrap();
    right
        .add_implementation(Tag::Text, table(&["equals"]))
        .unwrap();

    left.merge(&right).unwrap();
    assert!(left.has_implementation(&Tag::Number));
    assert!(left.has_implementation(&Tag::Text));
}

#[test]
fn merge_prefers_the_incoming_copy_on_shared_keys() {
    let left = Protocol::define("Eq");
    left.require("equals");
    let right = Protocol::define("Eq");
    right.require("equals");

    left.add_implementation(Tag::Number, single("equals", "left"))
        .unwrap();
    right
        .add_implementation(Tag::Number, single("equals", "right"))
        .unwrap();

    left.merge(&right).unwrap();
    let result = left.invoke("equals", vec![Value::Integer(1)]).unwrap();
    assert_eq!(result, Value::String("right".into()));
}

#[test]
fn merge_of_diverging_protocols_fails() {
    let eq = Protocol::define("Eq");
    eq.require("equals");
    let ord = Protocol::define("Ord");
    ord.require("compare");

    let err = eq.merge(&ord).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::DivergingProtocols {
            left: "Eq".to_string(),
            right: "Ord".to_string(),
        }
    );
}

#[test]
fn missing_method_message_keeps_the_stable_prefix() {
    let eq = Protocol::define("Eq");
    eq.require("equals");

    let point = Tag::fresh("Point");
    let err = eq
        .add_implementation(point.clone(), HashMap::new())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "{} doesn't implement all requisites of Eq.\nMissing methods: equals",
            point
        )
    );
}

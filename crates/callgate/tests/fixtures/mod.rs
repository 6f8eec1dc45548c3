//! Objects shared by the integration tests.

#![allow(dead_code)]

use callgate::{FirewallError, Object, Value};
use serde_json::json;

/// A plain object with scalar, nested and method members.
pub fn test_service() -> Object {
    let service = Object::from_entries([
        ("prop1", Value::from("hello")),
        ("prop2", Value::from("world")),
        ("prop3", Value::from(json!({"subProp1": "deep down"}))),
    ]);
    service
        .set(
            "increment",
            Object::function(|_, args| {
                let x = args.first().and_then(Value::as_number).unwrap_or_default();
                Ok(Value::Number(x + 1.0))
            }),
        )
        .expect("set increment");
    service
}

/// A constructor whose instances expose `create(first, last)`.
pub fn user_service() -> Object {
    Object::constructor(|this, _| {
        let this = this
            .as_object()
            .ok_or_else(|| FirewallError::TypeError("constructor called without this".into()))?;

        this.set(
            "create",
            Object::function(|_, args| {
                let first = args.first().cloned().unwrap_or_default();
                let last = args.get(1).cloned().unwrap_or_default();
                let full_name = format!(
                    "{} {}",
                    first.as_str().unwrap_or_default(),
                    last.as_str().unwrap_or_default()
                );
                let get_full_name =
                    Object::function(move |_, _| Ok(Value::from(full_name.clone())));

                Ok(Value::Object(Object::from_entries([
                    ("firstName", first),
                    ("lastName", last),
                    ("getFullName", Value::from(get_full_name)),
                ])))
            }),
        )?;
        Ok(Value::Undefined)
    })
}

/// `x => x * x`
pub fn square() -> Object {
    Object::function(|_, args| {
        let x = args.first().and_then(Value::as_number).unwrap_or_default();
        Ok(Value::Number(x * x))
    })
}

/// `{a: {b: {c: 1}}}`
pub fn nested() -> Object {
    match Value::from(json!({"a": {"b": {"c": 1}}})) {
        Value::Object(object) => object,
        other => panic!("expected object, got {other:?}"),
    }
}

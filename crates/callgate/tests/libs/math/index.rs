//! Operations performed from `tests/libs/math`.

use callgate::{FirewallResult, Object, PropertyDescriptor, Value};

pub fn square_of(square: &Object, x: f64) -> FirewallResult<Value> {
    square.call(&Value::Undefined, &[Value::Number(x)])
}

pub fn read(object: &Object, key: &str) -> FirewallResult<Value> {
    object.get(key)
}

/// Follow `path` one member at a time.
pub fn read_path(object: &Object, path: &[&str]) -> FirewallResult<Value> {
    let mut current = Value::Object(object.clone());
    for key in path {
        current = match current {
            Value::Object(object) => object.get(*key)?,
            other => return Ok(other),
        };
    }
    Ok(current)
}

pub fn write(object: &Object, key: &str, value: impl Into<Value>) -> FirewallResult<bool> {
    object.set(key, value)
}

pub fn define(
    object: &Object,
    key: &str,
    descriptor: PropertyDescriptor,
) -> FirewallResult<bool> {
    object.define_property(key, descriptor)
}

pub fn remove(object: &Object, key: &str) -> FirewallResult<bool> {
    object.delete(key)
}

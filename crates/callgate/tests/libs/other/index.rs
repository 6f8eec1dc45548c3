//! Operations performed from `tests/libs/other`.

use callgate::{FirewallResult, Object, Value};

pub fn square_of(square: &Object, x: f64) -> FirewallResult<Value> {
    square.call(&Value::Undefined, &[Value::Number(x)])
}

pub fn read(object: &Object, key: &str) -> FirewallResult<Value> {
    object.get(key)
}

pub fn remove(object: &Object, key: &str) -> FirewallResult<bool> {
    object.delete(key)
}

//! Default semantics for unguarded objects.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use super::value::{NativeFn, PropertyDescriptor, PropertyKey, Value};
use super::{Object, ObjectId};
use crate::error::{FirewallError, FirewallResult};

#[derive(Debug)]
struct ObjectState {
    properties: IndexMap<PropertyKey, PropertyDescriptor>,
    prototype: Option<Object>,
    extensible: bool,
}

/// Property storage plus optional call behaviour.
///
/// No lock is held while a native function body runs or while the prototype
/// chain is walked, so bodies may freely re-enter the object.
pub(crate) struct OrdinaryObject {
    state: RwLock<ObjectState>,
    body: Option<NativeFn>,
    constructible: bool,
}

impl OrdinaryObject {
    pub(crate) fn new(
        properties: IndexMap<PropertyKey, PropertyDescriptor>,
        prototype: Option<Object>,
        body: Option<NativeFn>,
        constructible: bool,
    ) -> Self {
        Self {
            state: RwLock::new(ObjectState {
                properties,
                prototype,
                extensible: true,
            }),
            body,
            constructible,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ObjectState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ObjectState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_callable(&self) -> bool {
        self.body.is_some()
    }

    pub(crate) fn is_constructible(&self) -> bool {
        self.constructible && self.body.is_some()
    }

    #[track_caller]
    pub(crate) fn get(&self, key: PropertyKey) -> FirewallResult<Value> {
        let prototype = {
            let state = self.read();
            if let Some(descriptor) = state.properties.get(&key) {
                return Ok(descriptor.value.clone());
            }
            state.prototype.clone()
        };

        match prototype {
            Some(prototype) => prototype.get(key),
            None => Ok(Value::Undefined),
        }
    }

    pub(crate) fn set(&self, key: PropertyKey, value: Value) -> bool {
        let mut state = self.write();
        if let Some(descriptor) = state.properties.get_mut(&key) {
            if !descriptor.writable {
                return false;
            }
            descriptor.value = value;
            return true;
        }

        if !state.extensible {
            return false;
        }
        state
            .properties
            .insert(key, PropertyDescriptor::new(value));
        true
    }

    #[track_caller]
    pub(crate) fn has(&self, key: PropertyKey) -> FirewallResult<bool> {
        let prototype = {
            let state = self.read();
            if state.properties.contains_key(&key) {
                return Ok(true);
            }
            state.prototype.clone()
        };

        match prototype {
            Some(prototype) => prototype.has(key),
            None => Ok(false),
        }
    }

    pub(crate) fn delete(&self, key: &PropertyKey) -> bool {
        let mut state = self.write();
        match state.properties.get(key) {
            None => true,
            Some(descriptor) if !descriptor.configurable => false,
            Some(_) => {
                state.properties.shift_remove(key);
                true
            }
        }
    }

    pub(crate) fn define_property(&self, key: PropertyKey, descriptor: PropertyDescriptor) -> bool {
        let mut state = self.write();
        match state.properties.get(&key) {
            Some(existing) if !existing.configurable => *existing == descriptor,
            None if !state.extensible => false,
            _ => {
                state.properties.insert(key, descriptor);
                true
            }
        }
    }

    pub(crate) fn get_own_property(&self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        self.read().properties.get(key).cloned()
    }

    /// Integer keys ascending, then strings in insertion order, then symbols.
    pub(crate) fn own_keys(&self) -> Vec<PropertyKey> {
        let state = self.read();
        let mut indices = Vec::new();
        let mut names = Vec::new();
        let mut symbols = Vec::new();

        for key in state.properties.keys() {
            match (key, key.as_index()) {
                (_, Some(index)) => indices.push((index, key.clone())),
                (PropertyKey::String(_), None) => names.push(key.clone()),
                (PropertyKey::Symbol(_), None) => symbols.push(key.clone()),
            }
        }

        indices.sort_by_key(|(index, _)| *index);
        indices
            .into_iter()
            .map(|(_, key)| key)
            .chain(names)
            .chain(symbols)
            .collect()
    }

    pub(crate) fn get_prototype_of(&self) -> Option<Object> {
        self.read().prototype.clone()
    }

    /// Refuses on non-extensible objects and when `prototype` would close a
    /// cycle back to `own_id`. Wrappers are followed through to their targets.
    pub(crate) fn set_prototype_of(&self, own_id: ObjectId, prototype: Option<Object>) -> bool {
        let mut cursor = prototype.clone();
        while let Some(link) = cursor {
            if link.id() == own_id {
                return false;
            }
            cursor = match link.as_guarded() {
                Some(guarded) => Some(guarded.target().clone()),
                None => link.ordinary().and_then(OrdinaryObject::get_prototype_of),
            };
        }

        let mut state = self.write();
        let unchanged = match (&state.prototype, &prototype) {
            (Some(current), Some(next)) => current.id() == next.id(),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return true;
        }
        if !state.extensible {
            return false;
        }
        state.prototype = prototype;
        true
    }

    pub(crate) fn is_extensible(&self) -> bool {
        self.read().extensible
    }

    pub(crate) fn prevent_extensions(&self) -> bool {
        self.write().extensible = false;
        true
    }

    pub(crate) fn call(&self, this: &Value, args: &[Value]) -> FirewallResult<Value> {
        match &self.body {
            Some(body) => {
                let body = Arc::clone(body);
                body(this, args)
            }
            None => Err(FirewallError::TypeError(
                "object is not a function".to_string(),
            )),
        }
    }

    /// The new instance inherits from the constructor's `prototype` property.
    /// An object returned by the body replaces the instance.
    #[track_caller]
    pub(crate) fn construct(&self, args: &[Value]) -> FirewallResult<Value> {
        let body = match (&self.body, self.constructible) {
            (Some(body), true) => Arc::clone(body),
            _ => {
                return Err(FirewallError::TypeError(
                    "object is not a constructor".to_string(),
                ));
            }
        };

        let prototype = match self.get(PropertyKey::from("prototype"))? {
            Value::Object(prototype) => Some(prototype),
            _ => None,
        };
        let instance = Object::with_prototype(prototype);

        match body(&Value::Object(instance.clone()), args)? {
            Value::Object(returned) => Ok(Value::Object(returned)),
            _ => Ok(Value::Object(instance)),
        }
    }
}

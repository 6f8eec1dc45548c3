//! Firewall wrappers.

use std::fmt;
use std::sync::Arc;

use super::value::{PropertyDescriptor, PropertyKey, Value};
use super::Object;
use crate::error::FirewallResult;
use crate::policy::{Operation, Policy};
use crate::registry::WrapRegistry;
use crate::stack::CallSite;

/// State shared by every wrapper created from one `allow` call.
pub(crate) struct Guard {
    policy: Policy,
    registry: WrapRegistry,
}

impl Guard {
    pub(crate) fn new(policy: Policy) -> Self {
        Self {
            policy,
            registry: WrapRegistry::new(),
        }
    }

    /// Return the wrapper for `target`, creating and registering it on first
    /// sight. Wrappers already owned by this guard are returned unchanged.
    pub(crate) fn wrap(self: &Arc<Self>, target: Object) -> Object {
        if let Some(guarded) = target.as_guarded()
            && Arc::ptr_eq(&guarded.guard, self)
        {
            return target;
        }

        self.registry
            .get_or_insert_with(&target, || Object::guarded(target.clone(), Arc::clone(self)))
    }

    /// Wrap object values crossing the wrapper boundary in deep mode.
    fn shield(self: &Arc<Self>, value: Value) -> Value {
        match value {
            Value::Object(object) if self.policy.config().deep => Value::Object(self.wrap(object)),
            other => other,
        }
    }

    #[track_caller]
    fn authorize(&self, operation: Operation) -> FirewallResult<()> {
        self.policy.authorize(&operation, &CallSite::capture())
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("policy", &self.policy)
            .field("registry", &self.registry)
            .finish()
    }
}

/// A wrapper that authorizes each operation before delegating to its target.
///
/// The target is only touched after authorization succeeds.
pub(crate) struct GuardedObject {
    target: Object,
    guard: Arc<Guard>,
}

impl GuardedObject {
    pub(crate) fn new(target: Object, guard: Arc<Guard>) -> Self {
        Self { target, guard }
    }

    pub(crate) fn target(&self) -> &Object {
        &self.target
    }

    #[track_caller]
    pub(crate) fn get(&self, key: PropertyKey) -> FirewallResult<Value> {
        self.guard.authorize(Operation::Get(key.clone()))?;
        let value = self.target.get(key)?;
        Ok(self.guard.shield(value))
    }

    #[track_caller]
    pub(crate) fn set(&self, key: PropertyKey, value: Value) -> FirewallResult<bool> {
        self.guard.authorize(Operation::Set(key.clone()))?;
        self.target.set(key, self.guard.shield(value))
    }

    #[track_caller]
    pub(crate) fn has(&self, key: PropertyKey) -> FirewallResult<bool> {
        self.guard.authorize(Operation::Has(key.clone()))?;
        self.target.has(key)
    }

    #[track_caller]
    pub(crate) fn delete(&self, key: PropertyKey) -> FirewallResult<bool> {
        self.guard.authorize(Operation::Delete(key.clone()))?;
        self.target.delete(key)
    }

    #[track_caller]
    pub(crate) fn define_property(
        &self,
        key: PropertyKey,
        mut descriptor: PropertyDescriptor,
    ) -> FirewallResult<bool> {
        self.guard
            .authorize(Operation::DefineProperty(key.clone()))?;
        descriptor.value = self.guard.shield(descriptor.value);
        self.target.define_property(key, descriptor)
    }

    #[track_caller]
    pub(crate) fn get_own_property(
        &self,
        key: PropertyKey,
    ) -> FirewallResult<Option<PropertyDescriptor>> {
        self.guard
            .authorize(Operation::GetOwnProperty(key.clone()))?;
        Ok(self.target.get_own_property(key)?.map(|mut descriptor| {
            descriptor.value = self.guard.shield(descriptor.value);
            descriptor
        }))
    }

    #[track_caller]
    pub(crate) fn own_keys(&self) -> FirewallResult<Vec<PropertyKey>> {
        self.guard.authorize(Operation::OwnKeys)?;
        self.target.own_keys()
    }

    #[track_caller]
    pub(crate) fn get_prototype_of(&self) -> FirewallResult<Option<Object>> {
        self.guard.authorize(Operation::GetPrototypeOf)?;
        let prototype = self.target.get_prototype_of()?;
        Ok(prototype.map(|prototype| {
            if self.guard.policy.config().deep {
                self.guard.wrap(prototype)
            } else {
                prototype
            }
        }))
    }

    #[track_caller]
    pub(crate) fn set_prototype_of(&self, prototype: Option<Object>) -> FirewallResult<bool> {
        self.guard.authorize(Operation::SetPrototypeOf)?;
        self.target.set_prototype_of(prototype)
    }

    #[track_caller]
    pub(crate) fn is_extensible(&self) -> FirewallResult<bool> {
        self.guard.authorize(Operation::IsExtensible)?;
        self.target.is_extensible()
    }

    #[track_caller]
    pub(crate) fn prevent_extensions(&self) -> FirewallResult<bool> {
        self.guard.authorize(Operation::PreventExtensions)?;
        self.target.prevent_extensions()
    }

    #[track_caller]
    pub(crate) fn call(&self, this: &Value, args: &[Value]) -> FirewallResult<Value> {
        self.guard.authorize(Operation::Call)?;
        self.target.call(this, args)
    }

    #[track_caller]
    pub(crate) fn construct(&self, args: &[Value]) -> FirewallResult<Value> {
        self.guard.authorize(Operation::Construct)?;
        self.target.construct(args)
    }
}

//! Dynamic object model.
//!
//! An [`Object`] is a shared handle to either an ordinary object (property
//! storage with a prototype link, an extensibility flag, and optional native
//! call behaviour) or a guarded wrapper around another object. Both answer
//! the same structural operations:
//!
//! | operation | method |
//! |---|---|
//! | read / write / test a member | [`Object::get`], [`Object::set`], [`Object::has`] |
//! | delete / define / describe a member | [`Object::delete`], [`Object::define_property`], [`Object::get_own_property`] |
//! | enumerate own members | [`Object::own_keys`] |
//! | prototype link | [`Object::get_prototype_of`], [`Object::set_prototype_of`] |
//! | extensibility | [`Object::is_extensible`], [`Object::prevent_extensions`] |
//! | invocation | [`Object::call`], [`Object::construct`] |
//!
//! Every operation is `#[track_caller]`: a guarded object authorizes the
//! source location that invoked the method before delegating to its target.

mod guarded;
mod ordinary;
mod value;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;

use crate::error::{FirewallError, FirewallResult};

pub(crate) use guarded::{Guard, GuardedObject};
use ordinary::OrdinaryObject;
pub use value::{NativeFn, PropertyDescriptor, PropertyKey, Symbol, Value};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an object handle. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct ObjectInner {
    id: ObjectId,
    kind: ObjectKind,
}

enum ObjectKind {
    Ordinary(OrdinaryObject),
    Guarded(GuardedObject),
}

/// Shared handle to an object or function.
///
/// Cloning the handle does not copy the object; equality is identity.
#[derive(Clone)]
pub struct Object(Arc<ObjectInner>);

impl Object {
    fn from_kind(kind: ObjectKind) -> Self {
        Self(Arc::new(ObjectInner {
            id: ObjectId::next(),
            kind,
        }))
    }

    fn ordinary_with(
        properties: IndexMap<PropertyKey, PropertyDescriptor>,
        prototype: Option<Object>,
        body: Option<NativeFn>,
        constructible: bool,
    ) -> Self {
        Self::from_kind(ObjectKind::Ordinary(OrdinaryObject::new(
            properties,
            prototype,
            body,
            constructible,
        )))
    }

    /// Create an empty object with no prototype.
    pub fn new() -> Self {
        Self::with_prototype(None)
    }

    /// Create an empty object with the given prototype.
    pub fn with_prototype(prototype: Option<Object>) -> Self {
        Self::ordinary_with(IndexMap::new(), prototype, None, false)
    }

    /// Create an object from key/value pairs, in order.
    pub fn from_entries<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<PropertyKey>,
        V: Into<Value>,
    {
        let properties = entries
            .into_iter()
            .map(|(key, value)| (key.into(), PropertyDescriptor::new(value)))
            .collect();
        Self::ordinary_with(properties, None, None, false)
    }

    /// Create a callable object that cannot be used as a constructor.
    pub fn function<F>(body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> FirewallResult<Value> + Send + Sync + 'static,
    {
        Self::ordinary_with(IndexMap::new(), None, Some(Arc::new(body)), false)
    }

    /// Create a constructor.
    ///
    /// The constructor gets a fresh `prototype` object; instances created by
    /// [`Object::construct`] inherit from it and are passed to `body` as `this`.
    pub fn constructor<F>(body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> FirewallResult<Value> + Send + Sync + 'static,
    {
        let mut properties = IndexMap::new();
        properties.insert(
            PropertyKey::from("prototype"),
            PropertyDescriptor::new(Object::new())
                .with_enumerable(false)
                .with_configurable(false),
        );
        Self::ordinary_with(properties, None, Some(Arc::new(body)), true)
    }

    pub(crate) fn guarded(target: Object, guard: Arc<Guard>) -> Self {
        Self::from_kind(ObjectKind::Guarded(GuardedObject::new(target, guard)))
    }

    /// This handle's identity.
    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    /// Returns true if this handle is a firewall wrapper.
    pub fn is_guarded(&self) -> bool {
        matches!(self.0.kind, ObjectKind::Guarded(_))
    }

    /// Returns true if the object can be called. Not an intercepted operation.
    pub fn is_callable(&self) -> bool {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => object.is_callable(),
            ObjectKind::Guarded(object) => object.target().is_callable(),
        }
    }

    /// Returns true if the object can be constructed. Not an intercepted operation.
    pub fn is_constructible(&self) -> bool {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => object.is_constructible(),
            ObjectKind::Guarded(object) => object.target().is_constructible(),
        }
    }

    pub(crate) fn ordinary(&self) -> Option<&OrdinaryObject> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => Some(object),
            ObjectKind::Guarded(_) => None,
        }
    }

    pub(crate) fn as_guarded(&self) -> Option<&GuardedObject> {
        match &self.0.kind {
            ObjectKind::Ordinary(_) => None,
            ObjectKind::Guarded(object) => Some(object),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<ObjectInner> {
        Arc::downgrade(&self.0)
    }

    pub(crate) fn upgrade(weak: &Weak<ObjectInner>) -> Option<Self> {
        weak.upgrade().map(Self)
    }

    /// Read a property, walking the prototype chain.
    #[track_caller]
    pub fn get(&self, key: impl Into<PropertyKey>) -> FirewallResult<Value> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => object.get(key.into()),
            ObjectKind::Guarded(object) => object.get(key.into()),
        }
    }

    /// Write a property. Returns false if the property is read-only or the
    /// object is not extensible.
    #[track_caller]
    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> FirewallResult<bool> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => Ok(object.set(key.into(), value.into())),
            ObjectKind::Guarded(object) => object.set(key.into(), value.into()),
        }
    }

    /// Test for a property, walking the prototype chain.
    #[track_caller]
    pub fn has(&self, key: impl Into<PropertyKey>) -> FirewallResult<bool> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => object.has(key.into()),
            ObjectKind::Guarded(object) => object.has(key.into()),
        }
    }

    /// Delete an own property. Returns false for non-configurable properties.
    #[track_caller]
    pub fn delete(&self, key: impl Into<PropertyKey>) -> FirewallResult<bool> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => Ok(object.delete(&key.into())),
            ObjectKind::Guarded(object) => object.delete(key.into()),
        }
    }

    /// Define or redefine an own property.
    #[track_caller]
    pub fn define_property(
        &self,
        key: impl Into<PropertyKey>,
        descriptor: PropertyDescriptor,
    ) -> FirewallResult<bool> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => Ok(object.define_property(key.into(), descriptor)),
            ObjectKind::Guarded(object) => object.define_property(key.into(), descriptor),
        }
    }

    /// Describe an own property.
    #[track_caller]
    pub fn get_own_property(
        &self,
        key: impl Into<PropertyKey>,
    ) -> FirewallResult<Option<PropertyDescriptor>> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => Ok(object.get_own_property(&key.into())),
            ObjectKind::Guarded(object) => object.get_own_property(key.into()),
        }
    }

    /// List own property keys.
    #[track_caller]
    pub fn own_keys(&self) -> FirewallResult<Vec<PropertyKey>> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => Ok(object.own_keys()),
            ObjectKind::Guarded(object) => object.own_keys(),
        }
    }

    /// Read the prototype link.
    #[track_caller]
    pub fn get_prototype_of(&self) -> FirewallResult<Option<Object>> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => Ok(object.get_prototype_of()),
            ObjectKind::Guarded(object) => object.get_prototype_of(),
        }
    }

    /// Replace the prototype link. Returns false if the object is not
    /// extensible or the new link would create a cycle.
    #[track_caller]
    pub fn set_prototype_of(&self, prototype: Option<Object>) -> FirewallResult<bool> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => Ok(object.set_prototype_of(self.id(), prototype)),
            ObjectKind::Guarded(object) => object.set_prototype_of(prototype),
        }
    }

    /// Query extensibility.
    #[track_caller]
    pub fn is_extensible(&self) -> FirewallResult<bool> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => Ok(object.is_extensible()),
            ObjectKind::Guarded(object) => object.is_extensible(),
        }
    }

    /// Make the object non-extensible.
    #[track_caller]
    pub fn prevent_extensions(&self) -> FirewallResult<bool> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => Ok(object.prevent_extensions()),
            ObjectKind::Guarded(object) => object.prevent_extensions(),
        }
    }

    /// Invoke as a function.
    #[track_caller]
    pub fn call(&self, this: &Value, args: &[Value]) -> FirewallResult<Value> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => object.call(this, args),
            ObjectKind::Guarded(object) => object.call(this, args),
        }
    }

    /// Invoke as a constructor.
    #[track_caller]
    pub fn construct(&self, args: &[Value]) -> FirewallResult<Value> {
        match &self.0.kind {
            ObjectKind::Ordinary(object) => object.construct(args),
            ObjectKind::Guarded(object) => object.construct(args),
        }
    }

    /// Read the method `name` and call it with this object as `this`.
    #[track_caller]
    pub fn call_method(
        &self,
        name: impl Into<PropertyKey>,
        args: &[Value],
    ) -> FirewallResult<Value> {
        let name = name.into();
        match self.get(name.clone())? {
            Value::Object(method) => method.call(&Value::Object(self.clone()), args),
            other => Err(FirewallError::TypeError(format!(
                "{name} is not a function (found {})",
                other.type_name()
            ))),
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Object {}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id())
            .field("guarded", &self.is_guarded())
            .field("callable", &self.is_callable())
            .finish_non_exhaustive()
    }
}

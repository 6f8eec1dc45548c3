//! Callgate: a caller-location firewall for shared objects
//!
//! Callgate wraps an object or function so that every structural operation
//! on it (reading, writing, deleting or describing members, enumerating keys,
//! prototype and extensibility changes, calls and construction) is allowed
//! only when the code performing it lives under a declared set of source
//! locations. Modules can be shared widely while the directories that may
//! actually use them stay restricted.
//!
//! ```rust,ignore
//! use callgate::{Object, Value, allow};
//!
//! let square = Object::function(|_, args| {
//!     let x = args.first().and_then(Value::as_number).unwrap_or_default();
//!     Ok(Value::Number(x * x))
//! });
//! let square = allow(["libs/math"], square)?;
//!
//! // From a file under libs/math/:
//! assert_eq!(square.call(&Value::Undefined, &[Value::from(5)])?, Value::Number(25.0));
//!
//! // From anywhere else:
//! // Err(Access denied for calling function from /app/libs/other/index.rs:4:12)
//! ```
//!
//! The caller is taken from the call site of each operation, never cached,
//! and relative patterns resolve against the working directory at the
//! moment of the check. Code holding the unwrapped target is not restricted.

mod config;
mod error;
mod firewall;
mod object;
mod paths;
mod registry;
mod stack;

pub mod policy;

pub use config::{DEFAULT_DEPENDENCY_MARKERS, FirewallConfig};
pub use error::{FirewallError, FirewallResult};
pub use firewall::{Firewall, allow};
pub use object::{NativeFn, Object, ObjectId, PropertyDescriptor, PropertyKey, Symbol, Value};
pub use policy::{LocationPattern, Operation, PatternKind, Policy, PolicyDecision};
pub use stack::{CallSite, CallStack, CallerInfo, StackFrame, is_internal_file, resolve_caller};

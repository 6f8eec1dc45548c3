//! Operations, decisions and the location policy.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::FirewallConfig;
use crate::error::{FirewallError, FirewallResult};
use crate::object::PropertyKey;
use crate::paths::to_match_string;
use crate::stack::{CallStack, CallerInfo, resolve_caller};

use super::pattern::LocationPattern;

/// A structural operation performed on a guarded object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Reading a property
    Get(PropertyKey),
    /// Writing a property
    Set(PropertyKey),
    /// Testing for a property
    Has(PropertyKey),
    /// Deleting a property
    Delete(PropertyKey),
    /// Defining a property from a descriptor
    DefineProperty(PropertyKey),
    /// Reading an own property descriptor
    GetOwnProperty(PropertyKey),
    /// Listing own property keys
    OwnKeys,
    /// Reading the prototype link
    GetPrototypeOf,
    /// Replacing the prototype link
    SetPrototypeOf,
    /// Querying extensibility
    IsExtensible,
    /// Making the object non-extensible
    PreventExtensions,
    /// Invoking as a function
    Call,
    /// Invoking as a constructor
    Construct,
}

impl Operation {
    /// The label used in denial messages.
    ///
    /// Member operations are labelled by the member name, everything else by
    /// a fixed description.
    pub fn label(&self) -> String {
        match self {
            Operation::Get(key)
            | Operation::Set(key)
            | Operation::Has(key)
            | Operation::DefineProperty(key)
            | Operation::GetOwnProperty(key) => key.to_string(),
            Operation::Delete(_) => "deleting property".to_string(),
            Operation::OwnKeys => "observing own keys".to_string(),
            Operation::GetPrototypeOf => "getting prototype".to_string(),
            Operation::SetPrototypeOf => "setting prototype".to_string(),
            Operation::IsExtensible => "checking extensibility".to_string(),
            Operation::PreventExtensions => "preventing extensions".to_string(),
            Operation::Call => "calling function".to_string(),
            Operation::Construct => "creating new object".to_string(),
        }
    }

    /// Short machine-readable name of the operation kind.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Get(_) => "get",
            Operation::Set(_) => "set",
            Operation::Has(_) => "has",
            Operation::Delete(_) => "delete",
            Operation::DefineProperty(_) => "define_property",
            Operation::GetOwnProperty(_) => "get_own_property",
            Operation::OwnKeys => "own_keys",
            Operation::GetPrototypeOf => "get_prototype_of",
            Operation::SetPrototypeOf => "set_prototype_of",
            Operation::IsExtensible => "is_extensible",
            Operation::PreventExtensions => "prevent_extensions",
            Operation::Call => "call",
            Operation::Construct => "construct",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// The result of a policy check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The operation is allowed.
    Allow,
    /// The operation is denied with a reason.
    Deny(String),
}

impl PolicyDecision {
    /// Returns true if the operation is allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }

    /// Returns the denial reason if denied, None if allowed.
    pub fn denial_reason(&self) -> Option<&str> {
        match self {
            PolicyDecision::Allow => None,
            PolicyDecision::Deny(reason) => Some(reason),
        }
    }
}

/// An ordered list of permitted caller locations.
///
/// Patterns are evaluated in order and the first match allows the operation.
/// A caller matching no pattern is denied unless the dependency carve-out
/// applies. Unresolvable callers are denied unless
/// [`FirewallConfig::allow_unknown_callers`] is set.
#[derive(Clone, Debug)]
pub struct Policy {
    patterns: Vec<LocationPattern>,
    config: FirewallConfig,
}

impl Policy {
    /// Build a policy from location patterns.
    ///
    /// Fails with [`FirewallError::InvalidArgument`] when `locations` is
    /// empty or contains an empty pattern.
    pub fn new<I, S>(locations: I, config: FirewallConfig) -> FirewallResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = locations
            .into_iter()
            .map(|location| LocationPattern::parse(location.as_ref()))
            .collect::<FirewallResult<Vec<_>>>()?;

        if patterns.is_empty() {
            return Err(FirewallError::InvalidArgument(
                "locations must contain at least one pattern".to_string(),
            ));
        }

        Ok(Self { patterns, config })
    }

    /// The patterns in evaluation order.
    pub fn patterns(&self) -> &[LocationPattern] {
        &self.patterns
    }

    /// The configuration this policy was built with.
    pub fn config(&self) -> &FirewallConfig {
        &self.config
    }

    /// Returns true if any pattern matches `caller`, resolving relative
    /// patterns against the current working directory.
    pub fn matches(&self, caller: &Path) -> bool {
        self.matches_in(caller, working_dir().as_deref())
    }

    /// Returns true if any pattern matches `caller`, resolving relative
    /// patterns against `cwd`.
    pub fn matches_in(&self, caller: &Path, cwd: Option<&Path>) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches(caller, cwd))
    }

    /// Decide whether `caller` may perform `operation`.
    pub fn check_caller(
        &self,
        operation: &Operation,
        caller: Option<&CallerInfo>,
    ) -> PolicyDecision {
        let Some(caller) = caller else {
            if self.config.allow_unknown_callers {
                tracing::trace!(operation = %operation, "allowing unresolved caller");
                return PolicyDecision::Allow;
            }
            return PolicyDecision::Deny("caller location could not be resolved".to_string());
        };

        if self.matches(&caller.file) {
            return PolicyDecision::Allow;
        }

        if self.config.trust_dependencies
            && self
                .config
                .is_dependency_path(&to_match_string(&caller.file))
        {
            tracing::trace!(
                operation = %operation,
                caller = %caller,
                "allowing dependency caller"
            );
            return PolicyDecision::Allow;
        }

        PolicyDecision::Deny(format!(
            "{} matches no location pattern",
            caller.file.display()
        ))
    }

    /// Resolve the caller from `stack` and authorize `operation`.
    ///
    /// Returns [`FirewallError::AccessDenied`] on denial; nothing is cached
    /// between calls.
    pub fn authorize<S: CallStack + ?Sized>(
        &self,
        operation: &Operation,
        stack: &S,
    ) -> FirewallResult<()> {
        let caller = resolve_caller(stack, self.config.source_root.as_deref());

        match self.check_caller(operation, caller.as_ref()) {
            PolicyDecision::Allow => Ok(()),
            PolicyDecision::Deny(reason) => {
                tracing::debug!(
                    operation = %operation,
                    kind = operation.name(),
                    caller = ?caller,
                    reason = %reason,
                    "firewall denied access"
                );
                Err(FirewallError::AccessDenied {
                    operation: operation.label(),
                    caller,
                })
            }
        }
    }
}

fn working_dir() -> Option<PathBuf> {
    match std::env::current_dir() {
        Ok(dir) => Some(dir),
        Err(error) => {
            tracing::warn!(%error, "working directory unavailable, relative patterns will not match");
            None
        }
    }
}

//! The `allow` entry point.

use std::sync::Arc;

use crate::config::FirewallConfig;
use crate::error::{FirewallError, FirewallResult};
use crate::object::{Guard, Object, Value};
use crate::policy::Policy;

/// Creates guarded wrappers that share one configuration.
///
/// ## Example
///
/// ```rust
/// use callgate::{Firewall, FirewallConfig, Object, Value};
///
/// let firewall = Firewall::new(FirewallConfig {
///     trust_dependencies: true,
///     ..FirewallConfig::default()
/// });
///
/// let square = Object::function(|_, args| {
///     let x = args.first().and_then(Value::as_number).unwrap_or_default();
///     Ok(Value::Number(x * x))
/// });
///
/// let guarded = firewall.allow(["libs/math"], square)?;
/// assert!(guarded.is_guarded());
/// # Ok::<(), callgate::FirewallError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Firewall {
    config: FirewallConfig,
}

impl Firewall {
    /// Create a firewall with the given configuration.
    pub fn new(config: FirewallConfig) -> Self {
        Self { config }
    }

    /// The configuration applied to every wrapper.
    pub fn config(&self) -> &FirewallConfig {
        &self.config
    }

    /// Wrap `target` so that only callers located under one of `locations`
    /// may operate on it.
    ///
    /// `locations` must be non-empty and `target` must be an object or
    /// function; both are checked before anything is wrapped. The returned
    /// handle is distinct from `target`, which is left untouched.
    pub fn allow<I, S>(&self, locations: I, target: impl Into<Value>) -> FirewallResult<Object>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let target = match target.into() {
            Value::Object(object) => object,
            other => {
                return Err(FirewallError::InvalidArgument(format!(
                    "target must be an object or function, got {}",
                    other.type_name()
                )));
            }
        };
        let policy = Policy::new(locations, self.config.clone())?;

        tracing::debug!(
            target = %target.id(),
            patterns = ?policy.patterns().iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            deep = self.config.deep,
            "wrapping object"
        );

        let guard = Arc::new(Guard::new(policy));
        Ok(guard.wrap(target))
    }
}

/// Wrap `target` with the default configuration.
///
/// See [`Firewall::allow`].
pub fn allow<I, S>(locations: I, target: impl Into<Value>) -> FirewallResult<Object>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Firewall::default().allow(locations, target)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_locations() {
        let result = allow(Vec::<&str>::new(), Object::new());
        assert!(matches!(result, Err(FirewallError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_non_object_target() {
        let err = allow(["libs"], 42).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid argument: target must be an object or function, got number"
        );

        assert!(allow(["libs"], "text").is_err());
        assert!(allow(["libs"], Value::Null).is_err());
    }

    #[test]
    fn test_wrapper_is_distinct_from_target() {
        let target = Object::from_entries([("p", 1)]);
        let wrapped = allow(["libs"], target.clone()).unwrap();

        assert!(wrapped.is_guarded());
        assert!(!target.is_guarded());
        assert_ne!(wrapped.id(), target.id());
    }

    #[test]
    fn test_wrapping_reports_capabilities() {
        let function = Object::function(|_, _| Ok(Value::Undefined));
        let constructor = Object::constructor(|_, _| Ok(Value::Undefined));

        let function = allow(["libs"], function).unwrap();
        let constructor = allow(["libs"], constructor).unwrap();

        assert!(function.is_callable());
        assert!(!function.is_constructible());
        assert!(constructor.is_constructible());
        assert_eq!(Value::from(function).type_name(), "function");
    }

    #[test]
    fn test_denies_from_inside_the_crate() {
        // Callers inside this crate resolve to no external frame.
        let wrapped = allow(["src"], Object::from_entries([("p", 1)])).unwrap();
        let err = wrapped.get("p").unwrap_err();
        assert_eq!(err.to_string(), "Access denied for p from <unknown>");
    }
}

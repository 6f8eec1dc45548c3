//! Relative patterns are resolved against the working directory at the time
//! of each check, not when the wrapper is created.
//!
//! Kept in its own test binary since it changes the process working directory.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::env;

use callgate::{FirewallError, Object, Value, allow};

#[test]
fn test_patterns_follow_working_directory() {
    let wrapped = allow(["tests"], Object::from_entries([("p", 1)])).unwrap();
    assert_eq!(wrapped.get("p").unwrap(), Value::Number(1.0));

    let original = env::current_dir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    env::set_current_dir(elsewhere.path()).unwrap();

    let moved = wrapped.get("p");

    env::set_current_dir(&original).unwrap();

    assert!(
        matches!(moved, Err(FirewallError::AccessDenied { .. })),
        "got: {moved:?}"
    );
    assert_eq!(wrapped.get("p").unwrap(), Value::Number(1.0));
}

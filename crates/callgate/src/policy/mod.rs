//! Location policies.
//!
//! A [`Policy`] decides, for a single structural operation, whether the code
//! that attempted it may proceed. The decision depends only on where that
//! code lives:
//!
//! - **Directory patterns** (`libs/math`) allow every file below the
//!   directory, resolved against the working directory at check time.
//! - **File patterns** (`libs/math/index.rs`) allow callers whose path
//!   contains the resolved pattern.
//!
//! Patterns are evaluated in order and the first match wins. Callers in
//! dependency directories can be trusted wholesale with
//! [`FirewallConfig::trust_dependencies`](crate::FirewallConfig::trust_dependencies).
//!
//! ## Example
//!
//! ```rust
//! use callgate::{CallerInfo, FirewallConfig, Operation, Policy};
//!
//! let policy = Policy::new(["/srv/app/libs/math"], FirewallConfig::default())?;
//! let caller = CallerInfo {
//!     file: "/srv/app/libs/math/index.rs".into(),
//!     line: 3,
//!     column: 5,
//! };
//!
//! assert!(policy.check_caller(&Operation::Call, Some(&caller)).is_allowed());
//! # Ok::<(), callgate::FirewallError>(())
//! ```

mod handler;
mod pattern;

pub use handler::{Operation, Policy, PolicyDecision};
pub use pattern::{LocationPattern, PatternKind};

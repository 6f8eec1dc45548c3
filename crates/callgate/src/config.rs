//! Firewall configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Directory fragments that identify third-party dependency sources.
pub const DEFAULT_DEPENDENCY_MARKERS: &[&str] = &[".cargo/registry/", ".cargo/git/", "/vendor/"];

/// Behaviour switches shared by every wrapper a [`Firewall`](crate::Firewall) creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallConfig {
    /// Wrap nested objects reachable through a wrapper.
    pub deep: bool,
    /// Always authorize callers whose file lies in a dependency directory.
    pub trust_dependencies: bool,
    /// Path fragments treated as dependency directories when
    /// `trust_dependencies` is set.
    pub dependency_markers: Vec<String>,
    /// Authorize operations whose caller cannot be resolved.
    pub allow_unknown_callers: bool,
    /// Directory that relative caller paths are resolved against.
    /// Defaults to the build root, then the working directory.
    pub source_root: Option<PathBuf>,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            deep: true,
            trust_dependencies: false,
            dependency_markers: DEFAULT_DEPENDENCY_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
            allow_unknown_callers: false,
            source_root: None,
        }
    }
}

impl FirewallConfig {
    /// Returns true if `path` lies under a configured dependency directory.
    pub fn is_dependency_path(&self, path: &str) -> bool {
        self.dependency_markers
            .iter()
            .any(|marker| !marker.is_empty() && path.contains(marker.as_str()))
    }
}

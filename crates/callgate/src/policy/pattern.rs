//! Location patterns.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FirewallError, FirewallResult};
use crate::paths::{normalize, to_match_string};

/// How a [`LocationPattern`] is matched against a caller path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Matches every file below a directory.
    Directory,
    /// Matches a file path by substring.
    File,
}

/// A permitted caller location.
///
/// A pattern whose final segment contains a `.` is file-style (`src/db.rs`),
/// anything else is directory-style (`libs/math`). Relative patterns are
/// resolved against the working directory each time they are matched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocationPattern {
    raw: String,
    kind: PatternKind,
}

impl LocationPattern {
    /// Parse a pattern, rejecting empty strings.
    pub fn parse(raw: &str) -> FirewallResult<Self> {
        if raw.trim().is_empty() {
            return Err(FirewallError::InvalidArgument(
                "location patterns must be non-empty strings".to_string(),
            ));
        }

        Ok(Self {
            raw: raw.to_string(),
            kind: classify(raw),
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this is a directory or file pattern.
    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// The absolute, normalized form the caller path must contain.
    ///
    /// Directory patterns end with `/` so that `libs/mat` never matches
    /// `libs/math`. Returns `None` for a relative pattern without a working
    /// directory.
    pub fn resolve(&self, cwd: Option<&Path>) -> Option<String> {
        let path = Path::new(&self.raw);
        let absolute = if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&cwd?.join(path))
        };

        let mut resolved = to_match_string(&absolute);
        if self.kind == PatternKind::Directory && !resolved.ends_with('/') {
            resolved.push('/');
        }
        Some(resolved)
    }

    /// Returns true if `caller` lies within this pattern.
    pub fn matches(&self, caller: &Path, cwd: Option<&Path>) -> bool {
        match self.resolve(cwd) {
            Some(resolved) => to_match_string(caller).contains(&resolved),
            None => false,
        }
    }
}

impl fmt::Display for LocationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn classify(raw: &str) -> PatternKind {
    let last = raw
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    if last != "." && last != ".." && last.contains('.') {
        PatternKind::File
    } else {
        PatternKind::Directory
    }
}

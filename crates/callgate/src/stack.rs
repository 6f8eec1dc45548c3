//! Caller resolution.
//!
//! Every guarded operation captures its call site with `#[track_caller]`.
//! Each helper between a public `Object` method and [`CallSite::capture`]
//! carries the attribute too, so the captured location is the first frame
//! outside this crate. Hosts that know better (an embedded interpreter with
//! its own script positions, say) can hand frames to the policy directly
//! through the [`CallStack`] trait.

use std::fmt;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::paths::normalize;

/// The workspace root rustc was invoked from, if this crate was compiled
/// from a relative path. `None` for registry or otherwise absolute builds.
static BUILD_ROOT: LazyLock<Option<PathBuf>> = LazyLock::new(build_root);

/// The source directory of this crate as reported by `file!()`.
static OWN_SOURCE_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
    Path::new(file!())
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
});

fn build_root() -> Option<PathBuf> {
    let own = Path::new(file!());
    if own.is_absolute() {
        return None;
    }

    // `file!()` is `<package dir relative to the build root>/src/stack.rs`.
    let package_dir = own.parent()?.parent()?;
    let mut root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    for _ in package_dir.components() {
        if !root.pop() {
            return None;
        }
    }
    Some(root)
}

/// Returns true if `file` is one of this crate's own source files.
pub fn is_internal_file(file: &Path) -> bool {
    !OWN_SOURCE_DIR.as_os_str().is_empty() && file.starts_with(&*OWN_SOURCE_DIR)
}

/// The nearest external caller of a guarded operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerInfo {
    /// Absolute path of the calling source file.
    pub file: PathBuf,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl fmt::Display for CallerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// One frame of a call stack, innermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Source file of the frame, if the host knows it.
    pub file: Option<PathBuf>,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    /// Whether the frame belongs to the firewall itself.
    pub internal: bool,
}

impl StackFrame {
    /// Create a frame for a known source position.
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        let file = file.into();
        let internal = is_internal_file(&file);
        Self {
            file: Some(file),
            line,
            column,
            internal,
        }
    }

    /// Create a frame with no source information (e.g. dynamically evaluated code).
    pub fn unknown() -> Self {
        Self {
            file: None,
            line: 0,
            column: 0,
            internal: false,
        }
    }

    /// Create a frame from a compiler-reported location.
    pub fn from_location(location: &Location<'_>) -> Self {
        Self::new(location.file(), location.line(), location.column())
    }
}

/// A source of call-stack frames for the current operation.
pub trait CallStack {
    /// The frames of the current execution context, innermost first.
    fn frames(&self) -> Vec<StackFrame>;
}

impl CallStack for [StackFrame] {
    fn frames(&self) -> Vec<StackFrame> {
        self.to_vec()
    }
}

impl CallStack for Vec<StackFrame> {
    fn frames(&self) -> Vec<StackFrame> {
        self.clone()
    }
}

/// The call site of a guarded operation, captured with `#[track_caller]`.
#[derive(Debug, Clone, Copy)]
pub struct CallSite {
    location: &'static Location<'static>,
}

impl CallSite {
    /// Capture the location of the nearest caller not marked `#[track_caller]`.
    #[track_caller]
    pub fn capture() -> Self {
        Self {
            location: Location::caller(),
        }
    }

    /// The captured location.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl CallStack for CallSite {
    fn frames(&self) -> Vec<StackFrame> {
        vec![StackFrame::from_location(self.location)]
    }
}

/// Resolve the nearest external caller from a call stack.
///
/// Internal frames and frames without a source file are skipped. Relative
/// paths are made absolute against `source_root`, falling back to the build
/// root and then the working directory. Returns `None` when no frame
/// qualifies.
pub fn resolve_caller<S: CallStack + ?Sized>(
    stack: &S,
    source_root: Option<&Path>,
) -> Option<CallerInfo> {
    stack
        .frames()
        .into_iter()
        .filter(|frame| !frame.internal)
        .find_map(|frame| {
            let file = absolutize(frame.file.as_deref()?, source_root)?;
            Some(CallerInfo {
                file,
                line: frame.line,
                column: frame.column,
            })
        })
}

fn absolutize(file: &Path, source_root: Option<&Path>) -> Option<PathBuf> {
    if file.is_absolute() {
        return Some(normalize(file));
    }

    let root = match (source_root, BUILD_ROOT.as_ref()) {
        (Some(root), _) => root.to_path_buf(),
        (None, Some(root)) => root.clone(),
        (None, None) => std::env::current_dir().ok()?,
    };
    Some(normalize(&root.join(file)))
}

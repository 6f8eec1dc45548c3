//! Callgate CLI
//!
//! Evaluates a location policy against a caller given on the command line
//! and prints the decision as JSON.
//!
//! Usage:
//!   callgate check --allow libs/math src/libs/math/index.rs:12:5
//!   callgate check --allow libs --config firewall.json --operation set --key total src/app.rs

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use callgate::{
    CallerInfo, FirewallConfig, FirewallError, Operation, Policy, PolicyDecision, PropertyKey,
    StackFrame, resolve_caller,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Check caller locations against callgate policies
#[derive(Parser, Debug)]
#[command(name = "callgate")]
#[command(about = "Evaluate caller-location firewall policies")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide whether a caller may perform an operation.
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
struct CheckArgs {
    /// Allowed location pattern (repeatable)
    #[arg(long = "allow", value_name = "PATTERN", required = true)]
    patterns: Vec<String>,

    /// JSON file with firewall configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Operation being attempted
    #[arg(long, value_enum, default_value_t = OperationKind::Call)]
    operation: OperationKind,

    /// Property key for keyed operations
    #[arg(long, default_value = "value")]
    key: String,

    /// Caller location as `file[:line[:column]]`
    caller: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OperationKind {
    Get,
    Set,
    Has,
    Delete,
    DefineProperty,
    GetOwnProperty,
    OwnKeys,
    GetPrototypeOf,
    SetPrototypeOf,
    IsExtensible,
    PreventExtensions,
    Call,
    Construct,
}

impl OperationKind {
    fn with_key(self, key: &str) -> Operation {
        let key = PropertyKey::from(key);
        match self {
            OperationKind::Get => Operation::Get(key),
            OperationKind::Set => Operation::Set(key),
            OperationKind::Has => Operation::Has(key),
            OperationKind::Delete => Operation::Delete(key),
            OperationKind::DefineProperty => Operation::DefineProperty(key),
            OperationKind::GetOwnProperty => Operation::GetOwnProperty(key),
            OperationKind::OwnKeys => Operation::OwnKeys,
            OperationKind::GetPrototypeOf => Operation::GetPrototypeOf,
            OperationKind::SetPrototypeOf => Operation::SetPrototypeOf,
            OperationKind::IsExtensible => Operation::IsExtensible,
            OperationKind::PreventExtensions => Operation::PreventExtensions,
            OperationKind::Call => Operation::Call,
            OperationKind::Construct => Operation::Construct,
        }
    }
}

#[derive(Serialize, Debug)]
struct Decision {
    allowed: bool,
    operation: String,
    caller: CallerInfo,
    reason: Option<String>,
    message: Option<String>,
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check(args) => match run_check(&args) {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(e) => {
                eprintln!("callgate: {e:#}");
                ExitCode::from(2)
            }
        },
    }
}

fn run_check(args: &CheckArgs) -> anyhow::Result<bool> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => FirewallConfig::default(),
    };
    let policy = Policy::new(&args.patterns, config).context("invalid location pattern")?;

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let caller = parse_caller(&args.caller, &cwd)?;
    let operation = args.operation.with_key(&args.key);

    tracing::debug!(caller = %caller, operation = %operation, "checking caller");

    let decision = match policy.check_caller(&operation, Some(&caller)) {
        PolicyDecision::Allow => Decision {
            allowed: true,
            operation: operation.label(),
            caller,
            reason: None,
            message: None,
        },
        PolicyDecision::Deny(reason) => {
            let message = FirewallError::AccessDenied {
                operation: operation.label(),
                caller: Some(caller.clone()),
            }
            .to_string();
            Decision {
                allowed: false,
                operation: operation.label(),
                caller,
                reason: Some(reason),
                message: Some(message),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(decision.allowed)
}

fn load_config(path: &Path) -> anyhow::Result<FirewallConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

/// Split `file[:line[:column]]`, taking trailing numeric segments as the
/// line and column. Relative files are resolved against `cwd` and the path
/// is normalized the same way as a captured call site.
fn parse_caller(raw: &str, cwd: &Path) -> anyhow::Result<CallerInfo> {
    let mut rest = raw;
    let mut numbers = Vec::new();
    while numbers.len() < 2 {
        match rest.rsplit_once(':') {
            Some((head, tail)) if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) => {
                numbers.push(
                    tail.parse::<u32>()
                        .with_context(|| format!("position out of range in {raw}"))?,
                );
                rest = head;
            }
            _ => break,
        }
    }
    numbers.reverse();

    if rest.is_empty() {
        bail!("caller location has no file: {raw}");
    }

    let line = numbers.first().copied().unwrap_or(1);
    let column = numbers.get(1).copied().unwrap_or(1);
    let frame = StackFrame {
        internal: false,
        ..StackFrame::new(rest, line, column)
    };
    resolve_caller(&[frame][..], Some(cwd))
        .with_context(|| format!("cannot resolve caller location {raw}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_caller_with_position() {
        let caller = parse_caller("libs/math/index.rs:12:5", Path::new("/work")).unwrap();
        assert_eq!(caller.file, PathBuf::from("/work/libs/math/index.rs"));
        assert_eq!(caller.line, 12);
        assert_eq!(caller.column, 5);
    }

    #[test]
    fn test_parse_caller_line_only() {
        let caller = parse_caller("/abs/app.rs:7", Path::new("/work")).unwrap();
        assert_eq!(caller.file, PathBuf::from("/abs/app.rs"));
        assert_eq!(caller.line, 7);
        assert_eq!(caller.column, 1);
    }

    #[test]
    fn test_parse_caller_without_position() {
        let caller = parse_caller("app.rs", Path::new("/work")).unwrap();
        assert_eq!(caller.file, PathBuf::from("/work/app.rs"));
        assert_eq!((caller.line, caller.column), (1, 1));
    }

    #[test]
    fn test_parse_caller_normalizes_dot_segments() {
        let caller = parse_caller("./libs/../libs/math/index.rs:4", Path::new("/work")).unwrap();
        assert_eq!(caller.file, PathBuf::from("/work/libs/math/index.rs"));

        let caller = parse_caller("/work/./libs/math/index.rs", Path::new("/")).unwrap();
        assert_eq!(caller.file, PathBuf::from("/work/libs/math/index.rs"));
    }

    #[test]
    fn test_parse_caller_rejects_missing_file() {
        assert!(parse_caller(":3:4", Path::new("/work")).is_err());
    }

    #[test]
    fn test_keyed_operation_label() {
        assert_eq!(OperationKind::Get.with_key("total").label(), "total");
        assert_eq!(OperationKind::Delete.with_key("total").label(), "deleting property");
        assert_eq!(OperationKind::Call.with_key("ignored").label(), "calling function");
    }
}

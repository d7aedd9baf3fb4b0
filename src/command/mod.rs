//! Control command grammar and dispatch.
//!
//! ```text
//! activate | deactivate | state
//! baseline [add|remove|set <id>[,<id>...]] | [version <n>]
//! ```
//!
//! Verbs may carry the `--` prefix (`--activate`, `--baseline add ...`).

pub mod handler;

pub use handler::{CommandHandler, CommandReport, EXIT_CODE_OK, EXIT_CODE_UNEXPECTED_ERROR};

use crate::baseline::BaselineChange;
use crate::core::{ControlError, Result};
use std::fmt;

/// A parsed control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Activate,
    Deactivate,
    State,
    /// `baseline` without a sub-verb.
    BaselineCollect,
    Baseline(BaselineChange),
}

impl ControlCommand {
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut args = args.iter().map(|arg| arg.as_ref().trim());
        let verb = args
            .next()
            .ok_or_else(|| ControlError::Validation("no command specified".to_string()))?;
        let rest: Vec<&str> = args.collect();

        match verb.strip_prefix("--").unwrap_or(verb).to_ascii_lowercase().as_str() {
            "activate" => no_arguments(Self::Activate, &rest),
            "deactivate" => no_arguments(Self::Deactivate, &rest),
            "state" => no_arguments(Self::State, &rest),
            "baseline" => parse_baseline(&rest),
            other => Err(ControlError::Validation(format!(
                "unknown command '{}'",
                other
            ))),
        }
    }

    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::State | Self::BaselineCollect)
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activate => f.write_str("activate"),
            Self::Deactivate => f.write_str("deactivate"),
            Self::State => f.write_str("state"),
            Self::BaselineCollect => f.write_str("baseline"),
            Self::Baseline(change) => write!(f, "baseline {}", change),
        }
    }
}

fn no_arguments(command: ControlCommand, rest: &[&str]) -> Result<ControlCommand> {
    match rest.first() {
        None => Ok(command),
        Some(extra) => Err(ControlError::Validation(format!(
            "unexpected argument '{}' for '{}'",
            extra, command
        ))),
    }
}

fn parse_baseline(rest: &[&str]) -> Result<ControlCommand> {
    let Some((sub, args)) = rest.split_first() else {
        return Ok(ControlCommand::BaselineCollect);
    };

    let change = match sub.to_ascii_lowercase().as_str() {
        "add" => BaselineChange::Add(consistent_ids(args)?),
        "remove" => BaselineChange::Remove(consistent_ids(args)?),
        "set" => BaselineChange::Set(consistent_ids(args)?),
        "version" => BaselineChange::Version(topology_version(args)?),
        other => {
            return Err(ControlError::Validation(format!(
                "unknown baseline command '{}', expected add, remove, set or version",
                other
            )));
        }
    };
    Ok(ControlCommand::Baseline(change))
}

/// Splits comma-separated consistent IDs; several arguments are concatenated.
fn consistent_ids(args: &[&str]) -> Result<Vec<String>> {
    let ids: Vec<String> = args
        .iter()
        .flat_map(|arg| arg.split(','))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    if ids.is_empty() {
        return Err(ControlError::Validation(
            "expected a comma-separated list of consistent IDs".to_string(),
        ));
    }
    Ok(ids)
}

fn topology_version(args: &[&str]) -> Result<u64> {
    match args {
        [version] => version.parse::<u64>().map_err(|_| {
            ControlError::Validation(format!("invalid topology version '{}'", version))
        }),
        [] => Err(ControlError::Validation(
            "expected a topology version".to_string(),
        )),
        _ => Err(ControlError::Validation(
            "expected a single topology version".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_verbs() {
        assert_eq!(
            ControlCommand::parse(&["--activate"]).unwrap(),
            ControlCommand::Activate
        );
        assert_eq!(
            ControlCommand::parse(&["deactivate"]).unwrap(),
            ControlCommand::Deactivate
        );
        assert_eq!(
            ControlCommand::parse(&["--state"]).unwrap(),
            ControlCommand::State
        );
        assert_eq!(
            ControlCommand::parse(&["--baseline"]).unwrap(),
            ControlCommand::BaselineCollect
        );
    }

    #[test]
    fn test_parse_baseline_ids() {
        let cmd = ControlCommand::parse(&["--baseline", "add", "node-a, node-b", "node-c,"]).unwrap();
        assert_eq!(
            cmd,
            ControlCommand::Baseline(BaselineChange::Add(vec![
                "node-a".to_string(),
                "node-b".to_string(),
                "node-c".to_string()
            ]))
        );
        assert!(cmd.is_mutating());
    }

    #[test]
    fn test_parse_baseline_version() {
        assert_eq!(
            ControlCommand::parse(&["baseline", "version", "7"]).unwrap(),
            ControlCommand::Baseline(BaselineChange::Version(7))
        );
        assert!(ControlCommand::parse(&["baseline", "version", "x"]).is_err());
        assert!(ControlCommand::parse(&["baseline", "version"]).is_err());
        assert!(ControlCommand::parse(&["baseline", "version", "1", "2"]).is_err());
    }

    #[test]
    fn test_parse_errors() {
        let empty: [&str; 0] = [];
        for args in [
            &empty[..],
            &["--frobnicate"][..],
            &["----activate"][..],
            &["-activate"][..],
            &["--activate", "now"][..],
            &["--baseline", "drop", "a"][..],
            &["--baseline", "set", " , "][..],
        ] {
            assert!(
                matches!(ControlCommand::parse(args), Err(ControlError::Validation(_))),
                "expected validation error for {:?}",
                args
            );
        }
    }
}

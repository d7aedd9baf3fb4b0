use super::ControlCommand;
use crate::activation::{ActivationOutcome, ClusterStateSnapshot};
use crate::baseline::BaselineReport;
use crate::connection::ClusterConnection;
use crate::core::Result;
use log::{info, warn};
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tracing::{Instrument, info_span};

pub const EXIT_CODE_OK: i32 = 0;
pub const EXIT_CODE_UNEXPECTED_ERROR: i32 = 4;

/// Result of a successfully executed control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReport {
    Activated(ActivationOutcome),
    /// Carries whether the cluster was active before.
    Deactivated(bool),
    State(ClusterStateSnapshot),
    Baseline(BaselineReport),
}

impl fmt::Display for CommandReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandReport::Activated(ActivationOutcome::AlreadyActive) => {
                writeln!(f, "Cluster is already active.")
            }
            CommandReport::Activated(ActivationOutcome::Activated { seeded }) => {
                writeln!(f, "Cluster activated.")?;
                if let Some(baseline) = seeded {
                    writeln!(
                        f,
                        "Baseline topology version {} created with {} node(s).",
                        baseline.version,
                        baseline.size()
                    )?;
                }
                Ok(())
            }
            CommandReport::Deactivated(true) => writeln!(f, "Cluster deactivated."),
            CommandReport::Deactivated(false) => writeln!(f, "Cluster is already inactive."),
            CommandReport::State(state) => {
                if state.active {
                    writeln!(f, "Cluster is active")?;
                } else {
                    writeln!(f, "Cluster is inactive")?;
                }
                match state.baseline_version {
                    Some(version) => writeln!(
                        f,
                        "Baseline version {}, {} node(s); {} node(s) online",
                        version, state.baseline_size, state.online_nodes
                    ),
                    None => writeln!(
                        f,
                        "Baseline not established; {} node(s) online",
                        state.online_nodes
                    ),
                }
            }
            CommandReport::Baseline(report) => write!(f, "{}", report),
        }
    }
}

/// Executes control commands against a cluster and maps outcomes to exit codes.
///
/// One invocation issues at most one request to the cluster and produces
/// exactly one outcome. Nothing is retried.
pub struct CommandHandler {
    connection: Arc<dyn ClusterConnection>,
}

impl CommandHandler {
    pub fn new(connection: Arc<dyn ClusterConnection>) -> Self {
        Self { connection }
    }

    /// Parses and executes `args`, printing the report to stdout and errors
    /// to stderr. Returns the process exit code.
    pub async fn execute<S: AsRef<str>>(&self, args: &[S]) -> i32 {
        let mut out = Vec::new();
        let code = self.execute_to(args, &mut out).await;
        let text = String::from_utf8_lossy(&out);
        if code == EXIT_CODE_OK {
            print!("{}", text);
        } else {
            eprint!("{}", text);
        }
        code
    }

    /// Same as [`execute`](Self::execute) but writes all output to `out`.
    pub async fn execute_to<S: AsRef<str>, W: Write>(&self, args: &[S], out: &mut W) -> i32 {
        let command = match ControlCommand::parse(args) {
            Ok(command) => command,
            Err(err) => {
                warn!("Rejected control command: {}", err);
                let _ = writeln!(out, "Error [{}]: {}", err.kind(), err.detail());
                return EXIT_CODE_UNEXPECTED_ERROR;
            }
        };

        let span = info_span!("control_command", command = %command);
        match self.run(command.clone()).instrument(span).await {
            Ok(report) => {
                if command.is_mutating() {
                    info!("Control command '{}' succeeded", command);
                }
                let _ = write!(out, "{}", report);
                EXIT_CODE_OK
            }
            Err(err) => {
                warn!("Control command '{}' failed: {}", command, err);
                let _ = writeln!(out, "Error [{}]: {}", err.kind(), err.detail());
                EXIT_CODE_UNEXPECTED_ERROR
            }
        }
    }

    /// Routes a parsed command to the cluster.
    pub async fn run(&self, command: ControlCommand) -> Result<CommandReport> {
        match command {
            ControlCommand::Activate => self.connection.activate().await.map(CommandReport::Activated),
            ControlCommand::Deactivate => self
                .connection
                .deactivate()
                .await
                .map(CommandReport::Deactivated),
            ControlCommand::State => self.connection.state().await.map(CommandReport::State),
            ControlCommand::BaselineCollect => self
                .connection
                .collect_baseline()
                .await
                .map(CommandReport::Baseline),
            ControlCommand::Baseline(change) => self
                .connection
                .change_baseline(change)
                .await
                .map(CommandReport::Baseline),
        }
    }
}

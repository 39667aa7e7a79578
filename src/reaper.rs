//! Collecting the outcome of every launched stage.

use crate::error::StageError;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, ExitStatus};
use tracing::{debug, warn};

/// A stage after the launch loop: either a running process or a failure that
/// was detected before anything could run.
#[derive(Debug)]
pub enum Spawned {
    Running {
        index: usize,
        program: String,
        child: Child,
    },
    Failed {
        index: usize,
        program: String,
        error: StageError,
    },
}

impl Spawned {
    pub fn is_running(&self) -> bool {
        matches!(self, Spawned::Running { .. })
    }
}

/// How a stage ended.
#[derive(Debug)]
pub enum StageStatus {
    /// The process exited with this code.
    Exited(i32),
    /// The process was killed by this signal.
    Signaled(i32),
    /// The stage never ran.
    Failed(StageError),
    /// Waiting for the process failed; its status is unknown.
    Lost(io::Error),
}

impl StageStatus {
    fn from_exit(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => StageStatus::Exited(code),
            (None, Some(signal)) => StageStatus::Signaled(signal),
            (None, None) => StageStatus::Exited(-1),
        }
    }

    /// Exit code in shell convention: 128 + signal for a killed process.
    pub fn code(&self) -> i32 {
        match self {
            StageStatus::Exited(code) => *code,
            StageStatus::Signaled(signal) => 128 + signal,
            StageStatus::Failed(err) => err.status(),
            StageStatus::Lost(_) => 1,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, StageStatus::Exited(0))
    }
}

/// Outcome of a single stage.
#[derive(Debug)]
pub struct StageOutcome {
    pub index: usize,
    pub program: String,
    pub status: StageStatus,
}

/// Wait for every running stage and collect all outcomes in stage order.
///
/// Exactly one wait is performed per launched process, so nothing is left in
/// the process table however the stages finish relative to each other.
pub fn reap(spawned: Vec<Spawned>) -> Vec<StageOutcome> {
    spawned
        .into_iter()
        .map(|stage| match stage {
            Spawned::Running {
                index,
                program,
                mut child,
            } => {
                let pid = child.id();
                let status = match child.wait() {
                    Ok(status) => StageStatus::from_exit(status),
                    Err(err) => {
                        warn!(stage = index, pid, %err, "wait failed");
                        StageStatus::Lost(err)
                    }
                };
                debug!(stage = index, pid, code = status.code(), "reaped");
                StageOutcome {
                    index,
                    program,
                    status,
                }
            }
            Spawned::Failed {
                index,
                program,
                error,
            } => StageOutcome {
                index,
                program,
                status: StageStatus::Failed(error),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn running(index: usize, program: &str, args: &[&str]) -> Spawned {
        let child = Command::new(program).args(args).spawn().unwrap();
        Spawned::Running {
            index,
            program: program.to_string(),
            child,
        }
    }

    #[test]
    fn collects_exit_codes_in_stage_order() {
        let spawned = vec![
            running(0, "sh", &["-c", "sleep 0.2; exit 3"]),
            Spawned::Failed {
                index: 1,
                program: "nope".into(),
                error: StageError::NotFound {
                    program: "nope".into(),
                },
            },
            running(2, "true", &[]),
        ];
        let outcomes = reap(spawned);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].status.code(), 3);
        assert_eq!(outcomes[1].status.code(), 127);
        assert!(outcomes[2].status.success());
        assert_eq!(
            outcomes.iter().map(|o| o.index).collect::<Vec<_>>(),
            [0, 1, 2]
        );
    }

    #[test]
    fn signal_maps_to_128_plus_signal() {
        let outcomes = reap(vec![running(0, "sh", &["-c", "kill -TERM $$"])]);
        assert!(matches!(outcomes[0].status, StageStatus::Signaled(15)));
        assert_eq!(outcomes[0].status.code(), 143);
    }
}

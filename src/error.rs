use std::io;

/// Failures that stop a pipeline launch in the parent.
///
/// These are the only errors that escape [`crate::Orchestrator::execute`];
/// anything that goes wrong for a single stage is a [`StageError`] recorded in
/// that stage's outcome instead.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// A pipe could not be created. Nothing was spawned.
    #[error("cannot create pipe {index}: {source}")]
    PipeCreation {
        index: usize,
        #[source]
        source: nix::Error,
    },

    /// The OS refused to create a process for a stage. Stages before it were
    /// spawned and have been reaped; stages after it were never started.
    #[error("cannot spawn `{program}` (stage {stage}): {source}")]
    Spawn {
        stage: usize,
        program: String,
        #[source]
        source: io::Error,
    },
}

/// A failure confined to one stage. Its siblings keep running.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The stage had no program name, as in the right-hand side of `"a |"`.
    #[error("empty command")]
    EmptyCommand,

    /// The program was not found on `PATH` or at the given path.
    #[error("{program}: command not found")]
    NotFound { program: String },

    /// The program exists but could not be executed.
    #[error("{program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A redirection target could not be opened.
    #[error("{path}: {source}")]
    Redirection {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A descriptor could not be prepared for the child's stdin or stdout.
    #[error("cannot wire descriptors for {program}: {source}")]
    Wire {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl StageError {
    /// Shell-style exit status reported for a stage that failed this way.
    pub fn status(&self) -> i32 {
        match self {
            StageError::EmptyCommand | StageError::NotFound { .. } => 127,
            StageError::Exec { .. } => 126,
            StageError::Redirection { .. } | StageError::Wire { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_shell_conventions() {
        assert_eq!(StageError::EmptyCommand.status(), 127);
        let not_found = StageError::NotFound {
            program: "nope".into(),
        };
        assert_eq!(not_found.status(), 127);
        assert_eq!(not_found.to_string(), "nope: command not found");

        let exec = StageError::Exec {
            program: "./x".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(exec.status(), 126);

        let redir = StageError::Redirection {
            path: "missing.txt".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(redir.status(), 1);
        assert!(redir.to_string().starts_with("missing.txt: "));
    }
}

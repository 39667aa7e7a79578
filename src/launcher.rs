use crate::error::StageError;
use crate::wiring::{StagePlan, StdinSource, StdoutSink};
use nix::errno::Errno;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use tracing::debug;

/// Why a stage could not be started.
#[derive(Debug)]
pub enum LaunchFailure {
    /// The stage itself is broken (missing program, unreadable redirection,
    /// ...). Only this stage fails.
    Stage(StageError),
    /// The OS could not create a process at all. The whole launch stops.
    Spawn(io::Error),
}

/// Turns a [`StagePlan`] into a running process.
///
/// The plan owns the stage's descriptors; once `launch` returns, the caller
/// holds no copy of them, whether or not the launch succeeded.
pub trait Launcher {
    fn launch(&self, plan: StagePlan) -> Result<Child, LaunchFailure>;
}

/// Launches stages as real OS processes.
///
/// A bare program name is searched along `PATH` the way `execvp` does it:
/// entries that exist but cannot be executed are skipped. A name containing
/// `/` is used as given.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, plan: StagePlan) -> Result<Child, LaunchFailure> {
        // Redirections come first, so `missing > out.txt` still truncates
        // `out.txt` before the program turns out to be missing.
        let stdin = match plan.stdin {
            StdinSource::Inherit => Stdio::inherit(),
            StdinSource::Pipe(fd) => Stdio::from(fd),
            StdinSource::File(path) => Stdio::from(open_input(&path)?),
        };
        let stdout = match plan.stdout {
            StdoutSink::Inherit => Stdio::inherit(),
            StdoutSink::Pipe(fd) => Stdio::from(fd),
            StdoutSink::File(path) => Stdio::from(open_output(&path)?),
        };

        let Some((program, args)) = plan.arguments.split_first() else {
            return Err(LaunchFailure::Stage(StageError::EmptyCommand));
        };

        // The command owns the parent's copies of the wired ends; dropping it
        // at the end of this scope closes them.
        let mut command = Command::new(program);
        command.args(args).stdin(stdin).stdout(stdout);

        let child = command
            .spawn()
            .map_err(|err| classify_spawn_error(program, err))?;
        debug!(stage = plan.index, pid = child.id(), %program, "spawned");
        Ok(child)
    }
}

fn open_input(path: &Path) -> Result<File, LaunchFailure> {
    File::open(path).map_err(|source| redirection_failure(path, source))
}

fn open_output(path: &Path) -> Result<File, LaunchFailure> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|source| redirection_failure(path, source))
}

fn redirection_failure(path: &Path, source: io::Error) -> LaunchFailure {
    LaunchFailure::Stage(StageError::Redirection {
        path: path.display().to_string(),
        source,
    })
}

/// Decide whether a failed spawn is the stage's own problem or the system's.
///
/// Errors raised while wiring or executing inside the child are reported back
/// through `spawn`; they only fail this stage. Anything else (no memory, no
/// free process slots) means no further process can be started either.
pub fn classify_spawn_error(program: &str, err: io::Error) -> LaunchFailure {
    let program = program.to_owned();
    if err.kind() == io::ErrorKind::InvalidInput {
        return LaunchFailure::Stage(StageError::Exec {
            program,
            source: err,
        });
    }
    let Some(errno) = err.raw_os_error().map(Errno::from_raw) else {
        return LaunchFailure::Spawn(err);
    };
    match errno {
        Errno::ENOENT | Errno::ENOTDIR | Errno::ELOOP | Errno::ENAMETOOLONG => {
            LaunchFailure::Stage(StageError::NotFound { program })
        }
        Errno::EACCES
        | Errno::EPERM
        | Errno::ENOEXEC
        | Errno::EISDIR
        | Errno::ETXTBSY
        | Errno::E2BIG => LaunchFailure::Stage(StageError::Exec {
            program,
            source: err,
        }),
        Errno::EBADF | Errno::EMFILE | Errno::ENFILE => LaunchFailure::Stage(StageError::Wire {
            program,
            source: err,
        }),
        _ => LaunchFailure::Spawn(err),
    }
}

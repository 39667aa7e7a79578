//! Pipe allocation and per-stage descriptor plans.
//!
//! Every pipe is created before any process is spawned and with close-on-exec
//! set, so a child only ever sees the ends that were deliberately wired to its
//! stdin or stdout. Ends that a stage does not use are dropped (closed) while
//! the plan is built.

use crate::error::LaunchError;
use crate::pipeline::Pipeline;
use nix::unistd;
use std::os::fd::OwnedFd;
use std::path::PathBuf;
use tracing::trace;

/// Both ends of one inter-stage pipe.
#[derive(Debug)]
pub struct Pipe {
    pub read: OwnedFd,
    pub write: OwnedFd,
}

#[cfg(not(target_vendor = "apple"))]
fn open_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    use nix::fcntl::OFlag;
    unistd::pipe2(OFlag::O_CLOEXEC)
}

#[cfg(target_vendor = "apple")]
fn open_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    use nix::fcntl::{fcntl, FcntlArg, FdFlag};
    let (read, write) = unistd::pipe()?;
    for fd in [&read, &write] {
        fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    }
    Ok((read, write))
}

/// Create `count` pipes up front.
///
/// If any creation fails, the pipes created so far are closed and the error
/// is returned; the caller must not spawn anything.
pub fn allocate_pipes(count: usize) -> Result<Vec<Pipe>, LaunchError> {
    let mut pipes = Vec::with_capacity(count);
    for index in 0..count {
        let (read, write) =
            open_pipe().map_err(|source| LaunchError::PipeCreation { index, source })?;
        trace!(index, "pipe created");
        pipes.push(Pipe { read, write });
    }
    Ok(pipes)
}

/// Where a stage reads its standard input from.
#[derive(Debug)]
pub enum StdinSource {
    Inherit,
    Pipe(OwnedFd),
    File(PathBuf),
}

/// Where a stage writes its standard output to.
#[derive(Debug)]
pub enum StdoutSink {
    Inherit,
    Pipe(OwnedFd),
    /// Opened for writing, created if missing and truncated.
    File(PathBuf),
}

/// Everything needed to launch one stage.
#[derive(Debug)]
pub struct StagePlan {
    pub index: usize,
    pub arguments: Vec<String>,
    pub stdin: StdinSource,
    pub stdout: StdoutSink,
}

impl StagePlan {
    /// Program name for reports; empty for a degenerate stage.
    pub fn program(&self) -> &str {
        self.arguments.first().map_or("", String::as_str)
    }
}

/// Pair each stage with its descriptors.
///
/// For stdout, an `output_file` overrides the pipe to the next stage; for
/// stdin, an `input_file` overrides the pipe from the previous stage. A pipe
/// end displaced by a redirection is closed here, so the neighbour on the
/// other side sees EOF (or a broken pipe) instead of waiting forever.
pub fn plan(pipeline: Pipeline, pipes: Vec<Pipe>) -> Vec<StagePlan> {
    debug_assert_eq!(pipes.len(), pipeline.pipe_count());

    let mut pipes = pipes.into_iter();
    let mut upstream: Option<OwnedFd> = None;
    let mut plans = Vec::with_capacity(pipeline.len());

    for (index, stage) in pipeline.into_iter().enumerate() {
        let (downstream_read, downstream_write) = match pipes.next() {
            Some(Pipe { read, write }) => (Some(read), Some(write)),
            None => (None, None),
        };

        let stdout = match (stage.output_file, downstream_write) {
            (Some(path), _) => StdoutSink::File(PathBuf::from(path)),
            (None, Some(write)) => StdoutSink::Pipe(write),
            (None, None) => StdoutSink::Inherit,
        };

        let stdin = match (stage.input_file, upstream.take()) {
            (Some(path), _) => StdinSource::File(PathBuf::from(path)),
            (None, Some(read)) => StdinSource::Pipe(read),
            (None, None) => StdinSource::Inherit,
        };

        upstream = downstream_read;
        plans.push(StagePlan {
            index,
            arguments: stage.arguments,
            stdin,
            stdout,
        });
    }

    plans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn planned(line: &str) -> Vec<StagePlan> {
        let pipeline = parse(line).unwrap();
        let pipes = allocate_pipes(pipeline.pipe_count()).unwrap();
        plan(pipeline, pipes)
    }

    #[test]
    fn allocates_requested_number_of_pipes() {
        assert_eq!(allocate_pipes(0).unwrap().len(), 0);
        assert_eq!(allocate_pipes(2).unwrap().len(), 2);
    }

    #[test]
    fn pipes_are_close_on_exec() {
        use nix::fcntl::{fcntl, FcntlArg, FdFlag};
        let pipes = allocate_pipes(1).unwrap();
        for fd in [&pipes[0].read, &pipes[0].write] {
            let flags = FdFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFD).unwrap());
            assert!(flags.contains(FdFlag::FD_CLOEXEC));
        }
    }

    #[test]
    fn single_stage_inherits_both_ends() {
        let plans = planned("echo hi");
        assert_eq!(plans.len(), 1);
        assert!(matches!(plans[0].stdin, StdinSource::Inherit));
        assert!(matches!(plans[0].stdout, StdoutSink::Inherit));
        assert_eq!(plans[0].program(), "echo");
    }

    #[test]
    fn middle_stage_is_piped_on_both_sides() {
        let plans = planned("a | b | c");
        assert!(matches!(plans[0].stdin, StdinSource::Inherit));
        assert!(matches!(plans[0].stdout, StdoutSink::Pipe(_)));
        assert!(matches!(plans[1].stdin, StdinSource::Pipe(_)));
        assert!(matches!(plans[1].stdout, StdoutSink::Pipe(_)));
        assert!(matches!(plans[2].stdin, StdinSource::Pipe(_)));
        assert!(matches!(plans[2].stdout, StdoutSink::Inherit));
    }

    #[test]
    fn redirection_overrides_pipe() {
        let plans = planned("a > out.txt | b < in.txt");
        match &plans[0].stdout {
            StdoutSink::File(path) => assert_eq!(path, &PathBuf::from("out.txt")),
            other => panic!("expected file sink, got {other:?}"),
        }
        match &plans[1].stdin {
            StdinSource::File(path) => assert_eq!(path, &PathBuf::from("in.txt")),
            other => panic!("expected file source, got {other:?}"),
        }
    }

    #[test]
    fn empty_stage_keeps_its_index() {
        let plans = planned("a |");
        assert_eq!(plans[1].index, 1);
        assert_eq!(plans[1].program(), "");
    }
}

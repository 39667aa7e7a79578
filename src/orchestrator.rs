use crate::error::{LaunchError, StageError};
use crate::launcher::{LaunchFailure, Launcher, SystemLauncher};
use crate::pipeline::Pipeline;
use crate::reaper::{self, Spawned, StageOutcome};
use crate::wiring;
use tracing::{debug, trace, warn};

/// Progress of a single pipeline execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parsed,
    PipesAllocated,
    Spawning,
    AllSpawned,
    SpawnFailed,
    Reaping,
    Done,
}

impl Phase {
    fn can_advance_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Parsed, Phase::PipesAllocated)
                | (Phase::PipesAllocated, Phase::Spawning)
                | (Phase::Spawning, Phase::AllSpawned | Phase::SpawnFailed)
                | (Phase::AllSpawned | Phase::SpawnFailed, Phase::Reaping)
                | (Phase::Reaping, Phase::Done)
        )
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(self.can_advance_to(next), "{self:?} -> {next:?}");
        trace!(from = ?*self, to = ?next, "pipeline phase");
        *self = next;
    }
}

/// Result of a pipeline that was launched and fully reaped.
#[derive(Debug)]
pub struct PipelineReport {
    outcomes: Vec<StageOutcome>,
    pipes: usize,
}

impl PipelineReport {
    /// One outcome per stage, in stage order.
    pub fn outcomes(&self) -> &[StageOutcome] {
        &self.outcomes
    }

    /// Number of pipes that connected the stages.
    pub fn pipes(&self) -> usize {
        self.pipes
    }

    /// `true` when every stage exited with status 0.
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.success())
    }

    /// Exit code of the last stage, as a shell would report it.
    pub fn last_status(&self) -> i32 {
        self.outcomes.last().map_or(0, |o| o.status.code())
    }

    /// Stages that never ran, with the reason.
    pub fn failures(&self) -> impl Iterator<Item = (&StageOutcome, &StageError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            reaper::StageStatus::Failed(err) => Some((o, err)),
            _ => None,
        })
    }
}

/// Runs a parsed pipeline as a set of connected processes.
pub struct Orchestrator<L = SystemLauncher> {
    launcher: L,
}

impl Orchestrator<SystemLauncher> {
    pub fn new() -> Self {
        Self::with_launcher(SystemLauncher)
    }
}

impl Default for Orchestrator<SystemLauncher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Launcher> Orchestrator<L> {
    pub fn with_launcher(launcher: L) -> Self {
        Self { launcher }
    }

    /// Launch one process per stage, wait for all of them, and report.
    ///
    /// Every pipe is created before the first spawn. A stage that cannot run
    /// (no program, unreadable redirection, exec failure) is recorded and the
    /// rest carry on; the failure is printed to stderr as soon as it is
    /// known, not after the siblings finish. A spawn refused by the OS stops
    /// the launch: the stages already running are still waited for before the
    /// error is returned.
    /// The pipeline is consumed, so it never outlives this call.
    pub fn execute(&self, pipeline: Pipeline) -> Result<PipelineReport, LaunchError> {
        debug_assert!(!pipeline.is_empty());
        let mut phase = Phase::Parsed;
        let stage_count = pipeline.len();
        let pipe_count = pipeline.pipe_count();

        let pipes = wiring::allocate_pipes(pipe_count)?;
        phase.advance(Phase::PipesAllocated);

        let mut plans = wiring::plan(pipeline, pipes).into_iter();
        phase.advance(Phase::Spawning);

        let mut spawned = Vec::with_capacity(stage_count);
        let mut failure = None;
        for plan in plans.by_ref() {
            let index = plan.index;
            let program = plan.program().to_owned();
            match self.launcher.launch(plan) {
                Ok(child) => spawned.push(Spawned::Running {
                    index,
                    program,
                    child,
                }),
                Err(LaunchFailure::Stage(error)) => {
                    // Reported now: the siblings may run for a long time.
                    debug!(stage = index, %error, "stage failed to start");
                    eprintln!("pipesh: stage {}: {error}", index + 1);
                    spawned.push(Spawned::Failed {
                        index,
                        program,
                        error,
                    });
                }
                Err(LaunchFailure::Spawn(source)) => {
                    warn!(stage = index, %source, "spawn failed, abandoning pipeline");
                    failure = Some(LaunchError::Spawn {
                        stage: index,
                        program,
                        source,
                    });
                    break;
                }
            }
        }
        // Plans never launched still hold pipe ends; close them before waiting
        // or an upstream reader could block forever.
        drop(plans);

        phase.advance(if failure.is_some() {
            Phase::SpawnFailed
        } else {
            Phase::AllSpawned
        });
        debug!(
            running = spawned.iter().filter(|s| s.is_running()).count(),
            stages = stage_count,
            "launch finished"
        );

        phase.advance(Phase::Reaping);
        let outcomes = reaper::reap(spawned);
        phase.advance(Phase::Done);

        match failure {
            Some(err) => Err(err),
            None => Ok(PipelineReport {
                outcomes,
                pipes: pipe_count,
            }),
        }
    }
}

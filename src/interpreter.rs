use crate::error::LaunchError;
use crate::orchestrator::{Orchestrator, PipelineReport};
use crate::parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

/// Longest line accepted by default, in bytes.
pub const DEFAULT_MAX_LINE_LEN: usize = 256;

/// Settings for an interactive session.
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Text shown before each line is read.
    pub prompt: String,
    /// Lines longer than this many bytes are rejected without running.
    pub max_line_len: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            prompt: "pipesh$ ".to_string(),
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

/// What the read loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Exit,
}

/// A line-oriented interpreter: each line is parsed into a pipeline and run
/// to completion before the next line is read.
///
/// Example
/// ```
/// use pipesh::Interpreter;
/// let mut sh = Interpreter::default();
/// let report = sh.execute_line("true | true").unwrap().unwrap();
/// assert!(report.success());
/// ```
pub struct Interpreter {
    config: InterpreterConfig,
    orchestrator: Orchestrator,
    last_status: i32,
}

impl Interpreter {
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            config,
            orchestrator: Orchestrator::new(),
            last_status: 0,
        }
    }

    /// Exit status of the most recently completed line.
    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    /// Parse and run one line.
    ///
    /// Returns `Ok(None)` for a blank line, which spawns nothing.
    pub fn execute_line(&mut self, line: &str) -> Result<Option<PipelineReport>, LaunchError> {
        let Some(pipeline) = parser::parse(line) else {
            return Ok(None);
        };
        debug!(?pipeline, "executing");
        let report = self.orchestrator.execute(pipeline)?;
        self.last_status = report.last_status();
        Ok(Some(report))
    }

    /// Handle one line the way the read loop does: recognise `exit`, enforce
    /// the length limit and run the pipeline. Stages that cannot start are
    /// reported on stderr while the pipeline runs.
    pub fn handle_line(&mut self, line: &str) -> Step {
        let trimmed = line.trim();
        if trimmed == "exit" {
            return Step::Exit;
        }
        if line.len() > self.config.max_line_len {
            eprintln!(
                "pipesh: line too long ({} bytes, limit {})",
                line.len(),
                self.config.max_line_len
            );
            self.last_status = 1;
            return Step::Continue;
        }
        if let Err(err) = self.execute_line(line) {
            eprintln!("pipesh: {err}");
            self.last_status = 1;
        }
        Step::Continue
    }

    /// Read-eval-print loop on the terminal.
    ///
    /// Ends on `exit` or end of input. Ctrl-C discards the current line.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()
            .map_err(|err| anyhow::anyhow!("cannot initialise line editor: {err}"))?;

        loop {
            match rl.readline(&self.config.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())
                            .map_err(|err| anyhow::anyhow!("cannot record history: {err}"))?;
                    }
                    if self.handle_line(&line) == Step::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => anyhow::bail!("cannot read line: {err}"),
            }
        }

        info!(status = self.last_status, "session finished");
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

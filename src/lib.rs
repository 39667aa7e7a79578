//! A small line-oriented shell that runs pipelines of external programs.
//!
//! One input line is parsed into a [`Pipeline`] of stages separated by `|`,
//! each stage optionally redirecting its standard input (`< file`) or output
//! (`> file`). The [`Orchestrator`] then starts one process per stage, wires
//! them together with pipes, and waits for all of them before returning.
//!
//! An explicit redirection always wins over the pipe to a neighbouring stage:
//! in `a > out.txt | b`, `a` writes to `out.txt` and `b` reads an empty input.
//!
//! The [`Interpreter`] adds the interactive glue around the core: reading
//! lines, recognising `exit`, and reporting failed stages.

pub mod error;
mod interpreter;
pub mod launcher;
mod lexer;
mod orchestrator;
pub mod parser;
pub mod pipeline;
pub mod reaper;
pub mod wiring;

pub use error::{LaunchError, StageError};
pub use interpreter::{DEFAULT_MAX_LINE_LEN, Interpreter, InterpreterConfig, Step};
pub use orchestrator::{Orchestrator, Phase, PipelineReport};
pub use parser::parse;
pub use pipeline::{Pipeline, Stage};

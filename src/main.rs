use argh::FromArgs;
use pipesh::{DEFAULT_MAX_LINE_LEN, Interpreter, InterpreterConfig};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(FromArgs)]
/// Run pipelines of external programs, one line at a time.
struct Args {
    #[argh(option, short = 'c')]
    /// run this line and exit with the status of its last stage.
    command: Option<String>,

    #[argh(option, default = "String::from(\"pipesh$ \")")]
    /// prompt shown before each line.
    prompt: String,

    #[argh(option, default = "DEFAULT_MAX_LINE_LEN")]
    /// longest accepted line, in bytes.
    max_line: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Args = argh::from_env();
    let mut sh = Interpreter::new(InterpreterConfig {
        prompt: args.prompt,
        max_line_len: args.max_line,
    });

    if let Some(line) = args.command {
        sh.handle_line(&line);
        return ExitCode::from(sh.last_status().clamp(0, 255) as u8);
    }

    match sh.repl() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pipesh: {e:?}");
            ExitCode::FAILURE
        }
    }
}

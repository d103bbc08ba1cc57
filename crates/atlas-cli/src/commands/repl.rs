//! `atlas repl` — an interactive chunk compiler/interpreter.

use anyhow::Result;
use atlas_runtime::config::RuntimeConfig;
use atlas_runtime::repl::{EvalError, EvalOutcome, ReplSession};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub fn run(verbose: bool) -> Result<()> {
    let config = RuntimeConfig::default().with_verbose(verbose);
    config.init_tracing();

    let mut session = ReplSession::new(&config);
    let mut editor = DefaultEditor::new()?;

    loop {
        match editor.readline("atlas> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                match session.eval(&line) {
                    Ok(EvalOutcome::Ran) => {}
                    Ok(EvalOutcome::Returned(value)) => println!("{value}"),
                    Err(EvalError::Diagnostics(diagnostics)) => {
                        for diag in &diagnostics {
                            eprintln!("{}", diag.render("<repl>", &line));
                        }
                    }
                    Err(EvalError::Runtime(fault)) => eprintln!("runtime fault: {fault}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

//! `atlas`: the thin file-runner and REPL wrapper around `atlas-runtime`.

mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "atlas", about = "A small statically-typed scripting language")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lex, parse, compile, and run a source file.
    Run {
        path: String,
        /// Print diagnostics as one JSON object per line instead of human text.
        #[arg(long)]
        json: bool,
        #[arg(short, long)]
        verbose: bool,
    },
    /// Launch an interactive chunk compiler/interpreter.
    Repl {
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { path, json, verbose } => commands::run::run(&path, json, verbose),
        Command::Repl { verbose } => commands::repl::run(verbose),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

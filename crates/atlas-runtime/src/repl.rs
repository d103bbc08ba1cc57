//! REPL core logic, kept UI-agnostic so a terminal front end is a thin
//! wrapper around it.
//!
//! Each submitted line is a *chunk*: it lowers into the same module context
//! as every previous line (so earlier `var`/`function` declarations stay in
//! scope), and runs against the same persistent VM root frame, so module
//! locals and captured upvalues survive between lines.

use crate::compiler::Compiler;
use crate::config::RuntimeConfig;
use crate::diagnostic::Diagnostic;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::stdlib;
use crate::value::Value;
use crate::vm::{RuntimeFault, Vm};

/// One REPL evaluation's outcome.
#[derive(Debug)]
pub enum EvalOutcome {
    /// The chunk ran to completion without hitting `RETURN`.
    Ran,
    /// The chunk executed `RETURN v`; `v` is printed and the session's root
    /// frame instruction pointer simply falls off the end on the next chunk
    /// (module-level `return` is legal but unusual outside `atlas run`).
    Returned(Value),
}

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("{} error(s)", .0.len())]
    Diagnostics(Vec<Diagnostic>),
    #[error(transparent)]
    Runtime(#[from] RuntimeFault),
}

/// Persistent REPL state: one compiler (module context never closes) and
/// one VM (root frame never pops) for the session's lifetime.
pub struct ReplSession {
    compiler: Compiler,
    vm: Vm,
}

impl ReplSession {
    pub fn new(config: &RuntimeConfig) -> Self {
        let mut vm = Vm::new(config.limits);
        vm.globals = stdlib::native_values();
        Self { compiler: Compiler::new(stdlib::register_builtins()), vm }
    }

    /// Lex, parse, compile, and run one line (or multi-statement chunk) of
    /// source text against this session's persistent state.
    pub fn eval(&mut self, source: &str) -> Result<EvalOutcome, EvalError> {
        let (tokens, lex_diagnostics) = Lexer::new(source).tokenize();
        if !lex_diagnostics.is_empty() {
            return Err(EvalError::Diagnostics(lex_diagnostics));
        }

        let program = Parser::new(tokens).parse().map_err(EvalError::Diagnostics)?;

        let chunk = self.compiler.compile_chunk(&program).map_err(EvalError::Diagnostics)?;

        let value = self.vm.run_chunk(&chunk)?;
        match value {
            Value::Null => Ok(EvalOutcome::Ran),
            other => Ok(EvalOutcome::Returned(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locals_persist_across_submissions() {
        let config = RuntimeConfig::default();
        let mut session = ReplSession::new(&config);
        session.eval("var x:int = 1;").unwrap();
        let outcome = session.eval("return x + 1;").unwrap();
        assert!(matches!(outcome, EvalOutcome::Returned(Value::Int(2))));
    }

    #[test]
    fn functions_defined_in_one_line_are_callable_in_the_next() {
        let config = RuntimeConfig::default();
        let mut session = ReplSession::new(&config);
        session.eval("function double(a:int):int { return a * 2; }").unwrap();
        let outcome = session.eval("return double(21);").unwrap();
        assert!(matches!(outcome, EvalOutcome::Returned(Value::Int(42))));
    }

    #[test]
    fn a_failed_chunk_does_not_corrupt_later_submissions() {
        let config = RuntimeConfig::default();
        let mut session = ReplSession::new(&config);
        session.eval("var x:int = 10;").unwrap();
        assert!(session.eval("var y:int = true;").is_err());
        let outcome = session.eval("return x;").unwrap();
        assert!(matches!(outcome, EvalOutcome::Returned(Value::Int(10))));
    }

    #[test]
    fn branching_control_flow_works_in_a_later_submission() {
        let config = RuntimeConfig::default();
        let mut session = ReplSession::new(&config);
        session.eval("var x:int = 5;").unwrap();
        let outcome = session.eval("if (x == 2) { return 7; } else { return 9; }").unwrap();
        assert!(matches!(outcome, EvalOutcome::Returned(Value::Int(9))));
    }
}

//! The top-level facade: source text in, a returned `Value` or diagnostics
//! out. Both the CLI's `run` command and the REPL's first line go through
//! this (the REPL then switches to `repl::ReplSession` for persistence
//! across subsequent lines).

use crate::compiler::Compiler;
use crate::config::RuntimeConfig;
use crate::diagnostic::Diagnostic;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::proto::ModuleProto;
use crate::stdlib;
use crate::value::Value;
use crate::vm::{RuntimeFault, Vm};
use std::rc::Rc;
use tracing::instrument;

/// Everything that can go wrong running a program, collapsed into one enum
/// so the CLI has a single match at its boundary.
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("{} compile-time error(s) found", .0.len())]
    Diagnostics(Vec<Diagnostic>),
    #[error(transparent)]
    Runtime(#[from] RuntimeFault),
}

/// Compile source text to a `ModuleProto`, threading the lex/parse/compile
/// pipeline's diagnostics together.
#[instrument(skip(source))]
pub fn compile_source(source: &str) -> Result<Rc<ModuleProto>, Vec<Diagnostic>> {
    let (tokens, lex_diagnostics) = Lexer::new(source).tokenize();
    if !lex_diagnostics.is_empty() {
        return Err(lex_diagnostics);
    }

    let program = Parser::new(tokens).parse()?;

    let compiler = Compiler::new(stdlib::register_builtins());
    compiler.compile(&program)
}

/// Compile and run a whole program in one shot (the `atlas run` path).
pub fn run_source(source: &str, config: &RuntimeConfig) -> Result<Value, AtlasError> {
    let module = compile_source(source).map_err(AtlasError::Diagnostics)?;
    let mut vm = Vm::new(config.limits);
    vm.globals = stdlib::native_values();
    vm.run_module(&module).map_err(AtlasError::from)
}

/// A reusable facade combining a `RuntimeConfig` with the pipeline above,
/// for callers (the CLI binary) that want to hold configuration once and
/// run multiple times.
pub struct Atlas {
    config: RuntimeConfig,
}

impl Atlas {
    pub fn new(config: RuntimeConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, source: &str) -> Result<Value, AtlasError> {
        run_source(source, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_arithmetic_and_returns_the_value() {
        let config = RuntimeConfig::default();
        let value = run_source("var x:int = 1 + 2; return x;", &config).unwrap();
        assert_eq!(value.as_int(), Some(3));
    }

    #[test]
    fn reports_division_by_zero_as_a_runtime_fault() {
        let config = RuntimeConfig::default();
        let err = run_source("var z:int = 0; return 1 / z;", &config).unwrap_err();
        assert!(matches!(err, AtlasError::Runtime(RuntimeFault::DivisionByZero)));
    }

    #[test]
    fn collects_compile_errors_instead_of_running() {
        let config = RuntimeConfig::default();
        let err = run_source("var y:int = true;", &config).unwrap_err();
        assert!(matches!(err, AtlasError::Diagnostics(_)));
    }
}

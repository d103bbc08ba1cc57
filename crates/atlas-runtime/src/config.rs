//! Runtime configuration threaded in from the CLI. There is no on-disk or
//! persisted configuration surface — this is purely the in-memory knob set
//! a production CLI would otherwise hardcode.

use crate::vm::VmLimits;

/// Whether/how diagnostics are presented at the CLI boundary. Presentation
/// only: never affects which diagnostics are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    pub limits: VmLimits,
    pub diagnostic_format: DiagnosticFormat,
    pub verbose: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            limits: VmLimits::default(),
            diagnostic_format: DiagnosticFormat::Human,
            verbose: false,
        }
    }
}

impl RuntimeConfig {
    pub fn with_json_diagnostics(mut self, json: bool) -> Self {
        self.diagnostic_format = if json { DiagnosticFormat::Json } else { DiagnosticFormat::Human };
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Install a `tracing` subscriber at a verbosity matching `--verbose`.
    /// Idempotent-by-convention: callers invoke this once at process start.
    pub fn init_tracing(&self) {
        let level = if self.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
        let subscriber = tracing_subscriber::fmt().with_max_level(level).with_target(false).finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

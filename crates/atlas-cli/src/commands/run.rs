//! `atlas run <path>` — compile and execute a source file.

use anyhow::{Context, Result};
use atlas_runtime::config::RuntimeConfig;
use atlas_runtime::runtime::{run_source, AtlasError};
use atlas_runtime::Value;
use std::fs;

pub fn run(path: &str, json_output: bool, verbose: bool) -> Result<()> {
    let config = RuntimeConfig::default().with_json_diagnostics(json_output).with_verbose(verbose);
    config.init_tracing();

    let source = fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;

    match run_source(&source, &config) {
        Ok(value) => {
            if !matches!(value, Value::Null) {
                println!("{value}");
            }
            Ok(())
        }
        Err(AtlasError::Diagnostics(diagnostics)) => {
            for diag in &diagnostics {
                if json_output {
                    println!("{}", diag.to_json_string()?);
                } else {
                    eprintln!("{}", diag.render(path, &source));
                }
            }
            anyhow::bail!("compilation failed with {} error(s)", diagnostics.len())
        }
        Err(AtlasError::Runtime(fault)) => {
            anyhow::bail!("runtime fault: {fault}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn runs_a_returning_program() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "return 1 + 2;").unwrap();
        let result = run(file.path().to_str().unwrap(), false, false);
        assert!(result.is_ok());
    }

    #[test]
    fn reports_missing_files() {
        let result = run("does-not-exist.atl", false, false);
        assert!(result.is_err());
    }

    #[test]
    fn reports_compile_errors_as_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "var y:int = true;").unwrap();
        let result = run(file.path().to_str().unwrap(), true, false);
        assert!(result.is_err());
    }
}

//! WASI interpreter backend
//!
//! Runs a Python interpreter compiled to `wasm32-wasip1` inside Wasmtime.
//! The module is loaded once at initialization from a configured path;
//! each execution gets a fresh store with in-memory std-stream pipes, no
//! preopened directories and no network.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info};
use wasmtime::{Engine, Linker, Module, Store};
use wasmtime_wasi::p2::pipe::MemoryOutputPipe;
use wasmtime_wasi::p2::WasiCtxBuilder;
use wasmtime_wasi::preview1::WasiP1Ctx;

use crate::capture::{OutputCapture, StreamKind};
use crate::config::WasiConfig;
use crate::error::{Error, Result};
use crate::interpreter::Interpreter;

/// Stdout pipe capacity (1 MiB)
const STDOUT_PIPE_BYTES: usize = 1024 * 1024;
/// Stderr pipe capacity (256 KiB)
const STDERR_PIPE_BYTES: usize = 256 * 1024;

/// Python-on-WASI interpreter using Wasmtime
#[derive(Debug)]
pub struct WasiInterpreter {
    /// Wasmtime engine
    engine: Engine,
    /// Interpreter module, compiled at initialization
    module: Module,
}

impl WasiInterpreter {
    /// Load the interpreter module from the configured path
    pub fn new(config: &WasiConfig) -> Result<Self> {
        let engine = Engine::default();

        let module = Module::from_file(&engine, &config.module_path).map_err(|e| {
            Error::Interpreter(format!(
                "Failed to load interpreter module {}: {}",
                config.module_path.display(),
                e
            ))
        })?;

        info!(
            "WASI interpreter initialized from {}",
            config.module_path.display()
        );
        Ok(WasiInterpreter { engine, module })
    }

    /// Synchronous execution under Wasmtime + WASI Preview 1. Returns the
    /// pipe contents even when the run faults, so partial output reaches
    /// the capture buffers as context.
    fn execute_sync(engine: &Engine, module: &Module, program: &str) -> (String, String, Result<()>) {
        let stdout_pipe = MemoryOutputPipe::new(STDOUT_PIPE_BYTES);
        let stderr_pipe = MemoryOutputPipe::new(STDERR_PIPE_BYTES);

        let outcome = Self::run_module(engine, module, program, &stdout_pipe, &stderr_pipe);

        let stdout = String::from_utf8_lossy(&stdout_pipe.contents()).to_string();
        let stderr = String::from_utf8_lossy(&stderr_pipe.contents()).to_string();
        (stdout, stderr, outcome)
    }

    fn run_module(
        engine: &Engine,
        module: &Module,
        program: &str,
        stdout_pipe: &MemoryOutputPipe,
        stderr_pipe: &MemoryOutputPipe,
    ) -> Result<()> {
        let mut wasi_builder = WasiCtxBuilder::new();
        wasi_builder
            .args(&["python", "-c", program])
            .stdout(stdout_pipe.clone())
            .stderr(stderr_pipe.clone());

        let wasi_ctx = wasi_builder.build_p1();
        let mut store = Store::new(engine, wasi_ctx);

        let mut linker = Linker::new(engine);
        wasmtime_wasi::preview1::add_to_linker_sync(&mut linker, |ctx: &mut WasiP1Ctx| ctx)
            .map_err(|e| Error::Interpreter(format!("Failed to link WASI: {}", e)))?;

        let instance = linker
            .instantiate(&mut store, module)
            .map_err(|e| Error::Interpreter(format!("Failed to instantiate module: {}", e)))?;

        let start_fn = instance
            .get_typed_func::<(), ()>(&mut store, "_start")
            .map_err(|e| Error::Interpreter(format!("No _start entry point: {}", e)))?;

        match start_fn.call(&mut store, ()) {
            Ok(()) => Ok(()),
            Err(e) => {
                // WASI programs terminate through proc_exit; anything else
                // is a trap.
                match e.downcast_ref::<wasmtime_wasi::I32Exit>() {
                    Some(exit) if exit.0 == 0 => Ok(()),
                    Some(exit) => Err(Error::Interpreter(format!(
                        "Interpreter exited with status {}",
                        exit.0
                    ))),
                    None => Err(Error::Interpreter(format!("Execution trapped: {}", e))),
                }
            }
        }
    }
}

#[async_trait]
impl Interpreter for WasiInterpreter {
    fn name(&self) -> &str {
        "wasi"
    }

    async fn run(&self, program: &str, capture: &OutputCapture) -> Result<()> {
        let start = Instant::now();
        let engine = self.engine.clone();
        let module = self.module.clone();
        let program = program.to_string();

        // Wasmtime execution is synchronous; keep the runtime responsive.
        let (stdout, stderr, outcome) =
            tokio::task::spawn_blocking(move || Self::execute_sync(&engine, &module, &program))
                .await
                .map_err(|e| Error::Interpreter(format!("Task join error: {}", e)))?;

        capture.sink(StreamKind::Stdout).push(stdout);
        capture.sink(StreamKind::Stderr).push(stderr);

        debug!("WASI execution settled in {:?}", start.elapsed());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_missing_module_is_an_interpreter_error() {
        let config = WasiConfig {
            module_path: PathBuf::from("/nonexistent/python.wasm"),
        };
        let err = WasiInterpreter::new(&config).unwrap_err();
        assert!(matches!(err, Error::Interpreter(_)));
        assert!(err.to_string().contains("/nonexistent/python.wasm"));
    }

    #[test]
    fn test_invalid_module_bytes_fail_initialization() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a wasm module").unwrap();

        let config = WasiConfig {
            module_path: file.path().to_path_buf(),
        };
        let err = WasiInterpreter::new(&config).unwrap_err();
        assert!(matches!(err, Error::Interpreter(_)));
    }
}

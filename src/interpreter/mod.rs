//! Interpreter sandbox - isolated execution of composed programs
//!
//! The interpreter is an external facility held behind a narrow capability
//! interface: initialization is construction, output sinks are attached
//! through the capture buffers, and `run` settles asynchronously when the
//! sandboxed program terminates or faults.
//!
//! Two backends satisfy the interface:
//! - WASI Mode: a Python interpreter compiled to wasm32-wasip1, run in
//!   Wasmtime with no filesystem or network access
//! - Process Mode: a host python subprocess, isolation delegated to the
//!   deployment

mod process;
mod wasm;

pub use process::ProcessInterpreter;
pub use wasm::WasiInterpreter;

use async_trait::async_trait;

use crate::capture::OutputCapture;
use crate::config::{Config, InterpreterKind};
use crate::error::Result;

/// Capability interface over an isolated interpreter
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Execute one composed program to completion or fault.
    ///
    /// All console output inside the sandbox is redirected into `capture`,
    /// never inherited by the host streams directly. An `Err` from this
    /// method is an executor fault; whatever reached the capture buffers
    /// before the fault is still available as context.
    async fn run(&self, program: &str, capture: &OutputCapture) -> Result<()>;
}

/// Create an interpreter backend based on the configuration
pub fn create_interpreter(config: &Config) -> Result<Box<dyn Interpreter>> {
    match config.interpreter {
        InterpreterKind::Wasi => {
            let interpreter = WasiInterpreter::new(&config.wasi)?;
            Ok(Box::new(interpreter))
        }
        InterpreterKind::Process => {
            let interpreter = ProcessInterpreter::new(&config.process)?;
            Ok(Box::new(interpreter))
        }
    }
}

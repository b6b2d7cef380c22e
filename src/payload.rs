//! Invocation payloads
//!
//! One payload file per invocation, read from a path fixed by convention.
//! Two shapes exist: the function-call payload (a function source plus its
//! keyword arguments) and the pipeline payload (arbitrary JSON consumed by
//! an external `run` routine). A missing or unparseable input file is
//! fatal; input faults get no structured report.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{Error, Result};

/// Name of the callable a function-call payload must define
pub const ENTRY_FUNCTION: &str = "blackbox";

/// Function-call payload
#[derive(Debug, Clone, Deserialize)]
pub struct CallPayload {
    /// Source text assumed to define a callable named `blackbox`
    #[serde(rename = "fn")]
    pub source: String,
    /// Keyword arguments, expanded by name at the call site
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

/// Load a function-call payload from the payload file
pub fn load_call_payload(path: &Path) -> Result<CallPayload> {
    let raw = read_input_file(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::Payload(format!("Invalid function-call payload: {}", e)))
}

/// Load a pipeline payload (arbitrary JSON) from the payload file
pub fn load_pipeline_payload(path: &Path) -> Result<Value> {
    let raw = read_input_file(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::Payload(format!("Invalid pipeline payload: {}", e)))
}

/// Load the pipeline runner source (defines `run`) from the runner file
pub fn load_runner_source(path: &Path) -> Result<String> {
    read_input_file(path)
}

fn read_input_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        Error::Payload(format!(
            "Failed to read input file {}: {}",
            path.display(),
            e
        ))
    })
}

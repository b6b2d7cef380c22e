//! Runtime configuration
//!
//! The external contract has no command-line flags: the payload and runner
//! locations are fixed by convention and the interpreter backend is picked
//! by the deployment. Configuration is therefore defaults overlaid with
//! `PYBOX_*` environment variables (a `.env` file is honored).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the invocation payload file
    #[serde(default = "default_payload_path")]
    pub payload_path: PathBuf,
    /// Path of the pipeline runner source file (pipeline mode only)
    #[serde(default = "default_runner_path")]
    pub runner_path: PathBuf,
    /// Interpreter backend
    #[serde(default)]
    pub interpreter: InterpreterKind,
    /// WASI backend configuration
    #[serde(default)]
    pub wasi: WasiConfig,
    /// Process backend configuration
    #[serde(default)]
    pub process: ProcessConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            payload_path: default_payload_path(),
            runner_path: default_runner_path(),
            interpreter: InterpreterKind::default(),
            wasi: WasiConfig::default(),
            process: ProcessConfig::default(),
        }
    }
}

fn default_payload_path() -> PathBuf {
    PathBuf::from("/json")
}

fn default_runner_path() -> PathBuf {
    PathBuf::from("/runner.py")
}

impl Config {
    /// Load configuration: defaults overlaid with environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Config::default();
        apply_env_overrides(&mut config)?;
        Ok(config)
    }
}

/// Apply `PYBOX_*` environment variable overrides to an existing config.
///
/// Loads `.env` first if present. Env vars have the highest precedence:
/// defaults < env.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    dotenvy::dotenv().ok();

    if let Ok(path) = std::env::var("PYBOX_PAYLOAD_PATH") {
        config.payload_path = PathBuf::from(path);
    }
    if let Ok(path) = std::env::var("PYBOX_RUNNER_PATH") {
        config.runner_path = PathBuf::from(path);
    }
    if let Ok(kind) = std::env::var("PYBOX_INTERPRETER") {
        config.interpreter = kind.parse()?;
    }
    if let Ok(path) = std::env::var("PYBOX_WASM_MODULE") {
        config.wasi.module_path = PathBuf::from(path);
    }
    if let Ok(bin) = std::env::var("PYBOX_PYTHON_BIN") {
        config.process.python_bin = bin;
    }

    Ok(())
}

/// Interpreter backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpreterKind {
    /// Python-on-WASI in Wasmtime (recommended)
    #[default]
    Wasi,
    /// Host python subprocess (isolation delegated to the deployment)
    Process,
}

impl std::str::FromStr for InterpreterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "wasi" | "wasm" => Ok(InterpreterKind::Wasi),
            "process" | "python" => Ok(InterpreterKind::Process),
            _ => Err(Error::Config(format!(
                "Invalid interpreter backend: {}. Valid: wasi, process",
                s
            ))),
        }
    }
}

impl std::fmt::Display for InterpreterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpreterKind::Wasi => write!(f, "wasi"),
            InterpreterKind::Process => write!(f, "process"),
        }
    }
}

/// WASI backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasiConfig {
    /// Path of the interpreter module compiled to wasm32-wasip1
    #[serde(default = "default_module_path")]
    pub module_path: PathBuf,
}

impl Default for WasiConfig {
    fn default() -> Self {
        WasiConfig {
            module_path: default_module_path(),
        }
    }
}

fn default_module_path() -> PathBuf {
    PathBuf::from("/opt/python/python.wasm")
}

/// Process backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Interpreter binary name or path
    #[serde(default = "default_python_bin")]
    pub python_bin: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        ProcessConfig {
            python_bin: default_python_bin(),
        }
    }
}

fn default_python_bin() -> String {
    "python3".to_string()
}

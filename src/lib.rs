//! # Pybox
//!
//! A sandboxed harness that executes one untrusted Python function body
//! per process and reports what happened as a single structured JSON
//! result, with the run's stdout and stderr captured separately.
//!
//! ## Pipeline
//!
//! - **Input Loader:** JSON payload read from a fixed path
//! - **Code Composer:** user code spliced into a fixed template with
//!   named placeholders
//! - **Sandbox Executor:** the composed program runs in an isolated
//!   interpreter (WASI or subprocess backend)
//! - **Output Capturer:** batched sinks collect stdout/stderr chunks
//! - **Result Reporter:** captured output flushed once; executor faults
//!   surface as one JSON error line

pub mod capture;
pub mod config;
pub mod error;
pub mod harness;
pub mod interpreter;
pub mod payload;
pub mod template;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");

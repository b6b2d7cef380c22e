//! Pybox function-call executor
//!
//! The function-call entry point: reads `{"fn": ..., "kwargs": ...}` from
//! the fixed payload path, runs the user's `blackbox` function in the
//! interpreter sandbox, and emits the captured output ending with one
//! result envelope line.

use pybox::config::Config;
use pybox::harness;
use pybox::Result;

use tracing::debug;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout belongs to the captured run output.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    debug!(
        "Starting {} v{} (function-call mode, {} backend)",
        pybox::NAME,
        pybox::VERSION,
        config.interpreter
    );

    harness::run_call(&config).await
}

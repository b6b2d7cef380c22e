//! Pybox pipeline executor
//!
//! The pipeline entry point: reads an arbitrary JSON payload from the
//! fixed payload path and the `run` routine source from the fixed runner
//! path, executes `run(data)` in the interpreter sandbox, and emits the
//! captured output ending with the JSON-encoded return value.

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
        "Starting {} v{} (pipeline mode, {} backend)",
        pybox::NAME,
        pybox::VERSION,
        config.interpreter
    );

    harness::run_pipeline(&config).await
}

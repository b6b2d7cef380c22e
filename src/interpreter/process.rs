//! Subprocess interpreter backend
//!
//! Runs the composed program with a host python binary. Isolation is
//! delegated to the deployment (the harness is typically the entry point
//! of a locked-down container). Output is streamed into the capture
//! buffers chunk by chunk, in arrival order, while the child runs.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info};

use crate::capture::{OutputCapture, StreamBuffer, StreamKind};
use crate::config::ProcessConfig;
use crate::error::{Error, Result};
use crate::interpreter::Interpreter;

/// Subprocess interpreter
#[derive(Debug)]
pub struct ProcessInterpreter {
    /// Resolved interpreter binary
    python_bin: PathBuf,
}

impl ProcessInterpreter {
    /// Locate the interpreter binary on the host
    pub fn new(config: &ProcessConfig) -> Result<Self> {
        let python_bin = which::which(&config.python_bin).map_err(|e| {
            Error::Interpreter(format!(
                "Interpreter binary {} not found: {}",
                config.python_bin, e
            ))
        })?;

        info!("Process interpreter using {}", python_bin.display());
        Ok(ProcessInterpreter { python_bin })
    }
}

#[async_trait]
impl Interpreter for ProcessInterpreter {
    fn name(&self) -> &str {
        "process"
    }

    async fn run(&self, program: &str, capture: &OutputCapture) -> Result<()> {
        let start = Instant::now();

        let mut child = Command::new(&self.python_bin)
            .arg("-c")
            .arg(program)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Interpreter(format!("Failed to spawn interpreter: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Interpreter("Child stdout not piped".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Interpreter("Child stderr not piped".to_string()))?;

        // Drain both streams while waiting, so chunks land in the buffers
        // in arrival order.
        let (out_res, err_res, status) = tokio::join!(
            drain_stream(stdout, capture.sink(StreamKind::Stdout)),
            drain_stream(stderr, capture.sink(StreamKind::Stderr)),
            child.wait(),
        );

        out_res.map_err(|e| Error::Interpreter(format!("Failed to read child stdout: {}", e)))?;
        err_res.map_err(|e| Error::Interpreter(format!("Failed to read child stderr: {}", e)))?;
        let status =
            status.map_err(|e| Error::Interpreter(format!("Failed to wait for interpreter: {}", e)))?;

        debug!("Process execution settled in {:?} ({})", start.elapsed(), status);

        if !status.success() {
            return Err(Error::Interpreter(format!(
                "Interpreter exited abnormally ({})",
                status
            )));
        }
        Ok(())
    }
}

/// Forward a child stream into a capture buffer, chunk by chunk. Bytes of
/// a UTF-8 sequence split across a read boundary are carried into the next
/// chunk so the captured text never grows replacement characters at chunk
/// seams.
async fn drain_stream<R>(mut reader: R, buffer: StreamBuffer) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut pending: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&chunk[..n]);

        match String::from_utf8(std::mem::take(&mut pending)) {
            Ok(text) => buffer.push(text),
            Err(err) if err.utf8_error().error_len().is_none() => {
                // Incomplete trailing sequence; emit the valid prefix and
                // carry the rest.
                let valid = err.utf8_error().valid_up_to();
                let bytes = err.into_bytes();
                buffer.push(String::from_utf8_lossy(&bytes[..valid]).to_string());
                pending = bytes[valid..].to_vec();
            }
            Err(err) => {
                // Genuinely invalid bytes; lossy-decode and move on.
                buffer.push(String::from_utf8_lossy(&err.into_bytes()).to_string());
            }
        }
    }

    if !pending.is_empty() {
        buffer.push(String::from_utf8_lossy(&pending).to_string());
    }
    Ok(())
}

//! Execution harness
//!
//! The linear pipeline behind both entry points: load the invocation
//! payload, compose the program, execute it in the interpreter sandbox,
//! then flush the captured streams and surface any executor fault as one
//! JSON error line. One invocation per process lifetime.

use std::io::Write;

use serde_json::json;
use tracing::{debug, error};

use crate::capture::OutputCapture;
use crate::config::Config;
use crate::error::Result;
use crate::interpreter::{self, Interpreter};
use crate::{payload, template};

/// Run one function-call invocation to completion
pub async fn run_call(config: &Config) -> Result<()> {
    let payload = payload::load_call_payload(&config.payload_path)?;
    let program = template::compose_call(&payload)?;
    execute_and_report(config, &program).await
}

/// Run one pipeline invocation to completion
pub async fn run_pipeline(config: &Config) -> Result<()> {
    let data = payload::load_pipeline_payload(&config.payload_path)?;
    let runner = payload::load_runner_source(&config.runner_path)?;
    let program = template::compose_pipeline(&runner, &data)?;
    execute_and_report(config, &program).await
}

async fn execute_and_report(config: &Config, program: &str) -> Result<()> {
    // Initialization failures take the same fault path as execution
    // failures: flush what was captured, then report.
    let capture = OutputCapture::new();
    let outcome = match interpreter::create_interpreter(config) {
        Ok(interpreter) => run_program(interpreter.as_ref(), program, &capture).await,
        Err(e) => Err(e),
    };

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    report(&capture, outcome, stdout.lock(), stderr.lock())
}

async fn run_program(
    interpreter: &dyn Interpreter,
    program: &str,
    capture: &OutputCapture,
) -> Result<()> {
    debug!(
        "Executing composed program ({} bytes) on {} backend",
        program.len(),
        interpreter.name()
    );
    interpreter.run(program, capture).await
}

/// Flush the joined capture buffers to the host streams, each written at
/// most once, then surface an executor fault as one extra JSON line on
/// stderr before propagating it.
fn report<W, E>(capture: &OutputCapture, outcome: Result<()>, mut stdout: W, mut stderr: E) -> Result<()>
where
    W: Write,
    E: Write,
{
    let out = capture.stdout.join();
    if !out.is_empty() {
        stdout.write_all(out.as_bytes())?;
        stdout.flush()?;
    }

    let err = capture.stderr.join();
    if !err.is_empty() {
        stderr.write_all(err.as_bytes())?;
        stderr.flush()?;
    }

    if let Err(fault) = outcome {
        error!("Sandbox fault: {}", fault);
        let envelope = json!({ "error": fault.to_string() });
        writeln!(stderr, "{}", envelope)?;
        stderr.flush()?;
        return Err(fault);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;

    /// Interpreter double that plays back scripted chunks and an outcome
    struct ScriptedInterpreter {
        stdout_chunks: Vec<&'static str>,
        stderr_chunks: Vec<&'static str>,
        fault: Option<&'static str>,
    }

    #[async_trait]
    impl Interpreter for ScriptedInterpreter {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn run(&self, _program: &str, capture: &OutputCapture) -> Result<()> {
            for chunk in &self.stdout_chunks {
                capture.stdout.push(*chunk);
            }
            for chunk in &self.stderr_chunks {
                capture.stderr.push(*chunk);
            }
            match self.fault {
                Some(message) => Err(Error::Interpreter(message.to_string())),
                None => Ok(()),
            }
        }
    }

    async fn run_scripted(interpreter: &ScriptedInterpreter) -> (Result<()>, Vec<u8>, Vec<u8>) {
        let capture = OutputCapture::new();
        let outcome = run_program(interpreter, "pass", &capture).await;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let reported = report(&capture, outcome, &mut stdout, &mut stderr);
        (reported, stdout, stderr)
    }

    #[tokio::test]
    async fn test_success_flushes_streams_once() {
        let interpreter = ScriptedInterpreter {
            stdout_chunks: vec!["debug print\n", "{\"result\": 5}\n"],
            stderr_chunks: vec!["warning from user code\n"],
            fault: None,
        };
        let (reported, stdout, stderr) = run_scripted(&interpreter).await;

        assert!(reported.is_ok());
        assert_eq!(stdout, b"debug print\n{\"result\": 5}\n");
        assert_eq!(stderr, b"warning from user code\n");
    }

    #[tokio::test]
    async fn test_user_prints_precede_the_envelope_line() {
        let interpreter = ScriptedInterpreter {
            stdout_chunks: vec!["step 1\n", "step 2\n", "{\"result\": [1, 2]}\n"],
            stderr_chunks: vec![],
            fault: None,
        };
        let (_, stdout, stderr) = run_scripted(&interpreter).await;

        let text = String::from_utf8(stdout).unwrap();
        let last_line = text.lines().last().unwrap();
        let envelope: serde_json::Value = serde_json::from_str(last_line).unwrap();
        assert_eq!(envelope["result"], serde_json::json!([1, 2]));
        assert!(text.starts_with("step 1\nstep 2\n"));
        assert!(stderr.is_empty());
    }

    #[tokio::test]
    async fn test_empty_streams_write_nothing() {
        let interpreter = ScriptedInterpreter {
            stdout_chunks: vec![],
            stderr_chunks: vec![],
            fault: None,
        };
        let (reported, stdout, stderr) = run_scripted(&interpreter).await;

        assert!(reported.is_ok());
        assert!(stdout.is_empty());
        assert!(stderr.is_empty());
    }

    #[tokio::test]
    async fn test_fault_reports_json_after_captured_stderr() {
        let interpreter = ScriptedInterpreter {
            stdout_chunks: vec!["partial output\n"],
            stderr_chunks: vec!["Traceback (most recent call last):\n"],
            fault: Some("run is not defined"),
        };
        let (reported, stdout, stderr) = run_scripted(&interpreter).await;

        assert!(reported.is_err());
        assert_eq!(stdout, b"partial output\n");

        let text = String::from_utf8(stderr).unwrap();
        assert!(text.starts_with("Traceback (most recent call last):\n"));

        let last_line = text.lines().last().unwrap();
        let envelope: serde_json::Value = serde_json::from_str(last_line).unwrap();
        let message = envelope["error"].as_str().unwrap();
        assert!(message.contains("run is not defined"));
    }

    #[tokio::test]
    async fn test_fault_envelope_is_the_only_stderr_line_when_nothing_captured() {
        let interpreter = ScriptedInterpreter {
            stdout_chunks: vec![],
            stderr_chunks: vec![],
            fault: Some("interpreter exploded"),
        };
        let (reported, stdout, stderr) = run_scripted(&interpreter).await;

        assert!(reported.is_err());
        assert!(stdout.is_empty());

        let text = String::from_utf8(stderr).unwrap();
        assert_eq!(text.lines().count(), 1);
        let envelope: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert!(envelope["error"].as_str().unwrap().contains("interpreter exploded"));
    }
}

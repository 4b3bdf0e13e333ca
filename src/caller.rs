//! Service invocation: the seam between the browser and the gateway.

use crate::decode;
use serde_json::Value;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// An exception raised by a service call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct CallError {
    pub message: String,
    pub code: i64,
    /// Where the error originated, when known.
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl CallError {
    pub fn new(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            code,
            file: None,
            line: None,
        }
    }

    pub fn at(mut self, file: impl Into<String>, line: Option<u32>) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self
    }
}

/// Executes a method on a named service.
pub trait ServiceCaller {
    fn invoke(&self, service: &str, method: &str, args: &[Value]) -> Result<Value, CallError>;
}

/// Raises on every call; used when no caller is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCaller;

impl ServiceCaller for DisabledCaller {
    fn invoke(&self, service: &str, method: &str, _args: &[Value]) -> Result<Value, CallError> {
        Err(CallError::new(
            format!("no service caller configured, cannot call {}.{}", service, method),
            -1,
        ))
    }
}

/// How long a [`ProcessCaller`] waits for a call before killing it.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs each call as a subprocess: `program [args..] <service> <method>`.
///
/// The argument list is written to stdin as a JSON array. A zero exit status
/// makes stdout the return value (decoded like a form field); any other
/// status raises a [`CallError`] carrying stderr and the exit code. A call
/// still running after the timeout is killed and raises.
#[derive(Debug, Clone)]
pub struct ProcessCaller {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessCaller {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn origin(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn raise(&self, message: String) -> CallError {
        CallError::new(message, -1).at(self.origin(), None)
    }

    /// Poll `child` until it exits or the timeout passes. On timeout the
    /// child is killed and reaped.
    fn wait_bounded(&self, child: &mut Child) -> Result<ExitStatus, CallError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if Instant::now() >= deadline => {
                    if let Err(e) = child.kill() {
                        tracing::debug!(error = %e, "failed to kill timed out caller");
                    }
                    let _ = child.wait();
                    return Err(self.raise(format!(
                        "service call timed out after {:.1}s",
                        self.timeout.as_secs_f64()
                    )));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(self.raise(format!("failed to wait for caller: {}", e))),
            }
        }
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Drain a child pipe on its own thread so a chatty child never blocks.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf) {
                tracing::debug!(error = %e, "failed to read caller output");
            }
        }
        buf
    })
}

impl ServiceCaller for ProcessCaller {
    fn invoke(&self, service: &str, method: &str, args: &[Value]) -> Result<Value, CallError> {
        let input = Value::Array(args.to_vec()).to_string();
        tracing::debug!(program = %self.program.display(), service, method, %input, "spawning service call");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(service)
            .arg(method)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.raise(format!("failed to execute: {}", e)))?;

        let stdin = child.stdin.take();
        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                // A caller that never reads stdin closes the pipe early; its
                // exit status still decides the outcome.
                if let Err(e) = stdin.write_all(input.as_bytes()) {
                    tracing::debug!(error = %e, "caller did not consume arguments");
                }
            }
        });
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        // On timeout the pipe threads are left detached: a grandchild may
        // still hold the pipes open.
        let status = self.wait_bounded(&mut child)?;
        let _ = writer.join();
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        let stdout_text = String::from_utf8_lossy(&stdout);
        let stdout_text = stdout_text.trim_end_matches(['\n', '\r']);
        if status.success() {
            return Ok(decode::decode(stdout_text));
        }

        let stderr_text = String::from_utf8_lossy(&stderr);
        let message = match stderr_text.trim() {
            "" => stdout_text.to_string(),
            text => text.to_string(),
        };
        let code = status.code().map_or(-1, i64::from);
        tracing::warn!(service, method, code, "service call failed");
        Err(CallError::new(message, code).at(self.origin(), None))
    }
}

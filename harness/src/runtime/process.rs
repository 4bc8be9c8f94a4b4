//! Child process execution with combined output capture
//!
//! Every external command the harness runs (compose tool, registration CLI)
//! goes through [`run_captured`]: one blocking child at a time, stdout and
//! stderr folded into a single buffer, exit code checked against a success set.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use shared::{Component, component_debug};

use crate::error::{HarnessError, HarnessResult};
use crate::runtime::capture::CaptureGuard;
use crate::traits::OutputCapture;

/// Exit codes treated as success when none are configured
pub const DEFAULT_SUCCESS_CODES: &[i32] = &[0];

/// Fully resolved command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Split a whitespace separated command such as `docker compose`
    pub fn from_command_line(command: &str) -> HarnessResult<Self> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| HarnessError::config("command", "command line is empty"))?;
        Ok(Self::new(program).args(parts))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Run a command to completion, capturing combined output.
///
/// Capture is suspended for the whole call; while suspended each output line
/// is also echoed to the terminal as it arrives.
pub async fn run_captured(
    spec: &CommandSpec,
    success_codes: &[i32],
    capture: &dyn OutputCapture,
    component: Component,
) -> HarnessResult<Vec<u8>> {
    let command_text = spec.to_string();
    let _guard = CaptureGuard::suspend(capture);
    let stream = capture.is_suspended();

    component_debug!(component, "▶️ Running `{}`", command_text);

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(ref dir) = spec.current_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|e| HarnessError::Subprocess {
        command: command_text.clone(),
        exit_code: None,
        output: format!("failed to spawn: {e}"),
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("child stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("child stderr was not piped"))?;

    let combined = Mutex::new(Vec::new());
    let (_, _, status) = tokio::join!(
        pump(stdout, &combined, stream),
        pump(stderr, &combined, stream),
        child.wait()
    );
    let status = status?;
    let output = combined.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());

    match status.code() {
        Some(code) if success_codes.contains(&code) => {
            component_debug!(component, "✅ `{}` exited with {}", command_text, code);
            Ok(output)
        }
        exit_code => Err(HarnessError::Subprocess {
            command: command_text,
            exit_code,
            output: String::from_utf8_lossy(&output).into_owned(),
        }),
    }
}

/// Copy one child stream into the shared buffer line by line
async fn pump<R>(reader: R, sink: &Mutex<Vec<u8>>, stream: bool)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if stream {
                    // Direct handle write; the test runner only intercepts the print macros
                    if let Err(e) = std::io::stderr().lock().write_all(&line) {
                        component_debug!(Component::Compose, "Terminal echo failed: {}", e);
                    }
                }
                if let Ok(mut buffer) = sink.lock() {
                    buffer.extend_from_slice(&line);
                }
            }
        }
    }
}

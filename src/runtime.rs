//! The embedded Python runtime behind the interpreter bridge.
//!
//! `PythonRuntime` is the seam the bridge executes through: a blocking
//! runtime with a single captured-output buffer. Production uses
//! `SystemPython`, which runs submitted source through a `python3` found on
//! PATH (or `PYTHON_BIN`) with stdout/stderr captured per run. Tests plug in
//! scripted fakes.

use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Mutex;

use tracing::{debug, info};

/// Error raised by the submitted code itself (not a system fault). Carries
/// the raw, possibly multi-line error text; the bridge condenses it.
#[derive(Clone, Debug)]
pub struct ExecError {
  pub raw: String,
}

impl fmt::Display for ExecError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.raw)
  }
}

impl std::error::Error for ExecError {}

/// Failure to locate or initialize a runtime.
#[derive(Clone, Debug)]
pub struct LoadError {
  pub message: String,
}

impl fmt::Display for LoadError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.message)
  }
}

impl std::error::Error for LoadError {}

/// A loaded interpreter with one mutable captured-output buffer.
///
/// The bridge's discipline for reusing the shared buffer safely is:
/// `clear_output` -> `exec` -> `take_output`, one run at a time.
pub trait PythonRuntime: Send + Sync {
  /// Drop any residual captured output from a prior (possibly timed-out) run.
  fn clear_output(&self);
  /// Execute the source, filling the captured-output buffer.
  fn exec(&self, code: &str) -> Result<(), ExecError>;
  /// Read back the buffer, trimmed of trailing whitespace.
  fn take_output(&self) -> String;
}

/// Produces a ready runtime. Loading is the expensive step (interpreter
/// detection / asset initialization) and must happen at most once per
/// process; the bridge enforces that.
pub trait RuntimeLoader: Send + Sync + 'static {
  fn load(&self) -> Result<Box<dyn PythonRuntime>, LoadError>;
}

/// Runtime backed by a system Python executable, one subprocess per run.
pub struct SystemPython {
  python: PathBuf,
  buffer: Mutex<String>,
}

impl SystemPython {
  fn new(python: PathBuf) -> Self {
    Self { python, buffer: Mutex::new(String::new()) }
  }
}

impl PythonRuntime for SystemPython {
  fn clear_output(&self) {
    if let Ok(mut buf) = self.buffer.lock() {
      buf.clear();
    }
  }

  fn exec(&self, code: &str) -> Result<(), ExecError> {
    let output = Command::new(&self.python)
      .arg("-c")
      .arg(code)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .output()
      .map_err(|e| ExecError { raw: format!("Failed to run interpreter: {}", e) })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if let Ok(mut buf) = self.buffer.lock() {
      *buf = stdout;
    }

    if output.status.success() {
      Ok(())
    } else {
      Err(ExecError { raw: String::from_utf8_lossy(&output.stderr).to_string() })
    }
  }

  fn take_output(&self) -> String {
    self
      .buffer
      .lock()
      .map(|buf| buf.trim_end().to_string())
      .unwrap_or_default()
  }
}

/// Finds a Python executable and verifies it answers `--version`.
pub struct SystemPythonLoader;

impl SystemPythonLoader {
  fn candidates() -> Vec<PathBuf> {
    if let Ok(explicit) = std::env::var("PYTHON_BIN") {
      return vec![PathBuf::from(explicit)];
    }
    vec![PathBuf::from("python3"), PathBuf::from("python")]
  }
}

impl RuntimeLoader for SystemPythonLoader {
  fn load(&self) -> Result<Box<dyn PythonRuntime>, LoadError> {
    for candidate in Self::candidates() {
      let probe = Command::new(&candidate)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
      match probe {
        Ok(status) if status.success() => {
          info!(target: "executor", python = %candidate.display(), "Python runtime detected");
          return Ok(Box::new(SystemPython::new(candidate)));
        }
        Ok(_) | Err(_) => {
          debug!(target: "executor", python = %candidate.display(), "Candidate interpreter not usable");
        }
      }
    }
    Err(LoadError { message: "No usable Python interpreter on PATH (set PYTHON_BIN to override)".into() })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exec_error_displays_raw_text() {
    let e = ExecError { raw: "NameError: name 'x' is not defined".into() };
    assert!(e.to_string().contains("NameError"));
  }
}

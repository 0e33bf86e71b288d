//! Interpreter bridge: owns the runtime's load lifecycle and executes code
//! against it with output capture and a timeout.
//!
//! Lifecycle is `Unloaded -> Loading -> Ready`, with `Loading -> Failed` on a
//! load error. Loading is shared: concurrent callers await the same in-flight
//! attempt, and a `Ready` runtime is cached for the rest of the process.
//! A `Failed` phase is sticky for the orchestrator's fallback decision, but
//! an explicit `ensure_loaded` call may retry.
//!
//! The timeout is cooperative: the run is raced against a timer, and on
//! expiry we report failure while the underlying execution may keep running
//! in the background. That is a documented limitation, not hidden; the
//! output-buffer clear at the start of every run keeps a timed-out run from
//! bleeding stale output into the next one.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::OnceCell;
use tracing::{error, info, instrument, warn};

use crate::runtime::{LoadError, PythonRuntime, RuntimeLoader};

/// Fixed error text for a run that exceeded its budget.
pub const TIMEOUT_ERROR: &str = "Execution timeout";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadPhase {
  Unloaded,
  Loading,
  Ready,
  Failed(String),
}

/// Result of one captured run; `success == false` carries a condensed,
/// single-line error message.
#[derive(Clone, Debug)]
pub struct CaptureOutcome {
  pub success: bool,
  pub output: String,
  pub error: Option<String>,
  pub execution_time_ms: u64,
}

pub struct InterpreterBridge {
  loader: Arc<dyn RuntimeLoader>,
  runtime: OnceCell<Arc<dyn PythonRuntime>>,
  phase: Mutex<LoadPhase>,
}

impl InterpreterBridge {
  pub fn new(loader: impl RuntimeLoader) -> Self {
    Self {
      loader: Arc::new(loader),
      runtime: OnceCell::new(),
      phase: Mutex::new(LoadPhase::Unloaded),
    }
  }

  pub fn phase(&self) -> LoadPhase {
    self
      .phase
      .lock()
      .map(|p| p.clone())
      .unwrap_or(LoadPhase::Unloaded)
  }

  /// True once a runtime is loaded and cached.
  pub fn is_ready(&self) -> bool {
    self.runtime.get().is_some()
  }

  fn set_phase(&self, next: LoadPhase) {
    if let Ok(mut p) = self.phase.lock() {
      *p = next;
    }
  }

  /// Idempotent, single-flight load. Concurrent callers share one attempt;
  /// after success the same runtime handle is returned forever.
  #[instrument(level = "info", skip(self))]
  pub async fn ensure_loaded(&self) -> Result<Arc<dyn PythonRuntime>, LoadError> {
    if let Some(rt) = self.runtime.get() {
      return Ok(rt.clone());
    }

    self.set_phase(LoadPhase::Loading);
    let loader = self.loader.clone();
    let result = self
      .runtime
      .get_or_try_init(|| async move {
        let loaded = tokio::task::spawn_blocking(move || loader.load())
          .await
          .map_err(|e| LoadError { message: format!("Runtime load task failed: {}", e) })??;
        Ok::<Arc<dyn PythonRuntime>, LoadError>(Arc::from(loaded))
      })
      .await;

    match result {
      Ok(rt) => {
        self.set_phase(LoadPhase::Ready);
        Ok(rt.clone())
      }
      Err(e) => {
        error!(target: "executor", error = %e, "Interpreter load failed");
        self.set_phase(LoadPhase::Failed(e.message.clone()));
        Err(e)
      }
    }
  }

  /// Run code with captured output, racing the execution against `timeout`.
  /// Sequencing per run: clear residual buffer, execute, read back trimmed
  /// output. Never panics; every failure is a `CaptureOutcome`.
  #[instrument(level = "info", skip(self, code), fields(code_len = code.len(), timeout_ms = timeout.as_millis() as u64))]
  pub async fn run_captured(&self, code: &str, timeout: Duration) -> CaptureOutcome {
    let started = Instant::now();

    let rt = match self.ensure_loaded().await {
      Ok(rt) => rt,
      Err(e) => {
        return CaptureOutcome {
          success: false,
          output: String::new(),
          error: Some(e.message),
          execution_time_ms: started.elapsed().as_millis() as u64,
        };
      }
    };

    let code = code.to_string();
    let run = tokio::task::spawn_blocking(move || {
      rt.clear_output();
      let result = rt.exec(&code);
      let output = rt.take_output();
      (result, output)
    });

    match tokio::time::timeout(timeout, run).await {
      Ok(Ok((Ok(()), output))) => CaptureOutcome {
        success: true,
        output,
        error: None,
        execution_time_ms: started.elapsed().as_millis() as u64,
      },
      Ok(Ok((Err(e), _))) => CaptureOutcome {
        success: false,
        output: String::new(),
        error: Some(condense_traceback(&e.raw)),
        execution_time_ms: started.elapsed().as_millis() as u64,
      },
      Ok(Err(join_err)) => {
        error!(target: "executor", error = %join_err, "Execution task fault");
        CaptureOutcome {
          success: false,
          output: String::new(),
          error: Some("Internal execution fault".into()),
          execution_time_ms: started.elapsed().as_millis() as u64,
        }
      }
      Err(_elapsed) => {
        warn!(target: "executor", "Execution timed out; run may continue in the background");
        CaptureOutcome {
          success: false,
          output: String::new(),
          error: Some(TIMEOUT_ERROR.into()),
          execution_time_ms: started.elapsed().as_millis() as u64,
        }
      }
    }
  }
}

/// Reduce a multi-line traceback-style error to its final message line so
/// learner-facing diagnostics stay short. The last non-indented, non-empty
/// line of a Python traceback is the `ErrorType: message` line.
pub fn condense_traceback(raw: &str) -> String {
  let condensed = raw
    .lines()
    .rev()
    .map(str::trim_end)
    .find(|line| !line.is_empty() && !line.starts_with(' ') && !line.starts_with('\t'));
  match condensed {
    Some(line) => line.to_string(),
    None => raw.trim().to_string(),
  }
}

#[cfg(test)]
pub(crate) mod test_support {
  use std::collections::VecDeque;
  use std::sync::Mutex;

  use crate::runtime::{ExecError, LoadError, PythonRuntime, RuntimeLoader};

  /// One scripted behavior per exec call.
  #[derive(Clone)]
  pub enum Script {
    /// Succeed, leaving this text in the buffer.
    Emit(&'static str),
    /// Write partial output, then block past any reasonable timeout.
    HangWith(&'static str, u64),
    /// Raise with this raw (possibly multi-line) error text.
    Raise(&'static str),
  }

  pub struct FakeRuntime {
    script: Mutex<VecDeque<Script>>,
    buffer: Mutex<String>,
  }

  impl FakeRuntime {
    pub fn new(script: Vec<Script>) -> Self {
      Self {
        script: Mutex::new(script.into()),
        buffer: Mutex::new(String::new()),
      }
    }
  }

  impl PythonRuntime for FakeRuntime {
    fn clear_output(&self) {
      self.buffer.lock().expect("buffer lock").clear();
    }

    fn exec(&self, _code: &str) -> Result<(), ExecError> {
      let step = self
        .script
        .lock()
        .expect("script lock")
        .pop_front()
        .unwrap_or(Script::Emit(""));
      match step {
        Script::Emit(out) => {
          self.buffer.lock().expect("buffer lock").push_str(out);
          Ok(())
        }
        Script::HangWith(partial, ms) => {
          self.buffer.lock().expect("buffer lock").push_str(partial);
          std::thread::sleep(std::time::Duration::from_millis(ms));
          Ok(())
        }
        Script::Raise(raw) => Err(ExecError { raw: raw.to_string() }),
      }
    }

    fn take_output(&self) -> String {
      self.buffer.lock().expect("buffer lock").trim_end().to_string()
    }
  }

  pub struct FakeLoader {
    pub script: Mutex<Option<Vec<Script>>>,
    pub loads: std::sync::atomic::AtomicUsize,
  }

  impl FakeLoader {
    pub fn new(script: Vec<Script>) -> Self {
      Self {
        script: Mutex::new(Some(script)),
        loads: std::sync::atomic::AtomicUsize::new(0),
      }
    }
  }

  impl RuntimeLoader for FakeLoader {
    fn load(&self) -> Result<Box<dyn PythonRuntime>, LoadError> {
      self.loads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
      let script = self
        .script
        .lock()
        .expect("loader lock")
        .take()
        .unwrap_or_default();
      Ok(Box::new(FakeRuntime::new(script)))
    }
  }

  /// Lets a test keep a handle on the loader after the bridge takes it.
  pub struct SharedLoader(pub std::sync::Arc<FakeLoader>);

  impl RuntimeLoader for SharedLoader {
    fn load(&self) -> Result<Box<dyn PythonRuntime>, LoadError> {
      self.0.load()
    }
  }

  pub struct FailingLoader;

  impl RuntimeLoader for FailingLoader {
    fn load(&self) -> Result<Box<dyn PythonRuntime>, LoadError> {
      Err(LoadError { message: "asset fetch failed".into() })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::test_support::*;
  use super::*;

  #[tokio::test]
  async fn load_is_single_flight_and_cached() {
    let loader = Arc::new(FakeLoader::new(vec![Script::Emit("1")]));
    let bridge = Arc::new(InterpreterBridge::new(SharedLoader(loader.clone())));
    assert_eq!(bridge.phase(), LoadPhase::Unloaded);

    let (a, b) = tokio::join!(bridge.ensure_loaded(), bridge.ensure_loaded());
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(bridge.phase(), LoadPhase::Ready);
    assert!(bridge.is_ready());

    // A third call trips the cache, not the loader.
    bridge.ensure_loaded().await.expect("cached runtime");
    assert_eq!(loader.loads.load(std::sync::atomic::Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn load_failure_is_observable_and_retryable() {
    let bridge = InterpreterBridge::new(FailingLoader);
    let first = bridge.ensure_loaded().await;
    assert!(first.is_err());
    assert!(matches!(bridge.phase(), LoadPhase::Failed(_)));
    assert!(!bridge.is_ready());

    // Explicit retry is permitted (and fails again here).
    assert!(bridge.ensure_loaded().await.is_err());
  }

  #[tokio::test]
  async fn successful_run_reports_output_and_timing() {
    let bridge = InterpreterBridge::new(FakeLoader::new(vec![Script::Emit("안녕, 세상아!\n")]));
    let outcome = bridge.run_captured("print('안녕, 세상아!')", Duration::from_secs(5)).await;
    assert!(outcome.success);
    assert_eq!(outcome.output, "안녕, 세상아!");
  }

  #[tokio::test]
  async fn timeout_resolves_with_fixed_error() {
    let bridge = InterpreterBridge::new(FakeLoader::new(vec![Script::HangWith("", 400)]));
    let started = std::time::Instant::now();
    let outcome = bridge.run_captured("while True: pass", Duration::from_millis(50)).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some(TIMEOUT_ERROR));
    // Resolved near the timeout, not the hang duration.
    assert!(started.elapsed() < Duration::from_millis(350));
  }

  #[tokio::test]
  async fn stale_output_from_timed_out_run_does_not_bleed() {
    let bridge = InterpreterBridge::new(FakeLoader::new(vec![
      Script::HangWith("stale", 200),
      Script::Emit("fresh"),
    ]));
    let first = bridge.run_captured("while True: pass", Duration::from_millis(30)).await;
    assert!(!first.success);

    // Give the hung blocking task time to finish writing its stale output.
    tokio::time::sleep(Duration::from_millis(250)).await;

    let second = bridge.run_captured("print('fresh')", Duration::from_secs(1)).await;
    assert!(second.success);
    assert_eq!(second.output, "fresh");
  }

  #[tokio::test]
  async fn raised_errors_are_condensed_to_last_line() {
    let traceback = "Traceback (most recent call last):\n  File \"<string>\", line 1\n    print(x)\nNameError: name 'x' is not defined";
    let bridge = InterpreterBridge::new(FakeLoader::new(vec![Script::Raise(traceback)]));
    let outcome = bridge.run_captured("print(x)", Duration::from_secs(1)).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("NameError: name 'x' is not defined"));
  }

  #[test]
  fn condense_handles_single_line_errors() {
    assert_eq!(condense_traceback("SyntaxError: invalid syntax"), "SyntaxError: invalid syntax");
    assert_eq!(condense_traceback("  indented only  "), "indented only");
  }
}

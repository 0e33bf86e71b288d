//! Execution orchestrator: decides per call whether learner code runs on the
//! real interpreter or the heuristic simulator, applies the fallback protocol,
//! and normalizes everything into one `ExecutionResult` shape.
//!
//! No error ever escapes to the caller: safety rejections, interpreter
//! faults, timeouts, and simulator gaps all come back as a result with
//! `success == false` and a populated `error`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::bridge::InterpreterBridge;
use crate::config::Messages;
use crate::domain::{ExecutionMethod, ExecutionResult};
use crate::safety::is_safe;
use crate::simulator::simulate;
use crate::util::{normalize_output, trunc_for_log};

#[derive(Clone, Debug)]
pub struct ExecuteOptions {
  /// Use the real interpreter when it is already loaded.
  pub prefer_interpreter: bool,
  pub timeout_ms: u64,
  /// On a real-interpreter failure, try the simulator before surfacing the
  /// error. A plausible simulated result beats an opaque interpreter error
  /// for a beginner; the method tag keeps the substitution honest.
  pub fallback_on_error: bool,
}

impl Default for ExecuteOptions {
  fn default() -> Self {
    Self { prefer_interpreter: true, timeout_ms: 5_000, fallback_on_error: true }
  }
}

pub struct Executor {
  bridge: Arc<InterpreterBridge>,
  messages: Messages,
}

impl Executor {
  pub fn new(bridge: Arc<InterpreterBridge>, messages: Messages) -> Self {
    Self { bridge, messages }
  }

  pub fn bridge(&self) -> &Arc<InterpreterBridge> {
    &self.bridge
  }

  fn unsafe_result(&self) -> ExecutionResult {
    ExecutionResult {
      success: false,
      output: String::new(),
      error: Some(self.messages.unsafe_code.clone()),
      method: ExecutionMethod::Heuristic,
      execution_time_ms: None,
    }
  }

  fn heuristic_result(code: &str) -> ExecutionResult {
    let sim = simulate(code);
    ExecutionResult {
      success: sim.success,
      output: sim.output,
      error: sim.error,
      method: ExecutionMethod::Heuristic,
      execution_time_ms: None,
    }
  }

  /// Execute learner code. Safety check always precedes any execution
  /// attempt; the fallback simulator runs only after a real attempt has
  /// settled, never speculatively in parallel. Bounded: the heuristic path
  /// is synchronous-fast and the interpreter path is bounded by its timeout.
  #[instrument(level = "info", skip(self, code), fields(code_len = code.len()))]
  pub async fn execute(&self, code: &str, opts: &ExecuteOptions) -> ExecutionResult {
    if !is_safe(code) {
      info!(target: "executor", code = %trunc_for_log(code, 120), "Unsafe code rejected");
      return self.unsafe_result();
    }

    if opts.prefer_interpreter && self.bridge.is_ready() {
      let outcome = self
        .bridge
        .run_captured(code, Duration::from_millis(opts.timeout_ms))
        .await;

      if outcome.success {
        return ExecutionResult {
          success: true,
          output: outcome.output,
          error: None,
          method: ExecutionMethod::RealInterpreter,
          execution_time_ms: Some(outcome.execution_time_ms),
        };
      }

      if opts.fallback_on_error {
        let sim = simulate(code);
        if sim.success && !sim.output.is_empty() {
          info!(target: "executor", "Real interpreter failed; serving heuristic fallback");
          return ExecutionResult {
            success: true,
            output: sim.output,
            error: None,
            method: ExecutionMethod::Heuristic,
            execution_time_ms: None,
          };
        }
      }

      return ExecutionResult {
        success: false,
        output: String::new(),
        error: outcome.error,
        method: ExecutionMethod::RealInterpreter,
        execution_time_ms: Some(outcome.execution_time_ms),
      };
    }

    // Interpreter not ready (still loading, failed, or not requested):
    // the simulator is the primary method.
    Self::heuristic_result(code)
  }

  /// Heuristic-only path with no suspension, for instant feedback before the
  /// interpreter has loaded.
  pub fn execute_sync(&self, code: &str) -> ExecutionResult {
    if !is_safe(code) {
      return self.unsafe_result();
    }
    Self::heuristic_result(code)
  }

  /// Run the code and compare its output to the expected text. Both sides
  /// are normalized (outer trim, per-line trim) so trailing spaces never
  /// cause a spurious failure.
  pub async fn check_output(&self, code: &str, expected: &str, opts: &ExecuteOptions) -> bool {
    let result = self.execute(code, opts).await;
    if !result.success {
      return false;
    }
    normalize_output(&result.output) == normalize_output(expected)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bridge::test_support::{FailingLoader, FakeLoader, Script};
  use crate::bridge::LoadPhase;

  fn executor(loader_script: Vec<Script>) -> Executor {
    let bridge = Arc::new(InterpreterBridge::new(FakeLoader::new(loader_script)));
    Executor::new(bridge, Messages::default())
  }

  #[tokio::test]
  async fn unsafe_code_is_rejected_before_any_execution() {
    let exec = executor(vec![]);
    let result = exec.execute("import os", &ExecuteOptions::default()).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("안전하지 않은 코드가 감지되었습니다."));
    assert_eq!(result.method, ExecutionMethod::Heuristic);
  }

  #[tokio::test]
  async fn unready_interpreter_falls_back_to_heuristic() {
    let bridge = Arc::new(InterpreterBridge::new(FailingLoader));
    let _ = bridge.ensure_loaded().await;
    assert!(matches!(bridge.phase(), LoadPhase::Failed(_)));

    let exec = Executor::new(bridge, Messages::default());
    let result = exec.execute("print('hi')", &ExecuteOptions::default()).await;
    assert!(result.success);
    assert_eq!(result.output, "hi");
    assert_eq!(result.method, ExecutionMethod::Heuristic);
  }

  #[tokio::test]
  async fn ready_interpreter_result_is_tagged_real() {
    let exec = executor(vec![Script::Emit("42\n")]);
    exec.bridge().ensure_loaded().await.expect("load");

    let result = exec.execute("print(6 * 7)", &ExecuteOptions::default()).await;
    assert!(result.success);
    assert_eq!(result.output, "42");
    assert_eq!(result.method, ExecutionMethod::RealInterpreter);
    assert!(result.execution_time_ms.is_some());
  }

  #[tokio::test]
  async fn real_failure_with_useful_simulation_serves_heuristic() {
    let exec = executor(vec![Script::Raise("SyntaxError: invalid syntax")]);
    exec.bridge().ensure_loaded().await.expect("load");

    let result = exec.execute("print('안녕')", &ExecuteOptions::default()).await;
    assert!(result.success);
    assert_eq!(result.output, "안녕");
    assert_eq!(result.method, ExecutionMethod::Heuristic);
  }

  #[tokio::test]
  async fn real_failure_without_simulation_surfaces_original_error() {
    let exec = executor(vec![Script::Raise("NameError: name 'x' is not defined")]);
    exec.bridge().ensure_loaded().await.expect("load");

    // The simulator cannot resolve this print, so the real error wins.
    let result = exec.execute("print(x)", &ExecuteOptions::default()).await;
    assert!(!result.success);
    assert_eq!(result.method, ExecutionMethod::RealInterpreter);
    assert_eq!(result.error.as_deref(), Some("NameError: name 'x' is not defined"));
  }

  #[tokio::test]
  async fn fallback_disabled_surfaces_real_error_directly() {
    let exec = executor(vec![Script::Raise("TypeError: bad type")]);
    exec.bridge().ensure_loaded().await.expect("load");

    let opts = ExecuteOptions { fallback_on_error: false, ..Default::default() };
    let result = exec.execute("print('안녕')", &opts).await;
    assert!(!result.success);
    assert_eq!(result.method, ExecutionMethod::RealInterpreter);
  }

  #[test]
  fn execute_sync_never_suspends_and_tags_heuristic() {
    let exec = executor(vec![]);
    let result = exec.execute_sync("print('빠름')");
    assert!(result.success);
    assert_eq!(result.output, "빠름");
    assert_eq!(result.method, ExecutionMethod::Heuristic);
  }

  #[tokio::test]
  async fn check_output_normalizes_line_and_outer_whitespace() {
    let exec = executor(vec![]);
    let opts = ExecuteOptions::default();
    let code = "print('a')\nprint('b')";
    assert!(exec.check_output(code, "a \nb", &opts).await);
    assert!(exec.check_output(code, "a\nb\n", &opts).await);
    assert!(!exec.check_output(code, "a\nc", &opts).await);
  }
}

//! Application state: lesson catalog, executor, progress tracker, messages.
//!
//! This module owns:
//!   - the lesson catalog (built-in bank plus optional TOML extensions)
//!   - the interpreter bridge and the executor wired on top of it
//!   - the progress tracker (in-memory store)
//!   - the learner-facing message strings (from TOML or defaults)
//!
//! Construction also kicks off the interpreter warm-up in the background so
//! the first execution request does not pay the load cost. A warm-up failure
//! only logs; the executor degrades to the heuristic simulator.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::bridge::InterpreterBridge;
use crate::catalog::LessonCatalog;
use crate::config::{load_app_config_from_env, Messages};
use crate::executor::Executor;
use crate::progress::{MemoryStore, ProgressTracker};
use crate::runtime::SystemPythonLoader;

#[derive(Clone)]
pub struct AppState {
  pub catalog: Arc<LessonCatalog>,
  pub executor: Arc<Executor>,
  pub progress: Arc<ProgressTracker<MemoryStore>>,
  pub messages: Messages,
}

impl AppState {
  /// Build state from env: load config, build the catalog, wire the bridge.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    let cfg_opt = load_app_config_from_env();
    let messages = cfg_opt
      .as_ref()
      .map(|c| c.messages.clone())
      .unwrap_or_default();
    let extra = cfg_opt.map(|c| c.lessons).unwrap_or_default();

    let catalog = Arc::new(LessonCatalog::build(&extra));

    let bridge = Arc::new(InterpreterBridge::new(SystemPythonLoader));
    let executor = Arc::new(Executor::new(bridge.clone(), messages.clone()));

    // Warm the interpreter off the request path.
    tokio::spawn(async move {
      match bridge.ensure_loaded().await {
        Ok(_) => info!(target: "baeum_backend", "Python interpreter ready"),
        Err(e) => {
          error!(target: "baeum_backend", error = %e, "Interpreter load failed; heuristic simulator only")
        }
      }
    });

    let progress = Arc::new(ProgressTracker::new(MemoryStore::default()));

    Self { catalog, executor, progress, messages }
  }
}

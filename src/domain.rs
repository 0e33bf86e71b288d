//! Domain models used by the backend: lessons, execution results, and
//! per-learner progress records.

use serde::{Deserialize, Serialize};

/// One unit of curriculum: a coding task with a single expected textual output.
/// Lessons are static and immutable once the catalog is built; `id` values are
/// a dense 1..N sequence that defines ordering.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lesson {
  pub id: u32,
  pub title: String,
  /// Learner-facing task description (Korean).
  pub task: String,
  /// Template shown in the editor; contains `???` placeholder markers.
  pub starter_code: String,
  /// Exact text a correct submission must produce (after normalization).
  pub expected_output: String,
  pub hint: String,
  pub hint_explain: String,
  /// Canonical solution source. Never sent to clients (see `protocol::to_out`).
  pub solution: String,
}

/// Which strategy produced an execution result. Always reported so tests and
/// the UI can tell a real run from a simulated one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMethod {
  #[serde(rename = "real-interpreter")]
  RealInterpreter,
  #[serde(rename = "heuristic")]
  Heuristic,
}

/// Result of one execute call. Created fresh per call, never mutated after
/// return, never persisted.
#[derive(Clone, Debug, Serialize)]
pub struct ExecutionResult {
  pub success: bool,
  pub output: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub method: ExecutionMethod,
  /// Present only when the real interpreter path ran.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub execution_time_ms: Option<u64>,
}

/// Per-lesson bookkeeping inside a progress record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelStatus {
  pub level_id: u32,
  pub completed: bool,
  pub attempts: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub completed_at: Option<i64>,
  /// Seconds spent on the completing run, when the client reported it.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub time_spent: Option<u32>,
}

/// One record per learner (or one ephemeral record for the guest learner).
///
/// Invariants maintained by `progress::ProgressTracker`:
/// - `completed_levels` only grows; every id in it has a `LevelStatus`
///   with `completed == true`.
/// - `current_level >= 1`; `best_streak >= streak`;
/// - `total_time_spent` (minutes) never decreases.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LearnerProgress {
  pub learner_id: String,
  pub completed_levels: Vec<u32>,
  pub current_level: u32,
  pub streak: u32,
  pub best_streak: u32,
  /// Calendar date "YYYY-MM-DD" of the most recent qualifying activity.
  pub last_active_date: String,
  /// Total minutes, whole minutes only.
  pub total_time_spent: u32,
  pub level_statuses: Vec<LevelStatus>,
  pub updated_at: i64,
}

impl LearnerProgress {
  /// Fresh record with defaults, stamped with the given date.
  pub fn new(learner_id: &str, today: &str) -> Self {
    Self {
      learner_id: learner_id.to_string(),
      completed_levels: Vec::new(),
      current_level: 1,
      streak: 0,
      best_streak: 0,
      last_active_date: today.to_string(),
      total_time_spent: 0,
      level_statuses: Vec::new(),
      updated_at: crate::util::now_millis(),
    }
  }

  pub fn status_mut(&mut self, level_id: u32) -> Option<&mut LevelStatus> {
    self.level_statuses.iter_mut().find(|s| s.level_id == level_id)
  }

  pub fn status(&self, level_id: u32) -> Option<&LevelStatus> {
    self.level_statuses.iter().find(|s| s.level_id == level_id)
  }
}

//! Progress state machine: per-learner completion, attempts, daily streaks,
//! and time bookkeeping, persisted through a pluggable store.
//!
//! The store is an opaque key-value upsert keyed by learner id; mutations are
//! last-write-wins under the single-learner, single-device assumption.
//! A failed save is always surfaced to the caller.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::domain::{LearnerProgress, LevelStatus};
use crate::util::{now_millis, today_ymd};

/// Sentinel identity for an unauthenticated session. Guest progress lives in
/// whatever store backs the session and is not durable across devices.
pub const GUEST_LEARNER_ID: &str = "guest";

#[derive(Clone, Debug)]
pub struct StoreError {
  pub message: String,
}

impl fmt::Display for StoreError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.message)
  }
}

impl std::error::Error for StoreError {}

/// Persistence provider seam. The core does not care what backs it.
#[allow(async_fn_in_trait)]
pub trait ProgressStore: Send + Sync {
  async fn get(&self, learner_id: &str) -> Result<Option<LearnerProgress>, StoreError>;
  async fn save(&self, progress: LearnerProgress) -> Result<(), StoreError>;
  /// Wholesale removal, for account deletion.
  async fn delete(&self, learner_id: &str) -> Result<(), StoreError>;
}

/// In-memory store; the default backing for guest sessions and tests.
#[derive(Default)]
pub struct MemoryStore {
  records: RwLock<HashMap<String, LearnerProgress>>,
}

impl ProgressStore for MemoryStore {
  async fn get(&self, learner_id: &str) -> Result<Option<LearnerProgress>, StoreError> {
    Ok(self.records.read().await.get(learner_id).cloned())
  }

  async fn save(&self, progress: LearnerProgress) -> Result<(), StoreError> {
    self
      .records
      .write()
      .await
      .insert(progress.learner_id.clone(), progress);
    Ok(())
  }

  async fn delete(&self, learner_id: &str) -> Result<(), StoreError> {
    self.records.write().await.remove(learner_id);
    Ok(())
  }
}

pub struct ProgressTracker<S: ProgressStore> {
  store: S,
}

impl<S: ProgressStore> ProgressTracker<S> {
  pub fn new(store: S) -> Self {
    Self { store }
  }

  /// Current record, or a fresh default when the learner has no history yet.
  pub async fn get(&self, learner_id: &str) -> Result<LearnerProgress, StoreError> {
    match self.store.get(learner_id).await? {
      Some(p) => Ok(p),
      None => Ok(LearnerProgress::new(learner_id, &today_ymd())),
    }
  }

  /// Mark a lesson complete. Idempotent: completing an already-completed
  /// lesson changes nothing (and writes nothing).
  #[instrument(level = "info", skip(self), fields(%learner_id, level_id))]
  pub async fn complete_level(
    &self,
    learner_id: &str,
    level_id: u32,
    time_spent_secs: Option<u32>,
  ) -> Result<LearnerProgress, StoreError> {
    self
      .complete_level_on(learner_id, level_id, time_spent_secs, local_today())
      .await
  }

  async fn complete_level_on(
    &self,
    learner_id: &str,
    level_id: u32,
    time_spent_secs: Option<u32>,
    today: NaiveDate,
  ) -> Result<LearnerProgress, StoreError> {
    let today_str = today.format("%Y-%m-%d").to_string();
    let mut p = match self.store.get(learner_id).await? {
      Some(p) => p,
      None => LearnerProgress::new(learner_id, &today_str),
    };

    if p.completed_levels.contains(&level_id) {
      return Ok(p);
    }

    // Streak: same-day activity keeps it, the day after extends it, anything
    // else (gap, or first-ever activity) restarts at 1.
    if p.last_active_date != today_str {
      match parse_ymd(&p.last_active_date) {
        Some(last) if (today - last).num_days() == 1 => p.streak += 1,
        _ => p.streak = 1,
      }
    }
    if p.streak == 0 {
      p.streak = 1;
    }
    p.best_streak = p.best_streak.max(p.streak);
    p.last_active_date = today_str;

    p.completed_levels.push(level_id);
    p.current_level = p.current_level.max(level_id + 1);
    p.total_time_spent += time_spent_secs.map(|s| s / 60).unwrap_or(0);

    let now = now_millis();
    match p.status_mut(level_id) {
      Some(status) => {
        status.completed = true;
        status.completed_at = Some(now);
        status.time_spent = time_spent_secs;
      }
      None => p.level_statuses.push(LevelStatus {
        level_id,
        completed: true,
        attempts: 1,
        completed_at: Some(now),
        time_spent: time_spent_secs,
      }),
    }
    p.updated_at = now;

    self.store.save(p.clone()).await?;
    info!(target: "lesson", %learner_id, level_id, streak = p.streak, "Level completed");
    Ok(p)
  }

  /// Count one more attempt at a lesson, creating its status entry if absent.
  #[instrument(level = "debug", skip(self), fields(%learner_id, level_id))]
  pub async fn increment_attempt(
    &self,
    learner_id: &str,
    level_id: u32,
  ) -> Result<LearnerProgress, StoreError> {
    let mut p = self.get(learner_id).await?;
    match p.status_mut(level_id) {
      Some(status) => status.attempts += 1,
      None => p.level_statuses.push(LevelStatus {
        level_id,
        completed: false,
        attempts: 1,
        completed_at: None,
        time_spent: None,
      }),
    }
    p.updated_at = now_millis();
    self.store.save(p.clone()).await?;
    Ok(p)
  }

  /// Explicit navigation: overwrite the current-level pointer. Does not
  /// touch streaks or completion.
  #[instrument(level = "debug", skip(self), fields(%learner_id, level_id))]
  pub async fn set_current_level(
    &self,
    learner_id: &str,
    level_id: u32,
  ) -> Result<LearnerProgress, StoreError> {
    let mut p = self.get(learner_id).await?;
    p.current_level = level_id.max(1);
    p.updated_at = now_millis();
    self.store.save(p.clone()).await?;
    Ok(p)
  }

  /// Wholesale deletion, for account removal.
  pub async fn delete(&self, learner_id: &str) -> Result<(), StoreError> {
    self.store.delete(learner_id).await
  }
}

fn local_today() -> NaiveDate {
  chrono::Local::now().date_naive()
}

fn parse_ymd(s: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tracker() -> ProgressTracker<MemoryStore> {
    ProgressTracker::new(MemoryStore::default())
  }

  fn day(s: &str) -> NaiveDate {
    parse_ymd(s).expect("test date")
  }

  #[tokio::test]
  async fn first_completion_initializes_record() {
    let t = tracker();
    let p = t
      .complete_level_on(GUEST_LEARNER_ID, 1, Some(90), day("2026-08-25"))
      .await
      .expect("save");
    assert_eq!(p.completed_levels, vec![1]);
    assert_eq!(p.current_level, 2);
    assert_eq!(p.streak, 1);
    assert_eq!(p.best_streak, 1);
    assert_eq!(p.total_time_spent, 1);
    let status = p.status(1).expect("status");
    assert!(status.completed);
    assert_eq!(status.attempts, 1);
  }

  #[tokio::test]
  async fn complete_level_is_idempotent() {
    let t = tracker();
    let today = day("2026-08-25");
    let first = t.complete_level_on("u1", 3, None, today).await.expect("save");
    let second = t.complete_level_on("u1", 3, None, today).await.expect("save");
    assert_eq!(first.completed_levels, second.completed_levels);
    assert_eq!(first.current_level, second.current_level);
    assert_eq!(first.streak, second.streak);
    assert_eq!(first.total_time_spent, second.total_time_spent);
  }

  #[tokio::test]
  async fn next_day_extends_streak_and_gap_resets_it() {
    let t = tracker();
    t.complete_level_on("u1", 1, None, day("2026-08-01")).await.expect("save");
    let p = t.complete_level_on("u1", 2, None, day("2026-08-02")).await.expect("save");
    assert_eq!(p.streak, 2);
    assert_eq!(p.best_streak, 2);

    // Two-day gap: streak resets to 1, best streak is preserved.
    let p = t.complete_level_on("u1", 3, None, day("2026-08-04")).await.expect("save");
    assert_eq!(p.streak, 1);
    assert_eq!(p.best_streak, 2);
  }

  #[tokio::test]
  async fn same_day_completions_keep_streak() {
    let t = tracker();
    let today = day("2026-08-25");
    t.complete_level_on("u1", 1, None, today).await.expect("save");
    let p = t.complete_level_on("u1", 2, None, today).await.expect("save");
    assert_eq!(p.streak, 1);
    assert_eq!(p.completed_levels, vec![1, 2]);
  }

  #[tokio::test]
  async fn monotone_quantities_never_decrease() {
    let t = tracker();
    let mut best = 0;
    let mut time = 0;
    let mut completed = 0;
    for (i, d) in ["2026-08-01", "2026-08-02", "2026-08-05", "2026-08-06"].iter().enumerate() {
      let p = t
        .complete_level_on("u1", i as u32 + 1, Some(120), day(d))
        .await
        .expect("save");
      assert!(p.best_streak >= best);
      assert!(p.total_time_spent >= time);
      assert!(p.completed_levels.len() >= completed);
      assert!(p.best_streak >= p.streak);
      best = p.best_streak;
      time = p.total_time_spent;
      completed = p.completed_levels.len();
    }
  }

  #[tokio::test]
  async fn completed_levels_always_have_completed_statuses() {
    let t = tracker();
    t.increment_attempt("u1", 1).await.expect("save");
    t.increment_attempt("u1", 1).await.expect("save");
    let p = t.complete_level_on("u1", 1, None, day("2026-08-25")).await.expect("save");
    for id in &p.completed_levels {
      assert!(p.status(*id).is_some_and(|s| s.completed));
    }
    assert_eq!(p.status(1).map(|s| s.attempts), Some(2));
  }

  #[tokio::test]
  async fn attempts_upsert_creates_incomplete_status() {
    let t = tracker();
    let p = t.increment_attempt("u1", 7).await.expect("save");
    let status = p.status(7).expect("status");
    assert!(!status.completed);
    assert_eq!(status.attempts, 1);
  }

  #[tokio::test]
  async fn set_current_level_is_a_plain_overwrite() {
    let t = tracker();
    t.complete_level_on("u1", 1, None, day("2026-08-25")).await.expect("save");
    let p = t.set_current_level("u1", 5).await.expect("save");
    assert_eq!(p.current_level, 5);
    assert_eq!(p.streak, 1);

    // Never below 1.
    let p = t.set_current_level("u1", 0).await.expect("save");
    assert_eq!(p.current_level, 1);
  }

  #[tokio::test]
  async fn failed_saves_propagate() {
    struct BrokenStore;
    impl ProgressStore for BrokenStore {
      async fn get(&self, _id: &str) -> Result<Option<LearnerProgress>, StoreError> {
        Ok(None)
      }
      async fn save(&self, _p: LearnerProgress) -> Result<(), StoreError> {
        Err(StoreError { message: "backend unavailable".into() })
      }
      async fn delete(&self, _id: &str) -> Result<(), StoreError> {
        Ok(())
      }
    }

    let t = ProgressTracker::new(BrokenStore);
    let err = t.complete_level("u1", 1, None).await;
    assert!(err.is_err());
  }

  #[tokio::test]
  async fn delete_removes_the_record() {
    let t = tracker();
    t.complete_level_on("u1", 1, None, day("2026-08-25")).await.expect("save");
    t.delete("u1").await.expect("delete");
    let p = t.get("u1").await.expect("get");
    assert!(p.completed_levels.is_empty());
  }
}

//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs include parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{error, info, instrument};

use crate::bridge::LoadPhase;
use crate::executor::ExecuteOptions;
use crate::hints::error_hint;
use crate::progress::GUEST_LEARNER_ID;
use crate::protocol::*;
use crate::state::AppState;
use crate::util::normalize_output;

fn phase_label(phase: &LoadPhase) -> &'static str {
  match phase {
    LoadPhase::Unloaded => "unloaded",
    LoadPhase::Loading => "loading",
    LoadPhase::Ready => "ready",
    LoadPhase::Failed(_) => "failed",
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    ok: true,
    interpreter: phase_label(&state.executor.bridge().phase()).to_string(),
    total_lessons: state.catalog.total_lessons(),
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_lessons(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let lessons: Vec<LessonOut> = state.catalog.all().iter().map(to_out).collect();
  Json(lessons)
}

#[instrument(level = "info", skip(state), fields(id = q.id))]
pub async fn http_get_lesson(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LessonQuery>,
) -> Result<Json<LessonOut>, StatusCode> {
  match state.catalog.get(q.id) {
    Some(lesson) => Ok(Json(to_out(lesson))),
    None => Err(StatusCode::NOT_FOUND),
  }
}

#[instrument(level = "info", skip(state, body), fields(code_len = body.code.len()))]
pub async fn http_post_execute(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ExecuteIn>,
) -> impl IntoResponse {
  let opts = ExecuteOptions {
    prefer_interpreter: body.prefer_interpreter.unwrap_or(true),
    ..Default::default()
  };
  let result = state.executor.execute(&body.code, &opts).await;
  info!(target: "executor", success = result.success, method = ?result.method, "HTTP execute served");
  Json(result)
}

#[instrument(level = "info", skip(state, body), fields(lesson_id = body.lesson_id, code_len = body.code.len()))]
pub async fn http_post_check(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CheckIn>,
) -> Result<Json<CheckOut>, StatusCode> {
  let lesson = state.catalog.get(body.lesson_id).ok_or(StatusCode::NOT_FOUND)?;
  let result = state.executor.execute(&body.code, &ExecuteOptions::default()).await;
  let correct =
    result.success && normalize_output(&result.output) == normalize_output(&lesson.expected_output);
  info!(target: "lesson", lesson_id = body.lesson_id, %correct, "HTTP check evaluated");
  Ok(Json(CheckOut { correct, result }))
}

#[instrument(level = "info", skip(state, body), fields(error_len = body.error.len()))]
pub async fn http_post_hint(
  State(state): State<Arc<AppState>>,
  Json(body): Json<HintIn>,
) -> impl IntoResponse {
  let text = error_hint(&body.error, &state.messages);
  Json(HintOut { text })
}

fn learner_or_guest(id: Option<String>) -> String {
  id.unwrap_or_else(|| GUEST_LEARNER_ID.to_string())
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ProgressQuery>,
) -> Result<impl IntoResponse, StatusCode> {
  let learner = learner_or_guest(q.learner_id);
  match state.progress.get(&learner).await {
    Ok(p) => Ok(Json(p)),
    Err(e) => {
      error!(target: "lesson", %learner, error = %e, "Progress read failed");
      Err(StatusCode::INTERNAL_SERVER_ERROR)
    }
  }
}

#[instrument(level = "info", skip(state, body), fields(lesson_id = body.lesson_id))]
pub async fn http_post_complete(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CompleteIn>,
) -> Result<impl IntoResponse, StatusCode> {
  let learner = learner_or_guest(body.learner_id);
  match state
    .progress
    .complete_level(&learner, body.lesson_id, body.time_spent)
    .await
  {
    Ok(p) => Ok(Json(p)),
    Err(e) => {
      error!(target: "lesson", %learner, error = %e, "Completion save failed");
      Err(StatusCode::INTERNAL_SERVER_ERROR)
    }
  }
}

#[instrument(level = "info", skip(state, body), fields(lesson_id = body.lesson_id))]
pub async fn http_post_attempt(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AttemptIn>,
) -> Result<impl IntoResponse, StatusCode> {
  let learner = learner_or_guest(body.learner_id);
  match state.progress.increment_attempt(&learner, body.lesson_id).await {
    Ok(p) => Ok(Json(p)),
    Err(e) => {
      error!(target: "lesson", %learner, error = %e, "Attempt save failed");
      Err(StatusCode::INTERNAL_SERVER_ERROR)
    }
  }
}

#[instrument(level = "info", skip(state, body), fields(lesson_id = body.lesson_id))]
pub async fn http_post_level(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SetLevelIn>,
) -> Result<impl IntoResponse, StatusCode> {
  let learner = learner_or_guest(body.learner_id);
  match state.progress.set_current_level(&learner, body.lesson_id).await {
    Ok(p) => Ok(Json(p)),
    Err(e) => {
      error!(target: "lesson", %learner, error = %e, "Level save failed");
      Err(StatusCode::INTERNAL_SERVER_ERROR)
    }
  }
}

//! Loading app configuration (learner-facing messages + optional lesson bank)
//! from TOML.
//!
//! See `AppConfig` and `Messages` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub messages: Messages,
  #[serde(default)]
  pub lessons: Vec<LessonCfg>,
}

/// Lesson entry accepted in TOML configuration. Extends the built-in
/// curriculum; entries whose id collides with a built-in lesson are skipped.
#[derive(Clone, Debug, Deserialize)]
pub struct LessonCfg {
  pub id: u32,
  pub title: String,
  pub task: String,
  pub starter_code: String,
  pub expected_output: String,
  #[serde(default)] pub hint: String,
  #[serde(default)] pub hint_explain: String,
  pub solution: String,
}

/// Learner-facing Korean strings. Defaults match the curriculum's tone;
/// override them in TOML if the copy needs tuning.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Messages {
  // Orchestrator
  pub unsafe_code: String,
  // Diagnostic hinter, specific sub-cases before generic categories.
  pub syntax_eol: String,
  pub syntax_unexpected_indent: String,
  pub syntax_expected: String,
  pub syntax_generic: String,
  pub name_error: String,
  pub type_error: String,
  pub index_error: String,
  pub key_error: String,
  pub indentation_error: String,
  pub timeout: String,
  pub generic: String,
}

impl Default for Messages {
  fn default() -> Self {
    Self {
      unsafe_code: "안전하지 않은 코드가 감지되었습니다.".into(),
      syntax_eol: "문자열의 따옴표가 제대로 닫히지 않았어요. ' 또는 \" 를 확인하세요!".into(),
      syntax_unexpected_indent: "들여쓰기가 잘못되었어요. 스페이스 4칸을 사용하세요!".into(),
      syntax_expected: "문법 오류가 있어요. 괄호, 콜론(:), 따옴표를 확인하세요!".into(),
      syntax_generic: "코드 문법에 문제가 있어요. 오타를 확인해보세요!".into(),
      name_error: "정의되지 않은 변수나 함수를 사용했어요. 이름 철자를 확인하세요!".into(),
      type_error: "잘못된 타입의 값을 사용했어요. 숫자와 문자열을 확인하세요!".into(),
      index_error: "리스트 인덱스가 범위를 벗어났어요. 인덱스는 0부터 시작해요!".into(),
      key_error: "딕셔너리에 없는 키를 사용했어요. 키 이름을 확인하세요!".into(),
      indentation_error: "들여쓰기가 잘못되었어요. 모든 블록은 스페이스 4칸으로 들여쓰세요!".into(),
      timeout: "코드 실행 시간이 너무 오래 걸렸어요. 무한 반복이 없는지 확인하세요!".into(),
      generic: "오류가 발생했어요. 코드를 다시 확인해보세요!".into(),
    }
  }
}

/// Attempt to load `AppConfig` from LESSON_CONFIG_PATH. On any parsing/IO
/// error, returns None and the caller falls back to defaults.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("LESSON_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "baeum_backend", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "baeum_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "baeum_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

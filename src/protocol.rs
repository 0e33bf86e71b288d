//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{ExecutionResult, LearnerProgress, Lesson};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  Execute {
    code: String,
    #[serde(rename = "preferInterpreter")]
    prefer_interpreter: Option<bool>,
  },
  Check {
    #[serde(rename = "lessonId")]
    lesson_id: u32,
    code: String,
  },
  Hint {
    error: String,
  },
  CompleteLevel {
    #[serde(rename = "learnerId")]
    learner_id: Option<String>,
    #[serde(rename = "lessonId")]
    lesson_id: u32,
    #[serde(rename = "timeSpent")]
    time_spent: Option<u32>,
  },
  Attempt {
    #[serde(rename = "learnerId")]
    learner_id: Option<String>,
    #[serde(rename = "lessonId")]
    lesson_id: u32,
  },
  SetLevel {
    #[serde(rename = "learnerId")]
    learner_id: Option<String>,
    #[serde(rename = "lessonId")]
    lesson_id: u32,
  },
  GetProgress {
    #[serde(rename = "learnerId")]
    learner_id: Option<String>,
  },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  ExecResult {
    result: ExecutionResult,
  },
  CheckResult {
    correct: bool,
    result: ExecutionResult,
  },
  Hint {
    text: String,
  },
  Progress {
    progress: LearnerProgress,
  },
  Error {
    message: String,
  },
}

/// DTO used by both WS and HTTP for lesson delivery. The solution stays
/// server-side so the check endpoint cannot be trivially bypassed by reading
/// the payload.
#[derive(Debug, Serialize)]
pub struct LessonOut {
  pub id: u32,
  pub title: String,
  pub task: String,
  #[serde(rename = "starterCode")]
  pub starter_code: String,
  #[serde(rename = "expectedOutput")]
  pub expected_output: String,
  pub hint: String,
  #[serde(rename = "hintExplain")]
  pub hint_explain: String,
}

/// Convert full `Lesson` (internal) to the public DTO.
pub fn to_out(l: &Lesson) -> LessonOut {
  LessonOut {
    id: l.id,
    title: l.title.clone(),
    task: l.task.clone(),
    starter_code: l.starter_code.clone(),
    expected_output: l.expected_output.clone(),
    hint: l.hint.clone(),
    hint_explain: l.hint_explain.clone(),
  }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct LessonQuery {
  pub id: u32,
}

#[derive(Deserialize)]
pub struct ExecuteIn {
  pub code: String,
  #[serde(rename = "preferInterpreter")]
  pub prefer_interpreter: Option<bool>,
}

#[derive(Deserialize)]
pub struct CheckIn {
  #[serde(rename = "lessonId")]
  pub lesson_id: u32,
  pub code: String,
}
#[derive(Serialize)]
pub struct CheckOut {
  pub correct: bool,
  pub result: ExecutionResult,
}

#[derive(Deserialize)]
pub struct HintIn {
  pub error: String,
}
#[derive(Serialize)]
pub struct HintOut {
  pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
  #[serde(rename = "learnerId")]
  pub learner_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CompleteIn {
  #[serde(rename = "learnerId")]
  pub learner_id: Option<String>,
  #[serde(rename = "lessonId")]
  pub lesson_id: u32,
  /// Seconds spent on the lesson, as measured by the client.
  #[serde(rename = "timeSpent")]
  pub time_spent: Option<u32>,
}

#[derive(Deserialize)]
pub struct AttemptIn {
  #[serde(rename = "learnerId")]
  pub learner_id: Option<String>,
  #[serde(rename = "lessonId")]
  pub lesson_id: u32,
}

#[derive(Deserialize)]
pub struct SetLevelIn {
  #[serde(rename = "learnerId")]
  pub learner_id: Option<String>,
  #[serde(rename = "lessonId")]
  pub lesson_id: u32,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
  pub interpreter: String,
  #[serde(rename = "totalLessons")]
  pub total_lessons: u32,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn client_messages_parse_from_tagged_json() {
    let msg: ClientWsMessage =
      serde_json::from_str(r#"{"type":"execute","code":"print('hi')"}"#).expect("parse");
    assert!(matches!(msg, ClientWsMessage::Execute { prefer_interpreter: None, .. }));

    let msg: ClientWsMessage =
      serde_json::from_str(r#"{"type":"check","lessonId":3,"code":"print(1)"}"#).expect("parse");
    assert!(matches!(msg, ClientWsMessage::Check { lesson_id: 3, .. }));

    let msg: ClientWsMessage =
      serde_json::from_str(r#"{"type":"complete_level","lessonId":1,"timeSpent":42}"#)
        .expect("parse");
    assert!(matches!(
      msg,
      ClientWsMessage::CompleteLevel { learner_id: None, lesson_id: 1, time_spent: Some(42) }
    ));
  }

  #[test]
  fn lesson_out_omits_the_solution() {
    let lesson = Lesson {
      id: 1,
      title: "t".into(),
      task: "k".into(),
      starter_code: "s".into(),
      expected_output: "o".into(),
      hint: "h".into(),
      hint_explain: "e".into(),
      solution: "print('secret')".into(),
    };
    let json = serde_json::to_string(&to_out(&lesson)).expect("serialize");
    assert!(!json.contains("secret"));
    assert!(json.contains("starterCode"));
  }
}

//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::executor::ExecuteOptions;
use crate::hints::error_hint;
use crate::progress::GUEST_LEARNER_ID;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::util::normalize_output;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "baeum_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let conn_id = Uuid::new_v4();
  info!(target: "baeum_backend", %conn_id, "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "baeum_backend", %conn_id, "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "baeum_backend", %conn_id, error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "baeum_backend", %conn_id, "WebSocket disconnected");
}

fn learner_or_guest(id: Option<String>) -> String {
  id.unwrap_or_else(|| GUEST_LEARNER_ID.to_string())
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Execute { code, prefer_interpreter } => {
      let opts = ExecuteOptions {
        prefer_interpreter: prefer_interpreter.unwrap_or(true),
        ..Default::default()
      };
      let result = state.executor.execute(&code, &opts).await;
      tracing::info!(target: "executor", success = result.success, method = ?result.method, "WS execute served");
      ServerWsMessage::ExecResult { result }
    }

    ClientWsMessage::Check { lesson_id, code } => {
      let Some(lesson) = state.catalog.get(lesson_id) else {
        return ServerWsMessage::Error { message: format!("Unknown lesson id: {}", lesson_id) };
      };
      let result = state.executor.execute(&code, &ExecuteOptions::default()).await;
      let correct = result.success
        && normalize_output(&result.output) == normalize_output(&lesson.expected_output);
      tracing::info!(target: "lesson", lesson_id, %correct, "WS check evaluated");
      ServerWsMessage::CheckResult { correct, result }
    }

    ClientWsMessage::Hint { error } => {
      let text = error_hint(&error, &state.messages);
      ServerWsMessage::Hint { text }
    }

    ClientWsMessage::CompleteLevel { learner_id, lesson_id, time_spent } => {
      let learner = learner_or_guest(learner_id);
      match state.progress.complete_level(&learner, lesson_id, time_spent).await {
        Ok(progress) => ServerWsMessage::Progress { progress },
        Err(e) => ServerWsMessage::Error { message: format!("Progress save failed: {}", e) },
      }
    }

    ClientWsMessage::Attempt { learner_id, lesson_id } => {
      let learner = learner_or_guest(learner_id);
      match state.progress.increment_attempt(&learner, lesson_id).await {
        Ok(progress) => ServerWsMessage::Progress { progress },
        Err(e) => ServerWsMessage::Error { message: format!("Progress save failed: {}", e) },
      }
    }

    ClientWsMessage::SetLevel { learner_id, lesson_id } => {
      let learner = learner_or_guest(learner_id);
      match state.progress.set_current_level(&learner, lesson_id).await {
        Ok(progress) => ServerWsMessage::Progress { progress },
        Err(e) => ServerWsMessage::Error { message: format!("Progress save failed: {}", e) },
      }
    }

    ClientWsMessage::GetProgress { learner_id } => {
      let learner = learner_or_guest(learner_id);
      match state.progress.get(&learner).await {
        Ok(progress) => ServerWsMessage::Progress { progress },
        Err(e) => ServerWsMessage::Error { message: format!("Progress read failed: {}", e) },
      }
    }
  }
}

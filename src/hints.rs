//! Maps raw interpreter error text to a learner-facing Korean hint.
//!
//! Classification is case-insensitive substring matching in a fixed priority
//! order: specific sub-cases before their generic category. Always returns a
//! non-empty hint, never panics.

use crate::config::Messages;

pub fn error_hint(raw_error: &str, messages: &Messages) -> String {
  let lower = raw_error.to_lowercase();

  if lower.contains("syntaxerror") {
    if lower.contains("eol") {
      return messages.syntax_eol.clone();
    }
    if lower.contains("unexpected indent") {
      return messages.syntax_unexpected_indent.clone();
    }
    if lower.contains("expected") {
      return messages.syntax_expected.clone();
    }
    return messages.syntax_generic.clone();
  }

  if lower.contains("nameerror") {
    return messages.name_error.clone();
  }
  if lower.contains("typeerror") {
    return messages.type_error.clone();
  }
  if lower.contains("indexerror") {
    return messages.index_error.clone();
  }
  if lower.contains("keyerror") {
    return messages.key_error.clone();
  }
  if lower.contains("indentationerror") {
    return messages.indentation_error.clone();
  }
  if lower.contains("timeout") {
    return messages.timeout.clone();
  }

  messages.generic.clone()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn hint(raw: &str) -> String {
    error_hint(raw, &Messages::default())
  }

  #[test]
  fn specific_syntax_subcases_win_over_generic() {
    assert!(hint("SyntaxError: EOL while scanning string literal").contains("따옴표"));
    assert!(hint("SyntaxError: unexpected indent").contains("들여쓰기"));
    assert!(hint("SyntaxError: expected ':'").contains("문법 오류"));
    assert!(hint("SyntaxError: invalid syntax").contains("문법에 문제"));
  }

  #[test]
  fn categories_map_case_insensitively() {
    assert!(hint("NAMEERROR: name 'x' is not defined").contains("정의되지 않은"));
    assert!(hint("TypeError: unsupported operand").contains("타입"));
    assert!(hint("IndexError: list index out of range").contains("인덱스"));
    assert!(hint("KeyError: 'name'").contains("키"));
    assert!(hint("IndentationError: expected an indented block").contains("들여쓰"));
    assert!(hint("Execution timeout").contains("무한 반복"));
  }

  #[test]
  fn always_returns_a_nonempty_hint() {
    assert!(!hint("").is_empty());
    assert!(hint("something completely unknown").contains("다시 확인"));
  }
}

//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Normalize captured output for comparison against a lesson's expected text:
/// trim outer whitespace, trim each line, rejoin with '\n'.
/// Per-line trimming keeps trailing spaces from failing an otherwise
/// correct answer.
pub fn normalize_output(output: &str) -> String {
  output
    .trim()
    .split('\n')
    .map(str::trim)
    .collect::<Vec<_>>()
    .join("\n")
}

/// Today's local calendar date as "YYYY-MM-DD".
pub fn today_ymd() -> String {
  chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Current wall-clock time in milliseconds since the epoch.
pub fn now_millis() -> i64 {
  chrono::Utc::now().timestamp_millis()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge code payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let cut = s
    .char_indices()
    .map(|(i, _)| i)
    .take_while(|i| *i <= max)
    .last()
    .unwrap_or(0);
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_fills_known_keys_only() {
    let out = fill_template("안녕, {name}! {missing}", &[("name", "파이썬")]);
    assert_eq!(out, "안녕, 파이썬! {missing}");
  }

  #[test]
  fn normalize_trims_lines_and_edges() {
    assert_eq!(normalize_output("  a  \nb \n"), "a\nb");
    assert_eq!(normalize_output("a \nb\n"), normalize_output("a\nb"));
  }

  #[test]
  fn trunc_respects_utf8_boundaries() {
    let t = trunc_for_log("파이썬 코딩", 4);
    assert!(t.contains("bytes total"));
  }
}

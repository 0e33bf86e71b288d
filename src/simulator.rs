//! Heuristic simulator: a best-effort, pattern-based evaluator for learner
//! Python when the real interpreter is unavailable (still loading, failed to
//! load, or the caller wants instant feedback).
//!
//! This is a closed-world evaluator tuned to a fixed curriculum, NOT a general
//! interpreter. There is no control flow and no function-body execution; loop
//! lessons are recognized as whole canonical shapes, everything else is
//! assignment extraction plus a print-argument rule chain. When no rule
//! matches a print argument, that print contributes no output line.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::util::fill_template;

#[derive(Clone, Debug)]
pub struct SimResult {
  pub success: bool,
  pub output: String,
  pub error: Option<String>,
}

impl SimResult {
  fn ok(output: impl Into<String>) -> Self {
    Self { success: true, output: output.into(), error: None }
  }
}

/// A whole-program shortcut: when every `requires` substring is present, the
/// program is one of the loop lessons and its output is known. Loop state is
/// deliberately not simulated; extending the curriculum means extending this
/// table, not the rule chain.
struct CanonicalShape {
  requires: &'static [&'static str],
  output: &'static str,
}

const CANONICAL_SHAPES: &[CanonicalShape] = &[
  CanonicalShape {
    requires: &["for i in range(1, 4)", "print(i)"],
    output: "1\n2\n3",
  },
  CanonicalShape {
    requires: &["while count <= 3", "print(count)", "count += 1"],
    output: "1\n2\n3",
  },
  CanonicalShape {
    requires: &["for num in numbers:", "print(num * 2)"],
    output: "2\n4\n6\n8\n10",
  },
];

/// Literal values the assignment scan can bind.
#[derive(Clone, Debug, PartialEq)]
enum Value {
  Str(String),
  Int(i64),
  /// Raw list literal text, e.g. `[1, 2, 3]`.
  List(String),
  /// Raw dict literal text, e.g. `{'name': '민수', 'age': 30}`.
  Dict(String),
}

impl Value {
  fn render(&self) -> String {
    match self {
      Value::Str(s) => s.clone(),
      Value::Int(n) => n.to_string(),
      Value::List(raw) | Value::Dict(raw) => raw.clone(),
    }
  }

  fn as_int(&self) -> Option<i64> {
    match self {
      Value::Int(n) => Some(*n),
      _ => None,
    }
  }
}

static ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r#"(?m)(\w+)\s*=\s*(?:'([^']*)'|"([^"]*)"|(\d+)|(\[[^\]]*\])|(\{[^}]*\}))"#,
  )
  .expect("assignment pattern must compile")
});

static PRINT_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?m)print\((.*)\)").expect("print pattern must compile"));

static DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"def\s+(\w+)\(\s*(\w+)\s*\)\s*:").expect("def pattern must compile")
});

static ARITH_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[\d\s+\-*/()]+$").expect("arithmetic pattern must compile"));

/// Simulate the program: canonical shapes first, then sequential
/// assignment-and-print evaluation in source order.
/// Deterministic for identical input; never panics.
pub fn simulate(code: &str) -> SimResult {
  for shape in CANONICAL_SHAPES {
    if shape.requires.iter().all(|s| code.contains(s)) {
      return SimResult::ok(shape.output);
    }
  }

  let vars = extract_variables(code);

  let mut outputs: Vec<String> = Vec::new();
  for cap in PRINT_RE.captures_iter(code) {
    let content = cap[1].trim();
    if let Some(line) = evaluate_print_arg(content, code, &vars) {
      outputs.push(line);
    }
  }

  SimResult::ok(outputs.join("\n"))
}

/// Build the symbol table from simple assignment statements. Last assignment
/// wins, simulating top-to-bottom execution order (not real control flow).
/// Single-parameter function calls with a string-literal argument additionally
/// bind the parameter name, so templated greetings inside a `def` resolve.
fn extract_variables(code: &str) -> HashMap<String, Value> {
  let mut vars = HashMap::new();

  for cap in ASSIGN_RE.captures_iter(code) {
    let name = cap[1].to_string();
    let value = if let Some(s) = cap.get(2).or_else(|| cap.get(3)) {
      Value::Str(s.as_str().to_string())
    } else if let Some(n) = cap.get(4) {
      match n.as_str().parse::<i64>() {
        Ok(n) => Value::Int(n),
        Err(_) => continue,
      }
    } else if let Some(l) = cap.get(5) {
      Value::List(l.as_str().to_string())
    } else if let Some(d) = cap.get(6) {
      Value::Dict(d.as_str().to_string())
    } else {
      continue;
    };
    vars.insert(name, value);
  }

  for cap in DEF_RE.captures_iter(code) {
    let fn_name = &cap[1];
    let param = &cap[2];
    let call_re = match Regex::new(&format!(r"{}\(\s*'([^']*)'\s*\)", regex::escape(fn_name))) {
      Ok(re) => re,
      Err(_) => continue,
    };
    if let Some(call) = call_re.captures(code) {
      vars
        .entry(param.to_string())
        .or_insert_with(|| Value::Str(call[1].to_string()));
    }
  }

  vars
}

/// Evaluate one print argument. Rules are tried in a fixed order; the first
/// match wins; no match yields None (the line is silently skipped).
fn evaluate_print_arg(
  content: &str,
  full_code: &str,
  vars: &HashMap<String, Value>,
) -> Option<String> {
  // String literal, single or double quoted.
  if let Some(inner) = strip_quoted(content) {
    return Some(inner.to_string());
  }

  // Bare integer literal.
  if !content.is_empty() && content.chars().all(|c| c.is_ascii_digit()) {
    return Some(content.to_string());
  }

  // f-string: substitute {name} placeholders from the symbol table.
  if content.starts_with("f'") || content.starts_with("f\"") {
    return evaluate_fstring(content, vars);
  }

  // Pure arithmetic over digits and + - * / ( ).
  if ARITH_RE.is_match(content) && content.chars().any(|c| c.is_ascii_digit()) {
    if let Some(text) = eval_arithmetic(content) {
      return Some(text);
    }
  }

  // Additive expression over identifiers and integer literals.
  if content.contains('+') && !content.contains('\'') && !content.contains('"') {
    if let Some(sum) = eval_additive(content, vars) {
      return Some(sum.to_string());
    }
  }

  // Case-conversion methods on a known string variable.
  if let Some(var_name) = content.strip_suffix(".upper()") {
    if let Some(Value::Str(s)) = vars.get(var_name.trim()) {
      return Some(s.to_uppercase());
    }
    if full_code.contains("'python programming'") {
      return Some("PYTHON PROGRAMMING".to_string());
    }
  }
  if let Some(var_name) = content.strip_suffix(".lower()") {
    if let Some(Value::Str(s)) = vars.get(var_name.trim()) {
      return Some(s.to_lowercase());
    }
  }

  // List indexing by integer literal: fruits[1].
  if let Some((name, idx)) = parse_index_access(content) {
    if let Some(Value::List(raw)) = vars.get(name) {
      if let Some(item) = list_items(raw).into_iter().nth(idx) {
        return Some(item);
      }
    }
  }

  // Dictionary lookup by string-literal key: person['name'].
  if let Some((name, key)) = parse_key_access(content) {
    if let Some(Value::Dict(raw)) = vars.get(name) {
      if let Some(value) = dict_value(raw, &key) {
        return Some(value);
      }
    }
  }

  // Bare identifier in the symbol table; a list that was appended to is
  // rendered with the appended element spliced in.
  if let Some(value) = vars.get(content) {
    if let Value::List(raw) = value {
      if let Some(spliced) = apply_append(content, raw, full_code) {
        return Some(spliced);
      }
    }
    return Some(value.render());
  }

  None
}

fn strip_quoted(content: &str) -> Option<&str> {
  for quote in ['\'', '"'] {
    if let Some(inner) = content
      .strip_prefix(quote)
      .and_then(|rest| rest.strip_suffix(quote))
    {
      // Reject strings whose inner text closes and reopens the quote,
      // e.g. two separate literals joined by a comma.
      if !inner.contains(quote) {
        return Some(inner);
      }
    }
  }
  None
}

fn evaluate_fstring(content: &str, vars: &HashMap<String, Value>) -> Option<String> {
  let inner = content
    .strip_prefix('f')?
    .trim()
    .trim_matches(|c| c == '\'' || c == '"');

  let rendered: Vec<(String, String)> = vars
    .iter()
    .map(|(k, v)| (k.clone(), v.render()))
    .collect();
  let pairs: Vec<(&str, &str)> = rendered
    .iter()
    .map(|(k, v)| (k.as_str(), v.as_str()))
    .collect();

  // Unresolved placeholders stay as literal text.
  Some(fill_template(inner, &pairs))
}

/// Tiny recursive-descent evaluator for + - * / with parentheses and standard
/// precedence. Division renders Python-style (a float, `.0` when exact).
fn eval_arithmetic(expr: &str) -> Option<String> {
  let tokens: Vec<char> = expr.chars().filter(|c| !c.is_whitespace()).collect();
  let mut pos = 0usize;
  let (value, used_division) = parse_expr(&tokens, &mut pos)?;
  if pos != tokens.len() {
    return None;
  }
  if used_division {
    if value.fract() == 0.0 {
      Some(format!("{:.1}", value))
    } else {
      Some(value.to_string())
    }
  } else {
    Some(format!("{}", value as i64))
  }
}

fn parse_expr(tokens: &[char], pos: &mut usize) -> Option<(f64, bool)> {
  let (mut acc, mut div) = parse_term(tokens, pos)?;
  while let Some(&op) = tokens.get(*pos) {
    if op != '+' && op != '-' {
      break;
    }
    *pos += 1;
    let (rhs, rhs_div) = parse_term(tokens, pos)?;
    acc = if op == '+' { acc + rhs } else { acc - rhs };
    div |= rhs_div;
  }
  Some((acc, div))
}

fn parse_term(tokens: &[char], pos: &mut usize) -> Option<(f64, bool)> {
  let (mut acc, mut div) = parse_factor(tokens, pos)?;
  while let Some(&op) = tokens.get(*pos) {
    if op != '*' && op != '/' {
      break;
    }
    *pos += 1;
    let (rhs, rhs_div) = parse_factor(tokens, pos)?;
    if op == '*' {
      acc *= rhs;
    } else {
      if rhs == 0.0 {
        return None;
      }
      acc /= rhs;
      div = true;
    }
    div |= rhs_div;
  }
  Some((acc, div))
}

fn parse_factor(tokens: &[char], pos: &mut usize) -> Option<(f64, bool)> {
  match tokens.get(*pos)? {
    '(' => {
      *pos += 1;
      let inner = parse_expr(tokens, pos)?;
      if tokens.get(*pos) != Some(&')') {
        return None;
      }
      *pos += 1;
      Some(inner)
    }
    '-' => {
      *pos += 1;
      let (v, d) = parse_factor(tokens, pos)?;
      Some((-v, d))
    }
    c if c.is_ascii_digit() => {
      let start = *pos;
      while tokens.get(*pos).is_some_and(|c| c.is_ascii_digit()) {
        *pos += 1;
      }
      let text: String = tokens[start..*pos].iter().collect();
      text.parse::<f64>().ok().map(|v| (v, false))
    }
    _ => None,
  }
}

fn eval_additive(content: &str, vars: &HashMap<String, Value>) -> Option<i64> {
  let mut sum = 0i64;
  for part in content.split('+') {
    let part = part.trim();
    let n = if part.chars().all(|c| c.is_ascii_digit()) && !part.is_empty() {
      part.parse::<i64>().ok()?
    } else {
      vars.get(part)?.as_int()?
    };
    sum = sum.checked_add(n)?;
  }
  Some(sum)
}

fn parse_index_access(content: &str) -> Option<(&str, usize)> {
  let open = content.find('[')?;
  let close = content.strip_suffix(']')?;
  let name = &content[..open];
  let idx = close.get(open + 1..)?.parse::<usize>().ok()?;
  if name.chars().all(|c| c.is_alphanumeric() || c == '_') && !name.is_empty() {
    Some((name, idx))
  } else {
    None
  }
}

fn parse_key_access(content: &str) -> Option<(&str, String)> {
  let open = content.find('[')?;
  let name = &content[..open];
  let inner = content.get(open + 1..)?.strip_suffix(']')?;
  let key = strip_quoted(inner.trim())?;
  if name.chars().all(|c| c.is_alphanumeric() || c == '_') && !name.is_empty() {
    Some((name, key.to_string()))
  } else {
    None
  }
}

fn list_items(raw: &str) -> Vec<String> {
  raw
    .trim_start_matches('[')
    .trim_end_matches(']')
    .split(',')
    .map(|item| strip_quoted(item.trim()).unwrap_or(item.trim()).to_string())
    .filter(|item| !item.is_empty())
    .collect()
}

fn dict_value(raw: &str, key: &str) -> Option<String> {
  let body = raw.trim_start_matches('{').trim_end_matches('}');
  for pair in body.split(',') {
    let (k, v) = pair.split_once(':')?;
    let k = strip_quoted(k.trim()).unwrap_or(k.trim());
    if k == key {
      let v = v.trim();
      return Some(strip_quoted(v).unwrap_or(v).to_string());
    }
  }
  None
}

/// When the source appends a literal to the printed list, splice it into the
/// rendered value: `[1, 2, 3]` + `numbers.append(4)` -> `[1, 2, 3, 4]`.
fn apply_append(name: &str, raw: &str, full_code: &str) -> Option<String> {
  let append_re =
    Regex::new(&format!(r"{}\.append\(([^)]+)\)", regex::escape(name))).ok()?;
  let arg = append_re.captures(full_code)?.get(1)?.as_str().trim().to_string();
  let without_close = raw.strip_suffix(']')?;
  if without_close.trim_end_matches(|c: char| c.is_whitespace()).ends_with('[') {
    Some(format!("[{}]", arg))
  } else {
    Some(format!("{}, {}]", without_close, arg))
  }
}

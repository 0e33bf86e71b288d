//! Syntactic safety filter run before any execution attempt.
//!
//! This is a conservative deny-list, not a sandbox: false negatives are
//! acceptable. The real bound on a hostile or runaway submission is the
//! interpreter bridge's execution timeout.

use std::sync::LazyLock;

use regex::Regex;

/// Constructs we refuse to execute: process/file/system access, dynamic code
/// evaluation, and global-namespace introspection. A bare `import sys` is
/// blocked, while longer module names such as `import sysconfig` stay
/// allowed.
static DENY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  [
    r"import\s+os\b",
    r"import\s+subprocess\b",
    r"import\s+sys\s*(?:[^a-zA-Z]|$)",
    r"exec\s*\(",
    r"eval\s*\(",
    r"__import__",
    r"open\s*\(",
    r"file\s*\(",
    r"compile\s*\(",
    r"globals\s*\(\s*\)\s*\[",
    r"locals\s*\(\s*\)\s*\[",
  ]
  .iter()
  .map(|p| Regex::new(p).expect("deny-list pattern must compile"))
  .collect()
});

/// True when the code matches none of the deny-list patterns.
pub fn is_safe(code: &str) -> bool {
  !DENY_PATTERNS.iter().any(|re| re.is_match(code))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blocks_dangerous_constructs() {
    assert!(!is_safe("import os"));
    assert!(!is_safe("import subprocess\nsubprocess.run(['rm'])"));
    assert!(!is_safe("import sys"));
    assert!(!is_safe("exec('print(1)')"));
    assert!(!is_safe("eval('1+1')"));
    assert!(!is_safe("__import__('os')"));
    assert!(!is_safe("open('secret.txt')"));
    assert!(!is_safe("globals()['x'] = 1"));
  }

  #[test]
  fn permits_curriculum_code() {
    assert!(is_safe("print('hi')"));
    assert!(is_safe("name = '파이썬'\nprint(f'안녕, {name}!')"));
    assert!(is_safe("for i in range(1, 4):\n    print(i)"));
    // Longer module names starting with "sys" are not the blocked module.
    assert!(is_safe("import sysconfig"));
  }
}

//! Built-in lesson bank and the catalog the rest of the backend reads from.
//!
//! The curriculum is a fixed, ordered set of 15 Python lessons for
//! Korean-speaking beginners. An optional TOML bank (see `config.rs`) can
//! append lessons after the built-in ones; ids must stay a dense 1..N
//! sequence, so config entries that collide or leave a gap are skipped.

use std::collections::HashMap;

use tracing::{error, info};

use crate::config::LessonCfg;
use crate::domain::Lesson;

fn lesson(
  id: u32,
  title: &str,
  task: &str,
  starter_code: &str,
  expected_output: &str,
  hint: &str,
  hint_explain: &str,
  solution: &str,
) -> Lesson {
  Lesson {
    id,
    title: title.into(),
    task: task.into(),
    starter_code: starter_code.into(),
    expected_output: expected_output.into(),
    hint: hint.into(),
    hint_explain: hint_explain.into(),
    solution: solution.into(),
  }
}

/// The built-in curriculum. Ordering is the learning path.
pub fn seed_lessons() -> Vec<Lesson> {
  vec![
    lesson(
      1,
      "안녕, 세상아!",
      "화면에 '안녕, 세상아!' 라고 출력해보세요.",
      "# 아래 코드에서 ??? 부분을 채워보세요!\nprint('???')",
      "안녕, 세상아!",
      "print('안녕, 세상아!')",
      "print() 안에 출력하고 싶은 글자를 작은따옴표로 감싸서 넣으면 돼요!",
      "print('안녕, 세상아!')",
    ),
    lesson(
      2,
      "숫자 담는 상자 (변수)",
      "'age'라는 이름의 상자에 25를 넣고, 그 상자 안의 숫자를 출력해보세요.",
      "# ??? 부분을 채워보세요!\nage = ???\nprint(age)",
      "25",
      "age = 25\nprint(age)",
      "첫 줄에서 age라는 상자에 25를 넣고, 둘째 줄에서 상자 안의 값을 출력해요!",
      "age = 25\nprint(age)",
    ),
    lesson(
      3,
      "글자 담는 상자 (문자열)",
      "'name' 상자에 '파이썬'을 넣고, '안녕, 파이썬!' 이라고 출력해보세요.",
      "# ??? 부분을 채워보세요!\nname = '???'\nprint(f'안녕, {name}!')",
      "안녕, 파이썬!",
      "name = '파이썬'\nprint(f'안녕, {name}!')",
      "f를 붙이고 중괄호 {name} 안에 변수 이름을 넣으면 그 값이 들어가요!",
      "name = '파이썬'\nprint(f'안녕, {name}!')",
    ),
    lesson(
      4,
      "변수 값 넣어서 출력하기",
      "color 변수에 '파랑'을 넣고, '내가 좋아하는 색은 파랑이야' 라고 출력해보세요.",
      "# ??? 부분을 채워보세요!\ncolor = '???'\nprint(f'내가 좋아하는 색은 {color}이야')",
      "내가 좋아하는 색은 파랑이야",
      "color = '파랑'\nprint(f'내가 좋아하는 색은 {color}이야')",
      "color에 '파랑'을 넣으면 {color} 자리에 '파랑'이 들어가요!",
      "color = '파랑'\nprint(f'내가 좋아하는 색은 {color}이야')",
    ),
    lesson(
      5,
      "계산기 만들기",
      "15 + 27 을 계산해서 결과를 출력해보세요.",
      "# ??? 부분에 계산식을 넣으세요!\nprint(??? + ???)",
      "42",
      "print(15 + 27)",
      "print() 안에 계산식을 넣으면 자동으로 계산해서 결과를 보여줘요!",
      "print(15 + 27)",
    ),
    lesson(
      6,
      "만약에... (조건문)",
      "숫자 10이 5보다 큰지 확인하고, 크다면 '10은 5보다 커요' 라고 출력해보세요.",
      "# ??? 부분을 채워보세요!\nnumber = 10\nif number > ???:\n    print('10은 5보다 커요')",
      "10은 5보다 커요",
      "number = 10\nif number > 5:\n    print('10은 5보다 커요')",
      "if 다음 줄은 반드시 스페이스 4칸 들여쓰기를 해야 해요! 탭 키를 눌러도 돼요.",
      "number = 10\nif number > 5:\n    print('10은 5보다 커요')",
    ),
    lesson(
      7,
      "반복하기 (for 반복문)",
      "1부터 3까지 숫자를 차례대로 출력해보세요.",
      "# ??? 부분을 채워보세요! (1부터 3까지)\nfor i in range(???, ???):\n    print(i)",
      "1\n2\n3",
      "for i in range(1, 4):\n    print(i)",
      "range(1, 4)는 1, 2, 3을 차례로 i에 넣어줘요. 4는 포함 안 돼요!",
      "for i in range(1, 4):\n    print(i)",
    ),
    lesson(
      8,
      "조건 반복 (while 반복문)",
      "1부터 3까지 숫자를 while 반복문으로 출력해보세요.",
      "# ??? 부분을 채워보세요!\ncount = 1\nwhile count <= ???:\n    print(count)\n    count += 1",
      "1\n2\n3",
      "count = 1\nwhile count <= 3:\n    print(count)\n    count += 1",
      "count += 1 은 count를 1씩 증가시켜요. 이게 없으면 무한 반복돼요!",
      "count = 1\nwhile count <= 3:\n    print(count)\n    count += 1",
    ),
    lesson(
      9,
      "여러 개 담기 (리스트)",
      "과일 리스트 ['사과', '바나나', '오렌지']를 만들고, 두 번째 과일을 출력해보세요.",
      "# ??? 부분을 채워보세요! (두번째 과일 출력)\nfruits = ['사과', '바나나', '오렌지']\nprint(fruits[???])",
      "바나나",
      "fruits = ['사과', '바나나', '오렌지']\nprint(fruits[1])",
      "리스트 순서는 0부터 시작해요! 첫번째=0, 두번째=1, 세번째=2",
      "fruits = ['사과', '바나나', '오렌지']\nprint(fruits[1])",
    ),
    lesson(
      10,
      "리스트에 추가하기",
      "숫자 리스트 [1, 2, 3]을 만들고, 4를 추가한 후 전체 리스트를 출력해보세요.",
      "# ??? 부분을 채워보세요!\nnumbers = [1, 2, 3]\nnumbers.append(???)\nprint(numbers)",
      "[1, 2, 3, 4]",
      "numbers = [1, 2, 3]\nnumbers.append(4)\nprint(numbers)",
      ".append()는 리스트 맨 끝에 새 값을 추가해요!",
      "numbers = [1, 2, 3]\nnumbers.append(4)\nprint(numbers)",
    ),
    lesson(
      11,
      "나만의 명령어 (함수)",
      "'greet'라는 함수를 만들어서 '안녕하세요!'를 출력하게 하고, 그 함수를 실행해보세요.",
      "# ??? 부분을 채워보세요!\ndef greet():\n    print('???')\n\ngreet()",
      "안녕하세요!",
      "def greet():\n    print('안녕하세요!')\n\ngreet()",
      "def로 함수를 만들고, 마지막에 함수이름()으로 실행해요!",
      "def greet():\n    print('안녕하세요!')\n\ngreet()",
    ),
    lesson(
      12,
      "함수에 값 전달하기",
      "'say_hello' 함수를 만들어서 이름을 받아 '안녕, 이름!' 을 출력하세요. '친구'로 테스트해보세요.",
      "# ??? 부분을 채워보세요!\ndef say_hello(name):\n    print(f'안녕, {name}!')\n\nsay_hello('???')",
      "안녕, 친구!",
      "def say_hello(name):\n    print(f'안녕, {name}!')\n\nsay_hello('친구')",
      "괄호 안의 name이 매개변수예요. '친구'를 넣으면 name에 '친구'가 들어가요!",
      "def say_hello(name):\n    print(f'안녕, {name}!')\n\nsay_hello('친구')",
    ),
    lesson(
      13,
      "이름표 붙은 상자 (딕셔너리)",
      "사람 정보를 담은 딕셔너리를 만들어보세요: 이름은 '민수', 나이는 30. 그리고 이름을 출력하세요.",
      "# ??? 부분을 채워보세요!\nperson = {'name': '???', 'age': ???}\nprint(person['name'])",
      "민수",
      "person = {'name': '민수', 'age': 30}\nprint(person['name'])",
      "딕셔너리는 중괄호 {}를 써요. 값을 꺼낼 때는 대괄호 []에 키를 넣어요!",
      "person = {'name': '민수', 'age': 30}\nprint(person['name'])",
    ),
    lesson(
      14,
      "글자 변환하기",
      "'python programming' 을 전부 대문자로 바꿔서 출력해보세요.",
      "# ??? 부분을 채워보세요! (대문자로 바꾸기)\ntext = 'python programming'\nprint(text.???())",
      "PYTHON PROGRAMMING",
      "text = 'python programming'\nprint(text.upper())",
      ".upper()는 대문자로, .lower()는 소문자로 바꿔줘요!",
      "text = 'python programming'\nprint(text.upper())",
    ),
    lesson(
      15,
      "🏆 최종 도전!",
      "숫자 리스트 [1,2,3,4,5]를 만들고, for 반복문으로 각 숫자에 2를 곱한 값을 출력해보세요.",
      "# ??? 부분을 채워보세요! (각 숫자 x 2)\nnumbers = [1, 2, 3, 4, 5]\nfor num in numbers:\n    print(num * ???)",
      "2\n4\n6\n8\n10",
      "numbers = [1, 2, 3, 4, 5]\nfor num in numbers:\n    print(num * 2)",
      "리스트의 각 값이 num에 차례로 들어가고, 2를 곱해서 출력해요!",
      "numbers = [1, 2, 3, 4, 5]\nfor num in numbers:\n    print(num * 2)",
    ),
  ]
}

/// Ordered, immutable lesson catalog. Built once at startup.
pub struct LessonCatalog {
  lessons: Vec<Lesson>,
  by_id: HashMap<u32, usize>,
}

impl LessonCatalog {
  /// Build from the seed bank plus optional config entries.
  pub fn build(extra: &[LessonCfg]) -> Self {
    let mut lessons = seed_lessons();
    let mut next_id = lessons.len() as u32 + 1;

    for cfg in extra {
      if cfg.id != next_id {
        // Ids must stay dense 1..N; built-ins own 1..=15.
        error!(target: "lesson", id = cfg.id, expected = next_id,
          "Skipping bank lesson: id breaks the dense sequence");
        continue;
      }
      if cfg.expected_output.is_empty() || cfg.solution.is_empty() {
        error!(target: "lesson", id = cfg.id, "Skipping bank lesson: missing expected_output or solution");
        continue;
      }
      lessons.push(Lesson {
        id: cfg.id,
        title: cfg.title.clone(),
        task: cfg.task.clone(),
        starter_code: cfg.starter_code.clone(),
        expected_output: cfg.expected_output.clone(),
        hint: cfg.hint.clone(),
        hint_explain: cfg.hint_explain.clone(),
        solution: cfg.solution.clone(),
      });
      next_id += 1;
    }

    let by_id = lessons
      .iter()
      .enumerate()
      .map(|(idx, l)| (l.id, idx))
      .collect::<HashMap<_, _>>();

    let built_in = seed_lessons().len();
    info!(target: "lesson", total = lessons.len(), built_in,
      from_bank = lessons.len() - built_in, "Startup lesson inventory");

    Self { lessons, by_id }
  }

  pub fn get(&self, id: u32) -> Option<&Lesson> {
    self.by_id.get(&id).map(|idx| &self.lessons[*idx])
  }

  pub fn all(&self) -> &[Lesson] {
    &self.lessons
  }

  pub fn total_lessons(&self) -> u32 {
    self.lessons.len() as u32
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn seed_ids_are_dense_from_one() {
    let catalog = LessonCatalog::build(&[]);
    for (i, l) in catalog.all().iter().enumerate() {
      assert_eq!(l.id, i as u32 + 1);
    }
    assert_eq!(catalog.total_lessons(), 15);
    assert_eq!(catalog.get(1).map(|l| l.id), Some(1));
    assert!(catalog.get(99).is_none());
  }

  #[test]
  fn bank_lessons_must_extend_the_sequence() {
    let good = LessonCfg {
      id: 16,
      title: "추가 레슨".into(),
      task: "출력해보세요.".into(),
      starter_code: "print('???')".into(),
      expected_output: "추가".into(),
      hint: String::new(),
      hint_explain: String::new(),
      solution: "print('추가')".into(),
    };
    let clash = LessonCfg { id: 3, ..good.clone() };
    let catalog = LessonCatalog::build(&[clash, good]);
    assert_eq!(catalog.total_lessons(), 16);
    assert_eq!(catalog.get(16).map(|l| l.title.as_str()), Some("추가 레슨"));
    // The colliding entry did not overwrite the built-in lesson.
    assert_eq!(catalog.get(3).map(|l| l.title.as_str()), Some("글자 담는 상자 (문자열)"));
  }
}

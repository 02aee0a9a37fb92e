//! Problem catalog: built-in seed problems plus optional entries from the TOML bank.
//!
//! The catalog is ordered (display order) and immutable after startup.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::ProblemCfg;
use crate::domain::{Difficulty, ProblemRecord};

const CLONE_PROMPT: &str = "    # 왼쪽의 정답 코드를 보며 그대로 따라 작성해보세요.";

#[derive(Clone, Debug, Default)]
pub struct Catalog {
  problems: Vec<Arc<ProblemRecord>>,
}

impl Catalog {
  pub fn new(problems: Vec<ProblemRecord>) -> Self {
    let mut out: Vec<Arc<ProblemRecord>> = Vec::with_capacity(problems.len());
    for p in problems {
      if out.iter().any(|q| q.id == p.id) {
        error!(target: "catalog", id = %p.id, "Duplicate problem id; keeping the first entry");
        continue;
      }
      out.push(Arc::new(p));
    }
    Self { problems: out }
  }

  /// Seeds first, then the TOML bank: same id replaces the seed in place, new ids are appended.
  pub fn with_bank(seeds: Vec<ProblemRecord>, bank: &[ProblemCfg]) -> Self {
    let mut problems = seeds;
    for cfg in bank {
      let Some(p) = problem_from_cfg(cfg) else { continue };
      match problems.iter_mut().find(|q| q.id == p.id) {
        Some(slot) => {
          info!(target: "catalog", id = %p.id, "Bank entry overrides built-in problem");
          *slot = p;
        }
        None => problems.push(p),
      }
    }
    Self::new(problems)
  }

  pub fn get(&self, id: &str) -> Option<Arc<ProblemRecord>> {
    self.problems.iter().find(|p| p.id == id).cloned()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Arc<ProblemRecord>> {
    self.problems.iter()
  }

  pub fn len(&self) -> usize { self.problems.len() }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool { self.problems.is_empty() }
}

fn problem_from_cfg(cc: &ProblemCfg) -> Option<ProblemRecord> {
  let reference_code = match &cc.reference_code {
    Some(s) if !s.trim().is_empty() => s.clone(),
    _ => {
      // Nothing to clone without a reference.
      error!(target: "catalog", id = %cc.id, "Skipping bank item: missing reference_code.");
      return None;
    }
  };
  let boilerplate = cc.boilerplate.clone().unwrap_or_else(|| derive_boilerplate(&reference_code));
  Some(ProblemRecord {
    id: cc.id.clone(),
    title: cc.title.clone(),
    category: cc.category.clone().unwrap_or_else(|| "기타 (Misc)".into()),
    difficulty: cc.difficulty.unwrap_or(Difficulty::Medium),
    description: cc.description.clone().unwrap_or_default(),
    language: cc.language.clone().unwrap_or_else(|| "Python".into()),
    reference_code,
    boilerplate,
    test_cases: cc.test_cases.clone(),
  })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Header {
  Def,
  Class,
}

fn header_kind(stripped: &str) -> Option<Header> {
  if stripped.starts_with("def ") || stripped.starts_with("async def ") {
    Some(Header::Def)
  } else if stripped.starts_with("class ") {
    Some(Header::Class)
  } else {
    None
  }
}

/// A header is complete once its last code line (comment stripped) ends in `:`.
fn ends_header(line: &str) -> bool {
  let code = line.split('#').next().unwrap_or(line);
  code.trim_end().ends_with(':')
}

/// Builds a starter file from a reference: top-level statements and signatures
/// survive, function bodies become the clone prompt plus `pass`.
#[derive(Default)]
struct Stubber {
  out: Vec<String>,
  prompted: bool,
  /// Last emitted line closed a stubbed body; the next block gets a blank line.
  after_body: bool,
  /// Indent of the function whose body is being dropped.
  skip_deeper_than: Option<usize>,
  /// Open classes: leading whitespace and whether any member was kept.
  classes: Vec<(String, bool)>,
  /// Multi-line header still waiting for its `:`.
  pending: Option<(String, Header)>,
}

impl Stubber {
  fn line(&mut self, line: &str) {
    if line.trim().is_empty() {
      return;
    }
    let stripped = line.trim_start();
    let lead = &line[..line.len() - stripped.len()];

    if let Some((open_lead, kind)) = self.pending.take() {
      self.out.push(line.to_string());
      if ends_header(line) {
        self.close_header(&open_lead, kind);
      } else {
        self.pending = Some((open_lead, kind));
      }
      return;
    }

    let indent = lead.len();
    if self.skip_deeper_than.is_some_and(|d| indent > d) {
      return;
    }
    self.skip_deeper_than = None;
    while self.classes.last().is_some_and(|(l, _)| l.len() >= indent) {
      self.pop_class();
    }

    let kind = header_kind(stripped);
    let member = kind.is_some() || stripped.starts_with('@');
    match self.classes.last_mut() {
      Some(class) if member => class.1 = true,
      // Class attributes and docstrings are part of what the learner types.
      Some(_) => return,
      None => {}
    }
    if member && self.after_body {
      self.out.push(String::new());
      self.after_body = false;
    }
    self.out.push(line.to_string());

    if let Some(kind) = kind {
      if ends_header(line) {
        self.close_header(lead, kind);
      } else {
        self.pending = Some((lead.to_string(), kind));
      }
    }
  }

  fn close_header(&mut self, lead: &str, kind: Header) {
    match kind {
      Header::Def => {
        if !self.prompted {
          self.out.push(format!("{lead}{CLONE_PROMPT}"));
          self.prompted = true;
        }
        self.out.push(format!("{lead}    pass"));
        self.skip_deeper_than = Some(lead.len());
        self.after_body = true;
      }
      Header::Class => self.classes.push((lead.to_string(), false)),
    }
  }

  fn pop_class(&mut self) {
    if let Some((lead, false)) = self.classes.pop() {
      self.out.push(format!("{lead}    pass"));
      self.after_body = true;
    }
  }

  fn finish(mut self) -> String {
    while !self.classes.is_empty() {
      self.pop_class();
    }
    self.out.join("\n")
  }
}

/// Used when a bank entry omits its boilerplate.
fn derive_boilerplate(reference: &str) -> String {
  let mut stub = Stubber::default();
  for line in reference.lines() {
    stub.line(line);
  }
  stub.finish()
}

/// Built-in problems that make the app useful without any external config.
pub fn seed_problems() -> Vec<ProblemRecord> {
  vec![
    ProblemRecord {
      id: "binary-search".into(),
      title: "이진 탐색 (Binary Search)".into(),
      category: "탐색 (Search)".into(),
      difficulty: Difficulty::Easy,
      description: "정렬된 리스트에서 특정 값을 찾는 효율적인 알고리즘입니다. 범위를 반씩 줄여가며 탐색합니다.".into(),
      language: "Python".into(),
      reference_code: r#"def binary_search(nums: list[int], target: int) -> int:
    left, right = 0, len(nums) - 1

    while left <= right:
        # 중간 인덱스 계산 (정수 나눗셈)
        mid = (left + right) // 2

        if nums[mid] == target:
            return mid  # 값을 찾음
        elif nums[mid] < target:
            left = mid + 1  # 오른쪽 절반 탐색
        else:
            right = mid - 1  # 왼쪽 절반 탐색

    return -1  # 값을 찾지 못함"#.into(),
      boilerplate: format!("def binary_search(nums: list[int], target: int) -> int:\n{CLONE_PROMPT}\n    pass"),
      test_cases: vec![
        "nums = [-1,0,3,5,9,12], target = 9 => 4".into(),
        "nums = [-1,0,3,5,9,12], target = 2 => -1".into(),
      ],
    },
    ProblemRecord {
      id: "valid-parentheses".into(),
      title: "유효한 괄호 (Valid Parentheses)".into(),
      category: "스택 (Stack)".into(),
      difficulty: Difficulty::Easy,
      description: "괄호가 올바르게 닫혔는지 확인하는 문제입니다. 여는 괄호는 스택에 넣고, 닫는 괄호는 스택에서 꺼내 짝을 맞춥니다.".into(),
      language: "Python".into(),
      reference_code: r#"def is_valid(s: str) -> bool:
    stack = []
    # 닫는 괄호를 키로, 여는 괄호를 값으로 매핑
    mapping = {")": "(", "}": "{", "]": "["}

    for char in s:
        if char in mapping:
            # 닫는 괄호인 경우: 스택 top과 비교
            top_element = stack.pop() if stack else '#'

            if mapping[char] != top_element:
                return False
        else:
            # 여는 괄호인 경우: 스택에 추가
            stack.append(char)

    # 스택이 비어있어야 모든 괄호가 짝이 맞음
    return not stack"#.into(),
      boilerplate: format!("def is_valid(s: str) -> bool:\n{CLONE_PROMPT}\n    pass"),
      test_cases: vec![
        r#"s = "()[]{}" => True"#.into(),
        r#"s = "(]" => False"#.into(),
      ],
    },
    ProblemRecord {
      id: "bubble-sort".into(),
      title: "버블 정렬 (Bubble Sort)".into(),
      category: "정렬 (Sorting)".into(),
      difficulty: Difficulty::Easy,
      description: "인접한 두 원소를 비교하여 큰 값을 뒤로 보내는 정렬 방식입니다. 구현이 간단하지만 느립니다.".into(),
      language: "Python".into(),
      reference_code: r#"def bubble_sort(arr: list[int]) -> list[int]:
    n = len(arr)

    for i in range(n):
        # 마지막 i개는 이미 정렬된 상태이므로 제외
        for j in range(0, n - 1 - i):
            # 인접한 두 원소 비교
            if arr[j] > arr[j + 1]:
                # 위치 교환 (Swap)
                arr[j], arr[j + 1] = arr[j + 1], arr[j]

    return arr"#.into(),
      boilerplate: format!("def bubble_sort(arr: list[int]) -> list[int]:\n{CLONE_PROMPT}\n    pass"),
      test_cases: vec!["arr = [5, 3, 8, 4, 2] => [2, 3, 4, 5, 8]".into()],
    },
    ProblemRecord {
      id: "dfs-recursive".into(),
      title: "깊이 우선 탐색 (DFS)".into(),
      category: "그래프 (Graph)".into(),
      difficulty: Difficulty::Medium,
      description: "그래프의 깊은 부분을 우선적으로 탐색하는 알고리즘입니다. 재귀(Recursion)를 사용하여 구현합니다.".into(),
      language: "Python".into(),
      reference_code: r#"def dfs(graph: dict, start_node: str, visited: set = None) -> list[str]:
    if visited is None:
        visited = set()

    result = []

    # 1. 현재 노드 방문 처리
    visited.add(start_node)
    result.append(start_node)

    # 2. 인접 노드 순회
    # graph.get(key, [])를 사용하여 키가 없을 경우 빈 리스트 반환
    for neighbor in graph.get(start_node, []):
        if neighbor not in visited:
            # 방문하지 않은 노드라면 재귀 호출
            result.extend(dfs(graph, neighbor, visited))

    return result"#.into(),
      boilerplate: format!("def dfs(graph: dict, start_node: str, visited: set = None) -> list[str]:\n{CLONE_PROMPT}\n    pass"),
      test_cases: vec![
        r#"graph = {"A":["B","C"], "B":["D"], "C":["E"]}, start = "A" => ["A", "B", "D", "C", "E"]"#.into(),
      ],
    },
    ProblemRecord {
      id: "bfs-iterative".into(),
      title: "너비 우선 탐색 (BFS)".into(),
      category: "그래프 (Graph)".into(),
      difficulty: Difficulty::Medium,
      description: "가까운 노드부터 탐색하는 알고리즘입니다. 큐(Queue/Deque)를 사용하여 레벨 단위로 탐색합니다.".into(),
      language: "Python".into(),
      reference_code: r#"from collections import deque

def bfs(graph: dict, start_node: str) -> list[str]:
    visited = set()
    queue = deque([start_node])

    visited.add(start_node)
    result = []

    while queue:
        # 큐의 앞에서 노드를 꺼냄 (FIFO)
        node = queue.popleft()
        result.append(node)

        for neighbor in graph.get(node, []):
            if neighbor not in visited:
                visited.add(neighbor)
                queue.append(neighbor)

    return result"#.into(),
      boilerplate: format!("from collections import deque\n\ndef bfs(graph: dict, start_node: str) -> list[str]:\n{CLONE_PROMPT}\n    pass"),
      test_cases: vec![
        r#"graph = {"A":["B","C"], "B":["D"], "C":["E"]}, start = "A" => ["A", "B", "C", "D", "E"]"#.into(),
      ],
    },
    ProblemRecord {
      id: "merge-sort".into(),
      title: "병합 정렬 (Merge Sort)".into(),
      category: "정렬 (Sorting)".into(),
      difficulty: Difficulty::Medium,
      description: "리스트를 반으로 나누고(Divide), 정렬 후 병합(Conquer)하는 분할 정복 알고리즘입니다.".into(),
      language: "Python".into(),
      reference_code: r#"def merge_sort(arr: list[int]) -> list[int]:
    # Base case: 원소가 1개 이하면 이미 정렬됨
    if len(arr) <= 1:
        return arr

    # 분할 (Divide)
    mid = len(arr) // 2
    left = merge_sort(arr[:mid])
    right = merge_sort(arr[mid:])

    # 병합 (Merge)
    return merge(left, right)

def merge(left: list[int], right: list[int]) -> list[int]:
    result = []
    l = r = 0

    # 두 리스트를 비교하며 병합
    while l < len(left) and r < len(right):
        if left[l] < right[r]:
            result.append(left[l])
            l += 1
        else:
            result.append(right[r])
            r += 1

    # 남은 요소들 추가
    result.extend(left[l:])
    result.extend(right[r:])

    return result"#.into(),
      boilerplate: format!(
        "def merge_sort(arr: list[int]) -> list[int]:\n{CLONE_PROMPT}\n    pass\n\ndef merge(left: list[int], right: list[int]) -> list[int]:\n    pass"
      ),
      test_cases: vec!["arr = [38, 27, 43, 3, 9, 82, 10] => [3, 9, 10, 27, 38, 43, 82]".into()],
    },
    ProblemRecord {
      id: "fibonacci-dp".into(),
      title: "피보나치 수열 (Fibonacci)".into(),
      category: "동적계획법 (DP)".into(),
      difficulty: Difficulty::Easy,
      description: "이전 두 수의 합이 다음 수가 되는 수열입니다. 반복문을 사용하여 효율적으로 계산하는 방법을 연습합니다.".into(),
      language: "Python".into(),
      reference_code: r#"def fibonacci(n: int) -> int:
    if n <= 1:
        return n

    # 두 변수만 사용하여 공간 복잡도 O(1)로 최적화
    a, b = 0, 1

    for _ in range(2, n + 1):
        # a는 이전 값, b는 현재 값
        a, b = b, a + b

    return b"#.into(),
      boilerplate: format!("def fibonacci(n: int) -> int:\n{CLONE_PROMPT}\n    pass"),
      test_cases: vec!["n = 10 => 55".into(), "n = 5 => 5".into()],
    },
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cfg(id: &str, reference: Option<&str>) -> ProblemCfg {
    ProblemCfg {
      id: id.into(),
      title: format!("Title {id}"),
      category: None,
      difficulty: None,
      description: None,
      language: None,
      reference_code: reference.map(Into::into),
      boilerplate: None,
      test_cases: vec![],
    }
  }

  #[test]
  fn seeds_have_unique_ids_and_stubbed_boilerplate() {
    let seeds = seed_problems();
    let catalog = Catalog::new(seeds.clone());
    assert_eq!(catalog.len(), seeds.len());
    for p in catalog.iter() {
      assert!(p.boilerplate.contains("pass"), "{} boilerplate", p.id);
      assert_ne!(p.boilerplate, p.reference_code);
      assert!(!p.test_cases.is_empty());
    }
    assert_eq!(catalog.iter().next().map(|p| p.id.as_str()), Some("binary-search"));
  }

  #[test]
  fn bank_overrides_in_place_and_appends_new_ids() {
    let mut over = cfg("bubble-sort", Some("def bubble_sort(arr):\n    return sorted(arr)"));
    over.boilerplate = Some("pass".into());
    let bank = vec![over, cfg("two-sum", Some("def two_sum(nums, target):\n    return []"))];
    let catalog = Catalog::with_bank(seed_problems(), &bank);

    let ids: Vec<&str> = catalog.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids[2], "bubble-sort");
    assert_eq!(ids.last().copied(), Some("two-sum"));
    assert_eq!(catalog.get("bubble-sort").unwrap().boilerplate, "pass");
    assert_eq!(catalog.get("two-sum").unwrap().difficulty, Difficulty::Medium);
  }

  #[test]
  fn bank_entry_without_reference_is_skipped() {
    let catalog = Catalog::with_bank(vec![], &[cfg("empty", None), cfg("blank", Some("   "))]);
    assert!(catalog.is_empty());
  }

  #[test]
  fn duplicate_ids_keep_first() {
    let mut seeds = seed_problems();
    let mut dup = seeds[0].clone();
    dup.title = "other".into();
    seeds.push(dup);
    let catalog = Catalog::new(seeds);
    assert_eq!(catalog.get("binary-search").unwrap().title, "이진 탐색 (Binary Search)");
  }

  #[test]
  fn derived_boilerplate_keeps_signatures() {
    let reference = "from collections import deque\n\ndef bfs(g, s):\n    q = deque([s])\n    return []\n\ndef helper(x):\n    return x";
    let bp = derive_boilerplate(reference);
    assert_eq!(
      bp,
      format!("from collections import deque\ndef bfs(g, s):\n{CLONE_PROMPT}\n    pass\n\ndef helper(x):\n    pass")
    );
  }

  #[test]
  fn derived_boilerplate_closes_multi_line_signatures() {
    let reference = "def merge(\n    left: list[int],\n    right: list[int],  # sorted\n) -> list[int]:\n    out = []\n    return out";
    assert_eq!(
      derive_boilerplate(reference),
      format!("def merge(\n    left: list[int],\n    right: list[int],  # sorted\n) -> list[int]:\n{CLONE_PROMPT}\n    pass")
    );
  }

  #[test]
  fn derived_boilerplate_stubs_async_functions() {
    let reference = "async def fetch(url):\n    return await get(url)";
    assert_eq!(derive_boilerplate(reference), format!("async def fetch(url):\n{CLONE_PROMPT}\n    pass"));
  }

  #[test]
  fn derived_boilerplate_keeps_class_methods() {
    let reference = "class Solution:\n    \"\"\"Two sum.\"\"\"\n\n    def two_sum(self, nums, target):\n        seen = {}\n        return []\n\n    @staticmethod\n    def helper(x):\n        return x\n\nclass Empty:\n    size = 0";
    assert_eq!(
      derive_boilerplate(reference),
      format!(
        "class Solution:\n    def two_sum(self, nums, target):\n    {CLONE_PROMPT}\n        pass\n\n    @staticmethod\n    def helper(x):\n        pass\n\nclass Empty:\n    pass"
      )
    );
  }
}

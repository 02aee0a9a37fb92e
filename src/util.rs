//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values in a single
/// pass: inserted values are never rescanned, and unknown `{...}` spans are kept as-is.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let tail = &rest[open + 1..];
    let value = tail
      .find(|c: char| c == '}' || c == '{')
      .filter(|&end| tail[end..].starts_with('}'))
      .and_then(|end| pairs.iter().find(|(k, _)| *k == &tail[..end]).map(|(_, v)| (end, *v)));
    match value {
      Some((end, v)) => {
        out.push_str(v);
        rest = &tail[end + 1..];
      }
      None => {
        out.push('{');
        rest = tail;
      }
    }
  }
  out.push_str(rest);
  out
}

/// True for empty or whitespace-only editor text.
pub fn is_blank(s: &str) -> bool {
  s.trim().is_empty()
}

/// Strip a surrounding Markdown code fence (```json ... ```), if any.
pub fn strip_code_fence(s: &str) -> &str {
  let t = s.trim();
  let Some(rest) = t.strip_prefix("```") else { return t };
  let Some(body) = rest.strip_suffix("```") else { return t };
  // Drop the info string ("json") on the opening line.
  match body.find('\n') {
    Some(nl) => body[nl + 1..].trim(),
    None => body.trim(),
  }
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) { cut -= 1; }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

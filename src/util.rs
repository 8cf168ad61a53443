//! Small utility helpers used across modules.

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge generator payloads. Cuts on a char boundary.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let cut = s.char_indices().map(|(i, _)| i).take_while(|i| *i <= max).last().unwrap_or(0);
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

/// Split a free-text word list ("sol, luna\nmarte") into trimmed entries.
pub fn split_word_list(text: &str) -> Vec<String> {
  text
    .split(|c: char| c == ',' || c == ';' || c == '\n')
    .map(str::trim)
    .filter(|w| !w.is_empty())
    .map(String::from)
    .collect()
}

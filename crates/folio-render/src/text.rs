//! Fixed-advance text helpers shared by the reflowing families.

/// Greedy word wrap to at most `max_chars` characters per line. Words longer
/// than a line are split.
#[must_use = "returns the wrapped lines"]
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > max_chars {
            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            let rest = chars.split_off(max_chars);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        let len = chars.len();
        if len == 0 {
            continue;
        }
        if line_len > 0 && line_len + 1 + len > max_chars {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }
        if line_len > 0 {
            line.push(' ');
            line_len += 1;
        }
        line.extend(chars);
        line_len += len;
    }
    if line_len > 0 {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("aa bb cc", 5), ["aa bb", "cc"]);
        assert_eq!(wrap_text("abcdefg hi", 3), ["abc", "def", "g", "hi"]);
        assert!(wrap_text("   ", 10).is_empty());
        assert_eq!(wrap_text("x", 0), ["x"]);
    }
}

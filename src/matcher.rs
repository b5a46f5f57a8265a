/// How expected content is compared with what is actually in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Byte-for-byte equality
    Exact,
    /// Same number of lines, each equal once trailing whitespace is removed.
    /// Leading and interior whitespace still have to match. `\n`, `\r\n` and
    /// a lone `\r` all end a line.
    #[default]
    Flexible,
}

impl MatchMode {
    pub fn from_exact_flag(require_exact_match: bool) -> Self {
        if require_exact_match {
            MatchMode::Exact
        } else {
            MatchMode::Flexible
        }
    }

    /// Check if `actual` satisfies `expected` under this mode.
    pub fn matches(self, actual: &str, expected: &str) -> bool {
        content_matches(actual, expected, self == MatchMode::Exact)
    }

    pub fn describe(self) -> &'static str {
        match self {
            MatchMode::Exact => "exact whitespace match required",
            MatchMode::Flexible => "trailing whitespace ignored",
        }
    }
}

pub fn content_matches(actual: &str, expected: &str, exact: bool) -> bool {
    if exact {
        return actual == expected;
    }

    let mut actual_lines = TextLines(actual);
    let mut expected_lines = TextLines(expected);
    loop {
        match (actual_lines.next(), expected_lines.next()) {
            (None, None) => return true,
            (Some(a), Some(e)) if a.trim_end() == e.trim_end() => {}
            _ => return false,
        }
    }
}

/// Like [`str::lines`], but a lone `\r` also ends a line.
struct TextLines<'a>(&'a str);

impl<'a> Iterator for TextLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.0.is_empty() {
            return None;
        }
        let rest = self.0;
        match rest.find(['\n', '\r']) {
            Some(at) => {
                let width = if rest[at..].starts_with("\r\n") { 2 } else { 1 };
                self.0 = &rest[at + width..];
                Some(&rest[..at])
            }
            None => {
                self.0 = "";
                Some(rest)
            }
        }
    }
}

/// Strip a single trailing `\n` or `\r\n`.
pub fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Compare one line of the file with a caller-supplied line, ignoring the
/// terminator on both sides.
pub fn line_matches(actual_line: &str, expected_line: &str, mode: MatchMode) -> bool {
    mode.matches(strip_terminator(actual_line), strip_terminator(expected_line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_mode() {
        assert!(content_matches("a\n", "a\n", true));
        assert!(!content_matches("a \n", "a\n", true));
        assert!(!content_matches("a\n", "a", true));
    }

    #[test]
    fn test_flexible_ignores_trailing_whitespace() {
        assert!(content_matches("fn main() {  \n}\n", "fn main() {\n}\n", false));
        assert!(content_matches("a\t\r\n", "a", false));
    }

    #[test]
    fn test_flexible_keeps_leading_and_interior_whitespace() {
        assert!(!content_matches("  a\n", "a\n", false));
        assert!(!content_matches("a  b\n", "a b\n", false));
    }

    #[test]
    fn test_flexible_requires_equal_line_count() {
        assert!(!content_matches("a\nb\n", "a\n", false));
        assert!(!content_matches("a\n\n", "a\n", false));
        assert!(content_matches("", "", false));
    }

    #[test]
    fn test_flexible_terminator_agnostic() {
        assert!(content_matches("a\r\nb\r\n", "a\nb", false));
        assert!(content_matches("a\rb\r", "a\nb\n", false));
        assert!(content_matches("a \rb", "a\r\nb", false));
    }

    #[test]
    fn test_flexible_lone_cr_counts_as_break() {
        assert!(!content_matches("a\rb", "a b", false));
        assert!(!content_matches("a\r\rb", "a\nb", false));
        assert!(content_matches("a\r\rb", "a\n\nb", false));
    }

    #[test]
    fn test_line_matches_strips_terminator() {
        assert!(line_matches("A\n", "A", MatchMode::Exact));
        assert!(line_matches("A\r\n", "A\n", MatchMode::Exact));
        assert!(!line_matches("A \n", "A", MatchMode::Exact));
        assert!(line_matches("A \n", "A", MatchMode::Flexible));
    }

    #[test]
    fn test_strip_terminator() {
        assert_eq!(strip_terminator("x\r\n"), "x");
        assert_eq!(strip_terminator("x\n"), "x");
        assert_eq!(strip_terminator("x"), "x");
        assert_eq!(strip_terminator("x\n\n"), "x\n");
    }
}

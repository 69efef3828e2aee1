//! Whitespace normalization for captured output.
//!
//! Diffs should reflect content differences, not formatting noise. Each
//! line keeps its words, separated by exactly one space; lines that
//! hold nothing but whitespace are dropped.

/// Normalizes raw captured text into a sequence of comparison lines.
///
/// Pure function over its input. Idempotent: normalizing an already
/// normalized sequence changes nothing.
pub fn normalize_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_interior_runs_and_trims() {
        let lines = normalize_lines("  Hello,   World!  \n\tTotal:\t\t42\n");
        assert_eq!(lines, vec!["Hello, World!", "Total: 42"]);
    }

    #[test]
    fn test_blank_lines_dropped() {
        let lines = normalize_lines("a\n\n   \nb\n");
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_lines("  x   y \n\n z\n");
        let again = normalize_lines(&once.join("\n"));
        assert_eq!(once, again);
    }

    #[test]
    fn test_no_leading_whitespace_or_double_spaces_survive() {
        for line in normalize_lines("   a  b\n\t\tc   d  e\n") {
            assert!(!line.starts_with(char::is_whitespace));
            assert!(!line.contains("  "));
        }
    }
}

//! Line-based unified diff between reference and student output.

const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
enum DiffOp {
    Equal(String),
    Removed(String),
    Added(String),
}

/// Longest-common-subsequence edit script between the two sequences.
fn edit_script(correct: &[String], student: &[String]) -> Vec<DiffOp> {
    let (n, m) = (correct.len(), student.len());
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];

    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if correct[i] == student[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut ops = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if correct[i] == student[j] {
            ops.push(DiffOp::Equal(correct[i].clone()));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            ops.push(DiffOp::Removed(correct[i].clone()));
            i += 1;
        } else {
            ops.push(DiffOp::Added(student[j].clone()));
            j += 1;
        }
    }
    ops.extend(correct[i..].iter().cloned().map(DiffOp::Removed));
    ops.extend(student[j..].iter().cloned().map(DiffOp::Added));
    ops
}

struct Hunk {
    correct_start: usize,
    correct_len: usize,
    student_start: usize,
    student_len: usize,
    lines: Vec<String>,
}

/// Groups an edit script into hunks with up to [`CONTEXT_LINES`] of
/// surrounding unchanged lines, the way `diff -u` presents changes.
/// Changes separated by at most twice the context share a hunk.
fn build_hunks(ops: &[DiffOp]) -> Vec<Hunk> {
    let change_indices: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| !matches!(op, DiffOp::Equal(_)))
        .map(|(idx, _)| idx)
        .collect();
    if change_indices.is_empty() {
        return Vec::new();
    }

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let (mut start, mut prev) = (change_indices[0], change_indices[0]);
    for &idx in &change_indices[1..] {
        if idx - prev > 2 * CONTEXT_LINES {
            ranges.push((start, prev));
            start = idx;
        }
        prev = idx;
    }
    ranges.push((start, prev));

    // Line position in each sequence just before op i.
    let mut correct_pos = vec![0usize; ops.len() + 1];
    let mut student_pos = vec![0usize; ops.len() + 1];
    for (idx, op) in ops.iter().enumerate() {
        let in_correct = matches!(op, DiffOp::Equal(_) | DiffOp::Removed(_)) as usize;
        let in_student = matches!(op, DiffOp::Equal(_) | DiffOp::Added(_)) as usize;
        correct_pos[idx + 1] = correct_pos[idx] + in_correct;
        student_pos[idx + 1] = student_pos[idx] + in_student;
    }

    ranges
        .into_iter()
        .map(|(first, last)| {
            let lo = first.saturating_sub(CONTEXT_LINES);
            let hi = (last + CONTEXT_LINES + 1).min(ops.len());

            let mut hunk = Hunk {
                correct_start: correct_pos[lo] + 1,
                correct_len: 0,
                student_start: student_pos[lo] + 1,
                student_len: 0,
                lines: Vec::new(),
            };
            for op in &ops[lo..hi] {
                match op {
                    DiffOp::Equal(line) => {
                        hunk.lines.push(format!(" {line}"));
                        hunk.correct_len += 1;
                        hunk.student_len += 1;
                    }
                    DiffOp::Removed(line) => {
                        hunk.lines.push(format!("-{line}"));
                        hunk.correct_len += 1;
                    }
                    DiffOp::Added(line) => {
                        hunk.lines.push(format!("+{line}"));
                        hunk.student_len += 1;
                    }
                }
            }
            // An empty side is anchored to the line before the hunk,
            // as `diff -u` renders it (`-0,0` / `+0,0`).
            if hunk.correct_len == 0 {
                hunk.correct_start -= 1;
            }
            if hunk.student_len == 0 {
                hunk.student_start -= 1;
            }
            hunk
        })
        .collect()
}

/// Renders a unified diff of the two normalized sequences, labeled
/// `correct` and `student`. Identical sequences yield an empty string.
pub fn unified_diff(correct: &[String], student: &[String]) -> String {
    let ops = edit_script(correct, student);
    if ops
        .iter()
        .all(|op| matches!(op, DiffOp::Equal(_)))
    {
        return String::new();
    }

    let mut out = String::from("--- correct\n+++ student\n");
    for hunk in build_hunks(&ops) {
        out.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            hunk.correct_start, hunk.correct_len, hunk.student_start, hunk.student_len
        ));
        for line in &hunk.lines {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_sequences_empty_diff() {
        let seq = lines(&["Hello, World!", "Total: 42"]);
        assert_eq!(unified_diff(&seq, &seq), "");
    }

    #[test]
    fn test_single_line_difference() {
        let correct = lines(&["a", "b", "c"]);
        let student = lines(&["a", "x", "c"]);

        let diff = unified_diff(&correct, &student);

        let removals: Vec<_> = diff.lines().filter(|l| l.starts_with('-') && !l.starts_with("---")).collect();
        let additions: Vec<_> = diff.lines().filter(|l| l.starts_with('+') && !l.starts_with("+++")).collect();
        assert_eq!(removals, vec!["-b"]);
        assert_eq!(additions, vec!["+x"]);
        assert!(diff.starts_with("--- correct\n+++ student\n"));
    }

    #[test]
    fn test_context_limited_to_three_lines() {
        let correct = lines(&["1", "2", "3", "4", "5", "6", "7", "8", "9"]);
        let mut student = correct.clone();
        student[4] = "changed".to_string();

        let diff = unified_diff(&correct, &student);

        let context: Vec<_> = diff
            .lines()
            .skip(3) // headers and hunk marker
            .filter(|l| l.starts_with(' '))
            .collect();
        assert_eq!(context, vec![" 2", " 3", " 4", " 6", " 7", " 8"]);
        assert!(diff.contains("@@ -2,7 +2,7 @@"));
    }

    #[test]
    fn test_distant_changes_get_separate_hunks() {
        let correct: Vec<String> = (1..=20).map(|i| i.to_string()).collect();
        let mut student = correct.clone();
        student[0] = "first".to_string();
        student[19] = "last".to_string();

        let diff = unified_diff(&correct, &student);
        assert_eq!(diff.matches("@@").count() / 2, 2, "two hunks: {diff}");
    }

    #[test]
    fn test_student_missing_everything() {
        let correct = lines(&["a", "b"]);
        let diff = unified_diff(&correct, &[]);
        assert!(diff.contains("@@ -1,2 +0,0 @@"), "empty side anchors at 0: {diff}");
        assert!(diff.contains("-a"));
        assert!(diff.contains("-b"));
        let additions = diff
            .lines()
            .filter(|l| l.starts_with('+') && !l.starts_with("+++"))
            .count();
        assert_eq!(additions, 0, "nothing added: {diff}");
    }

    #[test]
    fn test_student_extra_output_against_empty_reference() {
        let student = lines(&["noise"]);
        let diff = unified_diff(&[], &student);
        assert!(diff.contains("@@ -0,0 +1,1 @@"), "diff: {diff}");
        assert!(diff.contains("+noise"));
    }
}

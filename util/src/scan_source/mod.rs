//! Heuristic scan of submitted source for hard-coded output.
//!
//! A student who prints the expected output verbatim instead of
//! computing it will usually do so through a console-output primitive
//! with a literal argument. The scan flags every line that calls one,
//! verbatim, for the human grader to review. It is advisory only and
//! never blocks grading.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::languages::is_source_file;

const OUTPUT_CALL_PATTERN: &str =
    r"\b(printf|fprintf|sprintf|puts|fputs|putchar|fputc|putc)\s*\(";

/// Scans the text of one source file, returning `file:line: text`
/// entries for every line that calls an output primitive.
fn scan_source_text(file_name: &str, content: &str, pattern: &Regex) -> Vec<String> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| pattern.is_match(line))
        .map(|(idx, line)| format!("{}:{}: {}", file_name, idx + 1, line))
        .collect()
}

/// Scans every recognized source file under `dir` and renders the
/// per-student report.
///
/// Files that are not valid UTF-8 get a "failed to parse" note instead
/// of aborting the student's run.
///
/// # Errors
///
/// Returns an error only when the directory itself cannot be read.
pub fn scan_student_dir(dir: &Path) -> Result<String, String> {
    let pattern = Regex::new(OUTPUT_CALL_PATTERN)
        .map_err(|e| format!("Failed to compile scan pattern: {e}"))?;

    let mut report = Vec::new();
    scan_dir_into(dir, dir, &pattern, &mut report)?;

    if report.is_empty() {
        Ok("No suspicious output calls found.\n".to_string())
    } else {
        Ok(format!("{}\n", report.join("\n")))
    }
}

fn scan_dir_into(
    root: &Path,
    dir: &Path,
    pattern: &Regex,
    report: &mut Vec<String>,
) -> Result<(), String> {
    let entries =
        fs::read_dir(dir).map_err(|e| format!("Failed to read {}: {e}", dir.display()))?;

    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            scan_dir_into(root, &path, pattern, report)?;
            continue;
        }
        if !is_source_file(&path) {
            continue;
        }

        let display_name = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .display()
            .to_string();

        let bytes =
            fs::read(&path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        match String::from_utf8(bytes) {
            Ok(content) => report.extend(scan_source_text(&display_name, &content, pattern)),
            Err(_) => report.push(format!("{display_name}: failed to parse")),
        }
    }

    Ok(())
}

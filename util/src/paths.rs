use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Directory under the grading dir where the batch container is unpacked.
pub const TEMP_DIR: &str = "temp";
/// Directory under the grading dir holding one folder per student.
pub const SUBMISSIONS_DIR: &str = "submissions";

/// Create a directory (and all parents) if it doesn't exist, and return the path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let p = path.as_ref();
    fs::create_dir_all(p)?;
    Ok(p.to_path_buf())
}

// ─── Directory helpers for a grading run ────────────────────────────
//
// Every helper takes the grading dir explicitly; nothing in the
// workspace reads or changes the process current directory.

/// Scratch area for the unpacked batch container: {grading_dir}/temp
pub fn temp_dir(grading_dir: &Path) -> PathBuf {
    grading_dir.join(TEMP_DIR)
}

/// Top-level student area: {grading_dir}/submissions
pub fn submissions_dir(grading_dir: &Path) -> PathBuf {
    grading_dir.join(SUBMISSIONS_DIR)
}

/// One student's folder: {grading_dir}/submissions/{student_id}
pub fn student_dir(grading_dir: &Path, student_id: &str) -> PathBuf {
    submissions_dir(grading_dir).join(student_id)
}

// Per-student artifact files, all keyed by student id.

/// The LMS metadata record preserved with the submission: {id}.info.txt
pub fn info_file_path(student_dir: &Path, student_id: &str) -> PathBuf {
    student_dir.join(format!("{student_id}.info.txt"))
}

/// Captured command output: {id}.out.txt
pub fn output_file_path(student_dir: &Path, student_id: &str) -> PathBuf {
    student_dir.join(format!("{student_id}.out.txt"))
}

/// Grading template for the human grader: {id}.grading.txt
pub fn grading_file_path(student_dir: &Path, student_id: &str) -> PathBuf {
    student_dir.join(format!("{student_id}.grading.txt"))
}

/// Unified diff against the reference output: {id}.diff.txt
pub fn diff_file_path(student_dir: &Path, student_id: &str) -> PathBuf {
    student_dir.join(format!("{student_id}.diff.txt"))
}

/// Cheat-scan report: {id}.scan.txt
pub fn scan_file_path(student_dir: &Path, student_id: &str) -> PathBuf {
    student_dir.join(format!("{student_id}.scan.txt"))
}

/// Batch-level machine-readable summary: {grading_dir}/summary.json
pub fn summary_file_path(grading_dir: &Path) -> PathBuf {
    grading_dir.join("summary.json")
}

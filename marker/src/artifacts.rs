//! Per-student grading artifacts and the batch summary.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::MarkerError;
use util::paths;

/// How one student's run ended, recorded in the batch summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Success,
    CommandFailure,
    Timeout,
    CommandNotFound,
    ExpandFailure,
    WorkspaceFailure,
    DecodeFailure,
}

#[derive(Debug, Serialize)]
pub struct StudentSummary {
    pub student_id: String,
    pub status: StudentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Machine-readable record of a whole grading run, written next to the
/// submissions directory.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub assignment: String,
    pub grader: String,
    pub generated_at: String,
    pub students: Vec<StudentSummary>,
}

impl BatchSummary {
    pub fn new(assignment: impl Into<String>, grader: impl Into<String>) -> Self {
        Self {
            assignment: assignment.into(),
            grader: grader.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            students: Vec::new(),
        }
    }

    pub fn record(&mut self, student_id: &str, status: StudentStatus, note: Option<String>) {
        self.students.push(StudentSummary {
            student_id: student_id.to_string(),
            status,
            note,
        });
    }

    pub fn write(&self, grading_dir: &Path) -> Result<(), MarkerError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| MarkerError::SerializeError(e.to_string()))?;
        fs::write(paths::summary_file_path(grading_dir), json)?;
        tracing::debug!(students = self.students.len(), "wrote batch summary");
        Ok(())
    }
}

/// Writes the artifact files for one student, all keyed by student id
/// inside that student's submission directory.
pub struct ArtifactWriter {
    student_dir: PathBuf,
    student_id: String,
}

impl ArtifactWriter {
    pub fn new(student_dir: &Path, student_id: &str) -> Self {
        Self {
            student_dir: student_dir.to_path_buf(),
            student_id: student_id.to_string(),
        }
    }

    /// The template the human grader fills in: assignment and student
    /// identifiers, a blank score line, the grader's name.
    pub fn write_grading_template(
        &self,
        assignment: &str,
        grader: &str,
    ) -> Result<(), MarkerError> {
        let content = format!(
            "Grading for {} ({}).\n\n*\n\nScore: \nGrader: {}\n",
            assignment, self.student_id, grader
        );
        let path = paths::grading_file_path(&self.student_dir, &self.student_id);
        fs::write(path, content)?;
        Ok(())
    }

    /// Raw captured output, plus the failure note when the run stopped
    /// early.
    pub fn write_output(&self, output: &str, failure_note: Option<&str>) -> Result<(), MarkerError> {
        let mut content = output.to_string();
        if let Some(note) = failure_note {
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(note);
            content.push('\n');
        }
        let path = paths::output_file_path(&self.student_dir, &self.student_id);
        fs::write(path, content)?;
        Ok(())
    }

    /// Unified diff against the reference output; empty when the run
    /// failed or matched exactly.
    pub fn write_diff(&self, diff: &str) -> Result<(), MarkerError> {
        let path = paths::diff_file_path(&self.student_dir, &self.student_id);
        fs::write(path, diff)?;
        Ok(())
    }

    /// Cheat-scan report.
    pub fn write_scan(&self, report: &str) -> Result<(), MarkerError> {
        let path = paths::scan_file_path(&self.student_dir, &self.student_id);
        fs::write(path, report)?;
        Ok(())
    }
}

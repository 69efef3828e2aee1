//! The batch grading pipeline.
//!
//! One pass over the export: restore every student's files from the
//! batch container, then grade students one at a time. A student's
//! failure is recorded in their artifacts and the run moves on; only a
//! malformed export or an unexpected starting state stops the batch.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use code_runner::commands::{self, CommandSpec};
use code_runner::workspace::Workspace;
use code_runner::{FailureKind, run_commands};
use marker::artifacts::{ArtifactWriter, BatchSummary, StudentStatus};
use marker::{diff, normalizer};
use util::{archive, config, paths, scan_source};

pub struct BatchArgs {
    pub zipfile: PathBuf,
    pub assignment: String,
    pub grader: String,
    pub grading_dir: PathBuf,
    pub resources_dir: Option<PathBuf>,
    pub commands_path: PathBuf,
    pub expected_output: Option<PathBuf>,
}

/// Runs the whole batch and writes `summary.json` into the grading
/// directory.
///
/// # Errors
///
/// Fails when the grading directory already holds `temp` or
/// `submissions` (a previous run's state should never be silently
/// overwritten), when the container cannot be unpacked, or when a
/// metadata record is malformed.
pub async fn run_batch(args: &BatchArgs) -> Result<BatchSummary> {
    let temp_dir = paths::temp_dir(&args.grading_dir);
    let submissions_dir = paths::submissions_dir(&args.grading_dir);

    if temp_dir.exists() {
        bail!("{} directory already exists", temp_dir.display());
    }
    if submissions_dir.exists() {
        bail!("{} directory already exists", submissions_dir.display());
    }
    paths::ensure_dir(&temp_dir)?;
    paths::ensure_dir(&submissions_dir)?;

    archive::extract_archive_file(&args.zipfile, &temp_dir)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("unpacking batch container {}", args.zipfile.display()))?;

    let student_ids = manifest_parser::process_batch_records(&temp_dir, &submissions_dir)?;
    tracing::info!(count = student_ids.len(), "restored submissions");

    let specs = commands::load_commands(&args.commands_path).map_err(anyhow::Error::msg)?;

    // Normalized once for the whole batch.
    let expected: Option<Vec<String>> = match &args.expected_output {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("reading expected output {}", path.display()))?;
            Some(normalizer::normalize_lines(&String::from_utf8_lossy(&bytes)))
        }
        None => None,
    };

    let mut summary = BatchSummary::new(&args.assignment, &args.grader);

    for student_id in &student_ids {
        grade_student(args, student_id, &specs, expected.as_deref(), &mut summary).await?;
    }

    fs::remove_dir_all(&temp_dir)
        .with_context(|| format!("removing {}", temp_dir.display()))?;

    summary
        .write(&args.grading_dir)
        .map_err(|e| anyhow::anyhow!("writing batch summary: {e:?}"))?;

    Ok(summary)
}

/// Grades one student. Every failure past this point is per-student:
/// it lands in the artifacts and the summary, never in an `Err`.
async fn grade_student(
    args: &BatchArgs,
    student_id: &str,
    specs: &[CommandSpec],
    expected: Option<&[String]>,
    summary: &mut BatchSummary,
) -> Result<()> {
    tracing::info!(student_id, "grading submission");

    let student_dir = paths::student_dir(&args.grading_dir, student_id);
    let writer = ArtifactWriter::new(&student_dir, student_id);
    writer
        .write_grading_template(&args.assignment, &args.grader)
        .map_err(|e| anyhow::anyhow!("writing grading template for {student_id}: {e:?}"))?;

    if let Err(e) = archive::expand_in_place(&student_dir) {
        tracing::warn!(student_id, "archive expansion failed: {e}");
        write_failure_artifacts(&writer, &e)?;
        // The scan never ran; give the grader an empty report rather
        // than a missing file.
        writer
            .write_scan("")
            .map_err(|e| anyhow::anyhow!("writing empty scan for {student_id}: {e:?}"))?;
        summary.record(student_id, StudentStatus::ExpandFailure, Some(e));
        return Ok(());
    }

    let scan_report = match scan_source::scan_student_dir(&student_dir) {
        Ok(report) => report,
        Err(e) => format!("scan failed: {e}\n"),
    };
    let decode_trouble = scan_report.contains("failed to parse");
    writer
        .write_scan(&scan_report)
        .map_err(|e| anyhow::anyhow!("writing scan report for {student_id}: {e:?}"))?;

    let workspace = match Workspace::prepare(args.resources_dir.as_deref(), &student_dir) {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(student_id, "workspace preparation failed: {e}");
            // The scan report was already written and stands.
            write_failure_artifacts(&writer, &e)?;
            summary.record(student_id, StudentStatus::WorkspaceFailure, Some(e));
            return Ok(());
        }
    };

    let timeout = Duration::from_secs(config::command_timeout_secs());
    let report = run_commands(specs, workspace.path(), timeout)
        .await
        .map_err(anyhow::Error::msg)?;

    let failure_note = report.failure.as_ref().map(|f| f.describe());
    writer
        .write_output(&report.output, failure_note.as_deref())
        .map_err(|e| anyhow::anyhow!("writing output for {student_id}: {e:?}"))?;

    // A failed run has no meaningful output to diff.
    let diff_text = match (&report.failure, expected) {
        (None, Some(expected)) => {
            let student_lines = normalizer::normalize_lines(&report.output);
            diff::unified_diff(expected, &student_lines)
        }
        _ => String::new(),
    };
    writer
        .write_diff(&diff_text)
        .map_err(|e| anyhow::anyhow!("writing diff for {student_id}: {e:?}"))?;

    let status = match &report.failure {
        Some(failure) => match failure.kind {
            FailureKind::NonZeroExit(_) => StudentStatus::CommandFailure,
            FailureKind::Timeout => StudentStatus::Timeout,
            FailureKind::NotFound => StudentStatus::CommandNotFound,
        },
        None if decode_trouble => StudentStatus::DecodeFailure,
        None => StudentStatus::Success,
    };
    if let Some(note) = &failure_note {
        tracing::warn!(student_id, "{note}");
    }
    summary.record(student_id, status, failure_note);

    Ok(())
}

/// A student whose run never reached the command stage still gets
/// output and diff artifacts, with the failure noted in the output
/// file. The scan report is the caller's concern: it may already hold
/// real findings.
fn write_failure_artifacts(writer: &ArtifactWriter, note: &str) -> Result<()> {
    writer
        .write_output("", Some(note))
        .map_err(|e| anyhow::anyhow!("writing failure output: {e:?}"))?;
    writer
        .write_diff("")
        .map_err(|e| anyhow::anyhow!("writing empty diff: {e:?}"))?;
    Ok(())
}
